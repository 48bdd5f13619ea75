use scraper::{ElementRef, Html};

use super::Selectors;

/// A heading paired with the table that follows it.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub topic: String,
    pub table: ElementRef<'a>,
}

/// Pair every h2/h3 with its data table, in document order. Headings
/// without a table are dropped.
pub fn find_sections<'a>(document: &'a Html, selectors: &Selectors) -> Vec<Section<'a>> {
    document
        .select(&selectors.headings)
        .filter_map(|heading| {
            let table = following_table(heading)?;
            Some(Section {
                topic: element_text(heading),
                table,
            })
        })
        .collect()
}

/// Walk the heading's following element siblings up to the next heading and
/// return the first table. Intermediate siblings (banners, paragraphs, ads)
/// are skipped; descendants are never searched.
fn following_table(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|el| !is_heading(el))
        .find(|el| el.value().name() == "table")
}

fn is_heading(el: &ElementRef<'_>) -> bool {
    matches!(el.value().name(), "h2" | "h3")
}

/// All descendant text, trimmed at the ends only.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics(html: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        let selectors = Selectors::new().unwrap();
        find_sections(&doc, &selectors)
            .into_iter()
            .map(|s| s.topic)
            .collect()
    }

    #[test]
    fn skips_non_table_siblings() {
        let html = "<h2>Arrays</h2><p>intro</p><div class='ad'><table></table></div><ul><li>x</li></ul><table id='data'></table>";
        let doc = Html::parse_document(html);
        let selectors = Selectors::new().unwrap();
        let sections = find_sections(&doc, &selectors);
        assert_eq!(sections.len(), 1);
        // the nested table inside the div is a descendant, not a sibling
        assert_eq!(sections[0].table.value().attr("id"), Some("data"));
    }

    #[test]
    fn heading_without_table_dropped() {
        assert!(topics("<h2>Lonely</h2><p>nothing here</p>").is_empty());
    }

    #[test]
    fn walk_stops_at_next_heading() {
        assert_eq!(
            topics("<h2>A</h2><h3>B</h3><table></table>"),
            vec!["B".to_string()]
        );
    }

    #[test]
    fn only_first_table_associated() {
        let html = "<h2>A</h2><table id='one'></table><table id='two'></table>";
        let doc = Html::parse_document(html);
        let selectors = Selectors::new().unwrap();
        let sections = find_sections(&doc, &selectors);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].table.value().attr("id"), Some("one"));
    }

    #[test]
    fn heading_inside_wrapper_cannot_reach_outer_table() {
        assert!(topics("<div><h2>Wrapped</h2></div><table></table>").is_empty());
    }

    #[test]
    fn heading_text_includes_nested_markup() {
        assert_eq!(
            topics("<h2>  <span>Linked</span> <b>List</b>\n</h2><table></table>"),
            vec!["Linked List".to_string()]
        );
    }

    #[test]
    fn h1_and_h4_ignored() {
        assert_eq!(
            topics("<h1>Title</h1><table></table><h4>Minor</h4><table></table>"),
            Vec::<String>::new()
        );
    }
}
