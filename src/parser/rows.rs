use scraper::ElementRef;
use tracing::debug;

use super::sections::{element_text, Section};
use super::{Problem, Selectors};

const LINK_CELL: usize = 2;

/// Turn the data rows of a section's table into problems. The first row is
/// the header; rows with fewer than three cells or without a usable link in
/// the third cell are skipped.
pub fn extract_rows(section: &Section<'_>, selectors: &Selectors) -> Vec<Problem> {
    section
        .table
        .select(&selectors.rows)
        .skip(1)
        .filter_map(|row| extract_row(&section.topic, row, selectors))
        .collect()
}

fn extract_row(topic: &str, row: ElementRef<'_>, selectors: &Selectors) -> Option<Problem> {
    let cells: Vec<ElementRef<'_>> = row.select(&selectors.cells).collect();
    if cells.len() <= LINK_CELL {
        debug!(topic, cells = cells.len(), "Skipping short row");
        return None;
    }

    let question = element_text(cells[0]);
    let Some(link) = cell_link(cells[LINK_CELL], selectors) else {
        debug!(topic, question = %question, "Skipping row without link");
        return None;
    };

    Some(Problem {
        topic: topic.to_string(),
        question,
        link,
    })
}

/// href of the first anchor in the cell; an empty href counts as missing.
fn cell_link(cell: ElementRef<'_>, selectors: &Selectors) -> Option<String> {
    cell.select(&selectors.anchor)
        .next()?
        .value()
        .attr("href")
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::sections::find_sections;
    use scraper::Html;

    fn extract(rows: &str) -> Vec<Problem> {
        let html = format!(
            "<h2>Topic</h2><table><tr><th>Problem</th><th>Level</th><th>Link</th></tr>{}</table>",
            rows
        );
        let doc = Html::parse_document(&html);
        let selectors = Selectors::new().unwrap();
        find_sections(&doc, &selectors)
            .iter()
            .flat_map(|s| extract_rows(s, &selectors))
            .collect()
    }

    #[test]
    fn two_cell_row_excluded() {
        assert!(extract("<tr><td>Only</td><td><a href='/x'>x</a></td></tr>").is_empty());
    }

    #[test]
    fn missing_anchor_excluded() {
        assert!(extract("<tr><td>Q</td><td>Easy</td><td>no link</td></tr>").is_empty());
    }

    #[test]
    fn anchor_without_href_excluded() {
        assert!(extract("<tr><td>Q</td><td>Easy</td><td><a>Solve</a></td></tr>").is_empty());
    }

    #[test]
    fn empty_href_excluded() {
        assert!(extract("<tr><td>Q</td><td>Easy</td><td><a href=\"\">Solve</a></td></tr>").is_empty());
    }

    #[test]
    fn link_in_other_cell_ignored() {
        let rows = "<tr><td><a href='/first'>Q</a></td><td>Easy</td><td>none</td></tr>";
        assert!(extract(rows).is_empty());
    }

    #[test]
    fn extra_cells_allowed() {
        let problems = extract(
            "<tr><td> Q </td><td>Easy</td><td><span><a href='/q'>Solve</a></span><a href='/alt'>Alt</a></td><td>notes</td></tr>",
        );
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].question, "Q");
        // first anchor wins, nested anywhere in the cell
        assert_eq!(problems[0].link, "/q");
    }

    #[test]
    fn href_kept_verbatim() {
        let problems = extract("<tr><td>Q</td><td>E</td><td><a href=' /spaced?a=1&amp;b=2 '>s</a></td></tr>");
        assert_eq!(problems[0].link, " /spaced?a=1&b=2 ");
    }

    #[test]
    fn first_row_skipped_even_when_data() {
        let html = "<h2>T</h2><table><tr><td>A</td><td>E</td><td><a href='/a'>a</a></td></tr><tr><td>B</td><td>E</td><td><a href='/b'>b</a></td></tr></table>";
        let doc = Html::parse_document(html);
        let selectors = Selectors::new().unwrap();
        let problems: Vec<Problem> = find_sections(&doc, &selectors)
            .iter()
            .flat_map(|s| extract_rows(s, &selectors))
            .collect();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].question, "B");
    }

    #[test]
    fn rows_inside_thead_and_tbody() {
        let html = "<h2>T</h2><table><thead><tr><th>h</th></tr></thead><tbody><tr><td>A</td><td>E</td><td><a href='/a'>a</a></td></tr></tbody></table>";
        let doc = Html::parse_document(html);
        let selectors = Selectors::new().unwrap();
        let sections = find_sections(&doc, &selectors);
        let problems = extract_rows(&sections[0], &selectors);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].topic, "T");
    }
}
