pub mod rows;
pub mod sections;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SyncError};

/// One sheet entry: the section it sits under, its title and where to solve it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub topic: String,
    pub question: String,
    pub link: String,
}

/// Compiled selectors shared by the section walk and row extraction.
pub struct Selectors {
    pub headings: Selector,
    pub rows: Selector,
    pub cells: Selector,
    pub anchor: Selector,
}

impl Selectors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            headings: compile("h2, h3")?,
            rows: compile("tr")?,
            cells: compile("td")?,
            anchor: compile("a")?,
        })
    }
}

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SyncError::Parse(format!("selector {:?}: {}", css, e)))
}

/// Two-pass pipeline: markup → (heading, table) sections → problems.
pub fn extract_problems(markup: &str) -> Result<Vec<Problem>> {
    let selectors = Selectors::new()?;
    let document = Html::parse_document(markup);
    if !document.errors.is_empty() {
        // html5ever recovers from malformed markup; keep the count for diagnosis
        debug!(count = document.errors.len(), "Tree builder reported markup errors");
    }

    let sections = sections::find_sections(&document, &selectors);
    let mut problems = Vec::new();
    for section in &sections {
        let found = rows::extract_rows(section, &selectors);
        debug!(topic = %section.topic, problems = found.len(), "Section extracted");
        problems.extend(found);
    }

    info!(
        "Extracted {} problems from {} sections",
        problems.len(),
        sections.len()
    );
    Ok(problems)
}
