//! Plain-text extraction from fetched pages
//!
//! Pages are only searched, never rendered: every text node of the document is
//! concatenated as-is (inline markup never splits a word) and whitespace is collapsed.

use scraper::Html;

use crate::utils::normalize_whitespace;

/// Extract the visible text of an HTML document
///
/// Non-HTML bodies are returned with whitespace collapsed, since the HTML
/// parser treats them as a single text node.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let text = document.root_element().text().collect::<String>();
    normalize_whitespace(&text)
}
