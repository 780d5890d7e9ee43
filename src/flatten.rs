//! Text Flattener
//!
//! Turns fetched markup into newline-separated text, one text node per line.
//! Script, style and template contents are dropped; nothing else about the
//! document structure is kept. Plain-text input passes through unchanged.

use scraper::Html;

/// Elements whose text never reaches the reader
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Flatten HTML (or plain text) into newline-separated text
pub fn flatten_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| SKIPPED_ELEMENTS.contains(&element.name()))
        });
        if !hidden {
            parts.push(text);
        }
    }

    parts.join("\n")
}

/// Flatten each page and concatenate them, one page after another
pub fn flatten_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut combined = String::new();
    for page in pages {
        combined.push_str(&flatten_html(page.as_ref()));
        combined.push('\n');
    }
    combined
}
