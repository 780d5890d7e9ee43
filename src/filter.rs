//! Keyword Line Filter
//!
//! Selects the lines of a page that belong to a category:
//! - case-insensitive substring match against the category keywords
//! - trimmed lines shorter than the threshold are dropped (menu/nav noise)
//! - only the first `max_results` matches, in page order, are kept

use crate::types::CategorySpec;

/// Lower-cased keyword set of one category
#[derive(Debug, Clone)]
pub struct KeywordGroup {
    keywords: Vec<String>,
}

impl KeywordGroup {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    /// True if any keyword appears anywhere in the line
    pub fn matches(&self, line: &str) -> bool {
        let line_lower = line.to_lowercase();
        self.keywords.iter().any(|kw| line_lower.contains(kw.as_str()))
    }
}

/// Keep matching lines in original order, then cut to `max_results`.
///
/// A line is tested once; matching several keywords still yields it once.
/// Duplicate lines are kept.
pub fn match_lines<I, S>(lines: I, group: &KeywordGroup, min_length: usize, max_results: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut found: Vec<String> = lines
        .into_iter()
        .filter(|line| group.matches(line.as_ref()))
        .map(|line| line.as_ref().trim().to_string())
        .filter(|line| line.chars().count() >= min_length)
        .collect();

    found.truncate(max_results);
    found
}

/// Run one category over newline-separated text
pub fn find_key_sentences(text: &str, spec: &CategorySpec) -> Vec<String> {
    let group = KeywordGroup::new(spec.keywords.as_slice());
    match_lines(text.lines(), &group, spec.min_length, spec.max_results)
}
