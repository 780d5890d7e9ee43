use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Default text written into a cell when a category yields nothing
pub const DEFAULT_PLACEHOLDER: &str = "Not found";

/// A university (optionally paired with a course) being researched
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Entity {
    pub university: String,
    #[serde(default)]
    pub course: Option<String>,
}

impl Entity {
    pub fn new(university: impl Into<String>) -> Self {
        Self {
            university: university.into(),
            course: None,
        }
    }

    pub fn with_course(university: impl Into<String>, course: impl Into<String>) -> Self {
        Self {
            university: university.into(),
            course: Some(course.into()),
        }
    }

    /// Identifier written into the first column of the report
    pub fn label(&self) -> String {
        match &self.course {
            Some(course) => format!("{} ({})", self.university, course),
            None => self.university.clone(),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// One output column: keywords, length threshold and result cap
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySpec {
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub min_length: usize,
    pub max_results: usize,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    /// Search template, e.g. "{university} {degree} prerequisites"
    #[serde(default)]
    pub query: Option<String>,
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

impl CategorySpec {
    pub fn new(name: impl Into<String>, keywords: &[&str], min_length: usize, max_results: usize) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            min_length,
            max_results,
            placeholder: default_placeholder(),
            query: None,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("at least one category is required")]
    EmptyCategorySet,
    #[error("category name must not be blank")]
    BlankCategory,
    #[error("duplicate category '{0}'")]
    DuplicateCategory(String),
    #[error("category '{0}' has no usable keywords")]
    NoKeywords(String),
    #[error("category '{0}' must keep at least one line (max_results = 0)")]
    ZeroCap(String),
    #[error("unknown course '{course}' (configured: {known})")]
    UnknownCourse { course: String, known: String },
    #[error("a degree name is required for search-driven research")]
    MissingDegree,
    #[error("no universities selected")]
    NoUniversities,
    #[error("search.results_per_query must be at least 1")]
    ZeroResultsPerQuery,
    #[error("fetch.timeout_secs must be at least 1")]
    ZeroTimeout,
    #[error("courses '{first}' and '{second}' share the title '{title}'")]
    DuplicateCourseTitle { title: String, first: String, second: String },
}

/// Ordered, validated set of categories; the closed key set of every record
#[derive(Debug, Clone)]
pub struct CategorySet {
    specs: Vec<CategorySpec>,
}

impl CategorySet {
    pub fn new(specs: Vec<CategorySpec>) -> Result<Self, ConfigError> {
        if specs.is_empty() {
            return Err(ConfigError::EmptyCategorySet);
        }

        let mut seen = HashSet::new();
        for spec in &specs {
            let name = spec.name.trim();
            if name.is_empty() {
                return Err(ConfigError::BlankCategory);
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(ConfigError::DuplicateCategory(spec.name.clone()));
            }
            if spec.keywords.is_empty() || spec.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(ConfigError::NoKeywords(spec.name.clone()));
            }
            if spec.max_results == 0 {
                return Err(ConfigError::ZeroCap(spec.name.clone()));
            }
        }

        Ok(Self { specs })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CategorySpec> {
        self.specs.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CategorySpec> {
        self.specs.iter().find(|s| s.name == name)
    }
}

impl<'a> IntoIterator for &'a CategorySet {
    type Item = &'a CategorySpec;
    type IntoIter = std::slice::Iter<'a, CategorySpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}

/// How a cell value came about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", content = "lines", rename_all = "snake_case")]
pub enum ValueStatus {
    /// Number of matched lines joined into the cell
    Matched(usize),
    NoMatch,
    SourceUnavailable,
    LookupMiss,
}

impl ValueStatus {
    pub fn is_placeholder(&self) -> bool {
        !matches!(self, ValueStatus::Matched(_))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CategoryValue {
    pub category: String,
    pub text: String,
    pub status: ValueStatus,
}

/// Per-entity output row; `values` follows the category set order
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Record {
    pub entity: Entity,
    pub values: Vec<CategoryValue>,
}

impl Record {
    pub fn get(&self, category: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.category == category)
            .map(|v| v.text.as_str())
    }

    pub fn status(&self, category: &str) -> Option<ValueStatus> {
        self.values
            .iter()
            .find(|v| v.category == category)
            .map(|v| v.status)
    }

    pub fn matched_categories(&self) -> usize {
        self.values.iter().filter(|v| !v.status.is_placeholder()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Report {
    pub entity_column: String,
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Report {
    pub fn new(entity_column: impl Into<String>, categories: &CategorySet) -> Self {
        Self {
            entity_column: entity_column.into(),
            columns: categories.names(),
            records: Vec::new(),
        }
    }

    /// Header row: entity column followed by each category in order
    pub fn headers(&self) -> Vec<String> {
        let mut headers = Vec::with_capacity(self.columns.len() + 1);
        headers.push(self.entity_column.clone());
        headers.extend(self.columns.iter().cloned());
        headers
    }

    /// Cells for one record, aligned with `headers()`
    pub fn row(&self, record: &Record) -> Vec<String> {
        let mut row = Vec::with_capacity(self.columns.len() + 1);
        row.push(record.entity.label());
        for column in &self.columns {
            row.push(record.get(column).unwrap_or_default().to_string());
        }
        row
    }
}
