//! Research configuration
//!
//! YAML schema for a run: universities, categories, official URL tables,
//! course profiles, fetch and search settings. A missing file falls back to
//! the built-in search-driven setup.

use crate::scrapers::university::UrlTable;
use crate::types::{CategorySet, CategorySpec, ConfigError, Entity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Keywords shared by the built-in categories
const DEFAULT_KEYWORDS: &[&str] = &["requirement", "must have", "admission", "career", "job"];

const DEFAULT_UNIVERSITIES: &[&str] = &[
    "Massachusetts Institute of Technology",
    "Stanford University",
    "University of Oxford",
    "Harvard University",
    "California Institute of Technology",
];

/// Where page URLs come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// One web search per category, top results fetched
    #[default]
    Search,
    /// Official URL per university from the configured table
    Lookup,
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceMode::Search => f.write_str("search"),
            SourceMode::Lookup => f.write_str("lookup"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Pause between consecutive page fetches
    pub delay_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            delay_ms: 1000,
        }
    }
}

impl FetchSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSettings {
    pub results_per_query: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { results_per_query: 5 }
    }
}

/// Course-table variant: its own categories and official course pages
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourseProfile {
    pub title: String,
    pub categories: Vec<CategorySpec>,
    #[serde(default)]
    pub urls: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResearchConfig {
    pub entity_column: String,
    pub output: String,
    pub mode: SourceMode,
    pub universities: Vec<String>,
    pub categories: Vec<CategorySpec>,
    /// University -> official admissions page
    pub urls: BTreeMap<String, String>,
    pub courses: BTreeMap<String, CourseProfile>,
    pub fetch: FetchSettings,
    pub search: SearchSettings,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        let category = |name: &str, query: &str| {
            CategorySpec::new(name, DEFAULT_KEYWORDS, 0, 10).with_query(query)
        };

        Self {
            entity_column: "Entity".to_string(),
            output: "universities_info.csv".to_string(),
            mode: SourceMode::Search,
            universities: DEFAULT_UNIVERSITIES.iter().map(|u| u.to_string()).collect(),
            categories: vec![
                category("Prerequisites", "{university} {degree} prerequisites"),
                category(
                    "Admission Criteria",
                    "{university} {degree} admission requirements what they look for",
                ),
                category(
                    "Career Outcomes",
                    "{university} {degree} career outcomes jobs after degree",
                ),
            ],
            urls: BTreeMap::new(),
            courses: BTreeMap::new(),
            fetch: FetchSettings::default(),
            search: SearchSettings::default(),
        }
    }
}

/// Parameters collected by the front-end for one run
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub degree: Option<String>,
    /// Subset and order of universities; empty means all configured
    pub universities: Vec<String>,
    pub course: Option<String>,
    pub mode: Option<SourceMode>,
}

/// Everything the aggregator needs, resolved and validated
#[derive(Debug, Clone)]
pub struct ResearchPlan {
    pub mode: SourceMode,
    pub degree: String,
    pub entities: Vec<Entity>,
    pub categories: CategorySet,
    pub urls: UrlTable,
}

impl ResearchConfig {
    pub fn course_ids(&self) -> Vec<String> {
        self.courses.keys().cloned().collect()
    }

    /// Settings that make every fetch fail or return nothing
    fn setting_errors(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.search.results_per_query == 0 {
            errors.push(ConfigError::ZeroResultsPerQuery);
        }
        if self.fetch.timeout_secs == 0 {
            errors.push(ConfigError::ZeroTimeout);
        }

        // Course URL tables are keyed by title
        let mut titles: BTreeMap<&str, &str> = BTreeMap::new();
        for (id, course) in &self.courses {
            let title = course.title.trim();
            if let Some(first) = titles.insert(title, id.as_str()) {
                errors.push(ConfigError::DuplicateCourseTitle {
                    title: title.to_string(),
                    first: first.to_string(),
                    second: id.clone(),
                });
            }
        }

        errors
    }

    /// Resolve a run request against this config. Fails before any fetch.
    pub fn plan(&self, request: &RunRequest) -> Result<ResearchPlan, ConfigError> {
        if let Some(error) = self.setting_errors().into_iter().next() {
            return Err(error);
        }
        let urls = UrlTable::from_config(self);

        if let Some(course_id) = request.course.as_deref() {
            let course = self.courses.get(course_id).ok_or_else(|| ConfigError::UnknownCourse {
                course: course_id.to_string(),
                known: self.course_ids().join(", "),
            })?;
            let categories = CategorySet::new(course.categories.clone())?;

            let universities = if !request.universities.is_empty() {
                request.universities.clone()
            } else if !self.universities.is_empty() {
                self.universities.clone()
            } else {
                course.urls.keys().cloned().collect()
            };
            if universities.is_empty() {
                return Err(ConfigError::NoUniversities);
            }

            return Ok(ResearchPlan {
                mode: request.mode.unwrap_or(SourceMode::Lookup),
                degree: request.degree.clone().unwrap_or_else(|| course.title.clone()),
                entities: universities
                    .iter()
                    .map(|u| Entity::with_course(u.as_str(), course.title.as_str()))
                    .collect(),
                categories,
                urls,
            });
        }

        let categories = CategorySet::new(self.categories.clone())?;
        let mode = request.mode.unwrap_or(self.mode);

        let degree = request
            .degree
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if mode == SourceMode::Search && degree.is_empty() {
            return Err(ConfigError::MissingDegree);
        }

        let universities = if request.universities.is_empty() {
            self.universities.clone()
        } else {
            request.universities.clone()
        };
        if universities.is_empty() {
            return Err(ConfigError::NoUniversities);
        }

        Ok(ResearchPlan {
            mode,
            degree,
            entities: universities.iter().map(|u| Entity::new(u.as_str())).collect(),
            categories,
            urls,
        })
    }

    /// Problems that would break or degrade a run
    pub fn validate(&self) -> Vec<Issue> {
        let mut issues = Vec::new();

        if let Err(e) = CategorySet::new(self.categories.clone()) {
            issues.push(Issue::error(format!("categories: {}", e)));
        }
        if self.mode == SourceMode::Search {
            check_queries("categories", &self.categories, &mut issues);
        }
        if self.universities.is_empty() {
            issues.push(Issue::warning("no universities configured; --university must be given"));
        }
        for error in self.setting_errors() {
            issues.push(Issue::error(error.to_string()));
        }

        if self.mode == SourceMode::Lookup {
            for university in &self.universities {
                if !self.urls.contains_key(university) {
                    issues.push(Issue::warning(format!(
                        "university '{}' has no URL; its row will be filled with placeholders",
                        university
                    )));
                }
            }
        }
        check_urls("urls", &self.urls, &mut issues);

        for (id, course) in &self.courses {
            let scope = format!("courses.{}", id);
            if course.title.trim().is_empty() {
                issues.push(Issue::error(format!("{}: title must not be empty", scope)));
            }
            if let Err(e) = CategorySet::new(course.categories.clone()) {
                issues.push(Issue::error(format!("{}: {}", scope, e)));
            }
            if course.urls.is_empty() {
                issues.push(Issue::warning(format!("{}: no course URLs configured", scope)));
            }
            check_urls(&format!("{}.urls", scope), &course.urls, &mut issues);
        }

        issues
    }
}

fn check_queries(scope: &str, categories: &[CategorySpec], issues: &mut Vec<Issue>) {
    for spec in categories {
        match spec.query.as_deref() {
            None => issues.push(Issue::error(format!(
                "{}: '{}' has no search query template",
                scope, spec.name
            ))),
            Some(query) if !query.contains("{university}") => issues.push(Issue::warning(format!(
                "{}: query for '{}' does not mention {{university}}",
                scope, spec.name
            ))),
            Some(_) => {}
        }
    }
}

fn check_urls(scope: &str, urls: &BTreeMap<String, String>, issues: &mut Vec<Issue>) {
    for (university, url) in urls {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            issues.push(Issue::warning(format!(
                "{}: URL for '{}' has no http/https scheme: {}",
                scope, university, url
            )));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
