use super::{Resolution, SourceResolver};
use crate::config::ResearchConfig;
use crate::fetcher::{FetchError, PageFetcher};
use crate::pacer::Pacer;
use crate::types::{CategorySpec, Entity};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Official page per university, optionally per course
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlTable {
    universities: BTreeMap<String, String>,
    courses: BTreeMap<String, BTreeMap<String, String>>,
}

impl UrlTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// General table from `urls`, plus one nested table per course title
    pub fn from_config(config: &ResearchConfig) -> Self {
        let mut table = Self::new();
        for (university, url) in &config.urls {
            table.insert(university.as_str(), url.as_str());
        }
        for course in config.courses.values() {
            for (university, url) in &course.urls {
                table.insert_course(course.title.as_str(), university.as_str(), url.as_str());
            }
        }
        table
    }

    pub fn insert(&mut self, university: impl Into<String>, url: impl Into<String>) {
        self.universities.insert(university.into(), url.into());
    }

    pub fn insert_course(&mut self, course: impl Into<String>, university: impl Into<String>, url: impl Into<String>) {
        self.courses
            .entry(course.into())
            .or_default()
            .insert(university.into(), url.into());
    }

    /// Course entities only look in their course table
    pub fn lookup(&self, entity: &Entity) -> Option<&str> {
        let table = match &entity.course {
            Some(course) => self.courses.get(course)?,
            None => &self.universities,
        };
        table.get(&entity.university).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.universities.len() + self.courses.values().map(BTreeMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fetches the entity's official page once and serves it to every category
pub struct LookupResolver<F, P> {
    urls: UrlTable,
    fetcher: F,
    pacer: P,
    delay: Duration,
    last_page: Option<(String, Result<String, FetchError>)>,
    fetched: usize,
}

impl<F: PageFetcher, P: Pacer> LookupResolver<F, P> {
    pub fn new(urls: UrlTable, fetcher: F, pacer: P) -> Self {
        Self {
            urls,
            fetcher,
            pacer,
            delay: Duration::ZERO,
            last_page: None,
            fetched: 0,
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn page(&mut self, url: &str) -> Result<String, FetchError> {
        if let Some((cached_url, body)) = &self.last_page {
            if cached_url == url {
                return body.clone();
            }
        }

        if self.fetched > 0 {
            self.pacer.pause(self.delay);
        }
        self.fetched += 1;

        let body = self.fetcher.fetch(url);
        if let Err(e) = &body {
            warn!(url, kind = e.kind(), "fetch failed: {}", e);
        }
        self.last_page = Some((url.to_string(), body.clone()));
        body
    }
}

impl<F: PageFetcher, P: Pacer> SourceResolver for LookupResolver<F, P> {
    fn resolve(&mut self, entity: &Entity, category: &CategorySpec) -> Resolution {
        let Some(url) = self.urls.lookup(entity).map(str::to_string) else {
            warn!(entity = %entity, category = %category.name, "no URL configured");
            return Resolution::Missing;
        };

        debug!(entity = %entity, url = %url, category = %category.name, "using official page");
        Resolution::Pages(vec![self.page(&url)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacer::{NoPacer, RecordingPacer};
    use std::cell::RefCell;

    struct CountingFetcher {
        calls: RefCell<Vec<String>>,
    }

    impl PageFetcher for CountingFetcher {
        fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.borrow_mut().push(url.to_string());
            if url.contains("broken") {
                return Err(FetchError::Status {
                    code: 500,
                    url: url.to_string(),
                });
            }
            Ok(format!("page at {}", url))
        }
    }

    fn counting() -> CountingFetcher {
        CountingFetcher {
            calls: RefCell::new(vec![]),
        }
    }

    fn spec() -> CategorySpec {
        CategorySpec::new("Prerequisites", &["requirement"], 0, 10)
    }

    #[test]
    fn test_url_table_lookup() {
        let mut table = UrlTable::new();
        table.insert("MIT", "https://mitadmissions.org");
        table.insert_course("Physics", "MIT", "https://physics.mit.edu");

        assert_eq!(table.lookup(&Entity::new("MIT")), Some("https://mitadmissions.org"));
        assert_eq!(
            table.lookup(&Entity::with_course("MIT", "Physics")),
            Some("https://physics.mit.edu")
        );
        assert_eq!(table.lookup(&Entity::with_course("MIT", "Law")), None);
        assert_eq!(table.lookup(&Entity::new("Caltech")), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_url_is_lookup_miss() {
        let fetcher = counting();
        let mut resolver = LookupResolver::new(UrlTable::new(), &fetcher, NoPacer);
        assert_eq!(resolver.resolve(&Entity::new("Nowhere"), &spec()), Resolution::Missing);
        assert!(fetcher.calls.borrow().is_empty());
    }

    #[test]
    fn test_page_fetched_once_per_entity() {
        let mut table = UrlTable::new();
        table.insert("MIT", "https://mit.example/admissions");
        table.insert("Caltech", "https://caltech.example/admissions");

        let fetcher = counting();
        let pacer = RecordingPacer::new();
        let mut resolver =
            LookupResolver::new(table, &fetcher, &pacer).delay(Duration::from_secs(1));

        let mit = Entity::new("MIT");
        let first = resolver.resolve(&mit, &spec());
        let second = resolver.resolve(&mit, &CategorySpec::new("Careers", &["career"], 0, 10));
        assert_eq!(first, second);

        resolver.resolve(&Entity::new("Caltech"), &spec());

        assert_eq!(fetcher.calls.borrow().len(), 2);
        assert_eq!(pacer.pauses(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn test_fetch_failure_passed_through() {
        let mut table = UrlTable::new();
        table.insert("Broken U", "https://broken.example");

        let fetcher = counting();
        let mut resolver = LookupResolver::new(table, &fetcher, NoPacer);
        match resolver.resolve(&Entity::new("Broken U"), &spec()) {
            Resolution::Pages(pages) => {
                assert_eq!(pages.len(), 1);
                assert!(matches!(pages[0], Err(FetchError::Status { code: 500, .. })));
            }
            other => panic!("unexpected resolution: {:?}", other),
        }
    }
}
