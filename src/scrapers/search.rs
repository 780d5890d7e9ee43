use super::{Resolution, SourceResolver};
use crate::fetcher::PageFetcher;
use crate::pacer::Pacer;
use crate::search::SearchProvider;
use crate::types::{CategorySpec, Entity};
use std::time::Duration;
use tracing::{info, warn};

/// Used when a category carries no query template of its own
const FALLBACK_QUERY: &str = "{university} {degree} {category}";

/// Fill `{university}`, `{degree}`, `{course}` and `{category}` in a query template
pub fn render_query(template: &str, entity: &Entity, degree: &str, category: &str) -> String {
    let rendered = template
        .replace("{university}", &entity.university)
        .replace("{degree}", degree)
        .replace("{course}", entity.course.as_deref().unwrap_or_default())
        .replace("{category}", category);

    rendered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One search per category; each result URL fetched in turn
pub struct SearchResolver<S, F, P> {
    search: S,
    fetcher: F,
    pacer: P,
    degree: String,
    results_per_query: usize,
    delay: Duration,
    fetched: usize,
}

impl<S: SearchProvider, F: PageFetcher, P: Pacer> SearchResolver<S, F, P> {
    pub fn new(search: S, fetcher: F, pacer: P, degree: impl Into<String>) -> Self {
        Self {
            search,
            fetcher,
            pacer,
            degree: degree.into(),
            results_per_query: 5,
            delay: Duration::ZERO,
            fetched: 0,
        }
    }

    pub fn results_per_query(mut self, n: usize) -> Self {
        self.results_per_query = n;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl<S: SearchProvider, F: PageFetcher, P: Pacer> SourceResolver for SearchResolver<S, F, P> {
    fn resolve(&mut self, entity: &Entity, category: &CategorySpec) -> Resolution {
        let template = category.query.as_deref().unwrap_or(FALLBACK_QUERY);
        let query = render_query(template, entity, &self.degree, &category.name);
        info!(provider = self.search.name(), "Searching: {}", query);

        let urls = match self.search.search(&query, self.results_per_query) {
            Ok(urls) => urls,
            Err(e) => {
                warn!(query = %query, "search failed, no pages for this category: {}", e);
                return Resolution::Pages(vec![]);
            }
        };

        let mut pages = Vec::with_capacity(urls.len());
        for url in urls.iter().take(self.results_per_query) {
            if self.fetched > 0 {
                self.pacer.pause(self.delay);
            }
            self.fetched += 1;

            let body = self.fetcher.fetch(url);
            if let Err(e) = &body {
                warn!(url = %url, kind = e.kind(), "fetch failed: {}", e);
            }
            pages.push(body);
        }

        Resolution::Pages(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchError;
    use crate::pacer::RecordingPacer;
    use crate::search::SearchError;
    use std::cell::RefCell;

    struct FixedSearch {
        urls: Vec<String>,
        queries: RefCell<Vec<(String, usize)>>,
    }

    impl SearchProvider for FixedSearch {
        fn search(&self, query: &str, num_results: usize) -> Result<Vec<String>, SearchError> {
            self.queries.borrow_mut().push((query.to_string(), num_results));
            Ok(self.urls.iter().take(num_results).cloned().collect())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct FailingSearch;

    impl SearchProvider for FailingSearch {
        fn search(&self, _query: &str, _num_results: usize) -> Result<Vec<String>, SearchError> {
            Err(SearchError::Status(503))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct EchoFetcher;

    impl PageFetcher for EchoFetcher {
        fn fetch(&self, url: &str) -> Result<String, FetchError> {
            if url.ends_with("/down") {
                return Err(FetchError::Timeout { url: url.to_string() });
            }
            Ok(format!("body of {}", url))
        }
    }

    fn fixed(urls: &[&str]) -> FixedSearch {
        FixedSearch {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            queries: RefCell::new(vec![]),
        }
    }

    #[test]
    fn test_render_query() {
        let entity = Entity::new("Stanford University");
        assert_eq!(
            render_query("{university} {degree} prerequisites", &entity, "Computer Science BSc", "Prerequisites"),
            "Stanford University Computer Science BSc prerequisites"
        );
        assert_eq!(
            render_query("{university} {course} {category}", &entity, "", "Careers"),
            "Stanford University Careers"
        );
    }

    #[test]
    fn test_results_fetched_in_order_with_delay_between() {
        let search = fixed(&["https://a.edu/1", "https://a.edu/down", "https://a.edu/3"]);
        let pacer = RecordingPacer::new();
        let mut resolver = SearchResolver::new(&search, EchoFetcher, &pacer, "History BA")
            .results_per_query(5)
            .delay(Duration::from_secs(1));

        let spec = CategorySpec::new("Careers", &["career"], 0, 10)
            .with_query("{university} {degree} career outcomes");
        let resolution = resolver.resolve(&Entity::new("Harvard University"), &spec);

        let Resolution::Pages(pages) = resolution else {
            panic!("expected pages");
        };
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].as_deref(), Ok("body of https://a.edu/1"));
        assert!(pages[1].is_err());
        assert_eq!(pages[2].as_deref(), Ok("body of https://a.edu/3"));

        assert_eq!(pacer.pauses(), vec![Duration::from_secs(1); 2]);
        assert_eq!(
            search.queries.borrow()[0],
            ("Harvard University History BA career outcomes".to_string(), 5)
        );
    }

    #[test]
    fn test_result_limit_passed_to_provider() {
        let search = fixed(&["https://a.edu/1", "https://a.edu/2", "https://a.edu/3"]);
        let mut resolver = SearchResolver::new(&search, EchoFetcher, RecordingPacer::new(), "Law")
            .results_per_query(2);

        let spec = CategorySpec::new("Prerequisites", &["requirement"], 0, 10);
        let Resolution::Pages(pages) = resolver.resolve(&Entity::new("Yale"), &spec) else {
            panic!("expected pages");
        };
        assert_eq!(pages.len(), 2);
        assert_eq!(search.queries.borrow()[0].0, "Yale Law Prerequisites");
    }

    #[test]
    fn test_search_failure_degrades_to_no_pages() {
        let mut resolver = SearchResolver::new(FailingSearch, EchoFetcher, RecordingPacer::new(), "Law");
        let spec = CategorySpec::new("Prerequisites", &["requirement"], 0, 10);
        assert_eq!(
            resolver.resolve(&Entity::new("Yale"), &spec),
            Resolution::Pages(vec![])
        );
    }
}
