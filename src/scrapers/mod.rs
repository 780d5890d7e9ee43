//! Source resolution
//!
//! A resolver turns (entity, category) into fetched page texts:
//! - `university`: official page per university from a URL table
//! - `search`: one web search per category, top results fetched

pub mod search;
pub mod university;

use crate::config::{FetchSettings, ResearchPlan, SearchSettings, SourceMode};
use crate::fetcher::{FetchError, PageFetcher};
use crate::pacer::Pacer;
use crate::search::SearchProvider;
use crate::types::{CategorySpec, Entity};

/// Raw page bodies for one category of one entity
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// One entry per page, in fetch order; may be empty
    Pages(Vec<Result<String, FetchError>>),
    /// No URL is configured for the entity
    Missing,
}

pub trait SourceResolver {
    fn resolve(&mut self, entity: &Entity, category: &CategorySpec) -> Resolution;
}

impl<R: SourceResolver + ?Sized> SourceResolver for Box<R> {
    fn resolve(&mut self, entity: &Entity, category: &CategorySpec) -> Resolution {
        (**self).resolve(entity, category)
    }
}

/// Pick the resolver matching the plan's source mode
pub fn resolver_for<'a, S, F, P>(
    plan: &ResearchPlan,
    search: S,
    fetcher: F,
    pacer: P,
    fetch: &FetchSettings,
    settings: &SearchSettings,
) -> Box<dyn SourceResolver + 'a>
where
    S: SearchProvider + 'a,
    F: PageFetcher + 'a,
    P: Pacer + 'a,
{
    match plan.mode {
        SourceMode::Search => Box::new(
            search::SearchResolver::new(search, fetcher, pacer, plan.degree.clone())
                .results_per_query(settings.results_per_query)
                .delay(fetch.delay()),
        ),
        SourceMode::Lookup => Box::new(
            university::LookupResolver::new(plan.urls.clone(), fetcher, pacer).delay(fetch.delay()),
        ),
    }
}
