//! Record Aggregator
//!
//! Drives resolve -> flatten -> match for every category of every entity and
//! assembles the report. Failures never escape a cell: a missing URL, failed
//! fetches, failed searches and empty matches all become the category's
//! placeholder text.

use crate::filter::find_key_sentences;
use crate::flatten::flatten_pages;
use crate::scrapers::{Resolution, SourceResolver};
use crate::types::{CategorySet, CategorySpec, CategoryValue, Entity, Record, Report, ValueStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Shared stop flag, checked between entities
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Cancel; true if the token had already been cancelled
    pub fn cancel_again(&self) -> bool {
        self.flag.swap(true, Ordering::SeqCst)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("run cancelled after {completed} of {total} entities")]
pub struct Cancelled {
    pub completed: usize,
    pub total: usize,
}

/// Front-end hook for progress display
pub trait Progress {
    fn entity_started(&self, _index: usize, _total: usize, _entity: &Entity) {}
    fn entity_finished(&self, _index: usize, _total: usize, _record: &Record) {}
}

pub struct NoProgress;

impl Progress for NoProgress {}

/// Build one category cell from whatever the resolver produced
pub fn category_value(spec: &CategorySpec, resolution: Resolution) -> CategoryValue {
    let placeholder = |status| CategoryValue {
        category: spec.name.clone(),
        text: spec.placeholder.clone(),
        status,
    };

    let pages = match resolution {
        Resolution::Missing => return placeholder(ValueStatus::LookupMiss),
        Resolution::Pages(pages) => pages,
    };

    let bodies: Vec<String> = pages.into_iter().filter_map(Result::ok).collect();
    if bodies.is_empty() {
        return placeholder(ValueStatus::SourceUnavailable);
    }

    let found = find_key_sentences(&flatten_pages(&bodies), spec);
    if found.is_empty() {
        return placeholder(ValueStatus::NoMatch);
    }

    CategoryValue {
        category: spec.name.clone(),
        text: found.join("\n"),
        status: ValueStatus::Matched(found.len()),
    }
}

/// One record for one entity, categories in set order
pub fn build_record<R>(entity: &Entity, categories: &CategorySet, resolver: &mut R) -> Record
where
    R: SourceResolver + ?Sized,
{
    let mut values = Vec::with_capacity(categories.len());

    for spec in categories {
        let value = category_value(spec, resolver.resolve(entity, spec));
        match value.status {
            ValueStatus::Matched(n) => debug!(entity = %entity, category = %spec.name, lines = n, "matched"),
            status => warn!(entity = %entity, category = %spec.name, ?status, "using placeholder"),
        }
        values.push(value);
    }

    Record {
        entity: entity.clone(),
        values,
    }
}

/// Sequential run over all entities
pub struct Researcher<'a, R> {
    categories: &'a CategorySet,
    resolver: R,
    entity_column: String,
    cancel: CancelToken,
}

impl<'a, R: SourceResolver> Researcher<'a, R> {
    pub fn new(categories: &'a CategorySet, resolver: R) -> Self {
        Self {
            categories,
            resolver,
            entity_column: "Entity".to_string(),
            cancel: CancelToken::new(),
        }
    }

    pub fn entity_column(mut self, name: impl Into<String>) -> Self {
        self.entity_column = name.into();
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Full report, or `Cancelled` if the token fired before the last entity
    pub fn run(&mut self, entities: &[Entity], progress: &dyn Progress) -> Result<Report, Cancelled> {
        let total = entities.len();
        let mut report = Report::new(self.entity_column.clone(), self.categories);

        for (index, entity) in entities.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!(completed = index, total, "cancelled");
                return Err(Cancelled { completed: index, total });
            }

            info!("Processing {}", entity);
            progress.entity_started(index, total, entity);

            let record = build_record(entity, self.categories, &mut self.resolver);
            info!(
                entity = %entity,
                matched = record.matched_categories(),
                categories = self.categories.len(),
                "record complete"
            );
            progress.entity_finished(index, total, &record);
            report.records.push(record);
        }

        Ok(report)
    }
}
