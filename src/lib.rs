//! Admissions research library
//!
//! Fetches university pages, keeps the lines that mention each category's
//! keywords and assembles one record per university into a CSV report.

pub mod aggregator;
pub mod config;
pub mod fetcher;
pub mod filter;
pub mod flatten;
pub mod pacer;
pub mod scrapers;
pub mod search;
pub mod storage;
pub mod types;

pub use types::*;
