//! Data ingestion and output
//!
//! Scrapers for match-log pages, the raw table they produce, and the CSV
//! snapshot written at the end of a run.

pub mod export;
pub mod raw;
pub mod scrapers;

pub use export::write_fixtures_csv;
pub use raw::RawTable;
