//! Record store for Ordbok: three CSV-backed tables with dedup inserts,
//! index-addressed bulk mutation, and flush-on-mutation persistence.

pub mod search;
pub mod store;
mod table;

pub use store::{AddOutcome, BatchOutcome, RecordStore, SubmitOutcome, TablePaths};
