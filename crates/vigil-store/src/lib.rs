//! Vigil Store: persistence contract for reports, history and profiles
//!
//! The engine talks to storage only through [`ReportStore`]. The bundled
//! [`MemoryStore`] keeps everything in process and is what the API binary and
//! the test suites run against.

pub mod memory;
pub mod query;
pub mod store;

pub use memory::MemoryStore;
pub use query::{
    CandidateQuery, Page, Pagination, ReportFilter, ReportStats, DEFAULT_PAGE_LIMIT,
    MAX_PAGE_LIMIT,
};
pub use store::{ReportStore, StoreError, StoreResult, TransitionCommit};
