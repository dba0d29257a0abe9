//! # schoolfinder
//!
//! A school directory service: criteria search over school profiles, ranked
//! by rating, with comparison, city and board listings and chat-style
//! free-text queries.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! schoolfinder --data-file ./data/schools.json --http-port 8080
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use schoolfinder::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<()> {
//! let store = Arc::new(SchoolStore::open("./data/schools.json")?);
//! let matcher = SchoolMatcher::new(store).with_retry(RetryPolicy::default());
//!
//! let criteria = SearchCriteria::new()
//!     .city("Delhi")
//!     .fees_max(70_000)
//!     .facility("library");
//! let schools = matcher.search(&criteria).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - `schoolfinder-core` - records, criteria, matching, retry, query extraction
//! - `schoolfinder-storage` - in-memory store with JSON snapshots
//! - `schoolfinder-api` - REST API

// Re-export core types
pub use schoolfinder_core::{
    rank, with_retry,
    SchoolId, SchoolRecord, SchoolSummary,
    SearchCriteria, Facility, QueryFilters,
    SchoolMatcher, MatchLimits, CandidateSource, CandidateFilters,
    RetryPolicy, FaultInfo,
    Review, ReviewStats,
    Error, Result,
};

// Re-export storage
pub use schoolfinder_storage::{SchoolStore, SnapshotFile};

// Re-export API
pub use schoolfinder_api::{AppState, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        rank, with_retry,
        SchoolId, SchoolRecord, SchoolSummary,
        SearchCriteria, Facility, QueryFilters,
        SchoolMatcher, MatchLimits, CandidateSource, CandidateFilters,
        RetryPolicy,
        Error, Result,
        SchoolStore,
        RestApi, AppState,
    };
}
