//! # schoolfinder Core
//!
//! Core library for the schoolfinder school directory.
//!
//! - [`SchoolRecord`] - a school profile as read from storage
//! - [`SearchCriteria`] - optional-field query over schools
//! - [`SchoolMatcher`] - filters and ranks candidates from a [`CandidateSource`]
//! - [`with_retry`] - retries transient storage faults with linear backoff
//! - [`QueryFilters`] - criteria extracted from a free-text chat message
//!
//! ## Example
//!
//! ```rust
//! use schoolfinder_core::{rank, SchoolRecord, SearchCriteria};
//!
//! let mut orbit = SchoolRecord::new(1, "Orbit School");
//! orbit.city = Some("Delhi".to_string());
//! orbit.fees_min = Some(50_000);
//! orbit.has_library = Some(true);
//! orbit.rating = Some(4.4);
//!
//! let criteria = SearchCriteria::new()
//!     .city("Delhi")
//!     .fees_max(70_000)
//!     .facility("library");
//!
//! let ranked = rank(&criteria, vec![orbit]);
//! assert_eq!(ranked.len(), 1);
//! ```

pub mod error;
pub mod school;
pub mod criteria;
pub mod facility;
pub mod filter;
pub mod source;
pub mod matcher;
pub mod retry;
pub mod query;
pub mod review;

pub use error::{Error, Result};
pub use school::{SchoolId, SchoolRecord, SchoolSummary, TextList};
pub use criteria::SearchCriteria;
pub use facility::Facility;
pub use filter::{CriteriaFilter, Filter, FilterCondition};
pub use source::{CandidateFilters, CandidateSource};
pub use matcher::{rank, BoardCount, CityCount, MatchLimits, SchoolMatcher};
pub use retry::{is_transient, with_retry, FaultInfo, RetryPolicy};
pub use query::QueryFilters;
pub use review::{ApprovalStatus, Review, ReviewStats};
