//! # covenant-conditional: Conditional Request Preconditions
//!
//! Evaluates the RFC 7232 precondition headers (`If-Match`,
//! `If-None-Match`, `If-Modified-Since`, `If-Unmodified-Since`) against a
//! resource's current entity tag and modification time.
//!
//! Evaluation is a pure function of [`PreconditionParams`] and
//! [`ResourceState`]. Looking up the resource state is the caller's job.
//!
//! ## Outcomes
//!
//! | Request | Checks failed | [`Outcome`]           | Status |
//! |---------|---------------|-----------------------|--------|
//! | any     | none          | `Proceed`             | -      |
//! | write   | some          | `Blocked(errors)`     | 412    |
//! | read    | some          | `Blocked(vec![])`     | 304    |
//!
//! Writes carry one [`ErrorDetail`](covenant_core::ErrorDetail) per failed
//! header, located at `request.headers.<Header>`.

pub mod evaluate;
pub mod params;

pub use evaluate::{evaluate, Outcome, NOT_MODIFIED, PRECONDITION_FAILED};
pub use params::{normalize_etag, parse_etag_list, HeaderError, PreconditionParams, ResourceState};
