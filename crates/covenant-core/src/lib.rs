//! # covenant-core: Foundational Types for Covenant
//!
//! This crate defines the types every other Covenant crate reports through.
//! It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Errors are data.** Validation and precondition failures are
//!    collected as [`ErrorDetail`] values, never raised as `Err`. Only
//!    build-time misconfiguration and I/O use the [`CovenantError`] path.
//!
//! 2. **Locations are a compatibility contract.** [`Location`] renders the
//!    dotted/bracketed pointer syntax (`request.body.items[2].name`) that
//!    client tooling parses. All paths flow through it.
//!
//! 3. **One problem body.** [`ErrorModel`] is the single serialized shape
//!    for 4xx responses carrying error details.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `covenant-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod detail;
pub mod error;
pub mod http_date;
pub mod problem;

// Re-export primary types for ergonomic imports.
pub use detail::{ErrorDetail, Location};
pub use error::{ConfigurationError, CovenantError};
pub use problem::ErrorModel;
