//! # covenant-cli: Covenant Command-Line Interface
//!
//! ## Subcommands
//!
//! - `validate`: Validate a JSON or YAML document against a JSON Schema
//! - `precondition`: Evaluate conditional-request headers against a
//!   resource's ETag and modification time
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handler functions delegate to domain crates; no validation logic here.
//! - Results are printed as JSON on stdout; logs go to stderr.

pub mod document;
pub mod precondition;
pub mod validate;
