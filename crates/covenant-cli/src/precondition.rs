//! # Precondition Subcommand
//!
//! `covenant precondition --method PUT --if-match '"abc"' --etag '"def"'`

use chrono::{DateTime, Utc};
use clap::Args;
use covenant_conditional::{evaluate, Outcome, PreconditionParams, ResourceState};
use covenant_core::{http_date, CovenantError, ErrorModel};
use serde::Serialize;

/// Arguments for the precondition subcommand.
#[derive(Args, Debug)]
pub struct PreconditionArgs {
    /// HTTP method of the request.
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// `If-Match` header value. Repeatable.
    #[arg(long)]
    pub if_match: Vec<String>,

    /// `If-None-Match` header value. Repeatable.
    #[arg(long)]
    pub if_none_match: Vec<String>,

    /// `If-Modified-Since` header value (HTTP date).
    #[arg(long)]
    pub if_modified_since: Option<String>,

    /// `If-Unmodified-Since` header value (HTTP date).
    #[arg(long)]
    pub if_unmodified_since: Option<String>,

    /// Current ETag of the resource.
    #[arg(long)]
    pub etag: Option<String>,

    /// Last modification time of the resource (RFC 3339 or HTTP date).
    #[arg(long)]
    pub last_modified: Option<String>,
}

/// Printed result of a precondition evaluation.
#[derive(Debug, Serialize)]
pub struct Report {
    /// `proceed` or `blocked`.
    pub outcome: &'static str,
    /// Transport status for a blocked request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Problem body for a blocked write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<ErrorModel>,
}

impl From<Outcome> for Report {
    fn from(outcome: Outcome) -> Self {
        let label = if outcome.is_proceed() { "proceed" } else { "blocked" };
        Self {
            outcome: label,
            status: outcome.status(),
            problem: outcome.into_problem(),
        }
    }
}

/// Evaluate the preconditions described by `args`.
pub fn run(args: &PreconditionArgs) -> Result<Report, CovenantError> {
    let mut params = PreconditionParams::for_method(&args.method);
    let headers = args
        .if_match
        .iter()
        .map(|v| ("If-Match", v.as_str()))
        .chain(args.if_none_match.iter().map(|v| ("If-None-Match", v.as_str())))
        .chain(args.if_modified_since.iter().map(|v| ("If-Modified-Since", v.as_str())))
        .chain(args.if_unmodified_since.iter().map(|v| ("If-Unmodified-Since", v.as_str())));
    for (name, value) in headers {
        params.apply_header(name, value).map_err(|e| CovenantError::Parse {
            source_name: name.to_string(),
            reason: e.to_string(),
        })?;
    }

    let resource = ResourceState {
        etag: args.etag.clone(),
        last_modified: args.last_modified.as_deref().map(parse_time).transpose()?,
    };

    let outcome = evaluate(&params, &resource);
    tracing::info!(method = %args.method, proceed = outcome.is_proceed(), "preconditions evaluated");
    Ok(outcome.into())
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, CovenantError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| http_date::parse(raw))
        .ok_or_else(|| CovenantError::Parse {
            source_name: "--last-modified".to_string(),
            reason: format!("'{raw}' is neither an RFC 3339 timestamp nor an HTTP date"),
        })
}
