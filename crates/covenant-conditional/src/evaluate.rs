//! Precondition evaluation (RFC 7232).

use chrono::{DateTime, Utc};
use covenant_core::{http_date, ErrorDetail, ErrorModel, Location};
use serde_json::Value;

use crate::params::{
    normalize_etag, PreconditionParams, ResourceState, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    IF_UNMODIFIED_SINCE,
};

/// HTTP status for a failed write precondition.
pub const PRECONDITION_FAILED: u16 = 412;
/// HTTP status for a failed read precondition.
pub const NOT_MODIFIED: u16 = 304;

/// Result of evaluating preconditions.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Every precondition holds.
    Proceed,
    /// At least one precondition failed. Writes carry one error per failed
    /// check; reads carry none.
    Blocked(Vec<ErrorDetail>),
}

impl Outcome {
    /// Whether the request may proceed.
    pub fn is_proceed(&self) -> bool {
        matches!(self, Outcome::Proceed)
    }

    /// The transport status: `None` to proceed, `412` for a failed write,
    /// `304` for a failed read.
    pub fn status(&self) -> Option<u16> {
        match self {
            Outcome::Proceed => None,
            Outcome::Blocked(errors) if errors.is_empty() => Some(NOT_MODIFIED),
            Outcome::Blocked(_) => Some(PRECONDITION_FAILED),
        }
    }

    /// The problem body for a failed write. Proceeding requests and
    /// not-modified reads have no body.
    pub fn into_problem(self) -> Option<ErrorModel> {
        match self {
            Outcome::Blocked(errors) if !errors.is_empty() => Some(ErrorModel::precondition_failed(errors)),
            _ => None,
        }
    }
}

/// Evaluate every precondition in `params` against `resource`.
///
/// The four checks run independently so a write reports every violated
/// header at once. A resource without a modification time is treated as
/// never modified.
pub fn evaluate(params: &PreconditionParams, resource: &ResourceState) -> Outcome {
    let current = resource.etag.as_deref().map(normalize_etag);
    let found = describe(resource);
    let headers = Location::new("request.headers");
    let mut errors = Vec::new();
    let mut failed = false;

    let none_match = params.if_none_match.iter().find(|tag| {
        let tag = normalize_etag(tag);
        Some(tag) == current || (tag == "*" && resource.exists())
    });
    if let Some(tag) = none_match {
        failed = true;
        errors.push(
            headers
                .field(IF_NONE_MATCH)
                .error(format!("{IF_NONE_MATCH}: {tag} precondition failed, {found}"))
                .with_value(tag.as_str()),
        );
    }

    if !params.if_match.is_empty()
        && !params
            .if_match
            .iter()
            .any(|tag| Some(normalize_etag(tag)) == current)
    {
        failed = true;
        errors.push(
            headers
                .field(IF_MATCH)
                .error(format!("{IF_MATCH} precondition failed, {found}"))
                .with_value(params.if_match.clone()),
        );
    }

    if let Some(since) = params.if_modified_since {
        if !modified_after(resource.last_modified, since) {
            failed = true;
            errors.push(date_error(&headers, IF_MODIFIED_SINCE, since, resource));
        }
    }

    if let Some(since) = params.if_unmodified_since {
        if modified_after(resource.last_modified, since) {
            failed = true;
            errors.push(date_error(&headers, IF_UNMODIFIED_SINCE, since, resource));
        }
    }

    if !failed {
        return Outcome::Proceed;
    }
    if !params.is_write {
        errors.clear();
    }
    tracing::debug!(
        write = params.is_write,
        failed_checks = errors.len(),
        "request blocked by preconditions"
    );
    Outcome::Blocked(errors)
}

fn modified_after(modified: Option<DateTime<Utc>>, since: DateTime<Utc>) -> bool {
    modified.is_some_and(|m| m > since)
}

/// The resource's current tag or time, for entity-tag failure messages.
fn describe(resource: &ResourceState) -> String {
    match (&resource.etag, resource.last_modified) {
        (Some(etag), _) => format!("found resource with ETag {}", normalize_etag(etag)),
        (None, Some(modified)) => {
            format!("found resource modified at {}", http_date::format(&modified))
        }
        (None, None) => "found no existing resource".to_string(),
    }
}

fn date_error(
    headers: &Location,
    header: &str,
    since: DateTime<Utc>,
    resource: &ResourceState,
) -> ErrorDetail {
    let since = http_date::format(&since);
    let actual = match resource.last_modified {
        Some(m) => format!("resource was modified at {}", http_date::format(&m)),
        None if resource.exists() => "resource has no modification time".to_string(),
        None => "found no existing resource".to_string(),
    };
    headers
        .field(header)
        .error(format!("{header}: {since} precondition failed, {actual}"))
        .with_value(Value::String(since))
}
