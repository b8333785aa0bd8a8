//! Parsed precondition headers and the resource state they are checked
//! against.

use chrono::{DateTime, Utc};
use covenant_core::http_date;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `If-Match`.
pub const IF_MATCH: &str = "If-Match";
/// `If-None-Match`.
pub const IF_NONE_MATCH: &str = "If-None-Match";
/// `If-Modified-Since`.
pub const IF_MODIFIED_SINCE: &str = "If-Modified-Since";
/// `If-Unmodified-Since`.
pub const IF_UNMODIFIED_SINCE: &str = "If-Unmodified-Since";

/// A precondition header value that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// The value of a date header is not an IMF-fixdate.
    #[error("{header}: '{value}' is not a valid HTTP date")]
    InvalidDate {
        /// Header name.
        header: String,
        /// Raw value.
        value: String,
    },
}

/// Conditional-request headers of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreconditionParams {
    /// Succeeds if the resource matches one of these tags.
    #[serde(default)]
    pub if_match: Vec<String>,
    /// Succeeds if the resource matches none of these tags. `*` matches any
    /// existing resource.
    #[serde(default)]
    pub if_none_match: Vec<String>,
    /// Succeeds if the resource was modified strictly after this time.
    #[serde(default)]
    pub if_modified_since: Option<DateTime<Utc>>,
    /// Succeeds if the resource was not modified after this time.
    #[serde(default)]
    pub if_unmodified_since: Option<DateTime<Utc>>,
    /// Failed writes report errors; failed reads only short-circuit.
    #[serde(default)]
    pub is_write: bool,
}

impl PreconditionParams {
    /// Empty parameters for a request with the given HTTP method.
    /// `POST`, `PUT`, `PATCH` and `DELETE` are writes.
    pub fn for_method(method: &str) -> Self {
        let is_write = ["POST", "PUT", "PATCH", "DELETE"]
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method.trim()));
        Self {
            is_write,
            ..Self::default()
        }
    }

    /// Record one raw header. Header names match case-insensitively; other
    /// headers are ignored. List headers accumulate across repeated lines.
    pub fn apply_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        let name = name.trim();
        if name.eq_ignore_ascii_case(IF_MATCH) {
            self.if_match.extend(parse_etag_list(value));
        } else if name.eq_ignore_ascii_case(IF_NONE_MATCH) {
            self.if_none_match.extend(parse_etag_list(value));
        } else if name.eq_ignore_ascii_case(IF_MODIFIED_SINCE) {
            self.if_modified_since = Some(parse_date(IF_MODIFIED_SINCE, value)?);
        } else if name.eq_ignore_ascii_case(IF_UNMODIFIED_SINCE) {
            self.if_unmodified_since = Some(parse_date(IF_UNMODIFIED_SINCE, value)?);
        }
        Ok(())
    }

    /// Builder form of [`apply_header`](Self::apply_header).
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, HeaderError> {
        self.apply_header(name, value)?;
        Ok(self)
    }

    /// Whether any conditional header is set.
    pub fn has_conditional_params(&self) -> bool {
        !self.if_match.is_empty()
            || !self.if_none_match.is_empty()
            || self.if_modified_since.is_some()
            || self.if_unmodified_since.is_some()
    }
}

/// The current identity of a resource, supplied by the caller.
///
/// A resource "exists" when either field is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceState {
    /// Current entity tag, quoted or bare.
    #[serde(default)]
    pub etag: Option<String>,
    /// Last modification time.
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

impl ResourceState {
    /// Whether the resource currently exists.
    pub fn exists(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }
}

/// Strip a leading weak indicator (`W/`) and surrounding quotes.
///
/// `W/"abc"`, `"abc"` and `abc` all normalize to `abc`.
pub fn normalize_etag(tag: &str) -> &str {
    let tag = tag.trim();
    let tag = match tag.strip_prefix("W/") {
        Some(rest) if !rest.is_empty() => rest,
        _ => tag,
    };
    tag.trim_matches('"')
}

/// Split a comma-separated entity-tag list header value. Commas inside
/// quoted tags do not split.
pub fn parse_etag_list(value: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in value.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            ',' if !quoted => {
                push_trimmed(&mut tags, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_trimmed(&mut tags, &current);
    tags
}

fn push_trimmed(tags: &mut Vec<String>, raw: &str) {
    let tag = raw.trim();
    if !tag.is_empty() {
        tags.push(tag.to_string());
    }
}

fn parse_date(header: &str, value: &str) -> Result<DateTime<Utc>, HeaderError> {
    http_date::parse(value).ok_or_else(|| HeaderError::InvalidDate {
        header: header.to_string(),
        value: value.to_string(),
    })
}
