//! # String Formats
//!
//! A [`FormatRegistry`] maps `format` names to checker functions. The
//! validator consults it for every string validated against a node with a
//! `format`. Names with no registered checker are accepted, so schemas may
//! carry formats this process does not understand.
//!
//! ## Built-in Formats
//!
//! | Name | Accepts |
//! |------|---------|
//! | `date-time` | RFC 3339 `date-time` |
//! | `date-time-http` | IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`) |
//! | `date` | RFC 3339 `full-date` |
//! | `time` | RFC 3339 `full-time` or `partial-time` |
//! | `email`, `idn-email` | `local@domain` addresses (ASCII / Unicode) |
//! | `hostname` | RFC 1123 host names |
//! | `ipv4`, `ipv6` | IP addresses |
//! | `uri`, `iri` | absolute URIs |
//! | `uri-reference`, `iri-reference` | absolute or relative references |
//! | `uri-template` | RFC 6570 templates |
//! | `json-pointer`, `relative-json-pointer` | RFC 6901 pointers |
//! | `regex` | syntactically valid patterns |
//! | `uuid` | RFC 4122 UUIDs |

use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;

/// A format checker.
pub type Checker = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Result of checking a value against a named format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCheck {
    /// A checker exists and accepted the value.
    Valid,
    /// A checker exists and rejected the value.
    Invalid,
    /// No checker is registered under the name.
    Unknown,
}

/// Named string-format checkers.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    checkers: HashMap<String, Checker>,
}

static BUILTIN: Lazy<FormatRegistry> = Lazy::new(FormatRegistry::with_builtins);

impl FormatRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in format.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("date-time", is_date_time);
        registry.register("date-time-http", is_http_date);
        registry.register("date", is_date);
        registry.register("time", is_time);
        registry.register("email", is_email);
        registry.register("idn-email", is_idn_email);
        registry.register("hostname", is_hostname);
        registry.register("ipv4", |s| s.parse::<Ipv4Addr>().is_ok());
        registry.register("ipv6", |s| s.parse::<Ipv6Addr>().is_ok());
        registry.register("uri", is_uri);
        registry.register("iri", is_uri);
        registry.register("uri-reference", is_uri_reference);
        registry.register("iri-reference", is_uri_reference);
        registry.register("uri-template", is_uri_template);
        registry.register("json-pointer", is_json_pointer);
        registry.register("relative-json-pointer", is_relative_json_pointer);
        registry.register("regex", |s| regex::Regex::new(s).is_ok());
        registry.register("uuid", |s| uuid::Uuid::parse_str(s).is_ok());
        registry
    }

    /// The shared built-in registry.
    pub fn builtin() -> &'static FormatRegistry {
        &BUILTIN
    }

    /// Register (or replace) a checker.
    pub fn register<F>(&mut self, name: impl Into<String>, checker: F)
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.checkers.insert(name.into(), Arc::new(checker));
    }

    /// Check `value` against the format `name`.
    pub fn check(&self, name: &str, value: &str) -> FormatCheck {
        match self.checkers.get(name) {
            Some(checker) if checker(value) => FormatCheck::Valid,
            Some(_) => FormatCheck::Invalid,
            None => FormatCheck::Unknown,
        }
    }

    /// Whether a checker is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.checkers.contains_key(name)
    }

    /// Registered names, sorted alphabetically.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.checkers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.names())
            .finish()
    }
}

fn is_date_time(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
}

fn is_http_date(s: &str) -> bool {
    covenant_core::http_date::parse(s).is_some()
}

fn is_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
        && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_time(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() < 8
        || b[2] != b':'
        || b[5] != b':'
        || ![0, 1, 3, 4, 6, 7].iter().all(|&i| b[i].is_ascii_digit())
    {
        return false;
    }
    let rest = &s[8..];
    let (fraction, offset) = match rest.find(|c: char| c != '.' && !c.is_ascii_digit()) {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    let bad_fraction =
        fraction.len() < 2 || !fraction.starts_with('.') || fraction[1..].contains('.');
    if !fraction.is_empty() && bad_fraction {
        return false;
    }
    if offset.is_empty() {
        return NaiveTime::parse_from_str(s, "%H:%M:%S%.f").is_ok();
    }
    DateTime::parse_from_rfc3339(&format!("1970-01-01T{s}")).is_ok()
}

fn is_dot_atom(local: &str, allow: impl Fn(char) -> bool) -> bool {
    !local.is_empty()
        && local.split('.').all(|atom| !atom.is_empty() && atom.chars().all(&allow))
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.rsplit_once('@') else {
        return false;
    };
    is_dot_atom(local, |c| {
        c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~-".contains(c)
    }) && is_hostname(domain)
}

fn is_idn_email(s: &str) -> bool {
    let Some((local, domain)) = s.rsplit_once('@') else {
        return false;
    };
    let printable = |c: char| !c.is_whitespace() && !c.is_control() && c != '@';
    is_dot_atom(local, printable) && is_dot_atom(domain, |c| printable(c) && c != '_')
}

fn is_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }
    s.split('.').all(|label| {
        let b = label.as_bytes();
        !b.is_empty()
            && b.len() <= 63
            && b[0] != b'-'
            && b[b.len() - 1] != b'-'
            && b.iter().all(|c| c.is_ascii_alphanumeric() || *c == b'-')
    })
}

fn has_illegal_uri_chars(s: &str) -> bool {
    s.chars().any(|c| c.is_whitespace() || c.is_control() || "<>\"\\^`{|}".contains(c))
}

fn is_uri(s: &str) -> bool {
    !has_illegal_uri_chars(s) && url::Url::parse(s).is_ok()
}

fn is_uri_reference(s: &str) -> bool {
    if has_illegal_uri_chars(s) {
        return false;
    }
    match url::Url::parse(s) {
        Ok(_) => true,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            url::Url::parse("http://reference.invalid/")
                .and_then(|base| base.join(s))
                .is_ok()
        }
        Err(_) => false,
    }
}

fn is_uri_template(s: &str) -> bool {
    let mut rest = s;
    loop {
        let Some(open) = rest.find(['{', '}']) else {
            return !has_illegal_uri_chars(rest);
        };
        if rest.as_bytes()[open] == b'}' || has_illegal_uri_chars(&rest[..open]) {
            return false;
        }
        let after = &rest[open + 1..];
        let Some(close) = after.find(['{', '}']) else {
            return false;
        };
        if after.as_bytes()[close] == b'{' || !is_template_expression(&after[..close]) {
            return false;
        }
        rest = &after[close + 1..];
    }
}

fn is_template_expression(expr: &str) -> bool {
    let body = expr
        .strip_prefix(['+', '#', '.', '/', ';', '?', '&', '=', ',', '!', '@', '|'])
        .unwrap_or(expr);
    !body.is_empty() && body.split(',').all(is_template_varspec)
}

fn is_template_varspec(spec: &str) -> bool {
    let name = if let Some(name) = spec.strip_suffix('*') {
        name
    } else if let Some((name, len)) = spec.split_once(':') {
        let valid_len = !len.is_empty()
            && len.len() <= 4
            && !len.starts_with('0')
            && len.bytes().all(|c| c.is_ascii_digit());
        if !valid_len {
            return false;
        }
        name
    } else {
        spec
    };
    !name.is_empty()
        && !name.starts_with('.')
        && !name.ends_with('.')
        && !name.contains("..")
        && is_template_varname(name)
}

fn is_template_varname(name: &str) -> bool {
    let b = name.as_bytes();
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'%' => {
                if !(b.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                    && b.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
                {
                    return false;
                }
                i += 3;
            }
            c if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' => i += 1,
            _ => return false,
        }
    }
    true
}

fn is_json_pointer(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    if !s.starts_with('/') {
        return false;
    }
    let b = s.as_bytes();
    b.iter()
        .enumerate()
        .all(|(i, &c)| c != b'~' || matches!(b.get(i + 1), Some(b'0') | Some(b'1')))
}

fn is_relative_json_pointer(s: &str) -> bool {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || (digits > 1 && s.starts_with('0')) {
        return false;
    }
    let rest = &s[digits..];
    rest == "#" || is_json_pointer(rest)
}
