//! # HTTP Dates
//!
//! Formatting and parsing of the IMF-fixdate form used by HTTP headers
//! (`Sun, 06 Nov 1994 08:49:37 GMT`). Always UTC, seconds precision.

use chrono::{DateTime, NaiveDateTime, Utc};

/// `strftime` layout of an IMF-fixdate.
pub const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Render a timestamp as an IMF-fixdate.
pub fn format(t: &DateTime<Utc>) -> String {
    t.format(IMF_FIXDATE).to_string()
}

/// Parse an IMF-fixdate. Returns `None` for any other layout.
pub fn parse(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), IMF_FIXDATE)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_imf_fixdate() {
        let t = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(format(&t), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_parse_imf_fixdate() {
        let t = parse("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap());
    }

    #[test]
    fn test_parse_rejects_other_layouts() {
        assert!(parse("1994-11-06T08:49:37Z").is_none());
        assert!(parse("Sunday, 06-Nov-94 08:49:37 GMT").is_none());
        assert!(parse("Sun, 06 Nov 1994 08:49:37 PST").is_none());
    }
}
