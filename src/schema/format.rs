//! `format` assertions for the common string formats.
//!
//! Unknown format names are annotations only and always pass.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::path::JsonPointer;

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid pattern is valid")
});

static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));

static TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2})(\.\d+)?([zZ]|[+-](\d{2}):(\d{2}))$")
        .expect("time pattern is valid")
});

static DATE_TIME_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}[tT]\d{2}:\d{2}:\d{2}(\.\d+)?([zZ]|[+-]\d{2}:\d{2})$")
        .expect("date-time pattern is valid")
});

/// Names of the formats that are asserted.
pub const KNOWN_FORMATS: &[&str] = &[
    "date-time",
    "date",
    "time",
    "email",
    "hostname",
    "ipv4",
    "ipv6",
    "uri",
    "uri-reference",
    "uuid",
    "regex",
    "json-pointer",
];

/// Returns false only if `name` is a known format and `input` violates it.
pub fn check(name: &str, input: &str) -> bool {
    match name {
        "date-time" => is_date_time(input),
        "date" => is_date(input),
        "time" => is_time(input),
        "email" => is_email(input),
        "hostname" => is_hostname(input),
        "ipv4" => input.parse::<Ipv4Addr>().is_ok(),
        "ipv6" => input.parse::<Ipv6Addr>().is_ok(),
        "uri" => Url::parse(input).is_ok(),
        "uri-reference" => is_uri_reference(input),
        "uuid" => UUID.is_match(input),
        "regex" => Regex::new(input).is_ok(),
        "json-pointer" => is_json_pointer(input),
        _ => true,
    }
}

fn is_date_time(input: &str) -> bool {
    DATE_TIME_SHAPE.is_match(input) && DateTime::parse_from_rfc3339(input).is_ok()
}

fn is_date(input: &str) -> bool {
    DATE.is_match(input) && NaiveDate::parse_from_str(input, "%Y-%m-%d").is_ok()
}

fn is_time(input: &str) -> bool {
    let Some(caps) = TIME.captures(input) else {
        return false;
    };
    let field = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    // second 60 is allowed for leap seconds
    field(1) <= 23 && field(2) <= 59 && field(3) <= 60 && field(6) <= 23 && field(7) <= 59
}

fn is_email(input: &str) -> bool {
    let Some((local, domain)) = input.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.is_empty() {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    if local.contains('@') || local.chars().any(char::is_whitespace) {
        return false;
    }
    if let Some(literal) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        return match literal.strip_prefix("IPv6:") {
            Some(v6) => v6.parse::<Ipv6Addr>().is_ok(),
            None => literal.parse::<Ipv4Addr>().is_ok(),
        };
    }
    is_hostname(domain)
}

fn is_hostname(input: &str) -> bool {
    let host = input.strip_suffix('.').unwrap_or(input);
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

fn is_uri_reference(input: &str) -> bool {
    if input.contains('\\') || input.chars().any(char::is_whitespace) {
        return false;
    }
    static BASE: Lazy<Option<Url>> = Lazy::new(|| Url::parse("json-schema:///").ok());
    match BASE.as_ref() {
        Some(base) => base.join(input).is_ok(),
        None => false,
    }
}

fn is_json_pointer(input: &str) -> bool {
    !input.starts_with('#') && JsonPointer::parse(input).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_time() {
        assert!(check("date-time", "1963-06-19T08:30:06.283185Z"));
        assert!(check("date-time", "1963-06-19T08:30:06+02:00"));
        assert!(!check("date-time", "1963-06-19"));
        assert!(!check("date-time", "1990-02-31T15:59:59.123-08:00"));
        assert!(!check("date-time", "06/19/1963 08:30:06 PST"));
    }

    #[test]
    fn test_date() {
        assert!(check("date", "2020-02-29"));
        assert!(!check("date", "2021-02-29"));
        assert!(!check("date", "2020-1-01"));
        assert!(!check("date", "2020-13-01"));
    }

    #[test]
    fn test_time() {
        assert!(check("time", "08:30:06Z"));
        assert!(check("time", "23:59:60+00:00"));
        assert!(!check("time", "24:00:00Z"));
        assert!(!check("time", "08:30:06"));
        assert!(!check("time", "08:30:06+25:00"));
    }

    #[test]
    fn test_email() {
        assert!(check("email", "joe.bloggs@example.com"));
        assert!(check("email", "te~st@example.com"));
        assert!(check("email", "joe@[127.0.0.1]"));
        assert!(!check("email", "2962"));
        assert!(!check("email", ".test@example.com"));
        assert!(!check("email", "te..st@example.com"));
        assert!(!check("email", "joe@-bad.com"));
    }

    #[test]
    fn test_hostname() {
        assert!(check("hostname", "www.example.com"));
        assert!(check("hostname", "xn--4gbwdl.xn--wgbh1c"));
        assert!(!check("hostname", "-a-host-name-that-starts-with--"));
        assert!(!check("hostname", "not_a_valid_host_name"));
        assert!(!check("hostname", &"a".repeat(64)));
    }

    #[test]
    fn test_ip_addresses() {
        assert!(check("ipv4", "192.168.0.1"));
        assert!(!check("ipv4", "256.256.256.256"));
        assert!(check("ipv6", "::1"));
        assert!(!check("ipv6", "12345::"));
    }

    #[test]
    fn test_uri_family() {
        assert!(check("uri", "http://foo.bar/?baz=qux#quux"));
        assert!(!check("uri", "//foo.bar/?baz=qux#quux"));
        assert!(check("uri-reference", "/abc"));
        assert!(check("uri-reference", "#fragment"));
        assert!(!check("uri-reference", "\\\\WINDOWS\\fileshare"));
    }

    #[test]
    fn test_uuid_regex_and_pointer() {
        assert!(check("uuid", "2eb8aa08-aa98-11ea-b4aa-73b441d16380"));
        assert!(!check("uuid", "2eb8aa08-aa98-11ea-b4aa-73b441d1638"));
        assert!(check("regex", "([abc])+\\s+$"));
        assert!(!check("regex", "^(abc]"));
        assert!(check("json-pointer", "/foo/bar~0/baz~1/%a"));
        assert!(check("json-pointer", ""));
        assert!(!check("json-pointer", "/foo/bar~"));
        assert!(!check("json-pointer", "#/foo"));
    }

    #[test]
    fn test_unknown_format_passes() {
        assert!(check("x-custom", "anything"));
    }
}
