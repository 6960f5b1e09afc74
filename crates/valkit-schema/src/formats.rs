//! Named string formats.
//!
//! Each format is a predicate over `&str`. Formats with fixed alphabets use
//! precompiled regexes; addresses, URLs, JWTs, base64 and the ISO 8601 family
//! are checked structurally.

use std::net::{Ipv4Addr, Ipv6Addr};

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in format pattern compiles")
}

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    compile(r"^[A-Za-z0-9_'+\-\.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
});
static GUID: Lazy<Regex> = Lazy::new(|| {
    compile(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
});
static NANOID: Lazy<Regex> = Lazy::new(|| compile(r"^[a-zA-Z0-9_-]{21}$"));
static CUID: Lazy<Regex> = Lazy::new(|| compile(r"^[cC][^\s-]{8,}$"));
static CUID2: Lazy<Regex> = Lazy::new(|| compile(r"^[0-9a-z]+$"));
static ULID: Lazy<Regex> = Lazy::new(|| compile(r"^[0-9A-HJKMNP-TV-Za-hjkmnp-tv-z]{26}$"));
static XID: Lazy<Regex> = Lazy::new(|| compile(r"^[0-9a-vA-V]{20}$"));
static KSUID: Lazy<Regex> = Lazy::new(|| compile(r"^[A-Za-z0-9]{27}$"));
static EMOJI: Lazy<Regex> =
    Lazy::new(|| compile(r"^(\p{Extended_Pictographic}|\p{Emoji_Component})+$"));
static HEX: Lazy<Regex> = Lazy::new(|| compile(r"^[0-9a-fA-F]*$"));
static BASE64URL: Lazy<Regex> = Lazy::new(|| compile(r"^[A-Za-z0-9_-]*$"));
static E164: Lazy<Regex> = Lazy::new(|| compile(r"^\+[0-9]{6,14}[0-9]$"));
static DATE: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"^(?:(?:\d\d[2468][048]|\d\d[13579][26]|\d\d0[48]|[02468][048]00|[13579][26]00)-02-29",
        r"|\d{4}-(?:(?:0[13578]|1[02])-(?:0[1-9]|[12]\d|3[01])",
        r"|(?:0[469]|11)-(?:0[1-9]|[12]\d|30)|(?:02)-(?:0[1-9]|1\d|2[0-8])))$"
    ))
});
static YEAR: Lazy<Regex> = Lazy::new(|| compile(r"^\d{4}$"));
static YEAR_MONTH: Lazy<Regex> = Lazy::new(|| compile(r"^\d{4}-(?:0[1-9]|1[0-2])$"));

/// Sub-minute precision of an ISO time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// `HH:MM`
    Minute,
    /// `HH:MM:SS`
    Second,
    /// `HH:MM:SS.f`, one to three fractional digits.
    Millisecond,
    /// `HH:MM:SS` followed by exactly this many fractional digits.
    Digits(u8),
    /// `HH:MM`, optionally `:SS` and any number of fractional digits.
    #[default]
    Arbitrary,
}

/// Options for ISO datetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatetimeOptions {
    /// Accept `±HH:MM` offsets in addition to `Z`.
    pub offset: bool,
    /// Accept a missing timezone designator.
    pub local: bool,
    pub precision: Precision,
}

/// Granularity of an ISO date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatePrecision {
    Year,
    Month,
    #[default]
    Day,
}

/// Options for ISO durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DurationOptions {
    /// Upper bound on fractional-second digits.
    pub max_fraction_digits: Option<usize>,
}

/// Constraints on accepted URLs.
#[derive(Debug, Clone, Default)]
pub struct UrlOptions {
    pub hostname: Option<Regex>,
    pub protocol: Option<Regex>,
}

/// A named string format.
#[derive(Debug, Clone)]
pub enum Format {
    Email,
    Url(UrlOptions),
    /// Optional RFC 9562 version (1 through 8).
    Uuid(Option<u8>),
    Guid,
    Nanoid,
    Cuid,
    Cuid2,
    Ulid,
    Xid,
    Ksuid,
    Emoji,
    /// Optional required `alg` header value.
    Jwt(Option<String>),
    Base64,
    Base64Url,
    Hex,
    Ipv4,
    Ipv6,
    Cidrv4,
    Cidrv6,
    E164,
    Datetime(DatetimeOptions),
    Date(DatePrecision),
    Time(Precision),
    Duration(DurationOptions),
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Email => "email",
            Format::Url(_) => "url",
            Format::Uuid(_) => "uuid",
            Format::Guid => "guid",
            Format::Nanoid => "nanoid",
            Format::Cuid => "cuid",
            Format::Cuid2 => "cuid2",
            Format::Ulid => "ulid",
            Format::Xid => "xid",
            Format::Ksuid => "ksuid",
            Format::Emoji => "emoji",
            Format::Jwt(_) => "jwt",
            Format::Base64 => "base64",
            Format::Base64Url => "base64url",
            Format::Hex => "hex",
            Format::Ipv4 => "ipv4",
            Format::Ipv6 => "ipv6",
            Format::Cidrv4 => "cidrv4",
            Format::Cidrv6 => "cidrv6",
            Format::E164 => "e164",
            Format::Datetime(_) => "datetime",
            Format::Date(_) => "date",
            Format::Time(_) => "time",
            Format::Duration(_) => "duration",
        }
    }

    pub fn matches(&self, s: &str) -> bool {
        match self {
            Format::Email => !s.starts_with('.') && !s.contains("..") && EMAIL.is_match(s),
            Format::Url(options) => is_url(s, options),
            Format::Uuid(version) => is_uuid(s, *version),
            Format::Guid => GUID.is_match(s),
            Format::Nanoid => NANOID.is_match(s),
            Format::Cuid => CUID.is_match(s),
            Format::Cuid2 => CUID2.is_match(s),
            Format::Ulid => ULID.is_match(s),
            Format::Xid => XID.is_match(s),
            Format::Ksuid => KSUID.is_match(s),
            Format::Emoji => EMOJI.is_match(s),
            Format::Jwt(alg) => is_jwt(s, alg.as_deref()),
            Format::Base64 => STANDARD.decode(s).is_ok(),
            Format::Base64Url => BASE64URL.is_match(s) && URL_SAFE_NO_PAD.decode(s).is_ok(),
            Format::Hex => HEX.is_match(s),
            Format::Ipv4 => s.parse::<Ipv4Addr>().is_ok(),
            Format::Ipv6 => s.parse::<Ipv6Addr>().is_ok(),
            Format::Cidrv4 => is_cidr(s, 32, |a| a.parse::<Ipv4Addr>().is_ok()),
            Format::Cidrv6 => is_cidr(s, 128, |a| a.parse::<Ipv6Addr>().is_ok()),
            Format::E164 => E164.is_match(s),
            Format::Datetime(options) => is_datetime(s, options),
            Format::Date(precision) => is_date(s, *precision),
            Format::Time(precision) => is_time(s, *precision),
            Format::Duration(options) => is_duration(s, options),
        }
    }
}

fn is_url(s: &str, options: &UrlOptions) -> bool {
    let Ok(url) = url::Url::parse(s.trim()) else {
        return false;
    };
    if let Some(pattern) = &options.hostname {
        if !url.host_str().is_some_and(|host| pattern.is_match(host)) {
            return false;
        }
    }
    if let Some(pattern) = &options.protocol {
        if !pattern.is_match(url.scheme()) {
            return false;
        }
    }
    true
}

fn is_uuid(s: &str, version: Option<u8>) -> bool {
    if !GUID.is_match(s) {
        return false;
    }
    let lower = s.to_ascii_lowercase();
    if lower == "00000000-0000-0000-0000-000000000000" || lower == "ffffffff-ffff-ffff-ffff-ffffffffffff" {
        return version.is_none();
    }
    let bytes = lower.as_bytes();
    let version_digit = bytes[14];
    let variant_ok = matches!(bytes[19], b'8' | b'9' | b'a' | b'b');
    let version_ok = match version {
        Some(v) => version_digit == b'0' + v,
        None => (b'1'..=b'8').contains(&version_digit),
    };
    variant_ok && version_ok
}

fn is_jwt(s: &str, alg: Option<&str>) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 3 || parts[0].is_empty() {
        return false;
    }
    let Ok(header) = URL_SAFE_NO_PAD.decode(parts[0].trim_end_matches('=')) else {
        return false;
    };
    let Ok(header) = serde_json::from_slice::<serde_json::Value>(&header) else {
        return false;
    };
    if let Some(typ) = header.get("typ") {
        if typ != "JWT" {
            return false;
        }
    }
    let Some(header_alg) = header.get("alg").and_then(|a| a.as_str()) else {
        return false;
    };
    alg.is_none_or(|expected| expected == header_alg)
}

fn is_cidr(s: &str, max_prefix: u8, address: impl Fn(&str) -> bool) -> bool {
    let Some((addr, prefix)) = s.split_once('/') else {
        return false;
    };
    let prefix_ok = !prefix.is_empty()
        && prefix.bytes().all(|b| b.is_ascii_digit())
        && (prefix == "0" || !prefix.starts_with('0'))
        && prefix.parse::<u8>().is_ok_and(|p| p <= max_prefix);
    prefix_ok && address(addr)
}

fn is_date(s: &str, precision: DatePrecision) -> bool {
    match precision {
        DatePrecision::Year => YEAR.is_match(s),
        DatePrecision::Month => YEAR_MONTH.is_match(s),
        DatePrecision::Day => DATE.is_match(s),
    }
}

fn two_digits(s: &str, max: u8) -> bool {
    s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit()) && s.parse::<u8>().is_ok_and(|n| n <= max)
}

fn is_time(s: &str, precision: Precision) -> bool {
    let (hh, rest) = s.split_at_checked(2).unwrap_or(("", ""));
    let Some(rest) = rest.strip_prefix(':') else {
        return false;
    };
    let (mm, rest) = rest.split_at_checked(2).unwrap_or(("", ""));
    if !two_digits(hh, 23) || !two_digits(mm, 59) {
        return false;
    }
    if rest.is_empty() {
        return matches!(precision, Precision::Minute | Precision::Arbitrary);
    }
    if precision == Precision::Minute {
        return false;
    }
    let Some(rest) = rest.strip_prefix(':') else {
        return false;
    };
    let (ss, fraction) = rest.split_at_checked(2).unwrap_or(("", ""));
    if !two_digits(ss, 59) {
        return false;
    }
    let digits = match fraction.strip_prefix('.') {
        None if fraction.is_empty() => 0,
        None => return false,
        Some(f) if !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()) => f.len(),
        Some(_) => return false,
    };
    match precision {
        Precision::Minute => false,
        Precision::Second => digits == 0,
        Precision::Millisecond => (1..=3).contains(&digits),
        Precision::Digits(n) => digits == usize::from(n),
        Precision::Arbitrary => true,
    }
}

fn is_offset(s: &str) -> bool {
    let Some(rest) = s.strip_prefix(['+', '-']) else {
        return false;
    };
    let Some((hh, mm)) = rest.split_once(':') else {
        return false;
    };
    two_digits(hh, 23) && two_digits(mm, 59)
}

fn is_datetime(s: &str, options: &DatetimeOptions) -> bool {
    let Some((date, time)) = s.split_once('T') else {
        return false;
    };
    if !DATE.is_match(date) {
        return false;
    }
    let (clock, zone) = if let Some(clock) = time.strip_suffix('Z') {
        (clock, "Z")
    } else if let Some(idx) = time.rfind(['+', '-']) {
        (&time[..idx], &time[idx..])
    } else {
        (time, "")
    };
    let zone_ok = match zone {
        "Z" => true,
        "" => options.local,
        offset => options.offset && is_offset(offset),
    };
    zone_ok && is_time(clock, options.precision)
}

fn is_duration(s: &str, options: &DurationOptions) -> bool {
    let Some(body) = s.strip_prefix('P') else {
        return false;
    };
    if body.is_empty() {
        return false;
    }
    if let Some(weeks) = body.strip_suffix('W') {
        return !weeks.is_empty() && weeks.bytes().all(|b| b.is_ascii_digit());
    }
    let (date_part, time_part) = match body.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (body, None),
    };
    if !components(date_part, &['Y', 'M', 'D'], None) {
        return false;
    }
    match time_part {
        None => !date_part.is_empty(),
        Some(t) => !t.is_empty() && components(t, &['H', 'M', 'S'], Some(options)),
    }
}

/// `\d+X` groups in the order of `designators`, each at most once; only the
/// seconds group may carry a fraction.
fn components(mut s: &str, designators: &[char], seconds: Option<&DurationOptions>) -> bool {
    let mut next = 0;
    while !s.is_empty() {
        let end = s
            .find(|c: char| !c.is_ascii_digit() && c != '.' && c != ',')
            .unwrap_or(s.len());
        let (number, rest) = s.split_at(end);
        let Some(designator) = rest.chars().next() else {
            return false;
        };
        let Some(pos) = designators[next..].iter().position(|d| *d == designator) else {
            return false;
        };
        next += pos + 1;
        let (whole, fraction) = match number.split_once(['.', ',']) {
            Some((w, f)) => (w, Some(f)),
            None => (number, None),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        if let Some(fraction) = fraction {
            let allowed = designator == 'S' && seconds.is_some();
            if !allowed || fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
                return false;
            }
            let limit = seconds.and_then(|o| o.max_fraction_digits);
            if limit.is_some_and(|max| fraction.len() > max) {
                return false;
            }
        }
        s = &rest[designator.len_utf8()..];
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_precision_second() {
        let f = Format::Datetime(DatetimeOptions {
            precision: Precision::Second,
            ..DatetimeOptions::default()
        });
        assert!(f.matches("2020-01-01T06:15:00Z"));
        assert!(!f.matches("2020-01-01T06:15:00.1Z"));
        assert!(!f.matches("2020-01-01T06:15Z"));
    }

    #[test]
    fn datetime_precision_millisecond() {
        let f = Format::Datetime(DatetimeOptions {
            precision: Precision::Millisecond,
            ..DatetimeOptions::default()
        });
        assert!(f.matches("2020-01-01T06:15:00.1Z"));
        assert!(f.matches("2020-01-01T06:15:00.123Z"));
        assert!(!f.matches("2020-01-01T06:15:00Z"));
        assert!(!f.matches("2020-01-01T06:15:00.1234Z"));
    }

    #[test]
    fn datetime_offsets_and_local() {
        let strict = Format::Datetime(DatetimeOptions::default());
        assert!(strict.matches("2020-01-01T06:15:00.123456Z"));
        assert!(!strict.matches("2020-01-01T06:15:00+02:00"));
        assert!(!strict.matches("2020-01-01T06:15:00"));

        let lenient = Format::Datetime(DatetimeOptions {
            offset: true,
            local: true,
            precision: Precision::Arbitrary,
        });
        assert!(lenient.matches("2020-01-01T06:15:00+02:00"));
        assert!(lenient.matches("2020-01-01T06:15"));
        assert!(!lenient.matches("2020-02-30T06:15:00Z"));
    }

    #[test]
    fn date_handles_leap_years() {
        let f = Format::Date(DatePrecision::Day);
        assert!(f.matches("2024-02-29"));
        assert!(!f.matches("2023-02-29"));
        assert!(Format::Date(DatePrecision::Month).matches("2024-02"));
        assert!(!Format::Date(DatePrecision::Month).matches("2024-13"));
    }

    #[test]
    fn durations() {
        let f = Format::Duration(DurationOptions::default());
        for ok in ["P3Y6M4DT12H30M5S", "P1W", "PT0.5S", "P1D", "PT1H"] {
            assert!(f.matches(ok), "{ok}");
        }
        for bad in ["P", "PT", "P1S", "P1DT", "P1M1Y", "P1.5D", "1D"] {
            assert!(!f.matches(bad), "{bad}");
        }
        let bounded = Format::Duration(DurationOptions {
            max_fraction_digits: Some(2),
        });
        assert!(bounded.matches("PT1.25S"));
        assert!(!bounded.matches("PT1.255S"));
    }

    #[test]
    fn uuid_versions() {
        assert!(Format::Uuid(None).matches("123e4567-e89b-12d3-a456-426614174000"));
        assert!(Format::Uuid(Some(1)).matches("123e4567-e89b-12d3-a456-426614174000"));
        assert!(!Format::Uuid(Some(4)).matches("123e4567-e89b-12d3-a456-426614174000"));
        assert!(Format::Uuid(None).matches("00000000-0000-0000-0000-000000000000"));
        assert!(!Format::Uuid(None).matches("123e4567-e89b-02d3-a456-426614174000"));
    }

    #[test]
    fn network_formats() {
        assert!(Format::Ipv4.matches("192.168.0.1"));
        assert!(!Format::Ipv4.matches("256.0.0.1"));
        assert!(Format::Ipv6.matches("::1"));
        assert!(Format::Cidrv4.matches("10.0.0.0/8"));
        assert!(!Format::Cidrv4.matches("10.0.0.0/33"));
        assert!(Format::Cidrv6.matches("2001:db8::/32"));
    }

    #[test]
    fn email_and_url() {
        assert!(Format::Email.matches("a.b+c@example.com"));
        assert!(!Format::Email.matches(".a@example.com"));
        assert!(!Format::Email.matches("a..b@example.com"));
        assert!(!Format::Email.matches("a@b"));
        let https_only = UrlOptions {
            hostname: None,
            protocol: Some(Regex::new("^https$").unwrap()),
        };
        assert!(Format::Url(https_only.clone()).matches("https://example.com/x"));
        assert!(!Format::Url(https_only).matches("http://example.com/x"));
        assert!(!Format::Url(UrlOptions::default()).matches("not a url"));
    }

    #[test]
    fn jwt_header_checks() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let token = format!("{header}.e30.sig");
        assert!(Format::Jwt(None).matches(&token));
        assert!(Format::Jwt(Some("HS256".into())).matches(&token));
        assert!(!Format::Jwt(Some("RS256".into())).matches(&token));
        assert!(!Format::Jwt(None).matches("a.b"));
    }

    #[test]
    fn encodings() {
        assert!(Format::Base64.matches("aGVsbG8="));
        assert!(!Format::Base64.matches("aGVsbG8"));
        assert!(Format::Base64Url.matches("aGVsbG8"));
        assert!(!Format::Base64Url.matches("aGVsbG8="));
        assert!(Format::Hex.matches("deadBEEF"));
        assert!(!Format::Hex.matches("xyz"));
        assert!(Format::E164.matches("+14155552671"));
        assert!(Format::Emoji.matches("👍"));
        assert!(!Format::Emoji.matches("a"));
    }
}
