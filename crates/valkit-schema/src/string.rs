//! String helpers and the string-format leaves.
//!
//! A format leaf is a plain string schema with one format check already
//! registered; its type code and `bag["format"]` name the format.

use regex::Regex;
use valkit_value::Value;

use crate::checks::Check;
use crate::error::Result;
use crate::formats::{DatePrecision, DatetimeOptions, DurationOptions, Format, Precision, UrlOptions};
use crate::schema::{Def, Internals, Schema, TypeCode};

impl Schema<String> {
    /// Minimum length in characters.
    pub fn min(&self, limit: usize) -> Schema<String> {
        self.min_length(limit)
    }

    /// Maximum length in characters.
    pub fn max(&self, limit: usize) -> Schema<String> {
        self.max_length(limit)
    }

    /// Lexicographic lower bound (exclusive). Useful on ISO dates.
    pub fn gt(&self, limit: impl Into<String>) -> Schema<String> {
        self.with(Check::gt(limit.into()))
    }

    pub fn gte(&self, limit: impl Into<String>) -> Schema<String> {
        self.with(Check::gte(limit.into()))
    }

    pub fn lt(&self, limit: impl Into<String>) -> Schema<String> {
        self.with(Check::lt(limit.into()))
    }

    pub fn lte(&self, limit: impl Into<String>) -> Schema<String> {
        self.with(Check::lte(limit.into()))
    }

    /// Require a match of `pattern`, compiled now.
    pub fn regex(&self, pattern: &str) -> Result<Schema<String>> {
        Ok(self.pattern(Regex::new(pattern)?))
    }

    pub fn pattern(&self, regex: Regex) -> Schema<String> {
        self.derive(|i| {
            i.bag
                .insert("pattern".into(), Value::from(regex.as_str()));
            i.checks.push(Check::pattern(regex));
        })
    }

    pub fn starts_with(&self, prefix: impl Into<String>) -> Schema<String> {
        self.with(Check::starts_with(prefix))
    }

    pub fn ends_with(&self, suffix: impl Into<String>) -> Schema<String> {
        self.with(Check::ends_with(suffix))
    }

    pub fn includes(&self, needle: impl Into<String>) -> Schema<String> {
        self.with(Check::includes(needle))
    }

    pub fn lowercase(&self) -> Schema<String> {
        self.with(Check::lowercase())
    }

    pub fn uppercase(&self) -> Schema<String> {
        self.with(Check::uppercase())
    }

    pub fn trim(&self) -> Schema<String> {
        self.overwrite(|s| s.trim().to_owned())
    }

    pub fn to_lowercase(&self) -> Schema<String> {
        self.overwrite(|s| s.to_lowercase())
    }

    pub fn to_uppercase(&self) -> Schema<String> {
        self.overwrite(|s| s.to_uppercase())
    }

    /// Add a named format check.
    pub fn format(&self, format: Format) -> Schema<String> {
        self.derive(|i| {
            i.bag.insert("format".into(), Value::from(format.name()));
            i.checks.push(Check::format(format));
        })
    }

    /// Name of the first format check, if any.
    pub fn format_name(&self) -> Option<&'static str> {
        self.inner
            .checks
            .iter()
            .find_map(|c| c.as_format().map(Format::name))
    }
}

fn leaf(code: TypeCode, format: Format) -> Schema<String> {
    let mut internals = Internals::new(code, Def::String);
    internals
        .bag
        .insert("format".into(), Value::from(format.name()));
    internals.checks.push(Check::format(format));
    Schema::from_internals(internals)
}

pub fn email() -> Schema<String> {
    leaf(TypeCode::Email, Format::Email)
}

pub fn url() -> Schema<String> {
    url_with(UrlOptions::default())
}

/// A URL whose hostname and scheme match the given patterns.
pub fn url_with(options: UrlOptions) -> Schema<String> {
    leaf(TypeCode::Url, Format::Url(options))
}

/// Any RFC 9562 UUID (versions 1 through 8, plus nil and max).
pub fn uuid() -> Schema<String> {
    leaf(TypeCode::Uuid, Format::Uuid(None))
}

pub fn uuid_version(version: u8) -> Schema<String> {
    leaf(TypeCode::Uuid, Format::Uuid(Some(version)))
}

/// Any 8-4-4-4-12 hex identifier, without version checks.
pub fn guid() -> Schema<String> {
    leaf(TypeCode::Guid, Format::Guid)
}

pub fn nanoid() -> Schema<String> {
    leaf(TypeCode::Nanoid, Format::Nanoid)
}

pub fn cuid() -> Schema<String> {
    leaf(TypeCode::Cuid, Format::Cuid)
}

pub fn cuid2() -> Schema<String> {
    leaf(TypeCode::Cuid2, Format::Cuid2)
}

pub fn ulid() -> Schema<String> {
    leaf(TypeCode::Ulid, Format::Ulid)
}

pub fn xid() -> Schema<String> {
    leaf(TypeCode::Xid, Format::Xid)
}

pub fn ksuid() -> Schema<String> {
    leaf(TypeCode::Ksuid, Format::Ksuid)
}

pub fn emoji() -> Schema<String> {
    leaf(TypeCode::Emoji, Format::Emoji)
}

pub fn jwt() -> Schema<String> {
    leaf(TypeCode::Jwt, Format::Jwt(None))
}

/// A JWT whose header names `alg`.
pub fn jwt_alg(alg: impl Into<String>) -> Schema<String> {
    leaf(TypeCode::Jwt, Format::Jwt(Some(alg.into())))
}

pub fn base64() -> Schema<String> {
    leaf(TypeCode::Base64, Format::Base64)
}

pub fn base64url() -> Schema<String> {
    leaf(TypeCode::Base64Url, Format::Base64Url)
}

pub fn hex() -> Schema<String> {
    leaf(TypeCode::Hex, Format::Hex)
}

pub fn ipv4() -> Schema<String> {
    leaf(TypeCode::Ipv4, Format::Ipv4)
}

pub fn ipv6() -> Schema<String> {
    leaf(TypeCode::Ipv6, Format::Ipv6)
}

pub fn cidrv4() -> Schema<String> {
    leaf(TypeCode::Cidrv4, Format::Cidrv4)
}

pub fn cidrv6() -> Schema<String> {
    leaf(TypeCode::Cidrv6, Format::Cidrv6)
}

pub fn e164() -> Schema<String> {
    leaf(TypeCode::E164, Format::E164)
}

/// ISO 8601 datetime in UTC (`Z`) with any sub-minute precision.
pub fn iso_datetime() -> Schema<String> {
    iso_datetime_with(DatetimeOptions::default())
}

pub fn iso_datetime_with(options: DatetimeOptions) -> Schema<String> {
    leaf(TypeCode::IsoDatetime, Format::Datetime(options))
}

/// `YYYY-MM-DD`.
pub fn iso_date() -> Schema<String> {
    iso_date_with(DatePrecision::Day)
}

pub fn iso_date_with(precision: DatePrecision) -> Schema<String> {
    leaf(TypeCode::IsoDate, Format::Date(precision))
}

pub fn iso_time() -> Schema<String> {
    iso_time_with(Precision::Arbitrary)
}

pub fn iso_time_with(precision: Precision) -> Schema<String> {
    leaf(TypeCode::IsoTime, Format::Time(precision))
}

pub fn iso_duration() -> Schema<String> {
    iso_duration_with(DurationOptions::default())
}

pub fn iso_duration_with(options: DurationOptions) -> Schema<String> {
    leaf(TypeCode::IsoDuration, Format::Duration(options))
}

#[cfg(test)]
mod tests {
    use valkit_issue::{IssueCode, IssueKind};

    use super::*;
    use crate::primitive::string;

    #[test]
    fn format_leaves_report_their_format() {
        let err = email().parse("nope").unwrap_err();
        match &err.issues()[0].kind {
            IssueKind::InvalidFormat { format, .. } => assert_eq!(format, "email"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(email().type_code(), TypeCode::Email);
        assert_eq!(email().bag()["format"], Value::from("email"));
        assert_eq!(email().format_name(), Some("email"));
    }

    #[test]
    fn format_leaves_still_reject_non_strings() {
        let err = uuid().parse(5).unwrap_err();
        match &err.issues()[0].kind {
            IssueKind::InvalidType { expected, .. } => assert_eq!(expected, "string"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn iso_dates_have_lexicographic_bounds() {
        let s = iso_date().gte("2020-01-01").lt("2021-01-01");
        assert!(s.parse("2020-06-15").is_ok());
        let err = s.parse("2021-03-01").unwrap_err();
        assert_eq!(err.issues()[0].code(), IssueCode::TooBig);
    }

    #[test]
    fn datetime_precision_scenario() {
        let second = iso_datetime_with(DatetimeOptions {
            precision: Precision::Second,
            ..DatetimeOptions::default()
        });
        assert_eq!(
            second.parse("2020-01-01T06:15:00Z").unwrap(),
            "2020-01-01T06:15:00Z"
        );
        assert!(second.parse("2020-01-01T06:15:00.1Z").is_err());

        let milli = iso_datetime_with(DatetimeOptions {
            precision: Precision::Millisecond,
            ..DatetimeOptions::default()
        });
        assert!(milli.parse("2020-01-01T06:15:00Z").is_err());
        assert!(milli.parse("2020-01-01T06:15:00.1Z").is_ok());
    }

    #[test]
    fn string_helpers() {
        assert_eq!(string().to_uppercase().parse("abc").unwrap(), "ABC");
        assert!(string().starts_with("ab").parse("abc").is_ok());
        assert!(string().ends_with("x").parse("abc").is_err());
        assert!(string().lowercase().parse("aBc").is_err());
        assert!(string().min(2).max(3).parse("abcd").is_err());
        assert!(string().regex("(").is_err());
        assert_eq!(string().regex("^a").unwrap().bag()["pattern"], Value::from("^a"));
    }
}
