//! Server timestamps.
//!
//! The backend emits RFC 3339, but rows written straight through SQL come back
//! as `YYYY-MM-DD HH:MM:SS` without an offset; those are read as UTC.
//! Serialization always produces RFC 3339.

use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

const SQL_DATETIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Parses an RFC 3339 timestamp, falling back to the SQL datetime form.
pub fn parse(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(raw, &Rfc3339).or_else(|err| {
        PrimitiveDateTime::parse(raw, SQL_DATETIME)
            .map(PrimitiveDateTime::assume_utc)
            .map_err(|_| err)
    })
}

/// `#[serde(with = "crate::timestamp::option")]` for optional server timestamps.
pub mod option {
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(at) => {
                let text = at.format(&Rfc3339).map_err(S::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::parse(&raw).map_err(D::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_datetime_reads_as_utc() {
        let at = parse("2024-01-10 12:30:05").expect("sql datetime");
        assert_eq!(at, time::macros::datetime!(2024-01-10 12:30:05 UTC));
    }

    #[test]
    fn rfc3339_keeps_its_offset() {
        let at = parse("2024-01-10T12:30:05+02:00").expect("rfc3339");
        assert_eq!(at.offset().whole_hours(), 2);
    }

    #[test]
    fn garbage_reports_the_rfc3339_error() {
        assert!(parse("last tuesday").is_err());
    }
}
