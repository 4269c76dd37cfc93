use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};

use crate::core::time::to_primitive_utc;

/// Accepts RFC 3339 or the offset-less `YYYY-MM-DDTHH:MM[:SS]` that
/// datetime-local inputs send, which is read as UTC.
pub(crate) fn parse_datetime(raw: &str) -> Option<PrimitiveDateTime> {
    let raw = raw.trim();
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(to_primitive_utc(value));
    }

    if let Ok(value) =
        PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    {
        return Some(value);
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(value);
    }
    PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
    .ok()
}

pub(crate) fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), &format_description!("[year]-[month]-[day]")).ok()
}

pub(crate) fn deserialize_datetime<'de, D>(deserializer: D) -> Result<PrimitiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw).ok_or_else(|| D::Error::custom(format!("invalid datetime: {raw}")))
}

pub(crate) fn deserialize_option_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<PrimitiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) => parse_datetime(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid datetime: {value}")))
            .map(Some),
        None => Ok(None),
    }
}

pub(crate) fn deserialize_option_date<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) => parse_date(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid date: {value}")))
            .map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn rfc3339_offsets_are_normalized_to_utc() {
        assert_eq!(parse_datetime("2025-05-01T12:30:00+03:00"), Some(datetime!(2025-05-01 09:30:00)));
        assert_eq!(parse_datetime("2025-05-01T09:30:00Z"), Some(datetime!(2025-05-01 09:30:00)));
    }

    #[test]
    fn local_inputs_are_read_as_utc() {
        assert_eq!(parse_datetime("2025-05-01T09:30"), Some(datetime!(2025-05-01 09:30:00)));
        assert_eq!(parse_datetime("2025-05-01 09:30:15"), Some(datetime!(2025-05-01 09:30:15)));
        assert_eq!(parse_datetime("yesterday"), None);
    }

    #[test]
    fn dates_parse_iso_only() {
        assert_eq!(parse_date("2001-02-03"), Some(date!(2001 - 02 - 03)));
        assert_eq!(parse_date("03/02/2001"), None);
    }
}
