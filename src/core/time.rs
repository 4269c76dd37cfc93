use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime, UtcOffset,
};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn format_date(value: Date) -> String {
    value
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| value.to_string())
}

/// `YYYYMMDD`, used in receipt numbers.
pub(crate) fn compact_date(value: Date) -> String {
    value
        .format(format_description!("[year][month][day]"))
        .unwrap_or_else(|_| value.to_string())
}

/// Whole minutes elapsed, truncated toward zero and never negative.
pub(crate) fn whole_minutes_between(start: PrimitiveDateTime, end: PrimitiveDateTime) -> i32 {
    let minutes = (end - start).whole_minutes();
    minutes.clamp(0, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Duration, Time, UtcOffset};

    fn at(hour: u8, minute: u8, second: u8) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2025, time::Month::January, 2).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(hour, minute, second).unwrap())
    }

    #[test]
    fn format_primitive_outputs_utc_z() {
        assert_eq!(format_primitive(at(10, 20, 30)), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn to_primitive_normalizes_offset() {
        let shifted = at(10, 20, 30).assume_utc().to_offset(UtcOffset::from_hms(3, 0, 0).unwrap());
        assert_eq!(to_primitive_utc(shifted), at(10, 20, 30));
    }

    #[test]
    fn dates_format_for_receipts_and_certificates() {
        let date = Date::from_calendar_date(2025, time::Month::March, 7).unwrap();
        assert_eq!(format_date(date), "2025-03-07");
        assert_eq!(compact_date(date), "20250307");
    }

    #[test]
    fn whole_minutes_truncates_and_floors_at_zero() {
        let start = at(10, 0, 0);
        assert_eq!(whole_minutes_between(start, start + Duration::seconds(179)), 2);
        assert_eq!(whole_minutes_between(start, start - Duration::minutes(5)), 0);
    }
}
