//! Inventory dates are always stamped in US Eastern time, whatever the
//! timezone of the machine running the editor.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};

const EST_OFFSET_HOURS: i64 = -5;
const EDT_OFFSET_HOURS: i64 = -4;

/// Calendar date in America/New_York at the given instant.
pub fn eastern_date(now: DateTime<Utc>) -> NaiveDate {
    let offset = if is_eastern_dst(now) {
        EDT_OFFSET_HOURS
    } else {
        EST_OFFSET_HOURS
    };
    (now.naive_utc() + Duration::hours(offset)).date()
}

/// Today's date in America/New_York.
pub fn eastern_today() -> NaiveDate {
    eastern_date(Utc::now())
}

/// `M/D/YYYY`, no zero padding (the format the sheets already use).
pub fn format_us_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// US daylight saving: from 02:00 EST on the second Sunday of March until
/// 02:00 EDT on the first Sunday of November.
fn is_eastern_dst(now: DateTime<Utc>) -> bool {
    let year = now.year();
    let (Some(start_day), Some(end_day)) = (
        NaiveDate::from_weekday_of_month_opt(year, 3, Weekday::Sun, 2),
        NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Sun, 1),
    ) else {
        return false;
    };
    // 02:00 EST == 07:00 UTC, 02:00 EDT == 06:00 UTC.
    let start = utc_at(start_day, 7);
    let end = utc_at(end_day, 6);
    match (start, end) {
        (Some(start), Some(end)) => now >= start && now < end,
        _ => false,
    }
}

fn utc_at(day: NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
    let naive: NaiveDateTime = day.and_hms_opt(hour, 0, 0)?;
    Some(Utc.from_utc_datetime(&naive))
}
