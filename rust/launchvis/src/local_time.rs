//! Wall-clock formatting in a launch site's time zone.
//!
//! Sites carry a standard UTC offset and whether they follow the US daylight
//! saving rule (second Sunday of March to first Sunday of November, switching
//! at 02:00 local), which covers every site we ship.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Utc, Weekday};

use crate::calibration::LaunchSite;

/// UTC offset and abbreviation in effect at `utc` for `site`.
pub fn site_offset(site: &LaunchSite, utc: DateTime<Utc>) -> (FixedOffset, &str) {
    let standard_secs = site.utc_offset_hours * 3600;
    if site.observes_dst && in_us_dst(utc, standard_secs) {
        if let Some(offset) = FixedOffset::east_opt(standard_secs + 3600) {
            return (offset, site.daylight_abbrev.as_str());
        }
    }
    let offset = FixedOffset::east_opt(standard_secs).unwrap_or_else(|| Utc.fix());
    (offset, site.standard_abbrev.as_str())
}

/// `h:mm AM/PM ABBR`, e.g. `6:42 PM PDT`. `None` for timestamps chrono
/// cannot represent.
pub fn format_local(site: &LaunchSite, unix_seconds: i64) -> Option<String> {
    let utc = DateTime::<Utc>::from_timestamp(unix_seconds, 0)?;
    let (offset, abbrev) = site_offset(site, utc);
    let local = utc.with_timezone(&offset);
    Some(format!("{} {}", local.format("%-I:%M %p"), abbrev))
}

fn in_us_dst(utc: DateTime<Utc>, standard_secs: i32) -> bool {
    let year = utc.year();
    let (Some(march), Some(november)) = (
        nth_sunday(year, 3, 2),
        nth_sunday(year, 11, 1),
    ) else {
        return false;
    };
    // 02:00 standard time in March; 02:00 daylight (01:00 standard) in November
    let start = march.and_hms_opt(2, 0, 0).map(|t| t.and_utc() - Duration::seconds(standard_secs as i64));
    let end = november.and_hms_opt(1, 0, 0).map(|t| t.and_utc() - Duration::seconds(standard_secs as i64));
    match (start, end) {
        (Some(start), Some(end)) => utc >= start && utc < end,
        _ => false,
    }
}

fn nth_sunday(year: i32, month: u32, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Sun, n)
}
