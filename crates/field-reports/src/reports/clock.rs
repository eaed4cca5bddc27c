//! Tenant-local calendar arithmetic.
//!
//! All report decisions are made against the tenant's civil calendar, never
//! the host timezone or the UTC trigger date. An unrecognized zone name
//! falls back to UTC-derived values; the fallback is logged.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Calendar date observed right now in the given IANA timezone.
pub fn local_date(timezone: &str) -> NaiveDate {
    local_date_at(Utc::now(), timezone)
}

/// Calendar date observed at `now` in the given IANA timezone.
pub fn local_date_at(now: DateTime<Utc>, timezone: &str) -> NaiveDate {
    match timezone.parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).date_naive(),
        Err(_) => {
            warn!(%timezone, "unrecognized timezone, using UTC date");
            now.date_naive()
        }
    }
}

/// Day of week observed right now in the given timezone, 0 = Sunday .. 6 = Saturday.
pub fn local_weekday(timezone: &str) -> u8 {
    local_weekday_at(Utc::now(), timezone)
}

/// Day of week observed at `now` in the given timezone, 0 = Sunday .. 6 = Saturday.
pub fn local_weekday_at(now: DateTime<Utc>, timezone: &str) -> u8 {
    let weekday = match timezone.parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).weekday(),
        Err(_) => {
            warn!(%timezone, "unrecognized timezone, using UTC weekday");
            now.weekday()
        }
    };
    weekday.num_days_from_sunday() as u8
}

/// UTC instants bounding the local calendar day, as the half-open interval
/// `[start of day, start of next day)`.
pub fn day_window(date: NaiveDate, timezone: &str) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN);
    let end = (date + Duration::days(1)).and_time(NaiveTime::MIN);

    match timezone.parse::<Tz>() {
        Ok(tz) => {
            // `earliest` resolves DST gaps/folds to the first valid instant.
            let from = tz
                .from_local_datetime(&start)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
            let to = tz
                .from_local_datetime(&end)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
            match (from, to) {
                (Some(from), Some(to)) => (from, to),
                _ => {
                    warn!(%timezone, %date, "local midnight unresolvable, using UTC window");
                    (Utc.from_utc_datetime(&start), Utc.from_utc_datetime(&end))
                }
            }
        }
        Err(_) => {
            warn!(%timezone, "unrecognized timezone, using UTC window");
            (Utc.from_utc_datetime(&start), Utc.from_utc_datetime(&end))
        }
    }
}
