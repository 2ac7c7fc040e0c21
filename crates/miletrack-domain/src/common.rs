//! Shared traits and calendar utilities for mileage tracking primitives.

use chrono::{Datelike, Duration, NaiveDate};
use uuid::Uuid;

/// Exposes a stable identifier for entities stored in a garage.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Number of whole calendar days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// January 1 of the year containing `date`.
pub fn year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// Most recent Sunday on or before `date`. Readings are usually taken on week boundaries.
pub fn week_start_sunday(date: NaiveDate) -> NaiveDate {
    let delta = date.weekday().num_days_from_sunday() as i64;
    date - Duration::days(delta)
}

/// Moves `date` by a signed number of calendar months. A day past the end of
/// the target month rolls over into the following month, so 31 May minus
/// 3 months is 3 March (2 March in leap years).
///
/// Results outside chrono's representable range leave `date` unchanged.
pub fn shift_month(date: NaiveDate, months: i64) -> NaiveDate {
    let index = i64::from(date.year()) * 12 + i64::from(date.month0()) + months;
    let Ok(year) = i32::try_from(index.div_euclid(12)) else {
        return date;
    };
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_signed(Duration::days(i64::from(date.day()) - 1)))
        .unwrap_or(date)
}
