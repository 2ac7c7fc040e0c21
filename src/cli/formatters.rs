//! Display helpers for mileage values, dates and identifiers.

use chrono::NaiveDate;
use uuid::Uuid;

use miletrack_domain::{Identifiable, NamedEntity};

const PLACEHOLDER: &str = "-";

/// Whole miles with thousands separators, e.g. `12,345`.
pub fn format_miles(value: f64) -> String {
    if !value.is_finite() {
        return "invalid".into();
    }
    let rounded = value.round();
    let digits = group_digits(&format!("{:.0}", rounded.abs()));
    if rounded < 0.0 {
        format!("-{}", digits)
    } else {
        digits
    }
}

/// Miles with an explicit sign, used for deltas and deviations.
pub fn format_signed_miles(value: f64) -> String {
    if value.is_finite() && value.round() > 0.0 {
        format!("+{}", format_miles(value))
    } else {
        format_miles(value)
    }
}

pub fn format_optional_miles(value: Option<f64>) -> String {
    value.map(format_miles).unwrap_or_else(|| PLACEHOLDER.into())
}

pub fn format_optional_signed(value: Option<f64>) -> String {
    value
        .map(format_signed_miles)
        .unwrap_or_else(|| PLACEHOLDER.into())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// First eight hex digits of an id; enough to address it in commands.
pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

/// Quoted name followed by the short id, e.g. `` `Work` (1a2b3c4d) ``.
pub fn named_ref<T: Identifiable + NamedEntity>(entity: &T) -> String {
    format!("`{}` ({})", entity.name(), short_id(entity.id()))
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, ',');
        }
        grouped.insert(0, ch);
    }
    grouped
}
