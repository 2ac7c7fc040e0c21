//! Expected-mileage projection for a car at a calendar date.
//!
//! Two mutually exclusive modes exist. When the car carries both a contract end
//! date and a positive contract length, the contract allowance is prorated
//! linearly across the contract window. Otherwise the annual allowance is
//! spread over each calendar year starting on January 1.

use std::fmt;

use chrono::NaiveDate;

use miletrack_domain::{days_between, shift_month, year_start, Car};

/// Day count used for the calendar-year daily rate.
pub const DAYS_PER_YEAR: f64 = 365.0;
const MONTHS_PER_YEAR: f64 = 12.0;

/// Resolved contract period of a car together with its total mileage allowance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContractWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Length of the window in days, never less than one.
    pub span_days: i64,
    pub total_miles: f64,
}

impl ContractWindow {
    pub fn from_terms(end: NaiveDate, months: u32, annual_limit: f64) -> Self {
        let start = shift_month(end, -i64::from(months));
        Self {
            start,
            end,
            span_days: days_between(start, end).max(1),
            total_miles: annual_limit * (f64::from(months) / MONTHS_PER_YEAR),
        }
    }

    /// Days elapsed since the contract start, clamped to `[0, span_days]`.
    pub fn elapsed_days(&self, date: NaiveDate) -> i64 {
        days_between(self.start, date).clamp(0, self.span_days)
    }

    pub fn fraction_elapsed(&self, date: NaiveDate) -> f64 {
        self.elapsed_days(date) as f64 / self.span_days as f64
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    ContractProrated(ContractWindow),
    CalendarYear,
}

impl ProjectionMode {
    /// Selects the projection mode for `car`. `None` when the car has no annual limit.
    pub fn for_car(car: &Car) -> Option<Self> {
        let annual_limit = car.effective_annual_limit()?;
        let mode = match car.contract_terms() {
            Some((end, months)) => {
                let window = ContractWindow::from_terms(end, months, annual_limit);
                ProjectionMode::ContractProrated(window)
            }
            None => ProjectionMode::CalendarYear,
        };
        Some(mode)
    }
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionMode::ContractProrated(window) => {
                write!(f, "Contract {} to {}", window.start, window.end)
            }
            ProjectionMode::CalendarYear => f.write_str("Calendar year"),
        }
    }
}

pub struct ProjectionEngine;

impl ProjectionEngine {
    /// Mileage the car is expected to show on `date`, or `None` without an annual limit.
    pub fn expected_mileage(car: &Car, date: NaiveDate) -> Option<f64> {
        let annual_limit = car.effective_annual_limit()?;
        let delivery = car.delivery_mileage;
        let expected = match ProjectionMode::for_car(car)? {
            ProjectionMode::ContractProrated(window) => {
                delivery + window.total_miles * window.fraction_elapsed(date)
            }
            ProjectionMode::CalendarYear => {
                let days_into_year = days_between(year_start(date), date) as f64;
                delivery + (annual_limit / DAYS_PER_YEAR) * days_into_year
            }
        };
        Some(expected)
    }

    pub fn contract_window(car: &Car) -> Option<ContractWindow> {
        match ProjectionMode::for_car(car)? {
            ProjectionMode::ContractProrated(window) => Some(window),
            ProjectionMode::CalendarYear => None,
        }
    }

    /// Allowed miles per day under the calendar-year rate.
    pub fn daily_allowance(car: &Car) -> Option<f64> {
        car.effective_annual_limit().map(|annual_limit| annual_limit / DAYS_PER_YEAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    fn contract_car() -> Car {
        Car::new("Lease", Some(12_000.0))
            .with_delivery_mileage(50.0)
            .with_contract(date(2027, 6, 30), 36)
    }

    #[test]
    fn no_annual_limit_yields_no_projection() {
        let car = Car::new("Untracked", None).with_delivery_mileage(500.0);
        assert!(ProjectionEngine::expected_mileage(&car, date(2025, 6, 1)).is_none());
        assert!(ProjectionMode::for_car(&car).is_none());
        assert!(ProjectionEngine::daily_allowance(&car).is_none());
    }

    #[test]
    fn zero_annual_limit_is_treated_as_missing() {
        let car = Car::new("Zero", Some(0.0));
        assert!(ProjectionEngine::expected_mileage(&car, date(2025, 6, 1)).is_none());
    }

    #[test]
    fn calendar_year_starts_at_delivery_on_january_first() {
        let car = Car::new("Daily", Some(5_000.0)).with_delivery_mileage(100.0);
        for year in [2023, 2024, 2025] {
            let expected = ProjectionEngine::expected_mileage(&car, date(year, 1, 1)).unwrap();
            assert_close(expected, 100.0);
        }
    }

    #[test]
    fn calendar_year_prorates_by_day() {
        let car = Car::new("Daily", Some(5_000.0)).with_delivery_mileage(100.0);
        // 2025-04-11 is day 100 counted from January 1.
        let expected = ProjectionEngine::expected_mileage(&car, date(2025, 4, 11)).unwrap();
        assert_close(expected, 100.0 + (5_000.0 / 365.0) * 100.0);
        assert!((expected - 1469.863).abs() < 0.001);
    }

    #[test]
    fn calendar_year_does_not_clamp_in_leap_years() {
        let car = Car::new("Daily", Some(3_650.0));
        // December 31 of a leap year is day 365.
        let expected = ProjectionEngine::expected_mileage(&car, date(2024, 12, 31)).unwrap();
        assert_close(expected, 3_650.0);
    }

    #[test]
    fn contract_window_spans_contract_months() {
        let window = ProjectionEngine::contract_window(&contract_car()).unwrap();
        assert_eq!(window.start, date(2024, 6, 30));
        assert_eq!(window.end, date(2027, 6, 30));
        assert_eq!(window.span_days, 1095);
        assert_close(window.total_miles, 36_000.0);
    }

    #[test]
    fn contract_mode_reaches_full_allowance_at_end_date() {
        let car = contract_car();
        let expected = ProjectionEngine::expected_mileage(&car, date(2027, 6, 30)).unwrap();
        assert_close(expected, 50.0 + 12_000.0 * 3.0);
    }

    #[test]
    fn contract_mode_saturates_after_end_date() {
        let car = contract_car();
        let expected = ProjectionEngine::expected_mileage(&car, date(2029, 1, 1)).unwrap();
        assert_close(expected, 36_050.0);
    }

    #[test]
    fn contract_mode_clamps_before_start_to_delivery() {
        let car = contract_car();
        for day in [date(2024, 6, 29), date(2020, 1, 1)] {
            let expected = ProjectionEngine::expected_mileage(&car, day).unwrap();
            assert_close(expected, 50.0);
        }
    }

    #[test]
    fn contract_mode_prorates_linearly() {
        let car = Car::new("Lease", Some(10_000.0)).with_contract(date(2025, 1, 1), 12);
        // 2024 is a leap year: the window is 366 days long.
        let expected = ProjectionEngine::expected_mileage(&car, date(2024, 7, 2)).unwrap();
        assert_close(expected, 10_000.0 * (183.0 / 366.0));
    }

    #[test]
    fn partial_contract_terms_fall_back_to_calendar_year() {
        let mut car = Car::new("Half", Some(3_650.0));
        car.contract_end_date = Some(date(2026, 1, 1));
        let expected = ProjectionEngine::expected_mileage(&car, date(2025, 1, 11)).unwrap();
        assert_close(expected, 100.0);
        assert_eq!(ProjectionMode::for_car(&car), Some(ProjectionMode::CalendarYear));
    }

    #[test]
    fn contract_span_never_divides_by_zero() {
        let window = ContractWindow::from_terms(date(2025, 1, 1), u32::MAX, 1_000.0);
        assert!(window.span_days >= 1);
        assert!(window.fraction_elapsed(date(2025, 1, 1)).is_finite());
    }
}
