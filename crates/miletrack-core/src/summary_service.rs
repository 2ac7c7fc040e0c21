use chrono::NaiveDate;

use miletrack_domain::{days_between, Car, Reading};

use crate::projection::{ContractWindow, ProjectionEngine, ProjectionMode};

/// Progress of one car against its allowance.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSummary {
    pub car_name: String,
    pub reading_count: usize,
    pub latest: Option<Reading>,
    pub expected_at_latest: Option<f64>,
    /// Latest mileage minus the expected mileage on that date.
    pub deviation_at_latest: Option<f64>,
    pub expected_today: Option<f64>,
    /// Miles per week between the oldest and the latest reading.
    pub average_weekly: Option<f64>,
    pub mode: Option<ProjectionMode>,
    pub contract: Option<ContractWindow>,
    /// `delivery + total - latest mileage`, contract mode only.
    pub remaining_allowance: Option<f64>,
}

impl ProgressSummary {
    pub fn is_over(&self) -> bool {
        self.deviation_at_latest.is_some_and(|deviation| deviation > 0.0)
    }
}

pub struct SummaryService;

impl SummaryService {
    pub fn progress(car: &Car, readings: &[Reading], today: NaiveDate) -> ProgressSummary {
        let valid: Vec<&Reading> = readings
            .iter()
            .filter(|reading| reading.car_id == car.id && reading.has_valid_mileage())
            .collect();
        // Later entries win ties so a correction recorded on the same date counts.
        let latest = valid
            .iter()
            .copied()
            .max_by_key(|reading| reading.date)
            .cloned();
        let oldest = valid.iter().copied().min_by_key(|reading| reading.date);

        let expected_at_latest = latest
            .as_ref()
            .and_then(|reading| ProjectionEngine::expected_mileage(car, reading.date));
        let deviation_at_latest = match (&latest, expected_at_latest) {
            (Some(reading), Some(expected)) => Some(reading.mileage - expected),
            _ => None,
        };
        let average_weekly = match (oldest, &latest) {
            (Some(first), Some(last)) => {
                let days = days_between(first.date, last.date);
                (days > 0).then(|| (last.mileage - first.mileage) / days as f64 * 7.0)
            }
            _ => None,
        };
        let contract = ProjectionEngine::contract_window(car);
        let remaining_allowance = match (contract, &latest) {
            (Some(window), Some(reading)) => {
                Some(car.delivery_mileage + window.total_miles - reading.mileage)
            }
            _ => None,
        };

        ProgressSummary {
            car_name: car.name.clone(),
            reading_count: valid.len(),
            latest,
            expected_at_latest,
            deviation_at_latest,
            expected_today: ProjectionEngine::expected_mileage(car, today),
            average_weekly,
            mode: ProjectionMode::for_car(car),
            contract,
            remaining_allowance,
        }
    }
}
