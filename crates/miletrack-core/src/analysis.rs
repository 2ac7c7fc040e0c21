//! Reading analysis: weekly deltas, projected mileage, deviation and pace status.

use chrono::NaiveDate;

use miletrack_domain::{Car, Reading};

use crate::{
    classification::{ClassificationRule, PaceStatus},
    projection::ProjectionEngine,
};

/// A reading enriched with the values derived from its neighbours and the car's contract.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedReading {
    pub reading: Reading,
    /// Mileage since the chronologically preceding reading; `None` for the oldest one.
    pub weekly_delta: Option<f64>,
    pub expected_mileage: Option<f64>,
    /// Actual minus expected mileage. Negative means under pace.
    pub expected_deviation: Option<f64>,
    pub status: PaceStatus,
}

impl AnalyzedReading {
    pub fn date(&self) -> NaiveDate {
        self.reading.date
    }

    pub fn mileage(&self) -> f64 {
        self.reading.mileage
    }

    /// Status label, with the absolute deviation for deviation-based statuses.
    pub fn status_label(&self) -> String {
        match (self.status, self.expected_deviation) {
            (PaceStatus::OnTrack, Some(deviation)) => {
                format!("On track ({:.0} under)", deviation.abs())
            }
            (PaceStatus::Over, Some(deviation)) => format!("Over ({:.0} over)", deviation.abs()),
            (status, _) => status.label().to_string(),
        }
    }
}

/// One point of the actual-vs-expected mileage series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub actual: f64,
    /// Expected mileage rounded to whole miles.
    pub expected: Option<f64>,
}

pub struct ReadingAnalyzer;

impl ReadingAnalyzer {
    /// Enriches `readings` for presentation, most recent first.
    ///
    /// Sorting is stable: readings sharing a date keep their input order. The
    /// input slice is never modified.
    pub fn analyze(
        car: &Car,
        readings: &[Reading],
        rule: &ClassificationRule,
    ) -> Vec<AnalyzedReading> {
        let sorted = Self::sorted_newest_first(readings);
        sorted
            .iter()
            .enumerate()
            .map(|(index, reading)| {
                let weekly_delta = sorted
                    .get(index + 1)
                    .map(|previous| reading.mileage - previous.mileage);
                let expected_mileage = ProjectionEngine::expected_mileage(car, reading.date);
                let expected_deviation =
                    expected_mileage.map(|expected| reading.mileage - expected);
                let status = if reading.mileage.is_finite() {
                    rule.classify(car, weekly_delta, expected_deviation)
                } else {
                    PaceStatus::Invalid
                };
                AnalyzedReading {
                    reading: (*reading).clone(),
                    weekly_delta,
                    expected_mileage,
                    expected_deviation,
                    status,
                }
            })
            .collect()
    }

    /// Actual and expected mileage per reading, oldest first.
    ///
    /// Empty when the car has no annual limit, since there is nothing to compare against.
    pub fn chart_series(car: &Car, readings: &[Reading]) -> Vec<SeriesPoint> {
        if car.effective_annual_limit().is_none() {
            return Vec::new();
        }
        let mut sorted: Vec<&Reading> = readings.iter().collect();
        sorted.sort_by_key(|reading| reading.date);
        sorted
            .into_iter()
            .map(|reading| SeriesPoint {
                date: reading.date,
                actual: reading.mileage,
                expected: ProjectionEngine::expected_mileage(car, reading.date)
                    .map(|expected| expected.round()),
            })
            .collect()
    }

    /// Readings with a non-finite or negative mileage.
    pub fn invalid_readings(readings: &[Reading]) -> Vec<&Reading> {
        readings
            .iter()
            .filter(|reading| !reading.has_valid_mileage())
            .collect()
    }

    fn sorted_newest_first(readings: &[Reading]) -> Vec<&Reading> {
        let mut sorted: Vec<&Reading> = readings.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reading(car: &Car, day: NaiveDate, mileage: f64) -> Reading {
        Reading::new(car.id, day, mileage)
    }

    #[test]
    fn readings_are_sorted_newest_first_with_deltas() {
        let car = Car::new("Weekly", Some(5_000.0));
        let readings = vec![
            reading(&car, date(2025, 1, 12), 1_150.0),
            reading(&car, date(2025, 1, 5), 1_000.0),
            reading(&car, date(2025, 1, 19), 1_300.0),
        ];
        let analyzed = ReadingAnalyzer::analyze(&car, &readings, &ClassificationRule::default());

        let dates: Vec<NaiveDate> = analyzed.iter().map(AnalyzedReading::date).collect();
        assert_eq!(
            dates,
            vec![date(2025, 1, 19), date(2025, 1, 12), date(2025, 1, 5)]
        );
        assert_eq!(analyzed[0].weekly_delta, Some(150.0));
        assert_eq!(analyzed[1].weekly_delta, Some(150.0));
        assert_eq!(analyzed[2].weekly_delta, None);
        assert_eq!(analyzed[0].status, PaceStatus::OverLimit);
        assert_eq!(analyzed[2].status, PaceStatus::NoData);
    }

    #[test]
    fn no_annual_limit_leaves_expected_fields_empty() {
        let car = Car::new("Free", None);
        let readings = vec![
            reading(&car, date(2025, 2, 2), 10.0),
            reading(&car, date(2025, 2, 9), 40.0),
        ];
        for rule in [
            ClassificationRule::default(),
            ClassificationRule::DeviationSign,
            ClassificationRule::CarPace,
        ] {
            let analyzed = ReadingAnalyzer::analyze(&car, &readings, &rule);
            assert!(analyzed
                .iter()
                .all(|item| item.expected_mileage.is_none() && item.expected_deviation.is_none()));
        }
        assert!(ReadingAnalyzer::chart_series(&car, &readings).is_empty());
    }

    #[test]
    fn deviation_rule_reports_magnitude() {
        let car = Car::new("Daily", Some(5_000.0)).with_delivery_mileage(100.0);
        let readings = vec![reading(&car, date(2025, 4, 11), 300.0)];
        let analyzed =
            ReadingAnalyzer::analyze(&car, &readings, &ClassificationRule::DeviationSign);

        let only = &analyzed[0];
        assert!((only.expected_mileage.unwrap() - 1469.863).abs() < 0.001);
        assert!((only.expected_deviation.unwrap() + 1169.863).abs() < 0.001);
        assert_eq!(only.status, PaceStatus::OnTrack);
        assert_eq!(only.status_label(), "On track (1170 under)");
    }

    #[test]
    fn ties_keep_input_order() {
        let car = Car::new("Same day", None);
        let first = reading(&car, date(2025, 3, 2), 100.0);
        let second = reading(&car, date(2025, 3, 2), 120.0);
        let analyzed = ReadingAnalyzer::analyze(
            &car,
            &[first.clone(), second.clone()],
            &ClassificationRule::default(),
        );
        assert_eq!(analyzed[0].reading.id, first.id);
        assert_eq!(analyzed[1].reading.id, second.id);
        assert_eq!(analyzed[0].weekly_delta, Some(-20.0));
    }

    #[test]
    fn non_finite_mileage_is_flagged_invalid() {
        let car = Car::new("Broken", Some(5_000.0));
        let readings = vec![
            reading(&car, date(2025, 3, 2), 100.0),
            reading(&car, date(2025, 3, 9), f64::NAN),
        ];
        let analyzed = ReadingAnalyzer::analyze(&car, &readings, &ClassificationRule::default());
        assert_eq!(analyzed[0].status, PaceStatus::Invalid);
        assert!(analyzed[0].weekly_delta.unwrap().is_nan());
        assert_eq!(ReadingAnalyzer::invalid_readings(&readings).len(), 1);
    }

    #[test]
    fn chart_series_is_oldest_first_and_rounded() {
        let car = Car::new("Chart", Some(3_650.0)).with_delivery_mileage(0.4);
        let readings = vec![
            reading(&car, date(2025, 1, 21), 180.0),
            reading(&car, date(2025, 1, 11), 90.0),
        ];
        let series = ReadingAnalyzer::chart_series(&car, &readings);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, date(2025, 1, 11));
        assert_eq!(series[0].expected, Some(100.0));
        assert_eq!(series[1].expected, Some(200.0));
        assert_eq!(series[1].actual, 180.0);
    }
}
