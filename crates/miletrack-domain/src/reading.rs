//! Domain model for dated odometer readings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// A dated odometer snapshot for a car.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: Uuid,
    pub car_id: Uuid,
    /// Nominal date of the reading, usually a week boundary.
    pub date: NaiveDate,
    pub mileage: f64,
    pub recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Reading {
    pub fn new(car_id: Uuid, date: NaiveDate, mileage: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            car_id,
            date,
            mileage,
            recorded_at: Utc::now(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        self.notes = if notes.trim().is_empty() {
            None
        } else {
            Some(notes)
        };
        self
    }

    pub fn recorded_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.recorded_at = timestamp;
        self
    }

    pub fn has_valid_mileage(&self) -> bool {
        self.mileage.is_finite() && self.mileage >= 0.0
    }
}

impl Identifiable for Reading {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Reading {
    fn display_label(&self) -> String {
        format!("{} @ {:.1} mi", self.date, self.mileage)
    }
}
