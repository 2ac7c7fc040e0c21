//! The garage is the persisted collection of one user's cars and readings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{car::Car, common::*, reading::Reading};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Garage {
    pub name: String,
    #[serde(default)]
    pub cars: Vec<Car>,
    #[serde(default)]
    pub readings: Vec<Reading>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by every mutation. Derived values may be cached per revision.
    #[serde(default)]
    pub revision: u64,
}

impl Garage {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            cars: Vec::new(),
            readings: Vec::new(),
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn car(&self, id: Uuid) -> Option<&Car> {
        self.cars.iter().find(|car| car.id == id)
    }

    pub fn car_mut(&mut self, id: Uuid) -> Option<&mut Car> {
        self.cars.iter_mut().find(|car| car.id == id)
    }

    pub fn reading(&self, id: Uuid) -> Option<&Reading> {
        self.readings.iter().find(|reading| reading.id == id)
    }

    /// Readings owned by `car_id`, in storage order.
    pub fn readings_for(&self, car_id: Uuid) -> Vec<Reading> {
        self.readings
            .iter()
            .filter(|reading| reading.car_id == car_id)
            .cloned()
            .collect()
    }

    pub fn default_car(&self) -> Option<&Car> {
        self.cars.iter().find(|car| car.is_default)
    }
}

impl NamedEntity for Garage {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Garage {
    fn display_label(&self) -> String {
        format!(
            "{} ({} cars, {} readings)",
            self.name,
            self.cars.len(),
            self.readings.len()
        )
    }
}
