//! Domain model for tracked vehicles and their lease contract terms.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// A tracked vehicle with an annual mileage allowance and optional contract terms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: Uuid,
    pub name: String,
    /// Allowance in miles per year. `None` disables every projection for the car.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_limit: Option<f64>,
    /// Odometer value at the start of the tracked contract period.
    #[serde(default)]
    pub delivery_mileage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_months: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Car {
    pub fn new(name: impl Into<String>, annual_limit: Option<f64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            annual_limit,
            delivery_mileage: 0.0,
            contract_end_date: None,
            contract_months: None,
            registration_number: None,
            is_default: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_delivery_mileage(mut self, mileage: f64) -> Self {
        self.delivery_mileage = mileage;
        self
    }

    pub fn with_contract(mut self, end_date: NaiveDate, months: u32) -> Self {
        self.contract_end_date = Some(end_date);
        self.contract_months = Some(months);
        self
    }

    pub fn with_registration(mut self, registration: impl Into<String>) -> Self {
        self.registration_number = Some(registration.into());
        self
    }

    /// Contract end date and length, only when both are present and the length is positive.
    pub fn contract_terms(&self) -> Option<(NaiveDate, u32)> {
        match (self.contract_end_date, self.contract_months) {
            (Some(end), Some(months)) if months > 0 => Some((end, months)),
            _ => None,
        }
    }

    /// Annual limit when one is configured and usable for projections.
    pub fn effective_annual_limit(&self) -> Option<f64> {
        self.annual_limit.filter(|limit| *limit != 0.0 && !limit.is_nan())
    }
}

impl Identifiable for Car {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Car {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Car {
    fn display_label(&self) -> String {
        let mut label = self.name.clone();
        if let Some(registration) = self
            .registration_number
            .as_deref()
            .filter(|value| !value.trim().is_empty())
        {
            label.push_str(&format!(" ({registration})"));
        }
        if self.is_default {
            label.push_str(" [default]");
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_terms_require_both_fields() {
        let end = NaiveDate::from_ymd_opt(2027, 6, 30).unwrap();
        let mut car = Car::new("Work", Some(10_000.0));
        assert!(car.contract_terms().is_none());

        car.contract_end_date = Some(end);
        assert!(car.contract_terms().is_none());

        car.contract_months = Some(0);
        assert!(car.contract_terms().is_none());

        car.contract_months = Some(36);
        assert_eq!(car.contract_terms(), Some((end, 36)));
    }

    #[test]
    fn serializes_with_document_field_names() {
        let car = Car::new("Family", Some(8_000.0))
            .with_delivery_mileage(120.0)
            .with_contract(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(), 24)
            .with_registration("AB12 CDE");
        let json = serde_json::to_value(&car).unwrap();

        assert_eq!(json["annualLimit"], 8_000.0);
        assert_eq!(json["deliveryMileage"], 120.0);
        assert_eq!(json["contractEndDate"], "2026-01-31");
        assert_eq!(json["contractMonths"], 24);
        assert_eq!(json["registrationNumber"], "AB12 CDE");
        assert_eq!(json["isDefault"], false);
    }

    #[test]
    fn missing_delivery_mileage_defaults_to_zero() {
        let json = r#"{
            "id": "6f1c1d57-9b0e-4a53-8f9e-0d6f0e6f6a11",
            "name": "Legacy",
            "annualLimit": 5000,
            "createdAt": "2024-01-01T00:00:00Z"
        }"#;
        let car: Car = serde_json::from_str(json).unwrap();

        assert_eq!(car.delivery_mileage, 0.0);
        assert!(!car.is_default);
        assert_eq!(car.annual_limit, Some(5000.0));
    }

    #[test]
    fn display_label_mentions_registration_and_default() {
        let mut car = Car::new("Work", None).with_registration("XY99");
        car.is_default = true;
        assert_eq!(car.display_label(), "Work (XY99) [default]");
    }
}
