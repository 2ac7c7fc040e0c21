use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use miletrack_domain::Garage;

use crate::CoreError;

/// Describes a persisted backup artifact for a garage.
#[derive(Debug, Clone)]
pub struct GarageBackupInfo {
    pub garage: String,
    pub id: String,
    pub created_at: String,
    pub path: PathBuf,
}

/// Abstraction over persistence backends capable of storing garages and backups.
pub trait GarageStorage: Send + Sync {
    fn save_garage(&self, name: &str, garage: &Garage) -> Result<(), CoreError>;
    fn load_garage(&self, name: &str) -> Result<Garage, CoreError>;
    fn list_garages(&self) -> Result<Vec<String>, CoreError>;
    fn delete_garage(&self, name: &str) -> Result<(), CoreError>;
    fn save_garage_to_path(&self, garage: &Garage, path: &Path) -> Result<(), CoreError>;
    fn load_garage_from_path(&self, path: &Path) -> Result<Garage, CoreError>;
    fn backup_garage(
        &self,
        name: &str,
        garage: &Garage,
        note: Option<&str>,
    ) -> Result<GarageBackupInfo, CoreError>;
    fn list_backups(&self, name: &str) -> Result<Vec<GarageBackupInfo>, CoreError>;
    fn restore_backup(&self, backup: &GarageBackupInfo) -> Result<Garage, CoreError>;
}

/// Detects dangling references and other anomalies within a garage snapshot.
pub fn garage_warnings(garage: &Garage) -> Vec<String> {
    let car_ids: HashSet<_> = garage.cars.iter().map(|car| car.id).collect();
    let mut warnings = Vec::new();

    for reading in &garage.readings {
        if !car_ids.contains(&reading.car_id) {
            warnings.push(format!(
                "reading {} references unknown car {}",
                reading.id, reading.car_id
            ));
        }
        if !reading.has_valid_mileage() {
            warnings.push(format!(
                "reading {} on {} has invalid mileage {}",
                reading.id, reading.date, reading.mileage
            ));
        }
    }
    let defaults = garage.cars.iter().filter(|car| car.is_default).count();
    if defaults > 1 {
        warnings.push(format!("{} cars are flagged as default", defaults));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use miletrack_domain::{Car, Reading};
    use uuid::Uuid;

    #[test]
    fn clean_garage_has_no_warnings() {
        let mut garage = Garage::new("Clean");
        let car = Car::new("Work", None);
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        garage.readings.push(Reading::new(car.id, date, 10.0));
        garage.cars.push(car);
        assert!(garage_warnings(&garage).is_empty());
    }

    #[test]
    fn orphans_and_duplicate_defaults_are_reported() {
        let mut garage = Garage::new("Messy");
        let mut first = Car::new("First", None);
        let mut second = Car::new("Second", None);
        first.is_default = true;
        second.is_default = true;
        garage.cars.push(first);
        garage.cars.push(second);
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        garage.readings.push(Reading::new(Uuid::new_v4(), date, 10.0));

        let warnings = garage_warnings(&garage);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("unknown car"));
        assert!(warnings[1].contains("2 cars"));
    }
}
