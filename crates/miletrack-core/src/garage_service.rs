//! Helper functions for garage-level orchestration.

use miletrack_domain::Garage;

use crate::CoreError;

/// Provides constructor and mutation helpers for [`Garage`] instances.
pub struct GarageService;

impl GarageService {
    /// Creates an empty garage. The name must not be blank.
    pub fn create(name: &str) -> Result<Garage, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("garage name must not be empty".into()));
        }
        Ok(Garage::new(name))
    }

    pub fn rename(garage: &mut Garage, new_name: &str) -> Result<(), CoreError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(CoreError::Validation("garage name must not be empty".into()));
        }
        garage.name = new_name.to_string();
        garage.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_required() {
        let mut garage = GarageService::create("  Family ").unwrap();
        assert_eq!(garage.name, "Family");
        assert!(GarageService::create("   ").is_err());

        GarageService::rename(&mut garage, " Fleet ").unwrap();
        assert_eq!(garage.name, "Fleet");
        assert_eq!(garage.revision, 1);
        assert!(GarageService::rename(&mut garage, "").is_err());
        assert_eq!(garage.revision, 1);
    }
}
