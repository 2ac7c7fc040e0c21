use tracing::{debug, info};
use uuid::Uuid;

use miletrack_domain::{Car, Garage};

use crate::CoreError;

pub struct CarService;

impl CarService {
    /// Adds a car after validation. The first car of a garage becomes its default.
    pub fn add(garage: &mut Garage, mut car: Car) -> Result<Uuid, CoreError> {
        Self::validate(garage, None, &car)?;
        if garage.cars.is_empty() {
            car.is_default = true;
        } else if car.is_default {
            Self::clear_defaults(garage);
        }
        let id = car.id;
        debug!(car = %id, name = %car.name, "adding car");
        garage.cars.push(car);
        garage.touch();
        Ok(id)
    }

    /// Replaces the editable fields of a car. Identity, creation time and the default flag stay.
    pub fn edit(garage: &mut Garage, id: Uuid, changes: Car) -> Result<(), CoreError> {
        Self::validate(garage, Some(id), &changes)?;
        let car = garage
            .car_mut(id)
            .ok_or_else(|| CoreError::CarNotFound(id.to_string()))?;
        car.name = changes.name;
        car.annual_limit = changes.annual_limit;
        car.delivery_mileage = changes.delivery_mileage;
        car.contract_end_date = changes.contract_end_date;
        car.contract_months = changes.contract_months;
        car.registration_number = changes.registration_number;
        garage.touch();
        Ok(())
    }

    /// Removes a car together with its readings.
    ///
    /// When the default car is removed, the oldest remaining car takes over the flag.
    pub fn remove(garage: &mut Garage, id: Uuid) -> Result<Car, CoreError> {
        let index = garage
            .cars
            .iter()
            .position(|car| car.id == id)
            .ok_or_else(|| CoreError::CarNotFound(id.to_string()))?;
        let removed = garage.cars.remove(index);
        let before = garage.readings.len();
        garage.readings.retain(|reading| reading.car_id != id);
        let dropped = before - garage.readings.len();
        if removed.is_default {
            if let Some(successor) = garage.cars.iter_mut().min_by_key(|car| car.created_at) {
                successor.is_default = true;
            }
        }
        info!(car = %id, readings = dropped, "removed car");
        garage.touch();
        Ok(removed)
    }

    /// Marks `id` as the default car and clears the flag on every other car.
    pub fn set_default(garage: &mut Garage, id: Uuid) -> Result<(), CoreError> {
        if garage.car(id).is_none() {
            return Err(CoreError::CarNotFound(id.to_string()));
        }
        for car in garage.cars.iter_mut() {
            car.is_default = car.id == id;
        }
        garage.touch();
        Ok(())
    }

    pub fn default_car(garage: &Garage) -> Option<&Car> {
        garage.default_car()
    }

    pub fn list(garage: &Garage) -> Vec<&Car> {
        garage.cars.iter().collect()
    }

    /// Resolves a car by full id, case-insensitive name, or unique id prefix.
    pub fn find<'a>(garage: &'a Garage, query: &str) -> Result<&'a Car, CoreError> {
        let needle = query.trim();
        if let Ok(id) = Uuid::parse_str(needle) {
            return garage
                .car(id)
                .ok_or_else(|| CoreError::CarNotFound(needle.to_string()));
        }
        let lowered = needle.to_ascii_lowercase();
        if let Some(car) = garage
            .cars
            .iter()
            .find(|car| car.name.trim().to_ascii_lowercase() == lowered)
        {
            return Ok(car);
        }
        let matches: Vec<&Car> = garage
            .cars
            .iter()
            .filter(|car| !lowered.is_empty() && car.id.simple().to_string().starts_with(&lowered))
            .collect();
        match matches.as_slice() {
            [car] => Ok(*car),
            [] => Err(CoreError::CarNotFound(needle.to_string())),
            _ => Err(CoreError::Validation(format!(
                "`{}` matches more than one car",
                needle
            ))),
        }
    }

    fn clear_defaults(garage: &mut Garage) {
        for car in garage.cars.iter_mut() {
            car.is_default = false;
        }
    }

    fn validate(garage: &Garage, exclude: Option<Uuid>, car: &Car) -> Result<(), CoreError> {
        let name = car.name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("car name must not be empty".into()));
        }
        let normalized = name.to_ascii_lowercase();
        let duplicate = garage.cars.iter().any(|existing| {
            existing.name.trim().to_ascii_lowercase() == normalized
                && exclude.map_or(true, |id| existing.id != id)
        });
        if duplicate {
            return Err(CoreError::Validation(format!(
                "car `{}` already exists",
                name
            )));
        }
        if let Some(limit) = car.annual_limit {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(CoreError::Validation(
                    "annual limit must be a positive number".into(),
                ));
            }
        }
        if !car.delivery_mileage.is_finite() || car.delivery_mileage < 0.0 {
            return Err(CoreError::Validation(
                "delivery mileage must be a non-negative number".into(),
            ));
        }
        match (car.contract_end_date, car.contract_months) {
            (Some(_), Some(0)) => Err(CoreError::Validation(
                "contract length must be at least one month".into(),
            )),
            (Some(_), None) | (None, Some(_)) => Err(CoreError::Validation(
                "contract end date and contract length must be given together".into(),
            )),
            _ => Ok(()),
        }
    }
}
