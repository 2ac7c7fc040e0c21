use chrono::{Duration, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use miletrack_domain::{week_start_sunday, Garage, Reading};

use crate::{time::Clock, CoreError};

pub struct ReadingService;

impl ReadingService {
    pub fn add(garage: &mut Garage, reading: Reading) -> Result<Uuid, CoreError> {
        if garage.car(reading.car_id).is_none() {
            return Err(CoreError::CarNotFound(reading.car_id.to_string()));
        }
        if !reading.has_valid_mileage() {
            return Err(CoreError::Validation(
                "mileage must be a non-negative number".into(),
            ));
        }
        let id = reading.id;
        debug!(
            reading = %id,
            car = %reading.car_id,
            date = %reading.date,
            mileage = reading.mileage,
            "adding reading"
        );
        garage.readings.push(reading);
        garage.touch();
        Ok(id)
    }

    pub fn remove(garage: &mut Garage, id: Uuid) -> Result<Reading, CoreError> {
        let index = garage
            .readings
            .iter()
            .position(|reading| reading.id == id)
            .ok_or(CoreError::ReadingNotFound(id))?;
        let removed = garage.readings.remove(index);
        garage.touch();
        Ok(removed)
    }

    /// Readings of `car_id` in storage order.
    pub fn for_car(garage: &Garage, car_id: Uuid) -> Vec<&Reading> {
        garage
            .readings
            .iter()
            .filter(|reading| reading.car_id == car_id)
            .collect()
    }

    /// Most recent reading of `car_id` by date; the later stored one wins a tie.
    pub fn latest(garage: &Garage, car_id: Uuid) -> Option<&Reading> {
        Self::for_car(garage, car_id)
            .into_iter()
            .max_by_key(|reading| reading.date)
    }

    /// Resolves a reading of `car_id` by full id or unique id prefix.
    pub fn find<'a>(
        garage: &'a Garage,
        car_id: Uuid,
        query: &str,
    ) -> Result<&'a Reading, CoreError> {
        let needle = query.trim().to_ascii_lowercase();
        if let Ok(id) = Uuid::parse_str(&needle) {
            return garage
                .reading(id)
                .filter(|reading| reading.car_id == car_id)
                .ok_or(CoreError::ReadingNotFound(id));
        }
        let matches: Vec<&Reading> = Self::for_car(garage, car_id)
            .into_iter()
            .filter(|reading| {
                !needle.is_empty() && reading.id.simple().to_string().starts_with(&needle)
            })
            .collect();
        match matches.as_slice() {
            [reading] => Ok(*reading),
            [] => Err(CoreError::InvalidOperation(format!(
                "no reading matches `{}`",
                query.trim()
            ))),
            _ => Err(CoreError::Validation(format!(
                "`{}` matches more than one reading",
                query.trim()
            ))),
        }
    }

    /// Default date for a new reading: the most recent Sunday.
    pub fn suggested_date(clock: &dyn Clock) -> NaiveDate {
        week_start_sunday(clock.today())
    }

    /// Date suggested after recording a reading on `date`: one week later.
    pub fn next_suggested_date(date: NaiveDate) -> NaiveDate {
        date + Duration::days(7)
    }
}
