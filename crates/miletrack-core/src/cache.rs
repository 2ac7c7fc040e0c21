//! Memoized reading analysis keyed on the garage revision.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use miletrack_domain::Garage;

use crate::{
    analysis::{AnalyzedReading, ReadingAnalyzer},
    classification::ClassificationRule,
    CoreError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    car_id: Uuid,
    revision: u64,
    rule: (u8, u64),
}

/// Caches analyzer output per (car, garage revision, rule).
///
/// Any mutation of the garage bumps its revision, which makes earlier entries
/// unreachable; they are dropped on the next miss.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: HashMap<CacheKey, Vec<AnalyzedReading>>,
    hits: u64,
    misses: u64,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(
        &mut self,
        garage: &Garage,
        car_id: Uuid,
        rule: &ClassificationRule,
    ) -> Result<&[AnalyzedReading], CoreError> {
        let car = garage
            .car(car_id)
            .ok_or_else(|| CoreError::CarNotFound(car_id.to_string()))?;
        let key = CacheKey {
            car_id,
            revision: garage.revision,
            rule: rule.cache_key(),
        };
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
            self.entries.retain(|existing, _| existing.revision == garage.revision);
            let analyzed = ReadingAnalyzer::analyze(car, &garage.readings_for(car_id), rule);
            debug!(
                car = %car_id,
                revision = garage.revision,
                readings = analyzed.len(),
                "analysis cache miss"
            );
            self.entries.insert(key, analyzed);
        }
        Ok(self.entries.get(&key).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Drops every entry, e.g. after a different garage is loaded.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use miletrack_domain::{Car, Reading};

    fn garage_with_car() -> (Garage, Uuid) {
        let mut garage = Garage::new("Cache");
        let car = Car::new("Cached", Some(5_000.0));
        let id = car.id;
        garage.cars.push(car);
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        garage.readings.push(Reading::new(id, date, 100.0));
        (garage, id)
    }

    #[test]
    fn repeated_analysis_hits_cache() {
        let (garage, id) = garage_with_car();
        let mut cache = AnalysisCache::new();
        let rule = ClassificationRule::default();

        let first = cache.analyze(&garage, id, &rule).unwrap().to_vec();
        let second = cache.analyze(&garage, id, &rule).unwrap().to_vec();

        assert_eq!(first, second);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn revision_bump_invalidates_entries() {
        let (mut garage, id) = garage_with_car();
        let mut cache = AnalysisCache::new();
        let rule = ClassificationRule::default();
        cache.analyze(&garage, id, &rule).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 1, 12).unwrap();
        garage.readings.push(Reading::new(id, date, 250.0));
        garage.touch();

        let analyzed = cache.analyze(&garage, id, &rule).unwrap();
        assert_eq!(analyzed.len(), 2);
        assert_eq!(analyzed[0].weekly_delta, Some(150.0));
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn rules_are_cached_separately() {
        let (garage, id) = garage_with_car();
        let mut cache = AnalysisCache::new();
        cache.analyze(&garage, id, &ClassificationRule::default()).unwrap();
        cache
            .analyze(&garage, id, &ClassificationRule::DeviationSign)
            .unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn unknown_car_is_an_error() {
        let (garage, _) = garage_with_car();
        let mut cache = AnalysisCache::new();
        let err = cache
            .analyze(&garage, Uuid::new_v4(), &ClassificationRule::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::CarNotFound(_)));
    }
}
