//! Weekly pace classification.
//!
//! Two rules have been used historically: a fixed weekly threshold on the
//! mileage delta between consecutive readings, and the sign of the deviation
//! from the projected mileage. Both are kept as named strategies, plus a
//! per-car variant of the weekly threshold derived from the annual limit.

use std::fmt;

use miletrack_domain::Car;

use crate::projection::DAYS_PER_YEAR;

/// Fixed weekly threshold in miles (7 days at roughly 13.7 miles per day).
pub const DEFAULT_WEEKLY_LIMIT: f64 = 96.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassificationRule {
    /// Over limit when the weekly delta exceeds `limit` miles.
    WeeklyThreshold { limit: f64 },
    /// On track while actual mileage is at or below the projected mileage.
    DeviationSign,
    /// Weekly threshold derived from the car's own annual limit.
    CarPace,
}

impl Default for ClassificationRule {
    fn default() -> Self {
        ClassificationRule::WeeklyThreshold {
            limit: DEFAULT_WEEKLY_LIMIT,
        }
    }
}

impl ClassificationRule {
    pub fn name(&self) -> &'static str {
        match self {
            ClassificationRule::WeeklyThreshold { .. } => "weekly",
            ClassificationRule::DeviationSign => "deviation",
            ClassificationRule::CarPace => "pace",
        }
    }

    /// Parses a rule name; `threshold` only applies to the weekly rule.
    pub fn from_name(name: &str, threshold: Option<f64>) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "weekly" | "threshold" => Some(ClassificationRule::WeeklyThreshold {
                limit: threshold.unwrap_or(DEFAULT_WEEKLY_LIMIT),
            }),
            "deviation" | "sign" => Some(ClassificationRule::DeviationSign),
            "pace" | "car" => Some(ClassificationRule::CarPace),
            _ => None,
        }
    }

    /// Weekly threshold applied to `car`, when the rule compares weekly deltas.
    pub fn weekly_limit(&self, car: &Car) -> Option<f64> {
        match self {
            ClassificationRule::WeeklyThreshold { limit } => Some(*limit),
            ClassificationRule::DeviationSign => None,
            ClassificationRule::CarPace => car
                .effective_annual_limit()
                .map(|annual_limit| annual_limit / DAYS_PER_YEAR * 7.0),
        }
    }

    /// Classifies one reading from its computed numeric fields.
    pub fn classify(
        &self,
        car: &Car,
        weekly_delta: Option<f64>,
        deviation: Option<f64>,
    ) -> PaceStatus {
        match self {
            ClassificationRule::DeviationSign => match deviation {
                None => PaceStatus::NoData,
                Some(value) if value.is_nan() => PaceStatus::Invalid,
                Some(value) if value > 0.0 => PaceStatus::Over,
                Some(_) => PaceStatus::OnTrack,
            },
            ClassificationRule::WeeklyThreshold { .. } | ClassificationRule::CarPace => {
                let Some(limit) = self.weekly_limit(car) else {
                    return PaceStatus::NoData;
                };
                match weekly_delta {
                    None => PaceStatus::NoData,
                    Some(delta) if delta.is_nan() => PaceStatus::Invalid,
                    // A zero delta has nothing to judge.
                    Some(delta) if delta == 0.0 => PaceStatus::NoData,
                    Some(delta) if delta > limit => PaceStatus::OverLimit,
                    Some(_) => PaceStatus::Good,
                }
            }
        }
    }

    /// Hashable identity used by [`crate::cache::AnalysisCache`].
    pub(crate) fn cache_key(&self) -> (u8, u64) {
        match self {
            ClassificationRule::WeeklyThreshold { limit } => (0, limit.to_bits()),
            ClassificationRule::DeviationSign => (1, 0),
            ClassificationRule::CarPace => (2, 0),
        }
    }
}

impl fmt::Display for ClassificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationRule::WeeklyThreshold { limit } => {
                write!(f, "weekly delta over {limit:.0} mi")
            }
            ClassificationRule::DeviationSign => f.write_str("deviation from expected mileage"),
            ClassificationRule::CarPace => f.write_str("weekly delta over the car's own pace"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaceStatus {
    NoData,
    Good,
    OverLimit,
    OnTrack,
    Over,
    Invalid,
}

impl PaceStatus {
    pub fn is_over(&self) -> bool {
        matches!(self, PaceStatus::OverLimit | PaceStatus::Over)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaceStatus::NoData => "-",
            PaceStatus::Good => "Good",
            PaceStatus::OverLimit => "Over limit",
            PaceStatus::OnTrack => "On track",
            PaceStatus::Over => "Over",
            PaceStatus::Invalid => "Invalid reading",
        }
    }
}

impl fmt::Display for PaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
