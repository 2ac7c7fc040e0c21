use serde::{de::Deserializer, Deserialize, Serialize};
use std::{fmt, path::PathBuf};

use miletrack_core::{ClassificationRule, DEFAULT_WEEKLY_LIMIT};

/// Stores user-configurable CLI preferences and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub locale: String,
    #[serde(default)]
    pub classification: RuleKind,
    #[serde(default = "Config::default_weekly_threshold")]
    pub weekly_threshold: f64,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_garage: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom data directory. Defaults to `~/Documents/Miletrack`.
    pub default_data_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            classification: RuleKind::default(),
            weekly_threshold: Self::default_weekly_threshold(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            last_opened_garage: None,
            default_data_root: None,
        }
    }
}

impl Config {
    pub fn default_weekly_threshold() -> f64 {
        DEFAULT_WEEKLY_LIMIT
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    /// Classification strategy selected by the user.
    ///
    /// A non-positive or non-finite threshold falls back to the default limit.
    pub fn classification_rule(&self) -> ClassificationRule {
        match self.classification {
            RuleKind::Weekly => {
                let limit = if self.weekly_threshold.is_finite() && self.weekly_threshold > 0.0 {
                    self.weekly_threshold
                } else {
                    DEFAULT_WEEKLY_LIMIT
                };
                ClassificationRule::WeeklyThreshold { limit }
            }
            RuleKind::Deviation => ClassificationRule::DeviationSign,
            RuleKind::Pace => ClassificationRule::CarPace,
        }
    }

    /// Stores `rule` as the selected strategy.
    pub fn set_classification_rule(&mut self, rule: ClassificationRule) {
        self.classification = match rule {
            ClassificationRule::WeeklyThreshold { limit } => {
                self.weekly_threshold = limit;
                RuleKind::Weekly
            }
            ClassificationRule::DeviationSign => RuleKind::Deviation,
            ClassificationRule::CarPace => RuleKind::Pace,
        };
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(path) = &self.default_data_root {
            return path.clone();
        }

        let base = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("Miletrack")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    #[default]
    Weekly,
    Deviation,
    Pace,
}

impl RuleKind {
    fn from_value(value: Option<String>) -> Self {
        value
            .map(|v| RuleKind::from_str(v.trim()))
            .unwrap_or_default()
    }

    /// Unknown names map to the weekly rule.
    pub fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "deviation" => RuleKind::Deviation,
            "pace" => RuleKind::Pace,
            _ => RuleKind::Weekly,
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RuleKind::Weekly => "weekly",
            RuleKind::Deviation => "deviation",
            RuleKind::Pace => "pace",
        };
        f.write_str(label)
    }
}

impl<'de> Deserialize<'de> for RuleKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(RuleKind::from_value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_rule_names_fall_back_to_weekly() {
        let cfg: Config =
            serde_json::from_str(r#"{"locale":"en-GB","classification":"monthly"}"#).unwrap();
        assert_eq!(cfg.classification, RuleKind::Weekly);
        assert_eq!(cfg.weekly_threshold, 96.0);
        assert!(cfg.ui_color_enabled);
    }

    #[test]
    fn rule_round_trips_through_config() {
        let mut cfg = Config::default();
        cfg.set_classification_rule(ClassificationRule::WeeklyThreshold { limit: 120.0 });
        assert_eq!(
            cfg.classification_rule(),
            ClassificationRule::WeeklyThreshold { limit: 120.0 }
        );
        cfg.set_classification_rule(ClassificationRule::CarPace);
        assert_eq!(cfg.classification_rule(), ClassificationRule::CarPace);
        assert_eq!(cfg.weekly_threshold, 120.0);
    }

    #[test]
    fn bad_threshold_uses_default_limit() {
        let cfg = Config {
            weekly_threshold: -3.0,
            ..Config::default()
        };
        assert_eq!(cfg.classification_rule(), ClassificationRule::default());
    }
}
