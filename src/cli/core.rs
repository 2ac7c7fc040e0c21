//! Command dispatch, error reporting and shell context helpers.

use std::{io, path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use dialoguer::theme::ColorfulTheme;
use strsim::levenshtein;
use uuid::Uuid;

use miletrack_config::{ConfigError, ConfigManager};
use miletrack_core::{
    storage::{garage_warnings, GarageStorage},
    AnalysisCache, AnalyzedReading, CarService, ClassificationRule, CoreError,
};
use miletrack_domain::{Car, Garage};
use miletrack_storage_json::{JsonGarageStorage, StoragePaths};

pub use crate::cli::shell_context::{CliMode, ShellContext};
pub use crate::errors::CliError;

use super::commands;
use super::io as cli_io;
use super::registry::CommandEntry;
use super::system_clock::SystemClock;
use crate::utils::paths;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let registry = commands::registry();

        let config_manager = ConfigManager::with_base_dir(paths::app_config_dir())?;
        let config = config_manager.load()?;
        super::output::apply_config(&config);
        super::ui::style::refresh_style();

        let data_root = paths::home_override().unwrap_or_else(|| config.resolve_data_root());
        let storage = JsonGarageStorage::new(StoragePaths::from_data_root(&data_root))?;

        let mut app = ShellContext {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            storage,
            clock: Arc::new(SystemClock),
            config_manager,
            config,
            garage: None,
            garage_slug: None,
            garage_path: None,
            active_car: None,
            cache: AnalysisCache::new(),
            saved_revision: None,
            last_command: None,
            running: true,
        };
        app.auto_load_last();
        Ok(app)
    }

    fn auto_load_last(&mut self) {
        if self.mode != CliMode::Interactive {
            return;
        }
        let Some(name) = self.config.last_opened_garage.clone() else {
            return;
        };
        match self.storage.load_garage(&name) {
            Ok(garage) => {
                self.report_warnings(&garage);
                self.set_garage(garage, Some(name.clone()), None);
                cli_io::print_success(format!("Automatically loaded last garage `{}`.", name));
            }
            Err(err) => {
                tracing::warn!(garage = %name, error = %err, "could not reopen last garage");
            }
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(run) = self.registry.find(command).map(|entry| entry.run) {
            match run(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));
        if let Some(best) = closest_name(self.registry.names(), input) {
            cli_io::print_info(format!("Suggestion: `{}`?", best));
        }
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.find(name)
    }

    /// Names of the cars in the open garage, for completion.
    pub(crate) fn car_names(&self) -> Vec<String> {
        self.garage
            .iter()
            .flat_map(|garage| garage.cars.iter().map(|car| car.name.clone()))
            .collect()
    }

    /// Prompt showing the open garage and selected car, starred when unsaved.
    pub(crate) fn prompt(&self) -> String {
        let Some(garage) = self.garage.as_ref() else {
            return "miletrack> ".into();
        };
        let dirty = if self.has_unsaved_changes() { "*" } else { "" };
        match self.active_car.and_then(|id| garage.car(id)) {
            Some(car) => format!("miletrack({}{}:{})> ", garage.name, dirty, car.name),
            None => format!("miletrack({}{})> ", garage.name, dirty),
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        let prompt = if self.has_unsaved_changes() {
            "Exit with unsaved changes?"
        } else {
            "Exit shell?"
        };
        cli_io::confirm_action(&self.theme, prompt, false).map_err(CliError::from)
    }

    /// Asks before destructive actions. Script mode always proceeds.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, prompt, false)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                self.print_error(&message);
                self.print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::GarageNotLoaded => {
                self.print_error(&err.to_string());
                self.print_hint("Try `garage new Family` to get started.");
                Ok(())
            }
            CommandError::NoCarSelected => {
                self.print_error(&err.to_string());
                self.print_hint("Add one with `car add Work --limit 10000`.");
                Ok(())
            }
            other => {
                self.print_error(&other.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn print_error(&self, message: &str) {
        cli_io::print_error(message);
    }

    pub(crate) fn print_warning(&self, message: &str) {
        cli_io::print_warning(message);
    }

    pub(crate) fn print_hint(&self, message: &str) {
        cli_io::print_hint(message);
    }

    pub(crate) fn report_warnings(&self, garage: &Garage) {
        for warning in garage_warnings(garage) {
            cli_io::print_warning(warning);
        }
    }

    pub(crate) fn garage(&self) -> Result<&Garage, CommandError> {
        self.garage.as_ref().ok_or(CommandError::GarageNotLoaded)
    }

    pub(crate) fn garage_mut(&mut self) -> Result<&mut Garage, CommandError> {
        self.garage.as_mut().ok_or(CommandError::GarageNotLoaded)
    }

    /// Makes `garage` the open garage and selects its default car.
    pub(crate) fn set_garage(
        &mut self,
        garage: Garage,
        slug: Option<String>,
        path: Option<PathBuf>,
    ) {
        self.active_car = garage
            .default_car()
            .or_else(|| garage.cars.first())
            .map(|car| car.id);
        let persisted = slug.is_some() || path.is_some();
        self.saved_revision = persisted.then_some(garage.revision);
        self.garage = Some(garage);
        self.garage_slug = slug;
        self.garage_path = path;
        self.cache.clear();
    }

    pub(crate) fn mark_saved(&mut self) {
        self.saved_revision = self.garage.as_ref().map(|garage| garage.revision);
    }

    /// Car named by `query`, or the selected car when no query is given.
    pub(crate) fn resolve_car(&self, query: Option<&str>) -> Result<&Car, CommandError> {
        let garage = self.garage()?;
        match query {
            Some(query) => Ok(CarService::find(garage, query)?),
            None => self
                .active_car
                .and_then(|id| garage.car(id))
                .ok_or(CommandError::NoCarSelected),
        }
    }

    /// Keeps the car selection valid after cars were added or removed.
    pub(crate) fn refresh_active_car(&mut self) {
        let Some(garage) = self.garage.as_ref() else {
            self.active_car = None;
            return;
        };
        let still_present = self.active_car.and_then(|id| garage.car(id)).is_some();
        if !still_present {
            self.active_car = garage
                .default_car()
                .or_else(|| garage.cars.first())
                .map(|car| car.id);
        }
    }

    pub(crate) fn classification_rule(&self) -> ClassificationRule {
        self.config.classification_rule()
    }

    /// Analyzed readings of `car_id`, newest first, memoized per garage revision.
    pub(crate) fn analyzed_readings(
        &mut self,
        car_id: Uuid,
    ) -> Result<Vec<AnalyzedReading>, CommandError> {
        let garage = self.garage.as_ref().ok_or(CommandError::GarageNotLoaded)?;
        let rule = self.config.classification_rule();
        Ok(self.cache.analyze(garage, car_id, &rule)?.to_vec())
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    pub(crate) fn update_last_opened(&mut self, name: Option<&str>) -> CommandResult {
        self.config.last_opened_garage = name.map(str::to_string);
        self.persist_config()
    }
}

fn closest_name<'a>(names: impl Iterator<Item = &'a str>, input: &str) -> Option<&'a str> {
    let needle = input.to_lowercase();
    names
        .map(|name| (levenshtein(name, &needle), name))
        .filter(|(distance, _)| *distance <= 3)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, name)| name)
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", input))
    })
}

/// Parses a mileage value. Thousands separators are accepted.
pub(crate) fn parse_miles(input: &str) -> Result<f64, CommandError> {
    input
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CommandError::InvalidArguments(format!("invalid mileage `{}`", input)))
}

pub(crate) fn parse_months(input: &str) -> Result<u32, CommandError> {
    input
        .parse::<u32>()
        .ok()
        .filter(|months| *months > 0)
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!("invalid contract length `{}`", input))
        })
}

/// Positional arguments plus `--name value` options and `--switch` flags.
#[derive(Debug, Default)]
pub(crate) struct CommandArgs<'a> {
    positional: Vec<&'a str>,
    options: Vec<(&'a str, &'a str)>,
    switches: Vec<&'a str>,
}

impl<'a> CommandArgs<'a> {
    pub(crate) fn parse(
        args: &[&'a str],
        value_flags: &[&str],
        switch_flags: &[&str],
    ) -> Result<Self, CommandError> {
        let mut parsed = CommandArgs::default();
        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            let Some(flag) = arg.strip_prefix("--") else {
                parsed.positional.push(arg);
                continue;
            };
            if switch_flags.contains(&flag) {
                parsed.switches.push(flag);
            } else if value_flags.contains(&flag) {
                let value = iter.next().ok_or_else(|| {
                    CommandError::InvalidArguments(format!("`--{}` needs a value", flag))
                })?;
                parsed.options.push((flag, value));
            } else {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown option `--{}`",
                    flag
                )));
            }
        }
        Ok(parsed)
    }

    pub(crate) fn positional(&self, index: usize) -> Option<&'a str> {
        self.positional.get(index).copied()
    }

    /// Positional arguments from `index` on, joined with spaces.
    pub(crate) fn rest(&self, index: usize) -> Option<String> {
        let rest = self.positional.get(index..)?;
        (!rest.is_empty()).then(|| rest.join(" "))
    }

    /// Last value given for `name`.
    pub(crate) fn option(&self, name: &str) -> Option<&'a str> {
        self.options
            .iter()
            .rev()
            .find(|(flag, _)| *flag == name)
            .map(|(_, value)| *value)
    }

    pub(crate) fn has(&self, name: &str) -> bool {
        self.switches.contains(&name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("No garage loaded. Use `garage new` or `garage load` first.")]
    GarageNotLoaded,
    #[error("No car selected. Use `car add` or `car select` first.")]
    NoCarSelected,
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_args_split_flags_from_positionals() {
        let args = ["Work", "car", "--limit", "12000", "--default", "--limit", "9000"];
        let parsed = CommandArgs::parse(&args, &["limit"], &["default"]).unwrap();
        assert_eq!(parsed.positional(0), Some("Work"));
        assert_eq!(parsed.rest(0).as_deref(), Some("Work car"));
        assert_eq!(parsed.option("limit"), Some("9000"));
        assert!(parsed.has("default"));
        assert!(parsed.rest(2).is_none());
    }

    #[test]
    fn command_args_reject_unknown_or_incomplete_flags() {
        assert!(CommandArgs::parse(&["--colour", "red"], &["limit"], &[]).is_err());
        assert!(CommandArgs::parse(&["--limit"], &["limit"], &[]).is_err());
    }

    #[test]
    fn suggestions_stay_within_three_edits() {
        let names = ["garage", "car", "reading", "summary"];
        assert_eq!(closest_name(names.iter().copied(), "redaing"), Some("reading"));
        assert_eq!(closest_name(names.iter().copied(), "SUMARY"), Some("summary"));
        assert_eq!(closest_name(names.iter().copied(), "photosynthesis"), None);
    }

    #[test]
    fn numeric_parsers_validate_input() {
        assert_eq!(parse_miles("12,345").unwrap(), 12_345.0);
        assert!(parse_miles("lots").is_err());
        assert!(parse_miles("NaN").is_err());
        assert_eq!(parse_months("36").unwrap(), 36);
        assert!(parse_months("0").is_err());
        assert!(parse_date("05/01/2025").is_err());
    }
}
