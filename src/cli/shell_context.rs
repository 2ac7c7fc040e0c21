//! Shared runtime state for CLI interactions and command execution.

use std::{path::PathBuf, sync::Arc};

use dialoguer::theme::ColorfulTheme;
use uuid::Uuid;

use miletrack_config::{Config, ConfigManager};
use miletrack_core::{AnalysisCache, Clock};
use miletrack_domain::Garage;
use miletrack_storage_json::JsonGarageStorage;

use super::registry::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub storage: JsonGarageStorage,
    pub clock: Arc<dyn Clock>,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub garage: Option<Garage>,
    /// Storage name of the open garage, when it lives in the data directory.
    pub garage_slug: Option<String>,
    /// File the open garage was loaded from or saved to outside the data directory.
    pub garage_path: Option<PathBuf>,
    pub active_car: Option<Uuid>,
    pub cache: AnalysisCache,
    /// Garage revision at the last load or save.
    pub saved_revision: Option<u64>,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn has_unsaved_changes(&self) -> bool {
        match (&self.garage, self.saved_revision) {
            (Some(garage), Some(saved)) => garage.revision != saved,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn status(&self) -> String {
        format!(
            "ShellContext {{ running: {}, last_command: {:?}, garage: {:?} }}",
            self.running,
            self.last_command,
            self.garage.as_ref().map(|garage| garage.name.as_str())
        )
    }
}
