use std::sync::{OnceLock, RwLock};

use colored::{Color, Colorize};

use crate::cli::output::current_preferences;

#[derive(Clone, Debug)]
pub struct UiStyle {
    pub header_prefix: String,
    pub horizontal: char,
    pub use_color: bool,
    pub color_header: Option<Color>,
    pub color_alert: Option<Color>,
    pub plain_mode: bool,
}

static STYLE: OnceLock<RwLock<UiStyle>> = OnceLock::new();

pub fn style() -> UiStyle {
    let lock = STYLE.get_or_init(|| RwLock::new(UiStyle::detect()));
    match lock.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Re-reads the output preferences, e.g. after the config was loaded.
pub fn refresh_style() {
    if let Some(lock) = STYLE.get() {
        if let Ok(mut guard) = lock.write() {
            *guard = UiStyle::detect();
        }
    } else {
        let _ = STYLE.set(RwLock::new(UiStyle::detect()));
    }
}

impl UiStyle {
    fn detect() -> Self {
        let prefs = current_preferences();
        Self::from_flags(prefs.color_enabled, prefs.plain_mode)
    }

    pub fn from_flags(use_color: bool, plain_mode: bool) -> Self {
        Self {
            header_prefix: if plain_mode { "> ".into() } else { "» ".into() },
            horizontal: if plain_mode { '-' } else { '─' },
            use_color,
            color_header: use_color.then_some(Color::BrightBlue),
            color_alert: use_color.then_some(Color::BrightRed),
            plain_mode,
        }
    }

    pub fn horizontal_line(&self, width: usize) -> String {
        self.horizontal.to_string().repeat(width.max(20))
    }

    pub fn apply_header_style(&self, text: &str) -> String {
        match (self.use_color, self.color_header) {
            (true, Some(color)) => text.color(color).bold().to_string(),
            (true, None) => text.bold().to_string(),
            _ => text.to_string(),
        }
    }

    /// Highlights over-allowance values.
    pub fn apply_alert_style(&self, text: &str) -> String {
        match (self.use_color, self.color_alert) {
            (true, Some(color)) => text.color(color).to_string(),
            _ => text.to_string(),
        }
    }
}
