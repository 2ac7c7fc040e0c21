//! Top-level shell commands with the subcommand words offered for completion.

use crate::cli::core::CommandResult;
use crate::cli::shell_context::ShellContext;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

pub struct CommandEntry {
    pub name: &'static str,
    pub summary: &'static str,
    /// One usage form per line.
    pub usage: &'static str,
    pub actions: &'static [&'static str],
    pub run: CommandHandler,
}

impl CommandEntry {
    pub const fn new(
        name: &'static str,
        summary: &'static str,
        usage: &'static str,
        run: CommandHandler,
    ) -> Self {
        Self {
            name,
            summary,
            usage,
            actions: &[],
            run,
        }
    }

    pub const fn with_actions(mut self, actions: &'static [&'static str]) -> Self {
        self.actions = actions;
        self
    }

    pub fn usage_lines(&self) -> impl Iterator<Item = &'static str> {
        self.usage.lines().map(str::trim)
    }
}

/// Commands in the order `help` lists them. Names are matched lowercase.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
}

impl CommandRegistry {
    /// Builds the registry; a later entry replaces an earlier one with the same name.
    pub fn from_entries(entries: impl IntoIterator<Item = CommandEntry>) -> Self {
        let mut registry = Self::default();
        for entry in entries {
            match registry.entries.iter_mut().find(|known| known.name == entry.name) {
                Some(known) => *known = entry,
                None => registry.entries.push(entry),
            }
        }
        registry
    }

    pub fn find(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    pub fn actions(&self, name: &str) -> &'static [&'static str] {
        self.find(name).map_or(&[], |entry| entry.actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
        Ok(())
    }

    #[test]
    fn later_entries_replace_earlier_ones_in_place() {
        let registry = CommandRegistry::from_entries([
            CommandEntry::new("garage", "old", "garage", noop),
            CommandEntry::new("car", "cars", "car", noop),
            CommandEntry::new("garage", "new", "garage new <name>", noop).with_actions(&["new"]),
        ]);
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["garage", "car"]);
        assert_eq!(registry.find("garage").map(|entry| entry.summary), Some("new"));
        assert_eq!(registry.actions("garage"), &["new"]);
        assert!(registry.actions("chart").is_empty());
    }

    #[test]
    fn usage_lines_are_trimmed() {
        let entry = CommandEntry::new("reading", "", "reading add <miles>\n  reading list", noop);
        let lines: Vec<&str> = entry.usage_lines().collect();
        assert_eq!(lines, vec!["reading add <miles>", "reading list"]);
    }
}
