use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::{CommandEntry, CommandRegistry};

pub fn print_overview(registry: &CommandRegistry) {
    output_section("Available commands");
    for entry in registry.entries() {
        io::print_info(format!("  {:<10} {}", entry.name, entry.summary));
    }
    io::print_info("Use `help <command>` for details.");
}

pub fn print_command(entry: &CommandEntry) {
    output_section(format!("Help: {}", entry.name));
    io::print_info(format!("  Description: {}", entry.summary));
    for (index, usage) in entry.usage_lines().enumerate() {
        let label = if index == 0 { "Usage:" } else { "      " };
        io::print_info(format!("  {} {}", label, usage));
    }
    if !entry.actions.is_empty() {
        io::print_info(format!("  Actions: {}", entry.actions.join(", ")));
    }
}
