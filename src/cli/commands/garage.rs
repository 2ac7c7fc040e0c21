use std::path::{Path, PathBuf};

use miletrack_core::{storage::GarageStorage, GarageService};
use miletrack_domain::Displayable;
use miletrack_storage_json::{canonical_name, load_garage_from_path};

use super::subcommand;
use crate::cli::core::{CommandArgs, CommandError, CommandResult, ShellContext};
use crate::cli::formatters::format_date;
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::cli::ui::{style::style, Table, TableColumn, TableRenderer};

const USAGE: &str = "garage new <name>
garage load <name|file.json>
garage save [name|file.json]
garage rename <name>
garage list
garage backup [note]
garage backups
garage restore <number|backup>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "garage",
        "Create, open, save and back up garages",
        USAGE,
        cmd_garage,
    )
    .with_actions(&["new", "load", "save", "rename", "list", "backup", "backups", "restore"])]
}

fn cmd_garage(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = subcommand(args) else {
        return Err(CommandError::InvalidArguments(
            "usage: garage <new|load|save|rename|list|backup|backups|restore>".into(),
        ));
    };
    match action.as_str() {
        "new" => new_garage(context, rest),
        "load" | "open" => load_garage(context, rest),
        "save" => save_garage(context, rest),
        "rename" => rename_garage(context, rest),
        "list" => list_garages(context),
        "backup" => backup_garage(context, rest),
        "backups" => list_backups(context),
        "restore" => restore_backup(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown garage subcommand `{}`",
            other
        ))),
    }
}

fn new_garage(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &[], &[])?;
    let name = parsed
        .rest(0)
        .ok_or_else(|| CommandError::InvalidArguments("usage: garage new <name>".into()))?;
    if !confirm_discard(context)? {
        return Ok(());
    }
    let garage = GarageService::create(&name)?;
    io::print_success(format!("Created garage `{}`.", garage.name));
    context.set_garage(garage, None, None);
    Ok(())
}

fn load_garage(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &[], &[])?;
    let target = parsed.rest(0).ok_or_else(|| {
        CommandError::InvalidArguments("usage: garage load <name|file.json>".into())
    })?;
    if !confirm_discard(context)? {
        return Ok(());
    }

    if looks_like_path(&target) {
        let path = PathBuf::from(&target);
        let garage = load_garage_from_path(&path)?;
        context.report_warnings(&garage);
        io::print_success(format!(
            "Loaded garage `{}` from {}.",
            garage.name,
            path.display()
        ));
        context.set_garage(garage, None, Some(path));
        return Ok(());
    }

    let slug = canonical_name(&target);
    let garage = context.storage.load_garage(&slug)?;
    context.report_warnings(&garage);
    io::print_success(format!("Loaded garage {}.", garage.display_label()));
    context.set_garage(garage, Some(slug.clone()), None);
    context.update_last_opened(Some(&slug))
}

fn save_garage(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &[], &[])?;
    let target = parsed.rest(0);
    let garage = context.garage()?;

    if let Some(path) = target
        .as_deref()
        .filter(|value| looks_like_path(value))
        .map(PathBuf::from)
    {
        context.storage.save_garage_to_path(garage, &path)?;
        io::print_success(format!("Saved garage to {}.", path.display()));
        context.garage_path = Some(path);
        context.mark_saved();
        return Ok(());
    }

    let slug = match target {
        Some(name) => canonical_name(&name),
        None => match (&context.garage_slug, &context.garage_path) {
            (Some(slug), _) => slug.clone(),
            (None, Some(path)) => {
                let path = path.clone();
                context.storage.save_garage_to_path(garage, &path)?;
                io::print_success(format!("Saved garage to {}.", path.display()));
                context.mark_saved();
                return Ok(());
            }
            (None, None) => canonical_name(&garage.name),
        },
    };
    context.storage.save_garage(&slug, garage)?;
    io::print_success(format!(
        "Saved garage `{}` to {}.",
        garage.name,
        context.storage.garage_path(&slug).display()
    ));
    context.garage_slug = Some(slug.clone());
    context.mark_saved();
    context.update_last_opened(Some(&slug))
}

fn rename_garage(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &[], &[])?;
    let name = parsed
        .rest(0)
        .ok_or_else(|| CommandError::InvalidArguments("usage: garage rename <name>".into()))?;
    let garage = context.garage_mut()?;
    GarageService::rename(garage, &name)?;
    io::print_success(format!("Garage renamed to `{}`.", garage.name));
    Ok(())
}

fn list_garages(context: &mut ShellContext) -> CommandResult {
    let entries = context.storage.list_garage_metadata()?;
    if entries.is_empty() {
        io::print_info("No saved garages yet.");
        return Ok(());
    }
    let mut table = Table::new(
        Some("Garages"),
        vec![
            TableColumn::new("Name", 12),
            TableColumn::new("File", 8),
            TableColumn::new("Cars", 4).right(),
            TableColumn::new("Readings", 8).right(),
            TableColumn::new("Updated", 10),
        ],
    );
    for entry in entries {
        table.add_row(vec![
            entry.name,
            entry.slug,
            entry.car_count.to_string(),
            entry.reading_count.to_string(),
            format_date(entry.updated_at.date_naive()),
        ]);
    }
    TableRenderer::render(&table, &style());
    Ok(())
}

fn backup_garage(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &[], &[])?;
    let note = parsed.rest(0);
    let slug = stored_slug(context)?;
    let garage = context.garage()?;
    let info = context
        .storage
        .backup_garage(&slug, garage, note.as_deref())?;
    io::print_success(format!("Backup created: {}", info.id));
    Ok(())
}

fn list_backups(context: &mut ShellContext) -> CommandResult {
    let slug = stored_slug(context)?;
    let backups = context.storage.list_backup_metadata(&slug)?;
    if backups.is_empty() {
        io::print_info("No backups found.");
        return Ok(());
    }
    let mut table = Table::new(
        Some("Backups (newest first)"),
        vec![
            TableColumn::new("#", 2).right(),
            TableColumn::new("Backup", 20),
            TableColumn::new("Created", 16),
            TableColumn::new("Size", 6).right(),
        ],
    );
    for (index, backup) in backups.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            backup.name.clone(),
            backup
                .created_at
                .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".into()),
            format_size(backup.size_bytes),
        ]);
    }
    TableRenderer::render(&table, &style());
    Ok(())
}

fn restore_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &[], &[])?;
    let reference = parsed.positional(0).ok_or_else(|| {
        CommandError::InvalidArguments("usage: garage restore <number|backup>".into())
    })?;
    let slug = stored_slug(context)?;
    let backups = context.storage.list_backups(&slug)?;
    let selected = match reference.parse::<usize>() {
        Ok(number) if number >= 1 => backups.get(number - 1),
        _ => backups.iter().find(|backup| {
            backup.id == reference || backup.id.trim_end_matches(".json") == reference
        }),
    }
    .cloned()
    .ok_or_else(|| CommandError::Message(format!("backup `{}` not found", reference)))?;

    if !context.confirm(&format!("Restore `{}`? Unsaved changes are lost.", selected.id))? {
        io::print_info("Restore cancelled.");
        return Ok(());
    }
    let garage = context.storage.restore_backup(&selected)?;
    context.report_warnings(&garage);
    io::print_success(format!("Restored garage `{}` from {}.", garage.name, selected.id));
    context.set_garage(garage, Some(slug), None);
    Ok(())
}

/// Storage name of the open garage; backups exist only for garages saved by name.
fn stored_slug(context: &ShellContext) -> Result<String, CommandError> {
    context.garage()?;
    context.garage_slug.clone().ok_or_else(|| {
        CommandError::Message("Save the garage by name before using backups.".into())
    })
}

fn confirm_discard(context: &ShellContext) -> Result<bool, CommandError> {
    if !context.has_unsaved_changes() {
        return Ok(true);
    }
    context.confirm("Discard unsaved changes to the open garage?")
}

fn looks_like_path(value: &str) -> bool {
    let path = Path::new(value);
    value.ends_with(".json") || path.components().count() > 1
}

fn format_size(size_bytes: u64) -> String {
    let kb = (size_bytes as f64) / 1024.0;
    if kb < 1.0 {
        format!("{} B", size_bytes)
    } else {
        format!("{:.1} KB", kb)
    }
}
