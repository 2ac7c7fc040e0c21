use miletrack_core::{PaceStatus, ReadingService};
use miletrack_domain::{Displayable, Reading};

use super::subcommand;
use crate::cli::core::{
    parse_date, parse_miles, CommandArgs, CommandError, CommandResult, ShellContext,
};
use crate::cli::formatters::{
    format_date, format_miles, format_optional_miles, format_optional_signed, short_id,
};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::cli::ui::{style::style, Table, TableColumn, TableRenderer};

const USAGE: &str = "reading add <mileage> [YYYY-MM-DD] [--note <text>] [--car <car>]
reading list [--car <car>]
reading remove <reading> [--car <car>]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "reading",
        "Record and review odometer readings",
        USAGE,
        cmd_reading,
    )
    .with_actions(&["add", "list", "remove"])]
}

fn cmd_reading(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = subcommand(args) else {
        return Err(CommandError::InvalidArguments(
            "usage: reading <add|list|remove>".into(),
        ));
    };
    match action.as_str() {
        "add" => add_reading(context, rest),
        "list" | "ls" => list_readings(context, rest),
        "remove" | "delete" => remove_reading(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown reading subcommand `{}`",
            other
        ))),
    }
}

fn add_reading(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &["note", "car"], &[])?;
    let mileage = parsed.positional(0).ok_or_else(|| {
        CommandError::InvalidArguments("usage: reading add <mileage> [YYYY-MM-DD]".into())
    })?;
    let mileage = parse_miles(mileage)?;
    let date = match parsed.positional(1) {
        Some(value) => parse_date(value)?,
        None => ReadingService::suggested_date(context.clock.as_ref()),
    };
    let car = context.resolve_car(parsed.option("car"))?;
    let (car_id, car_name) = (car.id, car.name.clone());

    let mut reading = Reading::new(car_id, date, mileage).recorded_at(context.clock.now());
    if let Some(note) = parsed.option("note").filter(|note| !note.trim().is_empty()) {
        reading = reading.with_notes(note.trim());
    }
    ReadingService::add(context.garage_mut()?, reading)?;

    io::print_success(format!(
        "Recorded {} miles on {} for `{}`.",
        format_miles(mileage),
        format_date(date),
        car_name
    ));
    io::print_info(format!(
        "Next suggested date: {}",
        format_date(ReadingService::next_suggested_date(date))
    ));
    Ok(())
}

fn list_readings(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &["car"], &[])?;
    let car = context.resolve_car(parsed.option("car"))?;
    let (car_id, car_name) = (car.id, car.name.clone());
    let has_limit = car.effective_annual_limit().is_some();

    let analyzed = context.analyzed_readings(car_id)?;
    if analyzed.is_empty() {
        io::print_info(format!("No readings for `{}` yet.", car_name));
        return Ok(());
    }

    let mut columns = vec![
        TableColumn::new("Id", 8),
        TableColumn::new("Date", 10),
        TableColumn::new("Mileage", 7).right(),
        TableColumn::new("Weekly", 6).right(),
        TableColumn::new("Status", 10),
    ];
    if has_limit {
        columns.push(TableColumn::new("Expected", 8).right());
        columns.push(TableColumn::new("Diff", 6).right());
    }
    let rule = context.classification_rule();
    let mut table = Table::new(
        Some(format!("Readings for {} ({} rule)", car_name, rule.name())),
        columns,
    );
    for entry in &analyzed {
        let mut cells = vec![
            short_id(entry.reading.id),
            format_date(entry.date()),
            format_miles(entry.mileage()),
            format_optional_signed(entry.weekly_delta),
            entry.status_label(),
        ];
        if has_limit {
            cells.push(format_optional_miles(entry.expected_mileage));
            cells.push(format_optional_signed(entry.expected_deviation));
        }
        if entry.status.is_over() || entry.status == PaceStatus::Invalid {
            table.add_alert_row(cells);
        } else {
            table.add_row(cells);
        }
    }
    TableRenderer::render(&table, &style());

    let notes: Vec<String> = analyzed
        .iter()
        .filter_map(|entry| {
            let note = entry.reading.notes.as_deref()?;
            Some(format!("{} {}", format_date(entry.date()), note))
        })
        .collect();
    for note in notes {
        io::print_hint(note);
    }
    Ok(())
}

fn remove_reading(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &["car"], &[])?;
    let query = parsed.positional(0).ok_or_else(|| {
        CommandError::InvalidArguments("usage: reading remove <reading>".into())
    })?;
    let car_id = context.resolve_car(parsed.option("car"))?.id;
    let reading = ReadingService::find(context.garage()?, car_id, query)?;
    let (id, date, label) = (reading.id, reading.date, reading.display_label());

    let prompt = format!("Remove reading {}?", label);
    if !context.confirm(&prompt)? {
        io::print_info("Nothing removed.");
        return Ok(());
    }
    ReadingService::remove(context.garage_mut()?, id)?;
    io::print_success(format!("Removed reading {} ({}).", short_id(id), format_date(date)));
    Ok(())
}
