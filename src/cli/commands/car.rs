use miletrack_core::{CarService, ProjectionMode};
use miletrack_domain::{Car, Displayable};

use super::subcommand;
use crate::cli::core::{
    parse_date, parse_miles, parse_months, CommandArgs, CommandError, CommandResult,
    ShellContext,
};
use crate::cli::formatters::{format_miles, format_optional_miles, named_ref, short_id};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::cli::ui::{style::style, Table, TableColumn, TableRenderer};

const USAGE: &str = "car add <name> [--limit <miles>] [--delivery <miles>] \
[--end <YYYY-MM-DD> --months <n>] [--reg <plate>] [--default]
car edit [car] [--name <name>] [--limit <miles|none>] [--delivery <miles>] \
[--end <YYYY-MM-DD|none> --months <n>] [--reg <plate|none>]
car list
car select <car>
car default [car]
car remove [car]";

const VALUE_FLAGS: &[&str] = &["name", "limit", "delivery", "end", "months", "reg"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "car",
        "Manage the cars of the open garage",
        USAGE,
        cmd_car,
    )
    .with_actions(&["add", "edit", "list", "select", "default", "remove"])]
}

fn cmd_car(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = subcommand(args) else {
        return Err(CommandError::InvalidArguments(
            "usage: car <add|edit|list|select|default|remove>".into(),
        ));
    };
    match action.as_str() {
        "add" => add_car(context, rest),
        "edit" => edit_car(context, rest),
        "list" => list_cars(context),
        "select" | "use" => select_car(context, rest),
        "default" => default_car(context, rest),
        "remove" | "delete" => remove_car(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown car subcommand `{}`",
            other
        ))),
    }
}

fn add_car(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, VALUE_FLAGS, &["default"])?;
    let name = parsed
        .rest(0)
        .ok_or_else(|| CommandError::InvalidArguments("usage: car add <name> [options]".into()))?;
    let mut car = Car::new(name, None);
    car.is_default = parsed.has("default");
    apply_options(&mut car, &parsed)?;

    let garage = context.garage_mut()?;
    let id = CarService::add(garage, car)?;
    let became_default = garage.car(id).is_some_and(|car| car.is_default);
    let label = garage.car(id).map(named_ref).unwrap_or_default();
    if context.active_car.is_none() || became_default {
        context.active_car = Some(id);
    }
    io::print_success(format!("Added car {}.", label));
    Ok(())
}

fn edit_car(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, VALUE_FLAGS, &[])?;
    let query = parsed.rest(0);
    let car = context.resolve_car(query.as_deref())?;
    let id = car.id;
    let mut changes = car.clone();
    if let Some(name) = parsed.option("name") {
        changes.name = name.to_string();
    }
    apply_options(&mut changes, &parsed)?;

    CarService::edit(context.garage_mut()?, id, changes)?;
    io::print_success("Car updated.");
    Ok(())
}

/// Applies the shared `car add`/`car edit` flags; `none` clears optional values.
fn apply_options(car: &mut Car, parsed: &CommandArgs<'_>) -> Result<(), CommandError> {
    if let Some(limit) = parsed.option("limit") {
        car.annual_limit = if is_none(limit) {
            None
        } else {
            Some(parse_miles(limit)?)
        };
    }
    if let Some(delivery) = parsed.option("delivery") {
        car.delivery_mileage = parse_miles(delivery)?;
    }
    if let Some(end) = parsed.option("end") {
        car.contract_end_date = if is_none(end) {
            None
        } else {
            Some(parse_date(end)?)
        };
        if car.contract_end_date.is_none() {
            car.contract_months = None;
        }
    }
    if let Some(months) = parsed.option("months") {
        car.contract_months = Some(parse_months(months)?);
    }
    if let Some(reg) = parsed.option("reg") {
        car.registration_number = (!is_none(reg)).then(|| reg.trim().to_uppercase());
    }
    Ok(())
}

fn is_none(value: &str) -> bool {
    value.eq_ignore_ascii_case("none")
}

fn list_cars(context: &mut ShellContext) -> CommandResult {
    let garage = context.garage()?;
    if garage.cars.is_empty() {
        io::print_info("No cars yet. Use `car add <name> --limit <miles>`.");
        return Ok(());
    }
    let mut table = Table::new(
        Some(format!("Cars in {}", garage.name)),
        vec![
            TableColumn::new("", 1),
            TableColumn::new("Id", 8),
            TableColumn::new("Name", 10),
            TableColumn::new("Reg", 4),
            TableColumn::new("Limit/yr", 8).right(),
            TableColumn::new("Delivery", 8).right(),
            TableColumn::new("Projection", 10),
        ],
    );
    for car in CarService::list(garage) {
        let marker = match (Some(car.id) == context.active_car, car.is_default) {
            (true, true) => "*D",
            (true, false) => "*",
            (false, true) => "D",
            (false, false) => "",
        };
        table.add_row(vec![
            marker.to_string(),
            short_id(car.id),
            car.name.clone(),
            car.registration_number.clone().unwrap_or_else(|| "-".into()),
            format_optional_miles(car.annual_limit),
            format_miles(car.delivery_mileage),
            projection_label(car),
        ]);
    }
    TableRenderer::render(&table, &style());
    io::print_hint("* selected, D default");
    Ok(())
}

fn projection_label(car: &Car) -> String {
    ProjectionMode::for_car(car)
        .map(|mode| mode.to_string())
        .unwrap_or_else(|| "none".into())
}

fn select_car(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &[], &[])?;
    let query = parsed
        .rest(0)
        .ok_or_else(|| CommandError::InvalidArguments("usage: car select <car>".into()))?;
    let car = context.resolve_car(Some(&query))?;
    let (id, label) = (car.id, car.display_label());
    context.active_car = Some(id);
    io::print_success(format!("Selected {}.", label));
    Ok(())
}

fn default_car(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &[], &[])?;
    let query = parsed.rest(0);
    let car = context.resolve_car(query.as_deref())?;
    let (id, name) = (car.id, car.name.clone());
    CarService::set_default(context.garage_mut()?, id)?;
    io::print_success(format!("`{}` is now the default car.", name));
    Ok(())
}

fn remove_car(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &[], &[])?;
    let query = parsed.rest(0);
    let car = context.resolve_car(query.as_deref())?;
    let (id, name) = (car.id, car.name.clone());
    let readings = context.garage()?.readings_for(id).len();
    let prompt = format!("Remove `{}` and its {} readings?", name, readings);
    if !context.confirm(&prompt)? {
        io::print_info("Nothing removed.");
        return Ok(());
    }
    CarService::remove(context.garage_mut()?, id)?;
    context.refresh_active_car();
    io::print_success(format!("Removed `{}` and {} readings.", name, readings));
    Ok(())
}
