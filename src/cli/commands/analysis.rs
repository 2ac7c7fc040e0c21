use std::{fs, path::Path};

use miletrack_core::{
    ClassificationRule, ImportService, ProjectionMode, ReadingAnalyzer, SeriesPoint,
    SummaryService,
};

use crate::cli::core::{parse_miles, CommandArgs, CommandError, CommandResult, ShellContext};
use crate::cli::formatters::{
    format_date, format_miles, format_optional_miles, format_optional_signed,
};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::ui::{style::style, Table, TableColumn, TableRenderer};

const CHART_WIDTH: usize = 40;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "import",
            "Import tab-separated `DD/MM/YYYY<TAB>mileage` lines",
            "import <file> [--car <car>]",
            cmd_import,
        ),
        CommandEntry::new(
            "chart",
            "Plot actual against expected mileage",
            "chart [--car <car>]",
            cmd_chart,
        ),
        CommandEntry::new(
            "summary",
            "Show progress against the mileage allowance",
            "summary [--car <car>]",
            cmd_summary,
        ),
        CommandEntry::new(
            "rule",
            "Show or change the weekly status rule",
            "rule [weekly [limit] | deviation | pace]",
            cmd_rule,
        )
        .with_actions(&["weekly", "deviation", "pace"]),
    ]
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &["car"], &[])?;
    let file = parsed
        .rest(0)
        .ok_or_else(|| CommandError::InvalidArguments("usage: import <file>".into()))?;
    let car = context.resolve_car(parsed.option("car"))?;
    let (car_id, car_name) = (car.id, car.name.clone());

    let text = fs::read_to_string(Path::new(&file))?;
    let parsed_import = ImportService::parse(&text);
    for issue in &parsed_import.issues {
        io::print_warning(format!("Line {}: {}", issue.line, issue.reason));
    }
    if parsed_import.readings.is_empty() {
        io::print_info("No readings found to import.");
        return Ok(());
    }

    let clock = context.clock.clone();
    let garage = context.garage_mut()?;
    let report = ImportService::apply(garage, car_id, &parsed_import, clock.as_ref())?;
    io::print_success(format!(
        "Imported {} of {} readings into `{}`.",
        report.imported, report.total, car_name
    ));
    if report.failed > 0 {
        io::print_warning(format!("{} readings were rejected.", report.failed));
    }
    Ok(())
}

fn cmd_chart(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &["car"], &[])?;
    let car = context.resolve_car(parsed.option("car"))?;
    if car.effective_annual_limit().is_none() {
        io::print_info(format!(
            "`{}` has no annual limit, so there is nothing to compare against.",
            car.name
        ));
        return Ok(());
    }
    let readings = context.garage()?.readings_for(car.id);
    let series = ReadingAnalyzer::chart_series(car, &readings);
    if series.is_empty() {
        io::print_info(format!("No readings for `{}` yet.", car.name));
        return Ok(());
    }

    let mut table = Table::new(
        Some(format!("Actual vs expected for {}", car.name)),
        vec![
            TableColumn::new("Date", 10),
            TableColumn::new("Actual", 6).right(),
            TableColumn::new("Expected", 8).right(),
            TableColumn::new("Diff", 6).right(),
        ],
    );
    for point in &series {
        let diff = point.expected.map(|expected| point.actual - expected);
        let cells = vec![
            format_date(point.date),
            format_miles(point.actual),
            format_optional_miles(point.expected),
            format_optional_signed(diff),
        ];
        if diff.is_some_and(|value| value > 0.0) {
            table.add_alert_row(cells);
        } else {
            table.add_row(cells);
        }
    }
    let ui = style();
    TableRenderer::render(&table, &ui);
    io::println_text("");
    for line in render_chart(&series, CHART_WIDTH) {
        io::println_text(&line);
    }
    io::print_hint("# actual, | expected");
    Ok(())
}

/// One bar per point scaled to the largest value; `|` marks the expected mileage.
fn render_chart(points: &[SeriesPoint], width: usize) -> Vec<String> {
    let width = width.max(1);
    let max = points
        .iter()
        .flat_map(|point| [Some(point.actual), point.expected])
        .flatten()
        .filter(|value| value.is_finite())
        .fold(0.0_f64, f64::max);
    let scale = |value: f64| -> usize {
        if max <= 0.0 || !value.is_finite() || value <= 0.0 {
            return 0;
        }
        (((value / max) * width as f64).round() as usize).min(width)
    };

    points
        .iter()
        .map(|point| {
            let filled = scale(point.actual);
            let mut bar: Vec<char> = (0..width)
                .map(|index| if index < filled { '#' } else { ' ' })
                .collect();
            if let Some(expected) = point.expected {
                let marker = scale(expected).saturating_sub(1);
                bar[marker] = '|';
            }
            let bar: String = bar.into_iter().collect();
            format!("{} {} {}", format_date(point.date), bar, format_miles(point.actual))
        })
        .collect()
}

fn cmd_summary(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = CommandArgs::parse(args, &["car"], &[])?;
    let car = context.resolve_car(parsed.option("car"))?;
    let readings = context.garage()?.readings_for(car.id);
    let summary = SummaryService::progress(car, &readings, context.clock.today());

    output_section(format!("Summary: {}", summary.car_name));
    io::print_info(format!("  Readings          : {}", summary.reading_count));
    match &summary.latest {
        Some(latest) => io::print_info(format!(
            "  Latest            : {} miles on {}",
            format_miles(latest.mileage),
            format_date(latest.date)
        )),
        None => io::print_info("  Latest            : -"),
    }
    let mode = summary
        .mode
        .map(|mode| mode.to_string())
        .unwrap_or_else(|| "none (no annual limit)".into());
    io::print_info(format!("  Projection        : {}", mode));
    if let Some(ProjectionMode::ContractProrated(window)) = summary.mode {
        io::print_info(format!(
            "  Contract allowance: {} miles over {} days",
            format_miles(window.total_miles),
            window.span_days
        ));
    }
    io::print_info(format!(
        "  Expected at latest: {}",
        format_optional_miles(summary.expected_at_latest)
    ));
    io::print_info(format!(
        "  Deviation         : {}",
        format_optional_signed(summary.deviation_at_latest)
    ));
    io::print_info(format!(
        "  Expected today    : {}",
        format_optional_miles(summary.expected_today)
    ));
    io::print_info(format!(
        "  Average weekly    : {}",
        format_optional_miles(summary.average_weekly)
    ));
    if let Some(remaining) = summary.remaining_allowance {
        io::print_info(format!("  Remaining         : {} miles", format_miles(remaining)));
    }
    if summary.is_over() {
        io::print_warning("Mileage is ahead of the allowance.");
    }
    Ok(())
}

fn cmd_rule(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(name) = args.first() else {
        let rule = context.classification_rule();
        io::print_info(format!("Current rule: {} ({})", rule.name(), rule));
        return Ok(());
    };
    let threshold = match args.get(1) {
        Some(value) => {
            let limit = parse_miles(value)?;
            if limit <= 0.0 {
                return Err(CommandError::InvalidArguments(
                    "weekly limit must be positive".into(),
                ));
            }
            Some(limit)
        }
        None => None,
    };
    let rule = ClassificationRule::from_name(name, threshold).ok_or_else(|| {
        CommandError::InvalidArguments(format!(
            "unknown rule `{}` (use weekly, deviation or pace)",
            name
        ))
    })?;
    context.config.set_classification_rule(rule);
    context.persist_config()?;
    io::print_success(format!("Classification rule set to {} ({}).", rule.name(), rule));
    Ok(())
}
