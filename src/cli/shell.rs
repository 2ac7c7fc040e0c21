//! Line-driven shell. Lines come from a rustyline editor in interactive mode or
//! from stdin when `MILETRACK_CLI_SCRIPT` is set.

use std::io::{self, BufRead};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};

use crate::cli::core::{CliError, CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::output::info as output_info;
use crate::cli::registry::CommandRegistry;

pub const SCRIPT_ENV: &str = "MILETRACK_CLI_SCRIPT";

/// Subcommands of `car` whose next word names a car.
const CAR_TARGET_ACTIONS: &[&str] = &["edit", "select", "use", "default", "remove", "delete"];

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };
    let mut context = ShellContext::new(mode)?;

    let result = match mode {
        CliMode::Interactive => EditorSource::new(&context.registry)
            .and_then(|mut source| run_loop(&mut context, &mut source)),
        CliMode::Script => run_loop(&mut context, &mut ScriptSource::new(io::stdin().lock())),
    };
    if context.has_unsaved_changes() {
        context.print_warning("Session ended with unsaved changes.");
    }
    tracing::debug!(status = %context.status(), "shell finished");
    result
}

enum Input {
    Line(String),
    Interrupted,
    Closed,
}

trait LineSource {
    fn next_input(&mut self, context: &ShellContext) -> Result<Input, CliError>;
}

struct ScriptSource<R> {
    lines: io::Lines<R>,
}

impl<R: BufRead> ScriptSource<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> LineSource for ScriptSource<R> {
    fn next_input(&mut self, _context: &ShellContext) -> Result<Input, CliError> {
        match self.lines.next() {
            Some(line) => Ok(Input::Line(line?)),
            None => Ok(Input::Closed),
        }
    }
}

struct EditorSource {
    editor: Editor<ShellHelper, DefaultHistory>,
}

impl EditorSource {
    fn new(registry: &CommandRegistry) -> Result<Self, CliError> {
        let mut editor = Editor::<ShellHelper, DefaultHistory>::new()?;
        editor.set_helper(Some(ShellHelper::new(registry)));
        editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
        Ok(Self { editor })
    }
}

impl LineSource for EditorSource {
    fn next_input(&mut self, context: &ShellContext) -> Result<Input, CliError> {
        if let Some(helper) = self.editor.helper_mut() {
            helper.cars = context.car_names();
        }
        match self.editor.readline(&context.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.trim()).ok();
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Closed),
            Err(err) => Err(err.into()),
        }
    }
}

fn run_loop(context: &mut ShellContext, source: &mut dyn LineSource) -> Result<(), CliError> {
    while context.running {
        match source.next_input(context)? {
            Input::Line(line) => {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                match handle_line(context, line) {
                    Ok(LoopControl::Continue) => {}
                    Ok(LoopControl::Exit) => break,
                    Err(err) => context.report_error(err)?,
                }
            }
            Input::Interrupted => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Input::Closed => {
                if context.mode == CliMode::Interactive {
                    output_info("Exiting shell.");
                }
                break;
            }
        }
    }
    Ok(())
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = match shell_words::split(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            context.print_warning(&format!("Could not read `{}`: {}", line, err));
            return Ok(LoopControl::Continue);
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    context.last_command = Some(line.to_string());

    let control = context.dispatch(&raw.to_lowercase(), raw, &args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

/// Completes command names, their subcommands and the cars of the open garage.
struct ShellHelper {
    commands: Vec<(&'static str, &'static [&'static str])>,
    cars: Vec<String>,
}

impl ShellHelper {
    fn new(registry: &CommandRegistry) -> Self {
        Self {
            commands: registry
                .entries()
                .iter()
                .map(|entry| (entry.name, entry.actions))
                .collect(),
            cars: Vec::new(),
        }
    }

    /// Candidates for the word after `words`, which are already lowercased.
    fn candidates(&self, words: &[&str]) -> Vec<String> {
        match words {
            [] => self.commands.iter().map(|(name, _)| name.to_string()).collect(),
            [.., "--car"] => self.cars.clone(),
            ["car", action] if CAR_TARGET_ACTIONS.contains(action) => self.cars.clone(),
            [command] => self
                .commands
                .iter()
                .find(|(name, _)| name == command)
                .map(|(_, actions)| actions.iter().map(|action| action.to_string()).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

impl Helper for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = prefix
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let head = prefix[..start].to_lowercase();
        let words: Vec<&str> = head.split_whitespace().collect();
        let needle = prefix[start..].to_lowercase();

        let pairs = self
            .candidates(&words)
            .into_iter()
            .filter(|candidate| candidate.to_lowercase().starts_with(&needle))
            .map(|candidate| Pair {
                replacement: shell_words::quote(&candidate).into_owned(),
                display: candidate,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}
