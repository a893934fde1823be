use std::io::{self, BufRead, Write};
use std::path::Path;

use pw_core::WizardError;
use pw_runtime::PrototypeWizard;

use crate::{
    load_session_from_state_for_catalog, map_tui_io, save_session_state, start_session,
    TuiCommandAction, TuiCommandContext,
};

pub(crate) const TUI_COMMANDS: &str = "commands: :help :save :load :restart :quit";

pub(crate) fn run_tui_line_mode(
    context: &TuiCommandContext<'_>,
    wizard: &mut PrototypeWizard,
) -> Result<i32, WizardError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_tui_line_mode_with_io(context, wizard, &mut reader, &mut writer)
}

pub(crate) fn run_tui_line_mode_with_io(
    context: &TuiCommandContext<'_>,
    wizard: &mut PrototypeWizard,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, WizardError> {
    writeln!(writer, "Prototype wizard").map_err(map_tui_io)?;
    writeln!(writer, "{}", TUI_COMMANDS).map_err(map_tui_io)?;

    let mut output = wizard.look();
    loop {
        writeln!(writer).map_err(map_tui_io)?;
        writeln!(writer, "{}", output.text).map_err(map_tui_io)?;
        if output.exited {
            return Ok(0);
        }

        loop {
            let Some(raw) = prompt_input_from("> ", reader, writer)? else {
                return Ok(0);
            };
            let mut emitted = Vec::new();
            let mut emit = |line: String| emitted.push(line);
            let action = match handle_tui_command(raw.as_str(), context, wizard, &mut emit) {
                Ok(action) => action,
                Err(error) => {
                    emit(format!("error: {}", error));
                    TuiCommandAction::Continue
                }
            };
            for line in emitted {
                writeln!(writer, "{}", line).map_err(map_tui_io)?;
            }
            match action {
                TuiCommandAction::Continue => continue,
                TuiCommandAction::RefreshTurn => {
                    output = wizard.look();
                    break;
                }
                TuiCommandAction::Quit => return Ok(0),
                TuiCommandAction::NotHandled => {}
            }
            output = wizard.enter(&raw);
            break;
        }
    }
}

/// Host-level `:` commands. Anything else is wizard input.
pub(crate) fn handle_tui_command(
    raw: &str,
    context: &TuiCommandContext<'_>,
    wizard: &mut PrototypeWizard,
    emit: &mut dyn FnMut(String),
) -> Result<TuiCommandAction, WizardError> {
    match raw.trim() {
        ":help" => {
            emit(TUI_COMMANDS.to_string());
            Ok(TuiCommandAction::Continue)
        }
        ":save" => {
            save_session_state(Path::new(context.state_file), wizard, &context.catalog.id)?;
            emit(format!("saved: {}", context.state_file));
            Ok(TuiCommandAction::Continue)
        }
        ":load" => {
            let resumed =
                load_session_from_state_for_catalog(Path::new(context.state_file), context.catalog)?;
            *wizard = resumed;
            emit(format!("loaded: {}", context.state_file));
            Ok(TuiCommandAction::RefreshTurn)
        }
        ":restart" => {
            let mut restarted =
                start_session(context.catalog, context.user, context.template, context.seed)?;
            std::mem::swap(wizard, &mut restarted);
            emit("restarted".to_string());
            Ok(TuiCommandAction::RefreshTurn)
        }
        ":quit" => {
            emit("bye".to_string());
            Ok(TuiCommandAction::Quit)
        }
        _ => Ok(TuiCommandAction::NotHandled),
    }
}

/// `None` once the reader is exhausted.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, WizardError> {
    write!(writer, "{}", prefix).map_err(map_tui_io)?;
    writer.flush().map_err(map_tui_io)?;
    let mut input = String::new();
    if reader.read_line(&mut input).map_err(map_tui_io)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}
