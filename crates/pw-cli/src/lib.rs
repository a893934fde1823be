use std::ffi::OsString;

use clap::Parser;
use pw_core::WizardError;
use tracing::info;

mod agent;
mod catalog_loader;
mod cli_args;
mod error_map;
mod line_tui;
mod models;
mod session_ops;
mod state_store;
mod tui;
mod tui_render;
mod tui_state;
mod turn_printer;

#[cfg(test)]
mod cli_test_support;

pub(crate) use catalog_loader::{load_catalog_by_dir, load_catalog_by_ref};
pub(crate) use cli_args::{
    AgentArgs, AgentCommand, Cli, InputArgs, Mode, StartArgs, TuiArgs, UserArgs,
};
pub(crate) use error_map::{
    emit_error, map_cli_catalog_path, map_cli_state_invalid, map_cli_state_read,
    map_cli_state_write, map_tui_io,
};
pub(crate) use line_tui::{handle_tui_command, run_tui_line_mode};
pub(crate) use models::{
    LoadedCatalog, PlayerState, TuiCommandAction, TuiCommandContext, PLAYER_STATE_SCHEMA,
};
pub(crate) use session_ops::{
    emit_turn_with_saved_state, load_session_from_state_for_catalog,
    load_session_from_state_for_ref, save_session_state, start_session, user_from_args,
};
pub(crate) use state_store::{load_player_state, save_player_state};
pub(crate) use turn_printer::emit_turn;

const DEFAULT_STATE_FILE: &str = ".prototype-wizard/session.json";

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, WizardError> {
    match cli.command {
        Mode::Agent(args) => run_agent(args),
        Mode::Tui(args) => run_tui(args),
    }
}

fn run_agent(args: AgentArgs) -> Result<i32, WizardError> {
    agent::run_agent(args)
}

fn run_tui(args: TuiArgs) -> Result<i32, WizardError> {
    let state_file = args
        .state_file
        .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
    let catalog = load_catalog_by_dir(&args.catalog)?;
    let user = user_from_args(&args.user);
    let mut wizard = start_session(&catalog, &user, args.template.as_deref(), args.seed)?;
    info!(catalog = %catalog.dir.display(), user = %user.name, "tui session started");
    let context = TuiCommandContext {
        state_file: &state_file,
        catalog: &catalog,
        user: &user,
        template: args.template.as_deref(),
        seed: args.seed,
    };

    tui::run_tui_ratatui_mode(&context, &mut wizard, args.line)
}

#[cfg(test)]
mod tests;
