use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pw-cli")]
#[command(about = "Prototype wizard agent and terminal CLI")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Agent(AgentArgs),
    Tui(TuiArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Input(InputArgs),
}

/// Who is driving the wizard.
#[derive(Debug, Clone, Args)]
pub(crate) struct UserArgs {
    #[arg(long = "user", default_value = "builder")]
    pub(crate) user: String,
    #[arg(long = "perm")]
    pub(crate) permissions: Vec<String>,
    #[arg(long = "location")]
    pub(crate) location: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[arg(long = "catalog")]
    pub(crate) catalog: String,
    #[command(flatten)]
    pub(crate) user: UserArgs,
    /// Key of a catalog template to edit instead of starting blank.
    #[arg(long = "template")]
    pub(crate) template: Option<String>,
    #[arg(long = "seed")]
    pub(crate) seed: Option<u32>,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct InputArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "text")]
    pub(crate) text: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct TuiArgs {
    #[arg(long = "catalog")]
    pub(crate) catalog: String,
    #[command(flatten)]
    pub(crate) user: UserArgs,
    #[arg(long = "template")]
    pub(crate) template: Option<String>,
    #[arg(long = "seed")]
    pub(crate) seed: Option<u32>,
    #[arg(long = "state-file")]
    pub(crate) state_file: Option<String>,
    /// Plain prompt loop even when attached to a terminal.
    #[arg(long = "line")]
    pub(crate) line: bool,
}
