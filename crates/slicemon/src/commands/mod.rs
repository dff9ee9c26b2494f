//! Command dispatch: bridges CLI args -> monitor / config -> output formatting.

pub mod actions;
pub mod config_cmd;
pub mod evaluate;
pub mod metrics;
pub mod simulate;
pub mod thresholds;
pub mod util;
pub mod views;
pub mod watch;

use crate::cli::Command;
use crate::config::Context;
use crate::error::CliError;

/// Dispatch a config-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, mut ctx: Context) -> Result<(), CliError> {
    match cmd {
        Command::Watch(args) => watch::handle(args, &ctx).await,
        Command::Simulate(args) => simulate::handle(args, &ctx),
        Command::Evaluate(args) => evaluate::handle(args, &ctx),
        Command::Thresholds(args) => thresholds::handle(args, &mut ctx),
        Command::Metrics(args) => metrics::handle(args, &mut ctx),
        Command::Actions(args) => actions::handle(args, &mut ctx),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
