//! Shared helpers for command handlers.

use std::io::IsTerminal;

use slicemon_core::{Monitor, SimulatedSource};

use crate::config::Context;
use crate::error::CliError;

/// Build a monitor from the loaded config, fed by simulated telemetry.
///
/// A seed makes the telemetry reproducible; `no_auto_alert` overrides the
/// config's alert gate.
pub fn build_monitor(
    ctx: &Context,
    seed: Option<u64>,
    no_auto_alert: bool,
) -> Result<Monitor, CliError> {
    let mut monitor_config = ctx.config.to_monitor_config()?;
    if no_auto_alert {
        monitor_config.auto_alert = false;
    }
    let source = seed.map_or_else(SimulatedSource::new, SimulatedSource::seeded);
    Ok(Monitor::with_source(monitor_config, source)?)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Reject non-finite numbers supplied on the command line.
pub fn finite(field: &str, value: f64) -> Result<f64, CliError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CliError::Validation {
            field: field.into(),
            reason: format!("must be a finite number, got {value}"),
        })
    }
}
