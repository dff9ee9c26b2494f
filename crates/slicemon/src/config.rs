//! CLI configuration: thin wrapper around `slicemon_config`.
//!
//! Resolves the config file path and output settings with `GlobalOpts`
//! flag overrides taking priority over the file.

use std::path::PathBuf;

use clap::ValueEnum;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Re-exports from shared crate ────────────────────────────────────

pub use slicemon_config::{Config, load_config_from, save_config_to};

// ── CLI-specific helpers ────────────────────────────────────────────

/// The config file in effect: `--config` / `SLICEMON_CONFIG`, else the
/// platform default.
pub fn resolve_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(slicemon_config::config_path)
}

/// Everything a command handler needs from flags and the config file.
pub struct Context {
    pub path: PathBuf,
    pub config: Config,
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl Context {
    /// Load the config file and resolve output settings (flag > file).
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let path = resolve_path(global);
        let config = load_config_from(&path)?;

        let format = match global.output {
            Some(format) => format,
            None => parse_setting("defaults.output", &config.defaults.output)?,
        };
        let color_mode = match global.color {
            Some(mode) => mode,
            None => parse_setting::<ColorMode>("defaults.color", &config.defaults.color)?,
        };

        Ok(Self {
            path,
            config,
            format,
            color: output::should_color(color_mode),
            quiet: global.quiet,
        })
    }

    /// Validate and write the (modified) config back to its file.
    pub fn save(&self) -> Result<(), CliError> {
        save_config_to(&self.config, &self.path)?;
        tracing::debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}

fn parse_setting<T: ValueEnum>(field: &str, value: &str) -> Result<T, CliError> {
    T::from_str(value, true).map_err(|reason| CliError::InvalidConfig {
        field: field.into(),
        reason,
    })
}
