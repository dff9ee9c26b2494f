//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use slicemon_config::ConfigError;
use slicemon_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONFIG: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(slicemon::not_found),
        help("Run: slicemon {list_command} to see what is defined")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} '{identifier}' already exists")]
    #[diagnostic(code(slicemon::conflict))]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(slicemon::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration: {field}: {reason}")]
    #[diagnostic(
        code(slicemon::invalid_config),
        help(
            "Fix the value in the config file or the matching SLICEMON_ variable.\n\
             Run: slicemon config path"
        )
    )]
    InvalidConfig { field: String, reason: String },

    #[error("Configuration could not be loaded: {message}")]
    #[diagnostic(
        code(slicemon::config),
        help("Check the file syntax. Run: slicemon config path")
    )]
    Config { message: String },

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(slicemon::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    // ── Monitor ──────────────────────────────────────────────────────
    #[error("Monitor is already running")]
    #[diagnostic(code(slicemon::already_running))]
    AlreadyRunning,

    #[error("Settings state could not be read or written: {message}")]
    #[diagnostic(
        code(slicemon::state),
        help("Check the --state file path and its contents.")
    )]
    State { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(slicemon::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(slicemon::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(slicemon::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(slicemon::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } | Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::InvalidConfig { .. } | Self::Config { .. } => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::DuplicateMetric { name } => CliError::Conflict {
                resource_type: "custom metric".into(),
                identifier: name,
            },

            CoreError::AlreadyRunning => CliError::AlreadyRunning,

            CoreError::Storage { message } => CliError::State { message },

            CoreError::Serialization(e) => CliError::State {
                message: e.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::InvalidConfig { field, reason },
            ConfigError::Serialization(e) => CliError::Toml(e),
            ConfigError::Figment(e) => CliError::Config {
                message: e.to_string(),
            },
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
