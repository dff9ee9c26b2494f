//! Clap derive structures for the `slicemon` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// slicemon -- QoS threshold monitor for network slices
#[derive(Debug, Parser)]
#[command(
    name = "slicemon",
    version,
    about = "Watch network slice QoS metrics and raise threshold alerts",
    long_about = "Samples bandwidth, latency, and reliability (plus user-defined\n\
        custom metrics) on a fixed period, checks each sample against the\n\
        configured thresholds, and raises alerts when a limit is crossed.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path to the configuration file
    #[arg(long, env = "SLICEMON_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (defaults to the config file's choice, then table)
    #[arg(long, short = 'o', env = "SLICEMON_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the monitor and print alerts as they are raised
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Drive a number of ticks instantly and show the outcome
    #[command(alias = "sim")]
    Simulate(SimulateArgs),

    /// Check one set of values against the configured thresholds
    #[command(alias = "eval")]
    Evaluate(EvaluateArgs),

    /// Show or change built-in metric thresholds
    #[command(alias = "th")]
    Thresholds(ThresholdsArgs),

    /// Manage custom metric definitions
    Metrics(MetricsArgs),

    /// Manage automated action rules
    Actions(ActionsArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this long (e.g. "30s", "5m"); runs until Ctrl-C otherwise
    #[arg(long, short = 'd', value_parser = humantime::parse_duration)]
    pub duration: Option<Duration>,

    /// Seed the simulated telemetry for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Start with automatic alerts disabled
    #[arg(long)]
    pub no_auto_alert: bool,

    /// Restore settings from this file on start and save them on exit
    #[arg(long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Also print every sample as it is taken
    #[arg(long)]
    pub samples: bool,
}

// ── Simulate ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Rounds to run (each round is one built-in and one custom tick)
    #[arg(long, short = 'n', default_value = "20")]
    pub ticks: u32,

    /// Seed the simulated telemetry for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run with automatic alerts disabled
    #[arg(long)]
    pub no_auto_alert: bool,

    /// What to print once the rounds are done
    #[arg(long, default_value = "alerts")]
    pub show: SimulateView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SimulateView {
    /// Retained samples, oldest first
    History,
    /// Retained alerts, most recent first
    Alerts,
    /// Violations found in the retained samples
    Violations,
}

// ── Evaluate ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EvaluateArgs {
    /// Bandwidth usage (percent)
    #[arg(long, short = 'b')]
    pub bandwidth: f64,

    /// Latency (percent of target)
    #[arg(long, short = 'l')]
    pub latency: f64,

    /// Reliability (percent)
    #[arg(long, short = 'r')]
    pub reliability: f64,

    /// Custom metric value as NAME=VALUE (repeatable)
    #[arg(
        long = "custom",
        short = 'c',
        value_name = "NAME=VALUE",
        value_parser = parse_metric_value
    )]
    pub custom: Vec<(String, f64)>,
}

// ── Thresholds ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ThresholdsArgs {
    #[command(subcommand)]
    pub command: ThresholdsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ThresholdsCommand {
    /// Show the configured thresholds
    Show,

    /// Update one or more thresholds in the config file
    Set(ThresholdsSetArgs),
}

#[derive(Debug, Args)]
pub struct ThresholdsSetArgs {
    /// Bandwidth warning limit (percent)
    #[arg(long)]
    pub bandwidth: Option<f64>,

    /// Bandwidth critical limit (percent)
    #[arg(long)]
    pub bandwidth_critical: Option<f64>,

    /// Latency warning limit (percent of target)
    #[arg(long)]
    pub latency: Option<f64>,

    /// Latency critical limit (percent of target)
    #[arg(long)]
    pub latency_critical: Option<f64>,

    /// Reliability warning floor (percent)
    #[arg(long)]
    pub reliability: Option<f64>,

    /// Reliability critical floor (percent)
    #[arg(long)]
    pub reliability_critical: Option<f64>,

    /// Remove every critical limit before applying the others
    #[arg(long)]
    pub clear_critical: bool,
}

// ── Custom Metrics ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MetricsArgs {
    #[command(subcommand)]
    pub command: MetricsCommand,
}

#[derive(Debug, Subcommand)]
pub enum MetricsCommand {
    /// List custom metric definitions
    #[command(alias = "ls")]
    List,

    /// Define a new custom metric
    Add {
        /// Metric name (unique, not a built-in name)
        name: String,

        /// Which side of the threshold is a violation
        #[arg(long, default_value = "above")]
        condition: ConditionArg,

        /// Warning threshold
        #[arg(long, default_value = "80")]
        threshold: f64,

        /// Critical threshold
        #[arg(long)]
        critical: Option<f64>,

        /// Display unit
        #[arg(long, default_value = "")]
        unit: String,

        /// Display formula (not evaluated)
        #[arg(long, default_value = "")]
        formula: String,
    },

    /// Remove a custom metric definition
    #[command(alias = "rm")]
    Remove {
        /// Metric name
        name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConditionArg {
    /// Values greater than the threshold violate
    #[value(alias = ">")]
    Above,
    /// Values less than the threshold violate
    #[value(alias = "<")]
    Below,
}

// ── Action Rules ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ActionsArgs {
    #[command(subcommand)]
    pub command: ActionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ActionsCommand {
    /// List automated action rules
    #[command(alias = "ls")]
    List,

    /// Record a new automated action rule
    Add {
        /// Metric the rule watches
        metric: String,

        /// Comparison against the threshold
        #[arg(long, default_value = "above")]
        condition: ActionConditionArg,

        /// Threshold value
        #[arg(long)]
        threshold: f64,

        /// Action to take
        #[arg(long, default_value = "notify")]
        action: ActionKindArg,

        /// Action parameter as KEY=VALUE (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionConditionArg {
    Above,
    Below,
    Equals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionKindArg {
    Notify,
    Scale,
    Restart,
    Webhook,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration (file + environment)
    Show,

    /// Print the configuration file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

// ── Value parsers ────────────────────────────────────────────────────

fn split_pair(raw: &str) -> Result<(&str, &str), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing name in '{raw}'"));
    }
    Ok((key, value.trim()))
}

fn parse_metric_value(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = split_pair(raw)?;
    let value: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    Ok((name.to_owned(), value))
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (key, value) = split_pair(raw)?;
    Ok((key.to_owned(), value.to_owned()))
}
