//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use slicemon_core::Severity;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Severity label, colored when enabled.
pub fn severity_label(severity: Severity, color: bool) -> String {
    match (severity, color) {
        (_, false) => severity.to_string(),
        (Severity::Warning, true) => severity.yellow().to_string(),
        (Severity::Error, true) => severity.red().bold().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable items in the chosen format.
///
/// - `table`: maps each item through `to_row` and builds a rounded table
/// - `json` / `json-compact` / `yaml`: serializes the original data via serde
/// - `plain`: calls `line_fn` on each item to emit one line per item
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    line_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&line_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views don't use a
/// `Tabled` row.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    line_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(line_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Print a status line to stderr, respecting quiet mode.
pub fn print_status(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(rendered)
}

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}

/// Format a number without a trailing `.0` for whole values.
pub fn number(value: f64) -> String {
    format!("{value}")
}

/// Format a measurement with up to two decimals.
pub fn measurement(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Item {
        name: &'static str,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "Name")]
        name: String,
    }

    fn items() -> Vec<Item> {
        vec![Item { name: "jitter" }, Item { name: "loss" }]
    }

    fn row(item: &Item) -> ItemRow {
        ItemRow {
            name: item.name.to_owned(),
        }
    }

    #[test]
    fn plain_emits_one_line_per_item() {
        let out = render_list(OutputFormat::Plain, &items(), row, |i| i.name.to_owned()).ok();
        assert_eq!(out.as_deref(), Some("jitter\nloss"));
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_list(OutputFormat::JsonCompact, &items(), row, |i| i.name.to_owned())
            .ok();
        assert_eq!(
            out.as_deref(),
            Some(r#"[{"name":"jitter"},{"name":"loss"}]"#)
        );
    }

    #[test]
    fn table_has_header_and_rows() {
        let out = render_list(OutputFormat::Table, &items(), row, |i| i.name.to_owned())
            .unwrap_or_default();
        assert!(out.contains("Name"));
        assert!(out.contains("jitter"));
        assert!(out.contains("loss"));
    }

    #[test]
    fn uncolored_severity_is_the_bare_label() {
        assert_eq!(severity_label(Severity::Error, false), "error");
    }

    #[test]
    fn whole_numbers_have_no_fraction() {
        assert_eq!(number(80.0), "80");
        assert_eq!(number(92.5), "92.5");
        assert_eq!(measurement(1.0 / 3.0), "0.33");
    }
}
