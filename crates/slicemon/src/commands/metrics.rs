//! Custom metric command handlers.

use tabled::Tabled;

use slicemon_core::{BuiltinMetric, Comparison, CustomMetricDefinition, Limit};

use crate::cli::{ConditionArg, MetricsArgs, MetricsCommand};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Condition")]
    condition: String,
    #[tabled(rename = "Warning")]
    warning: String,
    #[tabled(rename = "Critical")]
    critical: String,
    #[tabled(rename = "Formula")]
    formula: String,
}

impl From<&CustomMetricDefinition> for MetricRow {
    fn from(d: &CustomMetricDefinition) -> Self {
        Self {
            name: d.name.clone(),
            unit: d.unit.clone(),
            condition: d.condition.to_string(),
            warning: output::number(d.threshold.warning),
            critical: d.threshold.critical.map(output::number).unwrap_or_default(),
            formula: d.formula.clone(),
        }
    }
}

impl From<ConditionArg> for Comparison {
    fn from(arg: ConditionArg) -> Self {
        match arg {
            ConditionArg::Above => Self::Above,
            ConditionArg::Below => Self::Below,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: MetricsArgs, ctx: &mut Context) -> Result<(), CliError> {
    match args.command {
        MetricsCommand::List => {
            let out = output::render_list(
                ctx.format,
                &ctx.config.custom_metrics,
                |d| MetricRow::from(d),
                |d| d.name.clone(),
            )?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        MetricsCommand::Add {
            name,
            condition,
            threshold,
            critical,
            unit,
            formula,
        } => {
            let name = name.trim().to_owned();
            if name.is_empty() || name.parse::<BuiltinMetric>().is_ok() {
                return Err(CliError::Validation {
                    field: "name".into(),
                    reason: format!("'{name}' is empty or names a built-in metric"),
                });
            }
            if ctx.config.custom_metrics.iter().any(|d| d.name == name) {
                return Err(CliError::Conflict {
                    resource_type: "custom metric".into(),
                    identifier: name,
                });
            }

            let condition = Comparison::from(condition);
            let warning = util::finite("threshold", threshold)?;
            let limit = match critical {
                Some(critical) => Limit::tiered(warning, util::finite("critical", critical)?),
                None => Limit::new(warning),
            };
            limit
                .validate(condition.direction())
                .map_err(|reason| CliError::Validation {
                    field: "critical".into(),
                    reason,
                })?;

            let definition = CustomMetricDefinition::new(name.clone(), condition, limit)
                .with_unit(unit)
                .with_formula(formula);

            ctx.config.custom_metrics.push(definition);
            ctx.save()?;
            output::print_status(&format!("Custom metric '{name}' added"), ctx.quiet);
            Ok(())
        }

        MetricsCommand::Remove { name } => {
            let before = ctx.config.custom_metrics.len();
            ctx.config.custom_metrics.retain(|d| d.name != name);
            if ctx.config.custom_metrics.len() == before {
                return Err(CliError::NotFound {
                    resource_type: "custom metric".into(),
                    identifier: name,
                    list_command: "metrics list".into(),
                });
            }
            ctx.save()?;
            output::print_status(&format!("Custom metric '{name}' removed"), ctx.quiet);
            Ok(())
        }
    }
}
