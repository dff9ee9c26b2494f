//! One-shot evaluation of supplied values.

use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;

use slicemon_core::{BuiltinSample, CustomSample, MetricSample, evaluate};

use crate::cli::{EvaluateArgs, OutputFormat};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::{util, views};

pub fn handle(args: EvaluateArgs, ctx: &Context) -> Result<(), CliError> {
    let thresholds = ctx.config.thresholds;
    let definitions: Vec<_> = ctx
        .config
        .custom_metrics
        .iter()
        .cloned()
        .map(Arc::new)
        .collect();

    let now = Utc::now();
    let builtin = MetricSample::Builtin(BuiltinSample {
        seq: 1,
        timestamp: now,
        bandwidth: util::finite("bandwidth", args.bandwidth)?,
        latency: util::finite("latency", args.latency)?,
        reliability: util::finite("reliability", args.reliability)?,
    });
    let mut violations = evaluate(&builtin, &thresholds, &definitions);

    if !args.custom.is_empty() {
        let mut values = IndexMap::new();
        for (name, value) in args.custom {
            if !definitions.iter().any(|d| d.name == name) {
                return Err(CliError::NotFound {
                    resource_type: "custom metric".into(),
                    identifier: name,
                    list_command: "metrics list".into(),
                });
            }
            let value = util::finite(&name, value)?;
            values.insert(name, value);
        }
        let custom = MetricSample::Custom(CustomSample {
            seq: 2,
            timestamp: now,
            values,
        });
        violations.extend(evaluate(&custom, &thresholds, &definitions));
    }

    tracing::debug!(count = violations.len(), "evaluated supplied values");

    if violations.is_empty() && ctx.format == OutputFormat::Table {
        output::print_status("All metrics within thresholds", ctx.quiet);
        return Ok(());
    }
    let out = views::render_violations(ctx.format, &violations, ctx.color)?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
