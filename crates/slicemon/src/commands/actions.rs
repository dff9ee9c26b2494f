//! Automated action rule handlers. Rules are recorded, not executed.

use indexmap::IndexMap;
use tabled::Tabled;

use slicemon_core::{ActionCondition, ActionKind, AutomatedActionRule};

use crate::cli::{ActionConditionArg, ActionKindArg, ActionsArgs, ActionsCommand};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Condition")]
    condition: String,
    #[tabled(rename = "Threshold")]
    threshold: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Parameters")]
    parameters: String,
}

fn rule_row(rule: &AutomatedActionRule) -> RuleRow {
    RuleRow {
        metric: rule.metric.clone(),
        condition: rule.condition.to_string(),
        threshold: output::number(rule.threshold),
        action: rule.action.to_string(),
        parameters: rule
            .parameters
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn rule_line(rule: &AutomatedActionRule) -> String {
    format!(
        "{} {} {} -> {}",
        rule.metric,
        rule.condition,
        output::number(rule.threshold),
        rule.action
    )
}

impl From<ActionConditionArg> for ActionCondition {
    fn from(arg: ActionConditionArg) -> Self {
        match arg {
            ActionConditionArg::Above => Self::Above,
            ActionConditionArg::Below => Self::Below,
            ActionConditionArg::Equals => Self::Equals,
        }
    }
}

impl From<ActionKindArg> for ActionKind {
    fn from(arg: ActionKindArg) -> Self {
        match arg {
            ActionKindArg::Notify => Self::Notify,
            ActionKindArg::Scale => Self::Scale,
            ActionKindArg::Restart => Self::Restart,
            ActionKindArg::Webhook => Self::Webhook,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ActionsArgs, ctx: &mut Context) -> Result<(), CliError> {
    match args.command {
        ActionsCommand::List => {
            let out = output::render_list(
                ctx.format,
                &ctx.config.action_rules,
                |r| rule_row(r),
                |r| rule_line(r),
            )?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        ActionsCommand::Add {
            metric,
            condition,
            threshold,
            action,
            params,
        } => {
            let metric = metric.trim().to_owned();
            if metric.is_empty() {
                return Err(CliError::Validation {
                    field: "metric".into(),
                    reason: "must not be empty".into(),
                });
            }

            let rule = AutomatedActionRule {
                metric,
                condition: condition.into(),
                threshold: util::finite("threshold", threshold)?,
                action: action.into(),
                parameters: params.into_iter().collect::<IndexMap<_, _>>(),
            };
            let line = rule_line(&rule);
            ctx.config.action_rules.push(rule);
            ctx.save()?;
            output::print_status(&format!("Action rule added: {line}"), ctx.quiet);
            Ok(())
        }
    }
}
