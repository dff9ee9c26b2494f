//! Synchronous simulation: run ticks back to back without timers.

use crate::cli::{SimulateArgs, SimulateView};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::{util, views};

pub fn handle(args: SimulateArgs, ctx: &Context) -> Result<(), CliError> {
    let monitor = util::build_monitor(ctx, args.seed, args.no_auto_alert)?;

    let mut raised = 0usize;
    for _ in 0..args.ticks {
        raised += monitor.tick_builtin().len();
        raised += monitor.tick_custom().len();
    }
    tracing::info!(rounds = args.ticks, raised, "simulation finished");

    let out = match args.show {
        SimulateView::History => views::render_history(ctx.format, &monitor.history())?,
        SimulateView::Alerts => views::render_alerts(ctx.format, &monitor.alerts(), ctx.color)?,
        SimulateView::Violations => views::render_historical(ctx.format, &monitor.violations())?,
    };
    output::print_output(&out, ctx.quiet);
    Ok(())
}
