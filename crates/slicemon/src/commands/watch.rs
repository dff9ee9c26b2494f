//! Live monitoring: run both ticks on their timers and stream alerts.

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio_stream::StreamExt;

use slicemon_core::{Alert, JsonFileStore, MetricSample, Monitor};

use crate::cli::{OutputFormat, WatchArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::{util, views};

pub async fn handle(args: WatchArgs, ctx: &Context) -> Result<(), CliError> {
    let monitor = util::build_monitor(ctx, args.seed, args.no_auto_alert)?;

    let store = args.state.as_ref().map(JsonFileStore::new);
    if let Some(store) = &store {
        if monitor.restore_settings(store)? {
            output::print_status(
                &format!("Restored settings from {}", store.path().display()),
                ctx.quiet,
            );
        }
        // The flag wins over a restored toggle.
        if args.no_auto_alert {
            monitor.toggle_auto_alert(false);
        }
    }

    let mut alerts = monitor.subscribe_alerts();
    let mut samples = monitor.history_stream();
    monitor.start().await?;
    output::print_status(
        &format!(
            "Watching: built-in every {}, custom every {} (Ctrl-C to stop)",
            humantime::format_duration(monitor.config().sample_interval),
            humantime::format_duration(monitor.config().custom_interval),
        ),
        ctx.quiet,
    );

    let deadline = sleep_or_forever(args.duration);
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            () = &mut deadline => {
                tracing::debug!("watch duration elapsed");
                break;
            }
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "failed to listen for Ctrl-C");
                }
                break;
            }
            received = alerts.recv() => match received {
                Ok(alert) => output::print_output(&stream_line(&alert, ctx)?, ctx.quiet),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "alert stream lagged; some alerts were not printed");
                }
                Err(RecvError::Closed) => break,
            },
            Some(sample) = samples.next(), if args.samples => {
                output::print_output(&sample_line(&sample, ctx)?, ctx.quiet);
            }
        }
    }

    if samples.missed() > 0 {
        tracing::warn!(missed = samples.missed(), "some samples were evicted before printing");
    }
    finish(&monitor, store.as_ref(), ctx).await
}

/// Stop the monitor, persist settings if asked, and print the final alert list.
async fn finish(
    monitor: &Monitor,
    store: Option<&JsonFileStore>,
    ctx: &Context,
) -> Result<(), CliError> {
    monitor.stop().await;

    if let Some(store) = store {
        monitor.save_settings(store)?;
        tracing::info!(path = %store.path().display(), "settings saved");
    }

    let alerts = monitor.alerts();
    if alerts.is_empty() {
        output::print_status("No alerts raised", ctx.quiet);
        return Ok(());
    }
    output::print_status("Final alerts:", ctx.quiet);
    let out = views::render_alerts(ctx.format, &alerts, ctx.color)?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

async fn sleep_or_forever(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

/// One sample as it is taken.
fn sample_line(sample: &MetricSample, ctx: &Context) -> Result<String, CliError> {
    let line = match ctx.format {
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(sample)?,
        OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(sample)?),
        OutputFormat::Table | OutputFormat::Plain => {
            let time = sample.timestamp().format("%H:%M:%S");
            format!("{time} {}", views::sample_line(sample))
        }
    };
    Ok(line)
}

/// One alert as it is raised. Structured formats emit one document per alert.
fn stream_line(alert: &Alert, ctx: &Context) -> Result<String, CliError> {
    let line = match ctx.format {
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(alert)?,
        OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(alert)?),
        OutputFormat::Table | OutputFormat::Plain => {
            let time = alert.timestamp.format("%H:%M:%S");
            format!("{time} {}", views::alert_line(alert, ctx.color))
        }
    };
    Ok(line)
}
