// ── Monitor ──
//
// Lifecycle owner for the QoS threshold loop. Holds the active thresholds,
// custom metric definitions, history buffer, and alert sink, and runs the
// built-in and custom sampling ticks as cancellable background tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::Utc;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::evaluate::{self, HistoricalViolation};
use crate::model::{
    Alert, AlertId, AutomatedActionRule, BuiltinMetric, BuiltinSample, CustomMetricDefinition,
    CustomSample, MetricSample, ThresholdSet,
};
use crate::sampler::{MetricSource, SimulatedSource};
use crate::settings::{MonitorSettings, SETTINGS_KEY, SettingsStore};
use crate::store::{AlertSink, HistoryBuffer};
use crate::stream::SampleStream;

const ALERT_CHANNEL_SIZE: usize = 64;

// ── MonitorState ─────────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy)]
enum TickKind {
    Builtin,
    Custom,
}

// ── Monitor ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<MonitorInner>`. Construction does not start
/// sampling; call [`start()`](Self::start) to arm both ticks and
/// [`stop()`](Self::stop) to disarm them. All setters take effect on the
/// next tick.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    thresholds: ArcSwap<ThresholdSet>,
    auto_alert: AtomicBool,
    custom_metrics: ArcSwap<Vec<Arc<CustomMetricDefinition>>>,
    action_rules: ArcSwap<Vec<Arc<AutomatedActionRule>>>,
    history: HistoryBuffer,
    alerts: AlertSink,
    alert_tx: broadcast::Sender<Arc<Alert>>,
    source: std::sync::Mutex<Box<dyn MetricSource>>,
    counters: std::sync::Mutex<Counters>,
    state: watch::Sender<MonitorState>,
    run: Mutex<Option<RunHandle>>,
}

/// Sequence and alert-id allocation. Held for a whole tick so that
/// history stays in `seq` order and the alert list in id order.
struct Counters {
    next_seq: u64,
    next_alert_id: u64,
}

impl Counters {
    fn seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn alert_id(&mut self) -> AlertId {
        let id = AlertId(self.next_alert_id);
        self.next_alert_id += 1;
        id
    }
}

struct RunHandle {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Monitor {
    /// Create a monitor fed by a [`SimulatedSource`].
    pub fn new(config: MonitorConfig) -> Result<Self, CoreError> {
        Self::with_source(config, SimulatedSource::new())
    }

    /// Create a monitor fed by the given metric source.
    pub fn with_source(
        config: MonitorConfig,
        source: impl MetricSource,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let custom_metrics = validated_custom_metrics(config.custom_metrics.clone())?;
        let action_rules = validated_action_rules(config.action_rules.clone())?;

        let (alert_tx, _) = broadcast::channel(ALERT_CHANNEL_SIZE);
        let (state, _) = watch::channel(MonitorState::Stopped);

        Ok(Self {
            inner: Arc::new(MonitorInner {
                thresholds: ArcSwap::from_pointee(config.thresholds),
                auto_alert: AtomicBool::new(config.auto_alert),
                custom_metrics: ArcSwap::from_pointee(custom_metrics),
                action_rules: ArcSwap::from_pointee(action_rules),
                history: HistoryBuffer::new(config.history_capacity),
                alerts: AlertSink::new(config.alert_capacity),
                alert_tx,
                source: std::sync::Mutex::new(Box::new(source) as Box<dyn MetricSource>),
                counters: std::sync::Mutex::new(Counters {
                    next_seq: 1,
                    next_alert_id: 1,
                }),
                state,
                run: Mutex::new(None),
                config,
            }),
        })
    }

    /// The configuration this monitor was built from.
    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Arm the built-in and custom ticks.
    ///
    /// Both fire first one full interval after this call. Must be called
    /// from within a tokio runtime.
    pub async fn start(&self) -> Result<(), CoreError> {
        let mut run = self.inner.run.lock().await;
        if run.is_some() {
            return Err(CoreError::AlreadyRunning);
        }

        let cancel = CancellationToken::new();
        let config = &self.inner.config;
        let handles = vec![
            tokio::spawn(tick_task(
                self.clone(),
                TickKind::Builtin,
                config.sample_interval,
                cancel.clone(),
            )),
            tokio::spawn(tick_task(
                self.clone(),
                TickKind::Custom,
                config.custom_interval,
                cancel.clone(),
            )),
        ];

        *run = Some(RunHandle { cancel, handles });
        self.inner.state.send_replace(MonitorState::Running);
        info!(
            sample_interval = ?config.sample_interval,
            custom_interval = ?config.custom_interval,
            "monitor started"
        );
        Ok(())
    }

    /// Disarm both ticks and wait for their tasks to exit.
    ///
    /// A tick already in progress finishes; nothing further is sampled.
    /// Stopping a stopped monitor does nothing.
    pub async fn stop(&self) {
        let Some(run) = self.inner.run.lock().await.take() else {
            return;
        };

        run.cancel.cancel();
        for handle in run.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "tick task ended abnormally");
            }
        }

        self.inner.state.send_replace(MonitorState::Stopped);
        info!("monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        *self.inner.state.borrow() == MonitorState::Running
    }

    /// Subscribe to lifecycle state changes.
    pub fn state(&self) -> watch::Receiver<MonitorState> {
        self.inner.state.subscribe()
    }

    // ── Ticks ────────────────────────────────────────────────────

    /// Sample the built-in metrics once, record the sample, and evaluate it.
    ///
    /// Returns the alerts raised by this tick.
    pub fn tick_builtin(&self) -> Vec<Arc<Alert>> {
        let mut counters = self.lock_counters();
        let reading = self.lock_source().builtin();
        let sample = MetricSample::Builtin(BuiltinSample {
            seq: counters.seq(),
            timestamp: Utc::now(),
            bandwidth: reading.bandwidth,
            latency: reading.latency,
            reliability: reading.reliability,
        });
        self.record(&mut counters, sample)
    }

    /// Sample the custom metrics once, record the sample, and evaluate it.
    ///
    /// Does nothing while no custom metric is defined.
    pub fn tick_custom(&self) -> Vec<Arc<Alert>> {
        let definitions = self.inner.custom_metrics.load_full();
        if definitions.is_empty() {
            return Vec::new();
        }

        let mut counters = self.lock_counters();
        let values = self.lock_source().custom(&definitions);
        let sample = MetricSample::Custom(CustomSample {
            seq: counters.seq(),
            timestamp: Utc::now(),
            values,
        });
        self.record(&mut counters, sample)
    }

    fn record(&self, counters: &mut Counters, sample: MetricSample) -> Vec<Arc<Alert>> {
        let raised = if self.auto_alert() {
            let violations = evaluate::evaluate(
                &sample,
                &self.thresholds(),
                &self.inner.custom_metrics.load(),
            );
            evaluate::group_alerts(violations)
                .into_iter()
                .map(|draft| {
                    self.raise(Alert {
                        id: counters.alert_id(),
                        timestamp: Utc::now(),
                        message: draft.message,
                        severity: draft.severity,
                        violations: draft.violations,
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        let seq = sample.seq();
        let evicted = self.inner.history.append(sample);
        debug!(
            seq,
            evicted,
            history = self.inner.history.len(),
            alerts = raised.len(),
            "tick recorded"
        );
        raised
    }

    fn raise(&self, alert: Alert) -> Arc<Alert> {
        warn!(
            alert_id = %alert.id,
            severity = %alert.severity,
            message = %alert.message,
            "QoS alert raised"
        );
        let alert = self.inner.alerts.push(alert);
        // No receivers is fine; the sink still holds the alert.
        let _ = self.inner.alert_tx.send(Arc::clone(&alert));
        alert
    }

    fn lock_counters(&self) -> MutexGuard<'_, Counters> {
        self.inner
            .counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_source(&self) -> MutexGuard<'_, Box<dyn MetricSource>> {
        // A panic inside a source leaves no invariant behind worth refusing.
        self.inner
            .source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ── Thresholds and alert gate ────────────────────────────────

    pub fn thresholds(&self) -> ThresholdSet {
        **self.inner.thresholds.load()
    }

    /// Replace the active thresholds. Takes effect on the next tick.
    pub fn set_thresholds(&self, thresholds: ThresholdSet) -> Result<(), CoreError> {
        thresholds.validate().map_err(CoreError::validation)?;
        self.inner.thresholds.store(Arc::new(thresholds));
        debug!(?thresholds, "thresholds updated");
        Ok(())
    }

    /// Arm or disarm the evaluator. Sampling continues either way.
    pub fn toggle_auto_alert(&self, enabled: bool) {
        self.inner.auto_alert.store(enabled, Ordering::Relaxed);
        debug!(enabled, "automatic alerts toggled");
    }

    pub fn auto_alert(&self) -> bool {
        self.inner.auto_alert.load(Ordering::Relaxed)
    }

    // ── Custom metrics and action rules ──────────────────────────

    /// Append a custom metric definition. Takes effect on the next custom tick.
    pub fn add_custom_metric(&self, definition: CustomMetricDefinition) -> Result<(), CoreError> {
        validate_custom_metric(&definition)?;

        let definition = Arc::new(definition);
        let mut duplicate = false;
        self.inner.custom_metrics.rcu(|current| {
            duplicate = current.iter().any(|d| d.name == definition.name);
            let mut next = Vec::clone(current);
            if !duplicate {
                next.push(Arc::clone(&definition));
            }
            next
        });

        if duplicate {
            return Err(CoreError::DuplicateMetric {
                name: definition.name.clone(),
            });
        }
        debug!(name = %definition.name, "custom metric added");
        Ok(())
    }

    pub fn custom_metrics(&self) -> Arc<Vec<Arc<CustomMetricDefinition>>> {
        self.inner.custom_metrics.load_full()
    }

    /// Record an automated action rule. Rules are listed, never executed.
    pub fn add_action_rule(&self, rule: AutomatedActionRule) -> Result<(), CoreError> {
        validate_action_rule(&rule)?;
        let rule = Arc::new(rule);
        self.inner.action_rules.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(Arc::clone(&rule));
            next
        });
        Ok(())
    }

    pub fn action_rules(&self) -> Arc<Vec<Arc<AutomatedActionRule>>> {
        self.inner.action_rules.load_full()
    }

    // ── Alerts and history ───────────────────────────────────────

    /// Remove one alert. Unknown ids are ignored; returns whether one was removed.
    pub fn dismiss_alert(&self, id: AlertId) -> bool {
        self.inner.alerts.dismiss(id)
    }

    pub fn clear_alerts(&self) {
        self.inner.alerts.clear();
    }

    /// Current alerts, most recent first.
    pub fn alerts(&self) -> Arc<Vec<Arc<Alert>>> {
        self.inner.alerts.snapshot()
    }

    /// Retained samples in append order.
    pub fn history(&self) -> Arc<Vec<Arc<MetricSample>>> {
        self.inner.history.snapshot()
    }

    /// Violations found in the retained history under the current thresholds.
    pub fn violations(&self) -> Vec<HistoricalViolation> {
        let history = self.history();
        evaluate::evaluate_history(
            history.iter().map(|s| &**s),
            &self.thresholds(),
            &self.inner.custom_metrics.load(),
        )
    }

    /// Subscribe to alerts as they are raised.
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Arc<Alert>> {
        self.inner.alert_tx.subscribe()
    }

    /// Watch the alert list as a whole (raise, dismiss, clear).
    pub fn alerts_stream(&self) -> watch::Receiver<Arc<Vec<Arc<Alert>>>> {
        self.inner.alerts.subscribe()
    }

    /// Feed of each sample recorded from now on.
    pub fn history_stream(&self) -> SampleStream {
        self.inner.history.subscribe()
    }

    // ── Settings persistence ─────────────────────────────────────

    /// Snapshot of the user-adjustable state.
    pub fn settings(&self) -> MonitorSettings {
        MonitorSettings {
            thresholds: self.thresholds(),
            auto_alert: self.auto_alert(),
            custom_metrics: self
                .custom_metrics()
                .iter()
                .map(|d| CustomMetricDefinition::clone(d))
                .collect(),
            action_rules: self
                .action_rules()
                .iter()
                .map(|r| AutomatedActionRule::clone(r))
                .collect(),
        }
    }

    /// Replace the user-adjustable state wholesale. Nothing changes if any
    /// part fails validation.
    pub fn apply_settings(&self, settings: MonitorSettings) -> Result<(), CoreError> {
        settings
            .thresholds
            .validate()
            .map_err(CoreError::validation)?;
        let custom_metrics = validated_custom_metrics(settings.custom_metrics)?;
        let action_rules = validated_action_rules(settings.action_rules)?;

        self.inner.thresholds.store(Arc::new(settings.thresholds));
        self.inner.custom_metrics.store(Arc::new(custom_metrics));
        self.inner.action_rules.store(Arc::new(action_rules));
        self.toggle_auto_alert(settings.auto_alert);
        Ok(())
    }

    pub fn save_settings(&self, store: &dyn SettingsStore) -> Result<(), CoreError> {
        let json = serde_json::to_string(&self.settings())?;
        store.set(SETTINGS_KEY, &json)
    }

    /// Load settings from `store` if any were saved. Returns whether
    /// anything was applied.
    pub fn restore_settings(&self, store: &dyn SettingsStore) -> Result<bool, CoreError> {
        let Some(json) = store.get(SETTINGS_KEY)? else {
            return Ok(false);
        };
        let settings: MonitorSettings = serde_json::from_str(&json)?;
        self.apply_settings(settings)?;
        info!("monitor settings restored");
        Ok(true)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Run one kind of tick every `period` until cancelled.
async fn tick_task(monitor: Monitor, kind: TickKind, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match kind {
                    TickKind::Builtin => monitor.tick_builtin(),
                    TickKind::Custom => monitor.tick_custom(),
                };
            }
        }
    }
    debug!(?kind, "tick task exiting");
}

// ── Validation helpers ───────────────────────────────────────────

fn validate_custom_metric(definition: &CustomMetricDefinition) -> Result<(), CoreError> {
    let name = definition.name.trim();
    if name.is_empty() {
        return Err(CoreError::validation("custom metric name must not be empty"));
    }
    if name.parse::<BuiltinMetric>().is_ok() {
        return Err(CoreError::validation(format!(
            "custom metric name '{name}' shadows a built-in metric"
        )));
    }
    definition
        .threshold
        .validate(definition.condition.direction())
        .map_err(|reason| CoreError::validation(format!("{name}: {reason}")))
}

fn validated_custom_metrics(
    definitions: Vec<CustomMetricDefinition>,
) -> Result<Vec<Arc<CustomMetricDefinition>>, CoreError> {
    let mut out: Vec<Arc<CustomMetricDefinition>> = Vec::with_capacity(definitions.len());
    for definition in definitions {
        validate_custom_metric(&definition)?;
        if out.iter().any(|d| d.name == definition.name) {
            return Err(CoreError::DuplicateMetric {
                name: definition.name,
            });
        }
        out.push(Arc::new(definition));
    }
    Ok(out)
}

fn validate_action_rule(rule: &AutomatedActionRule) -> Result<(), CoreError> {
    if rule.metric.trim().is_empty() {
        return Err(CoreError::validation("action rule metric must not be empty"));
    }
    if !rule.threshold.is_finite() {
        return Err(CoreError::validation(format!(
            "action rule threshold must be finite, got {}",
            rule.threshold
        )));
    }
    Ok(())
}

fn validated_action_rules(
    rules: Vec<AutomatedActionRule>,
) -> Result<Vec<Arc<AutomatedActionRule>>, CoreError> {
    rules
        .into_iter()
        .map(|rule| validate_action_rule(&rule).map(|()| Arc::new(rule)))
        .collect()
}
