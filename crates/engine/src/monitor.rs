//! Buy monitor dispatch loop.
//!
//! One long-running task sweeps all active destinations on a fixed cadence:
//! fetch recent events, filter by kind, threshold and dedup state, compute
//! metrics, deliver, then record. Sweeps never overlap, and each destination's
//! events are handled strictly in order so an event is only recorded after
//! its alert was delivered.

use crate::dedup::{DedupGate, RecordOutcome};
use crate::delivery::AlertSink;
use crate::error::{DeliveryError, MonitorError, StoreResult};
use crate::metrics::MetricsCalculator;
use crate::registry::DestinationRegistry;
use buyalert_core::{DestinationConfig, RawEvent};
use buyalert_feeds::TokenDataProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Timing configuration for the dispatch loop.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Delay after a completed sweep.
    pub sweep_interval: Duration,
    /// Delay after a sweep that failed as a whole.
    pub error_backoff: Duration,
    /// Delay while no destination is active.
    pub idle_interval: Duration,
    /// Upper bound on a single delivery callback.
    pub delivery_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(15),
            error_backoff: Duration::from_secs(30),
            idle_interval: Duration::from_secs(60),
            delivery_timeout: Duration::from_secs(10),
        }
    }
}

/// Whether the last registry read found anything to watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Sweeping,
}

/// Counters for one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub destinations: usize,
    pub events_seen: usize,
    pub alerts_sent: usize,
    pub skipped_not_buy: usize,
    pub skipped_below_threshold: usize,
    pub skipped_duplicate: usize,
    pub skipped_no_metrics: usize,
    pub delivery_failures: usize,
    /// Destinations abandoned because of a store error.
    pub destination_failures: usize,
    /// Set when shutdown stopped the sweep before the last destination.
    pub interrupted: bool,
}

impl SweepReport {
    pub fn is_idle(&self) -> bool {
        self.destinations == 0
    }
}

/// The dispatch loop and its collaborators.
pub struct BuyMonitor {
    config: MonitorConfig,
    registry: Arc<dyn DestinationRegistry>,
    provider: Arc<dyn TokenDataProvider>,
    dedup: DedupGate,
    metrics: MetricsCalculator,
    sink: Arc<dyn AlertSink>,
    state: MonitorState,
}

impl BuyMonitor {
    pub fn new(
        config: MonitorConfig,
        registry: Arc<dyn DestinationRegistry>,
        provider: Arc<dyn TokenDataProvider>,
        dedup: DedupGate,
        metrics: MetricsCalculator,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            config,
            registry,
            provider,
            dedup,
            metrics,
            sink,
            state: MonitorState::Idle,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Run until `shutdown` is cancelled. Shutdown is observed between sweeps
    /// and between destinations, never in the middle of a destination.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            sweep_interval = ?self.config.sweep_interval,
            idle_interval = ?self.config.idle_interval,
            "Starting buy monitor"
        );

        while !shutdown.is_cancelled() {
            let result = self.sweep(&shutdown).await;
            let delay = self.next_delay(&result);

            match &result {
                Ok(report) if report.is_idle() => {
                    info!(wait = ?delay, "No active destinations, waiting");
                }
                Ok(report) => {
                    info!(
                        destinations = report.destinations,
                        events = report.events_seen,
                        alerts = report.alerts_sent,
                        duplicates = report.skipped_duplicate,
                        below_threshold = report.skipped_below_threshold,
                        no_metrics = report.skipped_no_metrics,
                        delivery_failures = report.delivery_failures,
                        destination_failures = report.destination_failures,
                        "Sweep complete"
                    );
                }
                Err(e) => {
                    error!(error = %e, backoff = ?delay, "Sweep failed");
                }
            }

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("Buy monitor stopped");
    }

    /// Delay before the next sweep given the outcome of this one.
    pub fn next_delay(&self, result: &Result<SweepReport, MonitorError>) -> Duration {
        match result {
            Ok(report) if report.is_idle() => self.config.idle_interval,
            Ok(_) => self.config.sweep_interval,
            Err(_) => self.config.error_backoff,
        }
    }

    /// One pass over all active destinations.
    pub async fn sweep(&mut self, shutdown: &CancellationToken) -> Result<SweepReport, MonitorError> {
        let destinations = self
            .registry
            .list_active_destinations()
            .await
            .map_err(MonitorError::Registry)?;

        self.transition(if destinations.is_empty() {
            MonitorState::Idle
        } else {
            MonitorState::Sweeping
        });

        let mut report = SweepReport::default();
        for destination in &destinations {
            if shutdown.is_cancelled() {
                info!("Shutdown requested, ending sweep early");
                report.interrupted = true;
                break;
            }

            report.destinations += 1;
            if let Err(e) = self.process_destination(destination, &mut report).await {
                report.destination_failures += 1;
                error!(
                    destination = %destination.destination_id,
                    error = %e,
                    "Failed to process destination, continuing"
                );
            }
        }

        Ok(report)
    }

    fn transition(&mut self, next: MonitorState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "Monitor state change");
            self.state = next;
        }
    }

    async fn process_destination(
        &self,
        destination: &DestinationConfig,
        report: &mut SweepReport,
    ) -> StoreResult<()> {
        debug!(
            destination = %destination.destination_id,
            token = %destination.token_symbol,
            "Checking destination"
        );

        let events = self
            .provider
            .fetch_recent_events(destination.canonical_address(), &destination.venue_name)
            .await;

        for event in &events {
            report.events_seen += 1;
            self.process_event(destination, event, report).await?;
        }

        Ok(())
    }

    async fn process_event(
        &self,
        destination: &DestinationConfig,
        event: &RawEvent,
        report: &mut SweepReport,
    ) -> StoreResult<()> {
        let dest_id = &destination.destination_id;

        if !event.is_buy() {
            report.skipped_not_buy += 1;
            return Ok(());
        }

        if !destination.meets_threshold(event.amount_quote) {
            debug!(
                destination = %dest_id,
                amount = event.amount_quote,
                threshold = destination.min_buy_threshold,
                "Below threshold"
            );
            report.skipped_below_threshold += 1;
            return Ok(());
        }

        if !self.dedup.should_alert(dest_id, &event.event_hash).await? {
            debug!(destination = %dest_id, tx_hash = %event.event_hash, "Already alerted");
            report.skipped_duplicate += 1;
            return Ok(());
        }

        let Some(payload) = self.metrics.compute(event, destination).await else {
            report.skipped_no_metrics += 1;
            return Ok(());
        };

        let delivery = tokio::time::timeout(
            self.config.delivery_timeout,
            self.sink.notify(dest_id, &payload),
        )
        .await
        .unwrap_or(Err(DeliveryError::Timeout));

        if let Err(e) = delivery {
            error!(
                destination = %dest_id,
                tx_hash = %event.event_hash,
                error = %e,
                "Delivery failed, event left for retry"
            );
            report.delivery_failures += 1;
            return Ok(());
        }

        report.alerts_sent += 1;
        if self.dedup.record_alerted(dest_id, &event.event_hash).await? == RecordOutcome::Recorded {
            info!(
                destination = %dest_id,
                tx_hash = %event.event_hash,
                amount = event.amount_quote,
                "Alert sent"
            );
        }
        Ok(())
    }
}
