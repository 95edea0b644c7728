// The poll loop for one asset. It owns the asset's escalation tracker and is the only
// writer of the asset's derived state while it runs.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument, warn};

use super::{FetchError, PollSettings, TelemetryClient};
use crate::escalation::EscalationTracker;
use crate::health::classify;
use crate::models::{Asset, PollOutcome, TelemetrySample, parse_payload};
use crate::monitor::{AssetSlot, Publisher};
use crate::thresholds::{exceeds_max_pressure, severity_tier};

/// A finished request, tagged with the generation it was issued under.
struct Completed {
    generation: u64,
    received_at: DateTime<Utc>,
    result: Result<Bytes, FetchError>,
}

pub(crate) struct PollLoop {
    asset: Arc<Asset>,
    slot: Arc<AssetSlot>,
    client: TelemetryClient,
    publisher: Publisher,
    endpoint: String,
    settings: PollSettings,
    generation: u64,
    tracker: EscalationTracker,
}

impl PollLoop {
    pub(crate) fn new(
        asset: Arc<Asset>,
        slot: Arc<AssetSlot>,
        client: TelemetryClient,
        publisher: Publisher,
        endpoint: String,
        settings: PollSettings,
        generation: u64,
    ) -> Self {
        Self {
            asset,
            slot,
            client,
            publisher,
            endpoint,
            settings,
            generation,
            tracker: EscalationTracker::new(settings.escalation_threshold),
        }
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    #[instrument(
        name = "poll",
        skip_all,
        fields(asset_id = %self.asset.id, generation = self.generation)
    )]
    pub(crate) async fn run(mut self, mut shutdown_rx: oneshot::Receiver<()>) {
        // First tick completes immediately, so the first fetch has no delay.
        let mut tick = interval(self.settings.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut maintenance_rx = self.slot.maintenance_rx();
        let (done_tx, mut done_rx) = mpsc::channel::<Completed>(1);
        let mut in_flight: Option<JoinHandle<()>> = None;

        info!(
            endpoint = %self.endpoint,
            interval_ms = self.settings.interval.as_millis() as u64,
            timeout_ms = self.settings.timeout.as_millis() as u64,
            "poll task started"
        );
        let maintenance = *maintenance_rx.borrow_and_update();
        self.apply_maintenance(maintenance);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if in_flight.is_some() {
                        debug!("previous request still in flight; tick skipped");
                        continue;
                    }
                    in_flight = Some(self.issue(done_tx.clone()));
                }
                Some(done) = done_rx.recv() => {
                    in_flight = None;
                    self.complete(done);
                }
                changed = maintenance_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let enabled = *maintenance_rx.borrow_and_update();
                    self.apply_maintenance(enabled);
                }
                _ = &mut shutdown_rx => {
                    break;
                }
            }
        }

        if let Some(request) = in_flight {
            request.abort();
        }
        self.tracker.reset();
        info!("poll task stopped");
    }

    fn issue(&self, done_tx: mpsc::Sender<Completed>) -> JoinHandle<()> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let timeout = self.settings.timeout;
        let generation = self.generation;
        tokio::spawn(async move {
            let result = client.fetch(&endpoint, timeout).await;
            let _ = done_tx
                .send(Completed {
                    generation,
                    received_at: Utc::now(),
                    result,
                })
                .await;
        })
    }

    fn complete(&mut self, done: Completed) {
        if done.generation != self.generation {
            debug!(
                response_generation = done.generation,
                "response from an older generation discarded"
            );
            return;
        }
        match done.result {
            Err(e) => {
                warn!(
                    error = %e,
                    operation = "fetch_telemetry",
                    "telemetry request failed"
                );
                self.commit(PollOutcome::Failure, None);
            }
            Ok(body) => match parse_payload(&self.asset.id, &body, done.received_at) {
                Ok(sample) => {
                    let sample = self.enrich(sample);
                    self.commit(PollOutcome::Success, Some(sample));
                }
                // Reachable but unreadable: drop the sample, leave health alone.
                Err(e) => {
                    warn!(
                        error = %e,
                        operation = "parse_payload",
                        body_len = body.len(),
                        "telemetry payload dropped"
                    );
                }
            },
        }
    }

    fn enrich(&self, mut sample: TelemetrySample) -> TelemetrySample {
        sample.tier = severity_tier(sample.pressure, &self.asset.limits);
        sample.over_max_pressure = exceeds_max_pressure(sample.pressure, self.asset.max_pressure);
        sample
    }

    fn commit(&mut self, outcome: PollOutcome, sample: Option<TelemetrySample>) {
        let escalation = sample
            .as_ref()
            .map(|s| self.tracker.observe(s.is_anomaly, s.observed_at));
        let anomaly_since = self.tracker.window().map(|w| w.started_at);

        let change = self.slot.commit(self.generation, |state| {
            state.last_outcome = Some(outcome);
            state.health = classify(state.last_outcome, state.maintenance);
            if let Some(escalation) = escalation {
                state.escalation = escalation;
                state.anomaly_since = anomaly_since;
            }
            if let Some(sample) = &sample {
                state.last_sample = Some(sample.clone());
            }
        });
        let Some(change) = change else {
            debug!("asset moved to a newer generation; result discarded");
            return;
        };

        if let Some(sample) = sample {
            debug!(
                pressure = sample.pressure,
                is_anomaly = ?sample.is_anomaly,
                tier = ?sample.tier,
                "sample"
            );
            self.publisher.sample(sample);
        }
        self.publisher.changed(&self.asset, &change);
    }

    fn apply_maintenance(&mut self, enabled: bool) {
        let change = self.slot.commit(self.generation, |state| {
            state.maintenance = enabled;
            state.health = classify(state.last_outcome, enabled);
        });
        if let Some(change) = change {
            self.publisher.changed(&self.asset, &change);
        }
    }
}
