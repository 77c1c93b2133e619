use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use nexus_api_client::ApiClient;
use serde::Serialize;

use crate::liveness::Generations;

pub const PROBE_INTERVAL: Duration = Duration::from_secs(15);
const READY_STATUS: &str = "ready";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendState {
    #[default]
    Checking,
    Ready,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    #[default]
    Idle,
    Working,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub backend: BackendState,
    pub last_heartbeat: DateTime<Utc>,
}

/// `Ready` only when the readiness probe answers `ready`; any other answer
/// or failure counts as offline.
pub async fn probe_backend(client: &ApiClient) -> BackendState {
    match client.ready().await {
        Ok(health) if health.status == READY_STATUS => BackendState::Ready,
        Ok(health) => {
            tracing::debug!(status = %health.status, "backend not ready");
            BackendState::Offline
        }
        Err(error) => {
            tracing::debug!(reason = %error, "readiness probe failed");
            BackendState::Offline
        }
    }
}

pub async fn probe_snapshot(client: &ApiClient) -> StatusSnapshot {
    let backend = probe_backend(client).await;
    StatusSnapshot {
        backend,
        last_heartbeat: Utc::now(),
    }
}

#[must_use]
pub fn activity_label(backend: BackendState, activity: ActivityState) -> &'static str {
    if backend == BackendState::Offline {
        return "Offline";
    }
    match activity {
        ActivityState::Working => "Active",
        ActivityState::Idle => "Idle",
    }
}

/// Background readiness probe on a fixed interval.
///
/// Results stop reaching `on_update` as soon as the monitor is stopped or
/// dropped, including a probe that was already in flight.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct StatusMonitor {
    generations: Generations,
    task: tokio::task::JoinHandle<()>,
}

#[cfg(not(target_arch = "wasm32"))]
impl StatusMonitor {
    /// Starts probing immediately, then every `interval`.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime; `tokio::spawn` panics
    /// otherwise.
    pub fn spawn<F>(client: Arc<ApiClient>, interval: Duration, mut on_update: F) -> Self
    where
        F: FnMut(StatusSnapshot) + Send + 'static,
    {
        let generations = Generations::new();
        let ticket = generations.begin();
        let task = tokio::spawn(async move {
            let mut ticker = probe_ticker(interval);
            loop {
                ticker.tick().await;
                let snapshot = probe_snapshot(&client).await;
                if ticket.apply_if_current(|| on_update(snapshot)).is_none() {
                    break;
                }
            }
        });
        Self { generations, task }
    }

    pub fn stop(self) {
        drop(self);
    }
}

// A probe that outlasts the period delays the next tick instead of
// triggering a burst of catch-up probes.
#[cfg(not(target_arch = "wasm32"))]
fn probe_ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker
}

#[cfg(not(target_arch = "wasm32"))]
impl Drop for StatusMonitor {
    fn drop(&mut self) {
        self.generations.invalidate();
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_prefers_offline_over_activity() {
        assert_eq!(
            activity_label(BackendState::Offline, ActivityState::Working),
            "Offline"
        );
        assert_eq!(
            activity_label(BackendState::Ready, ActivityState::Working),
            "Active"
        );
        assert_eq!(activity_label(BackendState::Ready, ActivityState::Idle), "Idle");
        assert_eq!(
            activity_label(BackendState::Checking, ActivityState::Idle),
            "Idle"
        );
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[tokio::test]
    async fn slow_probes_delay_the_next_tick() {
        let ticker = probe_ticker(PROBE_INTERVAL);
        assert_eq!(ticker.period(), PROBE_INTERVAL);
        assert_eq!(
            ticker.missed_tick_behavior(),
            tokio::time::MissedTickBehavior::Delay
        );
    }

    #[test]
    fn default_states_are_checking_and_idle() {
        assert_eq!(BackendState::default(), BackendState::Checking);
        assert_eq!(ActivityState::default(), ActivityState::Idle);
    }
}
