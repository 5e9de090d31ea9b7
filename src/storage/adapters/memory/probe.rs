//! Scripted availability probe.

use crate::storage::{
    domain::GatewayUrl,
    ports::{AvailabilityProbe, ProbeError, ProbeResult},
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Probe that replays queued answers, then repeats a steady answer.
///
/// Clones share state, so a test can keep one clone and script the answers
/// another component observes.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProbe {
    state: Arc<Mutex<ScriptedProbeState>>,
}

#[derive(Debug, Default)]
struct ScriptedProbeState {
    queued: VecDeque<ScriptedAnswer>,
    steady: bool,
    delay: Option<Duration>,
    calls: usize,
}

#[derive(Debug, Clone)]
enum ScriptedAnswer {
    Available(bool),
    Failure(String),
}

impl ScriptedProbe {
    /// Creates a probe that steadily answers `available`.
    #[must_use]
    pub fn new(available: bool) -> Self {
        let probe = Self::default();
        probe.set_available(available);
        probe
    }

    /// Creates a probe that replays `answers` and then reports unavailable.
    #[must_use]
    pub fn sequence(answers: impl IntoIterator<Item = bool>) -> Self {
        let probe = Self::default();
        for available in answers {
            probe.push(available);
        }
        probe
    }

    fn state(&self) -> MutexGuard<'_, ScriptedProbeState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Changes the steady answer used once the queue is empty.
    pub fn set_available(&self, available: bool) {
        self.state().steady = available;
    }

    /// Queues one answer.
    pub fn push(&self, available: bool) {
        self.state()
            .queued
            .push_back(ScriptedAnswer::Available(available));
    }

    /// Queues one transport failure.
    pub fn push_failure(&self, reason: impl Into<String>) {
        self.state()
            .queued
            .push_back(ScriptedAnswer::Failure(reason.into()));
    }

    /// Makes every probe wait `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    /// Returns how many probes have been answered or started.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.state().calls
    }
}

#[async_trait]
impl AvailabilityProbe for ScriptedProbe {
    async fn is_available(&self, gateway: &GatewayUrl) -> ProbeResult<bool> {
        let (answer, delay) = {
            let mut state = self.state();
            state.calls += 1;
            let steady = state.steady;
            let answer = state
                .queued
                .pop_front()
                .unwrap_or(ScriptedAnswer::Available(steady));
            (answer, state.delay)
        };
        if let Some(wait) = delay {
            tokio::time::sleep(wait).await;
        }
        match answer {
            ScriptedAnswer::Available(available) => Ok(available),
            ScriptedAnswer::Failure(reason) => Err(ProbeError::Transport {
                gateway: gateway.clone(),
                reason,
            }),
        }
    }
}
