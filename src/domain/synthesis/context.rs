use super::error::SynthesisError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::{Duration, Instant};

/// Pipeline states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Received,
    Fetching,
    Normalizing,
    Synthesizing,
    Encoding,
    Streaming,
    Completed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Fetching => "fetching",
            Self::Normalizing => "normalizing",
            Self::Synthesizing => "synthesizing",
            Self::Encoding => "encoding",
            Self::Streaming => "streaming",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request bookkeeping: correlation id, start time and phase timings.
#[derive(Debug)]
pub struct RequestContext {
    correlation_id: String,
    received_at: DateTime<Utc>,
    started: Instant,
    phase: Phase,
    phase_started: Instant,
    durations: Vec<(Phase, Duration)>,
}

impl RequestContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            correlation_id: correlation_id.into(),
            received_at: Utc::now(),
            started: now,
            phase: Phase::Received,
            phase_started: now,
            durations: Vec::new(),
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn phase_durations(&self) -> &[(Phase, Duration)] {
        &self.durations
    }

    /// Close the current phase and move to `next`.
    pub fn advance(&mut self, next: Phase) {
        let spent = self.phase_started.elapsed();
        tracing::info!(
            correlation_id = %self.correlation_id,
            phase = %self.phase,
            next = %next,
            elapsed_ms = spent.as_millis() as u64,
            "Phase finished"
        );
        self.durations.push((self.phase, spent));
        self.phase = next;
        self.phase_started = Instant::now();
    }

    /// Record a failure in the current phase and hand the error back.
    pub fn fail(&mut self, err: SynthesisError) -> SynthesisError {
        let spent = self.phase_started.elapsed();
        tracing::error!(
            correlation_id = %self.correlation_id,
            phase = %self.phase,
            error_kind = err.kind(),
            error = %err,
            elapsed_ms = spent.as_millis() as u64,
            "Phase failed"
        );
        self.durations.push((self.phase, spent));
        err
    }
}
