//! Outbound application events.
//!
//! The [`InspectionLoop`](super::service::InspectionLoop) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them.

use crate::fieldbus::SessionHealth;
use crate::verdict::Verdict;

/// What happened to the PLC write of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The payload reached the PLC.
    Written,
    /// The write failed; it is retried with next cycle's verdict.
    Failed,
    /// Simulation mode: nothing was sent.
    Simulated,
}

/// Result of one fully processed frame.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub score: u32,
    pub verdict: Verdict,
    pub payload: Vec<u8>,
    pub write: WriteOutcome,
    /// Session health after the write; `None` in simulation mode.
    pub fieldbus: Option<SessionHealth>,
}

/// Why the loop left `Running`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Operator,
    EndOfStream,
    CaptureFailed(String),
    CycleLimit,
}

/// Counters accumulated over the loop's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub cycles: u64,
    pub defects: u64,
    pub writes_attempted: u64,
    pub writes_ok: u64,
    pub writes_failed: u64,
    pub simulated_writes: u64,
}

/// Structured events emitted by the inspection loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The loop entered `Running`.  `None` means simulation mode.
    Started { fieldbus: Option<SessionHealth> },

    /// One cycle completed.
    Cycle(CycleReport),

    /// The session health changed during a cycle.
    HealthChanged {
        from: SessionHealth,
        to: SessionHealth,
    },

    /// The loop is shutting down.
    Stopping(StopReason),

    /// All resources released.
    Stopped(LoopStats),
}
