//! Inspection loop, the hexagonal core.
//!
//! [`InspectionLoop`] owns the fieldbus [`Session`], the feature extractor
//! and the decision policy.  Everything else (camera, display, stop
//! input, event sink) is injected at the call site through port traits,
//! so the whole loop runs against mock adapters in tests.
//!
//! ```text
//!  CameraPort ──▶ ┌──────────────────────────────┐ ──▶ DisplayPort
//!                 │        InspectionLoop         │
//!    StopPort ──▶ │ extract · decide · encode     │ ──▶ EventSink
//!                 └──────────────┬───────────────┘
//!                                ▼
//!                      Session (Active | Simulated)
//! ```
//!
//! Phases: `Starting → Running → Stopping → Stopped`.  The loop reaches
//! `Running` whatever the fieldbus outcome, and only a capture failure or
//! an operator stop takes it out again.

use log::{error, info, warn};

use crate::codec::{Payload, VerdictEncoder};
use crate::config::InspectionConfig;
use crate::error::{CaptureError, LayoutError};
use crate::fieldbus::Session;
use crate::verdict::{DecisionPolicy, Verdict};
use crate::vision::overlay;

use super::events::{AppEvent, CycleReport, LoopStats, StopReason, WriteOutcome};
use super::ports::{CameraPort, DisplayPort, EventSink, FeatureExtractor, PlcClient, StopPort};

/// Lifecycle phase of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Starting,
    Running,
    Stopping,
    Stopped,
}

// ───────────────────────────────────────────────────────────────
// InspectionLoop
// ───────────────────────────────────────────────────────────────

pub struct InspectionLoop<C: PlcClient, X: FeatureExtractor> {
    session: Session<C>,
    extractor: X,
    policy: DecisionPolicy,
    encoder: VerdictEncoder,
    phase: LoopPhase,
    stats: LoopStats,
    /// Consecutive failed writes; the first is logged at ERROR, the rest at WARN.
    failed_streak: u32,
}

impl<C: PlcClient, X: FeatureExtractor> InspectionLoop<C, X> {
    /// Assemble the loop.  Does **not** start it; call [`start`](Self::start) next.
    ///
    /// Fails only on a payload layout that `validate` would also reject.
    pub fn new(config: &InspectionConfig, session: Session<C>, extractor: X) -> Result<Self, LayoutError> {
        Ok(Self {
            session,
            extractor,
            policy: DecisionPolicy::new(config.score_threshold),
            encoder: config.encoder()?,
            phase: LoopPhase::Starting,
            stats: LoopStats::default(),
            failed_streak: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// `Starting → Running`.  No-op in any other phase.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        if self.phase != LoopPhase::Starting {
            return;
        }
        self.phase = LoopPhase::Running;
        let fieldbus = self.session.health();
        match fieldbus {
            Some(h) => info!(
                "Inspection loop running (threshold {}, PLC {})",
                self.policy.threshold(),
                h
            ),
            None => info!(
                "Inspection loop running (threshold {}, simulation mode)",
                self.policy.threshold()
            ),
        }
        sink.emit(&AppEvent::Started { fieldbus });
    }

    /// Run one full cycle: capture → extract → decide → encode → write →
    /// overlay → display → poll stop.
    ///
    /// Returns the phase after the cycle.  Outside `Running` this does
    /// nothing.
    pub fn cycle(
        &mut self,
        camera: &mut impl CameraPort,
        display: &mut impl DisplayPort,
        stop: &mut impl StopPort,
        sink: &mut impl EventSink,
    ) -> LoopPhase {
        if self.phase != LoopPhase::Running {
            return self.phase;
        }

        // 1. Capture
        let frame = match camera.read_frame() {
            Ok(frame) => frame,
            Err(CaptureError::EndOfStream) => {
                info!("Video source exhausted");
                self.request_stop(StopReason::EndOfStream, sink);
                return self.phase;
            }
            Err(e) => {
                error!("Capture failed: {}", e);
                self.request_stop(StopReason::CaptureFailed(e.to_string()), sink);
                return self.phase;
            }
        };

        // 2. Feature → verdict → payload
        let score = self.extractor.extract(&frame);
        let verdict = self.policy.decide(score);
        let payload = self.encoder.encode(&verdict);

        // 3. Best-effort report to the PLC
        let write = self.report(&verdict, &payload, sink);

        // 4. Operator overlay
        display.show(&overlay::render(&frame, &verdict));

        self.stats.cycles += 1;
        if verdict.is_defect() {
            self.stats.defects += 1;
        }
        sink.emit(&AppEvent::Cycle(CycleReport {
            cycle: self.stats.cycles,
            score,
            verdict,
            payload: payload.as_bytes().to_vec(),
            write,
            fieldbus: self.session.health(),
        }));

        // 5. Stop is only honoured at the cycle boundary
        if stop.stop_requested() {
            info!("Operator stop requested");
            self.request_stop(StopReason::Operator, sink);
        }
        self.phase
    }

    /// Start, cycle until the loop leaves `Running`, then shut down.
    ///
    /// `max_cycles` bounds bench runs; `None` runs until stopped.
    pub fn run(
        &mut self,
        camera: &mut impl CameraPort,
        display: &mut impl DisplayPort,
        stop: &mut impl StopPort,
        sink: &mut impl EventSink,
        max_cycles: Option<u64>,
    ) -> LoopStats {
        self.start(sink);
        while self.cycle(camera, display, stop, sink) == LoopPhase::Running {
            if max_cycles.is_some_and(|max| self.stats.cycles >= max) {
                info!("Cycle limit of {} reached", self.stats.cycles);
                self.request_stop(StopReason::CycleLimit, sink);
            }
        }
        self.shutdown(camera, sink);
        self.stats
    }

    /// Release the camera and the PLC connection.  Idempotent.
    pub fn shutdown(&mut self, camera: &mut impl CameraPort, sink: &mut impl EventSink) {
        match self.phase {
            LoopPhase::Stopped => return,
            LoopPhase::Stopping => {}
            LoopPhase::Starting | LoopPhase::Running => {
                self.request_stop(StopReason::Operator, sink);
            }
        }
        camera.release();
        self.session.disconnect();
        self.phase = LoopPhase::Stopped;
        info!(
            "Inspection loop stopped: {} cycles, {} defects, {}/{} writes OK, {} simulated",
            self.stats.cycles,
            self.stats.defects,
            self.stats.writes_ok,
            self.stats.writes_attempted,
            self.stats.simulated_writes
        );
        sink.emit(&AppEvent::Stopped(self.stats));
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    // ── Internal ──────────────────────────────────────────────

    fn request_stop(&mut self, reason: StopReason, sink: &mut impl EventSink) {
        if matches!(self.phase, LoopPhase::Stopping | LoopPhase::Stopped) {
            return;
        }
        self.phase = LoopPhase::Stopping;
        sink.emit(&AppEvent::Stopping(reason));
    }

    /// Write the payload, or log it in simulation mode.  Never fails.
    fn report(&mut self, verdict: &Verdict, payload: &Payload, sink: &mut impl EventSink) -> WriteOutcome {
        let session = match &mut self.session {
            Session::Active(session) => session,
            Session::Simulated => {
                self.stats.simulated_writes += 1;
                info!("SIM | {} | payload {:02X?} not sent", verdict, payload.as_bytes());
                return WriteOutcome::Simulated;
            }
        };

        let before = session.health();
        self.stats.writes_attempted += 1;
        let outcome = match session.write(payload) {
            Ok(()) => {
                self.stats.writes_ok += 1;
                if self.failed_streak > 0 {
                    info!("PLC write recovered after {} failed cycle(s)", self.failed_streak);
                }
                self.failed_streak = 0;
                WriteOutcome::Written
            }
            Err(e) => {
                self.stats.writes_failed += 1;
                self.failed_streak += 1;
                if self.failed_streak == 1 {
                    error!("PLC write failed: {}", e);
                } else {
                    warn!("PLC write failed ({} in a row): {}", self.failed_streak, e);
                }
                WriteOutcome::Failed
            }
        };

        let after = session.health();
        if after != before {
            sink.emit(&AppEvent::HealthChanged {
                from: before,
                to: after,
            });
        }
        outcome
    }
}
