//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events
//! through the `log` facade.  A telemetry or HMI adapter would implement
//! the same trait.

use log::{info, warn};

use crate::app::events::{AppEvent, WriteOutcome};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Cycle(c) => {
                let plc = match c.fieldbus {
                    Some(h) => h.to_string(),
                    None => "simulated".to_owned(),
                };
                let write = match c.write {
                    WriteOutcome::Written => "written",
                    WriteOutcome::Failed => "failed",
                    WriteOutcome::Simulated => "skipped",
                };
                info!(
                    "CYCLE | #{} | score={} | {} | payload={:02X?} | write={} | plc={}",
                    c.cycle, c.score, c.verdict, c.payload, write, plc
                );
            }
            AppEvent::HealthChanged { from, to } => {
                warn!("PLC   | {} -> {}", from, to);
            }
            AppEvent::Started { fieldbus } => match fieldbus {
                Some(h) => info!("START | plc={}", h),
                None => info!("START | plc=simulated"),
            },
            AppEvent::Stopping(reason) => {
                info!("STOP  | reason={:?}", reason);
            }
            AppEvent::Stopped(s) => {
                info!(
                    "DONE  | cycles={} defects={} writes={}/{} failed={} simulated={}",
                    s.cycles, s.defects, s.writes_ok, s.writes_attempted, s.writes_failed, s.simulated_writes
                );
            }
        }
    }
}
