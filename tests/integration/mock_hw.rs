//! Mock devices for integration tests.
//!
//! Every mock records what the loop did to it so tests can assert on the
//! full call history without a camera, a screen or a PLC.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use image::{Rgb, RgbImage};
use surfscan::app::events::AppEvent;
use surfscan::app::ports::{CameraPort, DisplayPort, EventSink, FeatureExtractor, PlcClient, StopPort};
use surfscan::error::{CaptureError, FieldbusError};
use surfscan::vision::Frame;
use surfscan::vision::overlay::AnnotatedFrame;

// ── MockCamera ────────────────────────────────────────────────

/// Delivers `frames` blank frames, then the scripted terminal error.
pub struct MockCamera {
    remaining: usize,
    terminal: Option<CaptureError>,
    pub reads: usize,
    pub releases: usize,
}

#[allow(dead_code)]
impl MockCamera {
    pub fn new(frames: usize) -> Self {
        Self {
            remaining: frames,
            terminal: None,
            reads: 0,
            releases: 0,
        }
    }

    /// Never runs dry.
    pub fn endless() -> Self {
        Self::new(usize::MAX)
    }

    pub fn failing_after(frames: usize, err: CaptureError) -> Self {
        Self {
            terminal: Some(err),
            ..Self::new(frames)
        }
    }
}

impl CameraPort for MockCamera {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        self.reads += 1;
        if self.remaining == 0 {
            return Err(self.terminal.take().unwrap_or(CaptureError::EndOfStream));
        }
        self.remaining -= 1;
        Ok(Frame::new(RgbImage::from_pixel(8, 8, Rgb([90, 90, 90]))))
    }

    fn release(&mut self) {
        self.releases += 1;
    }
}

// ── ScriptedScores ───────────────────────────────────────────

/// Returns the scripted scores in order, repeating the last one.
pub struct ScriptedScores {
    scores: Vec<u32>,
    next: Cell<usize>,
}

impl ScriptedScores {
    pub fn new(scores: &[u32]) -> Self {
        assert!(!scores.is_empty());
        Self {
            scores: scores.to_vec(),
            next: Cell::new(0),
        }
    }

    pub fn constant(score: u32) -> Self {
        Self::new(&[score])
    }
}

impl FeatureExtractor for ScriptedScores {
    fn extract(&self, _frame: &Frame) -> u32 {
        let i = self.next.get();
        self.next.set(i + 1);
        self.scores[i.min(self.scores.len() - 1)]
    }
}

// ── MockPlc ───────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct PlcLog {
    pub connects: u32,
    pub disconnects: u32,
    pub reads: u32,
    pub writes: Vec<(u16, u16, Vec<u8>)>,
}

/// PLC client whose outcomes are scripted per call; unscripted calls succeed.
#[derive(Default)]
pub struct MockPlc {
    pub log: Rc<RefCell<PlcLog>>,
    connected: bool,
    pub connect_results: VecDeque<Result<(), FieldbusError>>,
    pub read_results: VecDeque<Result<(), FieldbusError>>,
    pub write_results: VecDeque<Result<(), FieldbusError>>,
}

#[allow(dead_code)]
impl MockPlc {
    pub fn new() -> Self {
        Self::default()
    }

    /// A PLC that never answers the connect.
    pub fn unreachable() -> Self {
        Self {
            connect_results: VecDeque::from([Err(FieldbusError::Timeout)]),
            ..Self::default()
        }
    }

    /// The first `n` writes fail with a transient item error.
    pub fn failing_writes(n: usize) -> Self {
        Self {
            write_results: (0..n).map(|_| Err(FieldbusError::Item(0x05))).collect(),
            ..Self::default()
        }
    }

    pub fn log(&self) -> Rc<RefCell<PlcLog>> {
        self.log.clone()
    }
}

impl PlcClient for MockPlc {
    fn connect(&mut self) -> Result<(), FieldbusError> {
        self.log.borrow_mut().connects += 1;
        let r = self.connect_results.pop_front().unwrap_or(Ok(()));
        self.connected = r.is_ok();
        r
    }

    fn disconnect(&mut self) {
        self.log.borrow_mut().disconnects += 1;
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn db_read(&mut self, _db: u16, _start: u16, buf: &mut [u8]) -> Result<(), FieldbusError> {
        self.log.borrow_mut().reads += 1;
        self.read_results.pop_front().unwrap_or(Ok(()))?;
        buf.fill(0);
        Ok(())
    }

    fn db_write(&mut self, db: u16, start: u16, data: &[u8]) -> Result<(), FieldbusError> {
        self.log.borrow_mut().writes.push((db, start, data.to_vec()));
        let r = self.write_results.pop_front().unwrap_or(Ok(()));
        if let Err(e) = &r {
            if e.is_transport_loss() {
                self.connected = false;
            }
        }
        r
    }
}

// ── MockDisplay ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockDisplay {
    pub labels: Vec<&'static str>,
}

impl DisplayPort for MockDisplay {
    fn show(&mut self, frame: &AnnotatedFrame) {
        self.labels.push(frame.label);
    }
}

// ── MockStop ──────────────────────────────────────────────────

/// Requests a stop on the `after`-th poll.
pub struct MockStop {
    after: Option<usize>,
    pub polls: usize,
}

#[allow(dead_code)]
impl MockStop {
    pub fn never() -> Self {
        Self { after: None, polls: 0 }
    }

    pub fn after(polls: usize) -> Self {
        Self {
            after: Some(polls),
            polls: 0,
        }
    }
}

impl StopPort for MockStop {
    fn stop_requested(&mut self) -> bool {
        self.polls += 1;
        self.after.is_some_and(|n| self.polls >= n)
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn cycles(&self) -> impl Iterator<Item = &surfscan::app::events::CycleReport> {
        self.events.iter().filter_map(|e| match e {
            AppEvent::Cycle(c) => Some(c),
            _ => None,
        })
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
