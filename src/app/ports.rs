//! Port traits: the boundary between the inspection loop and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ InspectionLoop (domain)
//! ```
//!
//! The camera, the PLC transport, the feature extractor, the display and
//! the operator stop input are all reached through these traits.  The
//! [`InspectionLoop`](super::service::InspectionLoop) consumes them via
//! generics, so the loop never touches a socket or a capture device
//! directly and can be driven entirely by mocks.

use std::time::Instant;

use crate::config::InspectionConfig;
use crate::error::{CaptureError, ConfigError, FieldbusError};
use crate::vision::Frame;
use crate::vision::overlay::AnnotatedFrame;

// ───────────────────────────────────────────────────────────────
// Camera port (driven adapter: device → domain)
// ───────────────────────────────────────────────────────────────

/// Frame source.  Opening is the adapter's constructor.
pub trait CameraPort {
    /// Block until the next frame is ready.
    ///
    /// [`CaptureError::EndOfStream`] and device errors both end the loop.
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Release the device.  Called once at shutdown; must be idempotent.
    fn release(&mut self);
}

// ───────────────────────────────────────────────────────────────
// PLC transport port (driven adapter: domain ↔ fieldbus)
// ───────────────────────────────────────────────────────────────

/// Raw data-block access on one controller endpoint.
///
/// Implementations must bound every call by a finite timeout and report
/// a timeout as [`FieldbusError::Timeout`], never block forever.  While a
/// deadline is set, every call shares it instead of starting its own.
pub trait PlcClient {
    /// Bound all following calls by one shared deadline; `None` restores
    /// the per-call timeout.  Clients without timed I/O ignore it.
    fn set_deadline(&mut self, _deadline: Option<Instant>) {}

    /// Open the transport and run the protocol handshake.
    fn connect(&mut self) -> Result<(), FieldbusError>;

    /// Close the transport.  No-op when already closed.
    fn disconnect(&mut self);

    /// Whether a transport connection is currently open.
    fn is_connected(&self) -> bool;

    /// Read `buf.len()` bytes of data block `db_number` starting at byte `start`.
    fn db_read(&mut self, db_number: u16, start: u16, buf: &mut [u8]) -> Result<(), FieldbusError>;

    /// Write `data` into data block `db_number` starting at byte `start`.
    fn db_write(&mut self, db_number: u16, start: u16, data: &[u8]) -> Result<(), FieldbusError>;
}

// ───────────────────────────────────────────────────────────────
// Feature extractor (pure collaborator)
// ───────────────────────────────────────────────────────────────

/// Maps a frame to a non-negative defect score.
///
/// Must be deterministic for a given frame.  The decision policy assumes
/// the score grows with the visible defect area.
pub trait FeatureExtractor {
    fn extract(&self, frame: &Frame) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → operator screen)
// ───────────────────────────────────────────────────────────────

/// Presents annotated frames.  Purely cosmetic: nothing flows back into
/// the decision path.
pub trait DisplayPort {
    fn show(&mut self, frame: &AnnotatedFrame);
}

// ───────────────────────────────────────────────────────────────
// Operator stop (driving adapter: operator → domain)
// ───────────────────────────────────────────────────────────────

/// Polled once per cycle boundary.
pub trait StopPort {
    /// `true` once the operator asked to stop.  Other input is ignored.
    fn stop_requested(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The loop emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads the startup configuration.
///
/// Implementations MUST return a validated configuration; invalid values
/// are reported as [`ConfigError::Validation`], never clamped.
pub trait ConfigPort {
    fn load(&self) -> Result<InspectionConfig, ConfigError>;
}
