//! Error types for every subsystem of the inspection controller.
//!
//! Fieldbus errors are split in two layers: [`FieldbusError`] is what the
//! transport reports for a single request, and the session-level errors
//! ([`ConnectError`], [`VerificationReadError`], [`WriteError`]) say which
//! lifecycle step it broke.  None of them is fatal to the process; only a
//! [`CaptureError`] ends the inspection loop.

use std::io;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// A single request to the PLC failed.
#[derive(Debug, Error)]
pub enum FieldbusError {
    /// Socket-level failure (refused, reset, broken pipe, ...).
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
    /// The PLC did not answer within the configured I/O timeout.
    #[error("timed out waiting for the PLC")]
    Timeout,
    /// The peer answered with something that is not a valid S7 frame.
    #[error("protocol violation: {0}")]
    Protocol(&'static str),
    /// The PLC rejected the job in the S7 header.
    #[error("PLC rejected request (class 0x{class:02X}, code 0x{code:02X})")]
    Rejected { class: u8, code: u8 },
    /// The PLC accepted the job but refused the data item.
    #[error("data item refused: {}", describe_item_code(*.0))]
    Item(u8),
    /// No transport connection is open.
    #[error("not connected")]
    NotConnected,
}

impl FieldbusError {
    /// Whether the transport itself is gone and must be re-established
    /// before the next request can succeed.
    pub fn is_transport_loss(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Timeout | Self::NotConnected)
    }
}

impl From<io::Error> for FieldbusError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            _ => Self::Io(e),
        }
    }
}

fn describe_item_code(code: u8) -> &'static str {
    match code {
        0x01 => "hardware fault",
        0x03 => "access denied (enable PUT/GET on the PLC)",
        0x05 => "address out of range",
        0x06 => "data type not supported",
        0x07 => "data type inconsistent",
        0x0A => "object does not exist (check the data block number)",
        _ => "unknown item return code",
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

/// No session could be opened.  Triggers simulation mode.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The transport handshake failed.
    #[error("PLC connect to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: FieldbusError,
    },
    /// The configured payload layout cannot be encoded; nothing was sent.
    #[error("cannot talk to the PLC: {0}")]
    Layout(#[from] LayoutError),
}

/// Connected, but the confirmatory read of the data block failed.
/// Usually a wrong DB number or missing PUT/GET permission.
#[derive(Debug, Error)]
#[error("verification read of DB{db_number} failed: {source}")]
pub struct VerificationReadError {
    pub db_number: u16,
    #[source]
    pub source: FieldbusError,
}

/// A single verdict write did not reach the PLC.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The write request itself failed.
    #[error("write to DB{db_number} failed: {source}")]
    Transport {
        db_number: u16,
        #[source]
        source: FieldbusError,
    },
    /// A reconnect was attempted this cycle and failed.
    #[error("reconnect failed: {0}")]
    Reconnect(#[source] FieldbusError),
}

// ---------------------------------------------------------------------------
// Capture errors
// ---------------------------------------------------------------------------

/// The camera collaborator could not deliver a frame.  Ends the loop.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open video source {source_id:?}: {reason}")]
    Open { source_id: String, reason: String },
    #[error("end of stream")]
    EndOfStream,
    #[error("capture device error: {0}")]
    Device(String),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] io::Error),
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value in {var}: {value:?}")]
    Env { var: &'static str, value: String },
    #[error("validation failed: {0}")]
    Validation(&'static str),
    #[error("invalid payload layout: {0}")]
    Layout(#[from] LayoutError),
}

// ---------------------------------------------------------------------------
// Payload layout and decoding
// ---------------------------------------------------------------------------

/// The two payload fields cannot be placed as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("result field at byte {offset_result} overlaps defect field at byte {offset_defect}")]
    Overlap { offset_result: u16, offset_defect: u16 },
    #[error("payload of {width} bytes exceeds the {max}-byte limit")]
    TooWide { width: usize, max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("buffer too short: need {needed} bytes, got {got}")]
    TooShort { needed: usize, got: usize },
    #[error("unknown result code {0}")]
    UnknownResult(i16),
    #[error("result {result} inconsistent with defect kind {defect_kind}")]
    Inconsistent { result: i16, defect_kind: i16 },
}
