//! PLC session lifecycle: connect, verify, write, recover, release.
//!
//! ```text
//!             connect ok + read ok
//!   (start) ─────────────────────────▶ CONNECTED ◀──┐
//!      │      connect ok + read fail        │       │ write ok
//!      │ ────────────────────────────▶ DEGRADED ────┘
//!      │                                    │
//!      │ connect fail                       │ transport lost
//!      ▼                                    ▼
//!   Session::Simulated               DISCONNECTED ──[reconnect]──▶ write
//! ```
//!
//! Failures never tear the session down: the caller keeps writing every
//! cycle and the session decides whether that write needs a reconnect
//! first.  A reconnect is attempted on every such write, and the reconnect
//! plus the write share one I/O deadline.  The transport is released
//! exactly once, either by [`FieldbusSession::disconnect`] or on drop.

use core::fmt;
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::app::ports::PlcClient;
use crate::codec::{Payload, VerdictEncoder};
use crate::config::InspectionConfig;
use crate::error::{ConnectError, VerificationReadError, WriteError};

/// Observable state of the PLC link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionHealth {
    /// The transport dropped; writes reconnect first.
    Disconnected,
    /// Transport up and the data block answered.
    Connected,
    /// Transport up, but the data block refused a read or write.
    Degraded,
}

impl fmt::Display for SessionHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected => write!(f, "connected"),
            Self::Degraded => write!(f, "degraded"),
        }
    }
}

/// An open session to one data block on one controller.
pub struct FieldbusSession<C: PlcClient> {
    client: C,
    db_number: u16,
    encoder: VerdictEncoder,
    health: SessionHealth,
    io_timeout: Duration,
    released: bool,
}

impl<C: PlcClient> FieldbusSession<C> {
    /// Handshake with the PLC, then confirm the data block is readable.
    ///
    /// A failed verification read leaves the session [`SessionHealth::Degraded`]
    /// instead of failing: the loop must still run.
    pub fn connect(mut client: C, config: &InspectionConfig) -> Result<Self, ConnectError> {
        let encoder = config.encoder()?;
        info!(
            "PLC: connecting to {} (rack {}, slot {})",
            config.endpoint(),
            config.rack,
            config.slot
        );
        client.connect().map_err(|source| ConnectError::Transport {
            endpoint: config.endpoint(),
            source,
        })?;
        info!("PLC: connected to {}", config.endpoint());

        let mut session = Self {
            client,
            db_number: config.db_number,
            encoder,
            health: SessionHealth::Connected,
            io_timeout: Duration::from_millis(config.io_timeout_ms as u64),
            released: false,
        };

        match session.verify() {
            Ok(bytes) => match session.encoder.decode(&bytes) {
                Ok(verdict) => info!(
                    "PLC: verification read OK, DB{} holds {:02X?} ({})",
                    session.db_number, bytes, verdict
                ),
                Err(e) => info!(
                    "PLC: verification read OK, DB{} holds {:02X?} ({})",
                    session.db_number, bytes, e
                ),
            },
            Err(e) => {
                error!("PLC: {} (check PUT/GET access and the DB number)", e);
                session.health = SessionHealth::Degraded;
            }
        }
        Ok(session)
    }

    /// Read back the payload region of the data block.
    pub fn verify(&mut self) -> Result<Vec<u8>, VerificationReadError> {
        let mut buf = vec![0u8; self.encoder.width()];
        self.client
            .db_read(self.db_number, 0, &mut buf)
            .map_err(|source| VerificationReadError {
                db_number: self.db_number,
                source,
            })?;
        Ok(buf)
    }

    /// Write one payload at byte 0 of the data block.
    ///
    /// At most one reconnect and one write per call, both within one I/O
    /// timeout.  A failure is returned to the caller, who retries with the
    /// next cycle's payload.
    pub fn write(&mut self, payload: &Payload) -> Result<(), WriteError> {
        self.client.set_deadline(Some(Instant::now() + self.io_timeout));
        let result = self.write_once(payload);
        self.client.set_deadline(None);
        result
    }

    fn write_once(&mut self, payload: &Payload) -> Result<(), WriteError> {
        if !self.client.is_connected() {
            self.reconnect()?;
        }

        match self.client.db_write(self.db_number, 0, payload.as_bytes()) {
            Ok(()) => {
                self.health = SessionHealth::Connected;
                Ok(())
            }
            Err(source) => {
                self.health = if source.is_transport_loss() && !self.client.is_connected() {
                    SessionHealth::Disconnected
                } else {
                    SessionHealth::Degraded
                };
                Err(WriteError::Transport {
                    db_number: self.db_number,
                    source,
                })
            }
        }
    }

    fn reconnect(&mut self) -> Result<(), WriteError> {
        self.health = SessionHealth::Disconnected;
        match self.client.connect() {
            Ok(()) => {
                info!("PLC: reconnected");
                Ok(())
            }
            Err(e) => {
                warn!("PLC: reconnect failed, retrying next cycle");
                Err(WriteError::Reconnect(e))
            }
        }
    }

    pub fn health(&self) -> SessionHealth {
        self.health
    }

    pub fn encoder(&self) -> &VerdictEncoder {
        &self.encoder
    }

    /// Release the transport.  Safe to call more than once.
    pub fn disconnect(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.client.disconnect();
        self.health = SessionHealth::Disconnected;
        info!("PLC: session released");
    }
}

impl<C: PlcClient> Drop for FieldbusSession<C> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// ───────────────────────────────────────────────────────────────
// Session: active link or simulation
// ───────────────────────────────────────────────────────────────

/// Either a live PLC session or simulation mode.
///
/// Every call site matches both arms, so "no PLC attached" is never a
/// forgotten `None`.
pub enum Session<C: PlcClient> {
    Active(FieldbusSession<C>),
    Simulated,
}

impl<C: PlcClient> Session<C> {
    /// Try to open a session; a connect failure selects simulation mode.
    pub fn establish(client: C, config: &InspectionConfig) -> Self {
        match FieldbusSession::connect(client, config) {
            Ok(session) => Self::Active(session),
            Err(e) => {
                error!("PLC: {}", e);
                warn!("Simulation mode: verdicts are shown but not written to the PLC");
                Self::Simulated
            }
        }
    }

    /// `None` in simulation mode.
    pub fn health(&self) -> Option<SessionHealth> {
        match self {
            Self::Active(s) => Some(s.health()),
            Self::Simulated => None,
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated)
    }

    /// Release the link if there is one.  Idempotent.
    pub fn disconnect(&mut self) {
        match self {
            Self::Active(s) => s.disconnect(),
            Self::Simulated => {}
        }
    }
}
