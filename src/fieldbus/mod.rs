//! Fieldbus side: S7 framing, the blocking TCP client and the session
//! that owns it.

pub mod pdu;
pub mod s7;
pub mod session;

pub use s7::{S7Client, S7Endpoint};
pub use session::{FieldbusSession, Session, SessionHealth};
