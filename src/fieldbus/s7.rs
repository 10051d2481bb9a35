//! Blocking S7 client over ISO-on-TCP.
//!
//! Implements [`PlcClient`] on a `std::net::TcpStream`.  Each request runs
//! against one deadline: connect, handshake and every partial read or
//! write only get the time left until it.  A peer that trickles bytes
//! cannot stretch a request past the configured I/O timeout.  Any I/O
//! failure or timeout closes the socket, because a late answer would
//! otherwise be read as the reply to the next request.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::app::ports::PlcClient;
use crate::config::InspectionConfig;
use crate::error::FieldbusError;

use super::pdu;

/// Connection parameters for one PLC endpoint.
#[derive(Debug, Clone)]
pub struct S7Endpoint {
    pub host: String,
    pub port: u16,
    pub rack: u16,
    pub slot: u16,
    pub timeout: Duration,
}

impl S7Endpoint {
    pub fn from_config(config: &InspectionConfig) -> Self {
        Self {
            host: config.plc_address.clone(),
            port: config.plc_port,
            rack: config.rack,
            slot: config.slot,
            timeout: Duration::from_millis(config.io_timeout_ms as u64),
        }
    }

    fn resolve(&self) -> Result<SocketAddr, FieldbusError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(FieldbusError::Io)?
            .next()
            .ok_or(FieldbusError::Protocol("PLC address did not resolve"))
    }
}

/// S7 client holding at most one open connection.
pub struct S7Client {
    endpoint: S7Endpoint,
    stream: Option<TcpStream>,
    pdu_ref: u16,
    pdu_len: u16,
    /// Shared deadline set by the caller; otherwise each request gets its own.
    deadline: Option<Instant>,
}

impl S7Client {
    pub fn new(endpoint: S7Endpoint) -> Self {
        Self {
            endpoint,
            stream: None,
            pdu_ref: 0,
            pdu_len: pdu::REQUESTED_PDU_LEN,
            deadline: None,
        }
    }

    /// PDU length negotiated with the PLC during the last connect.
    pub fn pdu_len(&self) -> u16 {
        self.pdu_len
    }

    fn request_deadline(&self) -> Instant {
        self.deadline
            .unwrap_or_else(|| Instant::now() + self.endpoint.timeout)
    }

    fn next_ref(&mut self) -> u16 {
        self.pdu_ref = self.pdu_ref.wrapping_add(1);
        self.pdu_ref
    }

    /// Send one frame and read back one TPKT frame.
    ///
    /// Drops the connection on any error that leaves the stream in an
    /// unknown position.
    fn exchange(&mut self, request: &[u8], deadline: Instant) -> Result<Vec<u8>, FieldbusError> {
        let stream = self.stream.as_mut().ok_or(FieldbusError::NotConnected)?;
        let result = round_trip(stream, request, deadline);
        if let Err(e) = &result {
            if e.is_transport_loss() || matches!(e, FieldbusError::Protocol(_)) {
                debug!("S7: dropping connection after {}", e);
                self.close();
            }
        }
        result
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    fn handshake(&mut self, deadline: Instant) -> Result<(), FieldbusError> {
        let cr = pdu::connection_request(self.endpoint.rack, self.endpoint.slot);
        let cc = self.exchange(&cr, deadline)?;
        pdu::parse_connection_confirm(&cc)?;

        let pdu_ref = self.next_ref();
        let setup = self.exchange(&pdu::setup_communication(pdu_ref), deadline)?;
        self.pdu_len = pdu::parse_setup_response(&setup)?;
        Ok(())
    }

    fn check_item_len(&self, len: usize) -> Result<u16, FieldbusError> {
        if len == 0 || len > pdu::max_item_bytes(self.pdu_len) {
            return Err(FieldbusError::Protocol("item does not fit the negotiated PDU"));
        }
        Ok(len as u16)
    }
}

/// Time left until `deadline`, or [`FieldbusError::Timeout`] once it passed.
fn remaining(deadline: Instant) -> Result<Duration, FieldbusError> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|left| !left.is_zero())
        .ok_or(FieldbusError::Timeout)
}

fn round_trip(stream: &mut TcpStream, request: &[u8], deadline: Instant) -> Result<Vec<u8>, FieldbusError> {
    send_all(stream, request, deadline)?;

    let mut header = [0u8; pdu::TPKT_HEADER_LEN];
    recv_exact(stream, &mut header, deadline)?;
    let total = pdu::tpkt_length(&header)?;

    let mut frame = vec![0u8; total];
    frame[..pdu::TPKT_HEADER_LEN].copy_from_slice(&header);
    recv_exact(stream, &mut frame[pdu::TPKT_HEADER_LEN..], deadline)?;
    Ok(frame)
}

// `write_all`/`read_exact` restart the socket timeout on every partial
// transfer; these re-arm it with what is left of the deadline instead.

fn send_all(stream: &mut TcpStream, mut buf: &[u8], deadline: Instant) -> Result<(), FieldbusError> {
    while !buf.is_empty() {
        stream.set_write_timeout(Some(remaining(deadline)?))?;
        match stream.write(buf) {
            Ok(0) => return Err(FieldbusError::Io(io::ErrorKind::WriteZero.into())),
            Ok(n) => buf = &buf[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn recv_exact(stream: &mut TcpStream, buf: &mut [u8], deadline: Instant) -> Result<(), FieldbusError> {
    let mut filled = 0;
    while filled < buf.len() {
        stream.set_read_timeout(Some(remaining(deadline)?))?;
        match stream.read(&mut buf[filled..]) {
            Ok(0) => return Err(FieldbusError::Io(io::ErrorKind::UnexpectedEof.into())),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

impl PlcClient for S7Client {
    fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }

    fn connect(&mut self) -> Result<(), FieldbusError> {
        self.close();

        let deadline = self.request_deadline();
        let addr = self.endpoint.resolve()?;
        let stream = TcpStream::connect_timeout(&addr, remaining(deadline)?)?;
        stream.set_nodelay(true)?;
        self.stream = Some(stream);

        if let Err(e) = self.handshake(deadline) {
            self.close();
            return Err(e);
        }
        info!(
            "S7: connected to {} (rack {}, slot {}, PDU {})",
            addr, self.endpoint.rack, self.endpoint.slot, self.pdu_len
        );
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.stream.is_some() {
            self.close();
            info!("S7: disconnected from {}:{}", self.endpoint.host, self.endpoint.port);
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn db_read(&mut self, db_number: u16, start: u16, buf: &mut [u8]) -> Result<(), FieldbusError> {
        let len = self.check_item_len(buf.len())?;
        let deadline = self.request_deadline();
        let pdu_ref = self.next_ref();
        let response = self.exchange(&pdu::read_db_request(pdu_ref, db_number, start, len), deadline)?;
        pdu::parse_read_response(&response, buf)
    }

    fn db_write(&mut self, db_number: u16, start: u16, data: &[u8]) -> Result<(), FieldbusError> {
        self.check_item_len(data.len())?;
        let deadline = self.request_deadline();
        let pdu_ref = self.next_ref();
        let response = self.exchange(&pdu::write_db_request(pdu_ref, db_number, start, data), deadline)?;
        pdu::parse_write_response(&response)
    }
}

impl Drop for S7Client {
    fn drop(&mut self) {
        self.close();
    }
}
