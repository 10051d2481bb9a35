//! S7 over ISO-on-TCP frame builders and parsers.
//!
//! Only the subset needed for one data block is implemented:
//!
//! ```text
//! ┌──────────────┬──────────────┬────────────────────────────────────┐
//! │ TPKT (4B)    │ COTP         │ S7 PDU                             │
//! │ 03 00 len16  │ CR / CC / DT │ header · params · data             │
//! └──────────────┴──────────────┴────────────────────────────────────┘
//! ```
//!
//! Everything here is pure byte shuffling so it can be unit-tested and
//! fuzzed without a socket.  Multi-byte fields are big-endian on the wire.

use crate::error::FieldbusError;

pub const TPKT_HEADER_LEN: usize = 4;
const TPKT_VERSION: u8 = 0x03;

const COTP_CR: u8 = 0xE0;
const COTP_CC: u8 = 0xD0;
const COTP_DT: u8 = 0xF0;
/// COTP data header: length, DT, EOT + TPDU number 0.
const COTP_DT_HEADER: [u8; 3] = [0x02, COTP_DT, 0x80];

const S7_PROTOCOL_ID: u8 = 0x32;
const ROSCTR_JOB: u8 = 0x01;
const ROSCTR_ACK_DATA: u8 = 0x03;

const FN_SETUP_COMMUNICATION: u8 = 0xF0;
const FN_READ_VAR: u8 = 0x04;
const FN_WRITE_VAR: u8 = 0x05;

const AREA_DB: u8 = 0x84;
const TRANSPORT_SIZE_BYTE: u8 = 0x02;
const DATA_TRANSPORT_BYTE: u8 = 0x04;
const ITEM_OK: u8 = 0xFF;

/// PDU length we ask for during setup.
pub const REQUESTED_PDU_LEN: u16 = 480;

/// Offset of the S7 header inside a full TPKT frame.
const S7_OFFSET: usize = TPKT_HEADER_LEN + COTP_DT_HEADER.len();
/// Ack-data header is 12 bytes (job header + error class/code).
const ACK_HEADER_LEN: usize = 12;
const ACK_PARAMS: usize = S7_OFFSET + ACK_HEADER_LEN;

/// Largest payload a single read/write item can carry for a negotiated PDU.
pub fn max_item_bytes(pdu_len: u16) -> usize {
    // 12B ack header + 2B params + 4B item header on reads; write requests
    // need 10B header + 14B params + 4B item header.
    (pdu_len as usize).saturating_sub(28)
}

/// Remote TSAP for a PG connection to (rack, slot).
pub fn remote_tsap(rack: u16, slot: u16) -> [u8; 2] {
    [0x01, ((rack * 0x20) + slot) as u8]
}

fn tpkt(body_len: usize) -> Vec<u8> {
    let total = (TPKT_HEADER_LEN + body_len) as u16;
    let mut frame = Vec::with_capacity(total as usize);
    frame.extend_from_slice(&[TPKT_VERSION, 0x00]);
    frame.extend_from_slice(&total.to_be_bytes());
    frame
}

/// COTP connection request (22 bytes on the wire).
pub fn connection_request(rack: u16, slot: u16) -> Vec<u8> {
    let remote = remote_tsap(rack, slot);
    let cotp = [
        0x11, // length indicator (bytes that follow)
        COTP_CR,
        0x00, 0x00, // destination reference
        0x00, 0x01, // source reference
        0x00, // class 0
        0xC0, 0x01, 0x0A, // TPDU size 1024
        0xC1, 0x02, 0x01, 0x00, // calling TSAP
        0xC2, 0x02, remote[0], remote[1], // called TSAP
    ];
    let mut frame = tpkt(cotp.len());
    frame.extend_from_slice(&cotp);
    frame
}

/// Job header + parameters + data, wrapped in TPKT/COTP DT.
fn job(pdu_ref: u16, params: &[u8], data: &[u8]) -> Vec<u8> {
    let mut frame = tpkt(COTP_DT_HEADER.len() + 10 + params.len() + data.len());
    frame.extend_from_slice(&COTP_DT_HEADER);
    frame.extend_from_slice(&[S7_PROTOCOL_ID, ROSCTR_JOB, 0x00, 0x00]);
    frame.extend_from_slice(&pdu_ref.to_be_bytes());
    frame.extend_from_slice(&(params.len() as u16).to_be_bytes());
    frame.extend_from_slice(&(data.len() as u16).to_be_bytes());
    frame.extend_from_slice(params);
    frame.extend_from_slice(data);
    frame
}

/// S7 "setup communication" job (25 bytes on the wire).
pub fn setup_communication(pdu_ref: u16) -> Vec<u8> {
    let mut params = vec![FN_SETUP_COMMUNICATION, 0x00, 0x00, 0x01, 0x00, 0x01];
    params.extend_from_slice(&REQUESTED_PDU_LEN.to_be_bytes());
    job(pdu_ref, &params, &[])
}

/// 12-byte any-pointer to `len` bytes of DB `db_number` at byte `start`.
fn db_item(db_number: u16, start: u16, len: u16) -> [u8; 12] {
    let bit_address = (start as u32) * 8;
    let addr = bit_address.to_be_bytes();
    let count = len.to_be_bytes();
    let db = db_number.to_be_bytes();
    [
        0x12, 0x0A, 0x10, // variable spec, length, syntax id S7ANY
        TRANSPORT_SIZE_BYTE,
        count[0], count[1],
        db[0], db[1],
        AREA_DB,
        addr[1], addr[2], addr[3],
    ]
}

/// Read `len` bytes of a data block (31 bytes on the wire).
pub fn read_db_request(pdu_ref: u16, db_number: u16, start: u16, len: u16) -> Vec<u8> {
    let mut params = vec![FN_READ_VAR, 0x01];
    params.extend_from_slice(&db_item(db_number, start, len));
    job(pdu_ref, &params, &[])
}

/// Write `data` into a data block (35 + n bytes on the wire).
pub fn write_db_request(pdu_ref: u16, db_number: u16, start: u16, data: &[u8]) -> Vec<u8> {
    let len = data.len() as u16;
    let mut params = vec![FN_WRITE_VAR, 0x01];
    params.extend_from_slice(&db_item(db_number, start, len));

    let mut payload = vec![0x00, DATA_TRANSPORT_BYTE];
    payload.extend_from_slice(&(len * 8).to_be_bytes());
    payload.extend_from_slice(data);
    job(pdu_ref, &params, &payload)
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Total frame length announced by a TPKT header.
pub fn tpkt_length(header: &[u8; TPKT_HEADER_LEN]) -> Result<usize, FieldbusError> {
    if header[0] != TPKT_VERSION {
        return Err(FieldbusError::Protocol("bad TPKT version"));
    }
    let len = u16::from_be_bytes([header[2], header[3]]) as usize;
    if len < TPKT_HEADER_LEN + 3 {
        return Err(FieldbusError::Protocol("TPKT length too short"));
    }
    Ok(len)
}

/// Check a COTP connection confirm.
pub fn parse_connection_confirm(frame: &[u8]) -> Result<(), FieldbusError> {
    match frame.get(5) {
        Some(&COTP_CC) => Ok(()),
        Some(_) => Err(FieldbusError::Protocol("expected COTP connection confirm")),
        None => Err(FieldbusError::Protocol("truncated COTP frame")),
    }
}

/// Validate an ack-data frame and return it for the function-specific parser.
fn ack_data(frame: &[u8], function: u8) -> Result<&[u8], FieldbusError> {
    if frame.len() < ACK_PARAMS + 2 {
        return Err(FieldbusError::Protocol("truncated S7 response"));
    }
    if frame[5] != COTP_DT {
        return Err(FieldbusError::Protocol("expected COTP data frame"));
    }
    if frame[S7_OFFSET] != S7_PROTOCOL_ID {
        return Err(FieldbusError::Protocol("bad S7 protocol id"));
    }
    if frame[S7_OFFSET + 1] != ROSCTR_ACK_DATA {
        return Err(FieldbusError::Protocol("expected S7 ack-data"));
    }
    let (class, code) = (frame[S7_OFFSET + 10], frame[S7_OFFSET + 11]);
    if class != 0 || code != 0 {
        return Err(FieldbusError::Rejected { class, code });
    }
    if frame[ACK_PARAMS] != function {
        return Err(FieldbusError::Protocol("response for a different function"));
    }
    Ok(frame)
}

/// Parse the setup-communication answer; returns the negotiated PDU length.
///
/// The PLC may only shrink the requested length.  A larger offer is capped
/// at [`REQUESTED_PDU_LEN`]; one too small to carry any item is rejected.
pub fn parse_setup_response(frame: &[u8]) -> Result<u16, FieldbusError> {
    let frame = ack_data(frame, FN_SETUP_COMMUNICATION)?;
    let pdu = frame
        .get(ACK_PARAMS + 6..ACK_PARAMS + 8)
        .ok_or(FieldbusError::Protocol("truncated setup response"))?;
    let offered = u16::from_be_bytes([pdu[0], pdu[1]]);
    if max_item_bytes(offered) == 0 {
        return Err(FieldbusError::Protocol("negotiated PDU too small for any item"));
    }
    Ok(offered.min(REQUESTED_PDU_LEN))
}

fn item_status(frame: &[u8], at: usize) -> Result<(), FieldbusError> {
    match frame.get(at) {
        Some(&ITEM_OK) => Ok(()),
        Some(&code) => Err(FieldbusError::Item(code)),
        None => Err(FieldbusError::Protocol("missing item status")),
    }
}

/// Parse a read-var answer into `out`; the PLC must return exactly `out.len()` bytes.
pub fn parse_read_response(frame: &[u8], out: &mut [u8]) -> Result<(), FieldbusError> {
    let frame = ack_data(frame, FN_READ_VAR)?;
    let item = ACK_PARAMS + 2;
    item_status(frame, item)?;
    let header = frame
        .get(item..item + 4)
        .ok_or(FieldbusError::Protocol("truncated read item"))?;
    let bits = u16::from_be_bytes([header[2], header[3]]) as usize;
    if bits != out.len() * 8 {
        return Err(FieldbusError::Protocol("read length mismatch"));
    }
    let data = frame
        .get(item + 4..item + 4 + out.len())
        .ok_or(FieldbusError::Protocol("truncated read data"))?;
    out.copy_from_slice(data);
    Ok(())
}

/// Parse a write-var answer.
pub fn parse_write_response(frame: &[u8]) -> Result<(), FieldbusError> {
    let frame = ack_data(frame, FN_WRITE_VAR)?;
    item_status(frame, ACK_PARAMS + 2)
}
