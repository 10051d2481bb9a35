//! Fuzz target: S7 response parsers.
//!
//! Feeds arbitrary bytes to every parser the client runs on PLC replies.
//! None of them may panic, whatever the peer sends.

#![no_main]

use libfuzzer_sys::fuzz_target;
use surfscan::fieldbus::pdu;

fuzz_target!(|data: &[u8]| {
    if data.len() >= pdu::TPKT_HEADER_LEN {
        let mut header = [0u8; pdu::TPKT_HEADER_LEN];
        header.copy_from_slice(&data[..pdu::TPKT_HEADER_LEN]);
        let _ = pdu::tpkt_length(&header);
    }
    let _ = pdu::parse_connection_confirm(data);
    let _ = pdu::parse_setup_response(data);
    let _ = pdu::parse_write_response(data);

    let mut out = vec![0u8; data.first().map_or(4, |b| usize::from(*b % 32) + 1)];
    let _ = pdu::parse_read_response(data, &mut out);
});
