//! Session establishment and release against the mock PLC.

use crate::mock_hw::MockPlc;
use surfscan::codec::VerdictEncoder;
use surfscan::config::{ByteOrder, InspectionConfig};
use surfscan::fieldbus::{FieldbusSession, Session, SessionHealth};
use surfscan::verdict::{decide, Verdict};

#[test]
fn unreachable_plc_selects_simulation_without_writing() {
    let plc = MockPlc::unreachable();
    let log = plc.log();
    let session = Session::establish(plc, &InspectionConfig::default());
    assert!(session.is_simulated());
    assert_eq!(log.borrow().connects, 1);
    assert_eq!(log.borrow().reads, 0);
}

#[test]
fn connect_runs_one_verification_read() {
    let plc = MockPlc::new();
    let log = plc.log();
    let session = Session::establish(plc, &InspectionConfig::default());
    assert_eq!(session.health(), Some(SessionHealth::Connected));
    assert_eq!(log.borrow().reads, 1);
}

#[test]
fn writes_go_to_the_configured_block_at_byte_zero() {
    let config = InspectionConfig {
        db_number: 7,
        ..InspectionConfig::default()
    };
    let plc = MockPlc::new();
    let log = plc.log();
    let mut session = FieldbusSession::connect(plc, &config).unwrap();
    session.write(&config.encoder().unwrap().encode(&decide(10, 500))).unwrap();
    assert_eq!(log.borrow().writes, vec![(7, 0, vec![1, 0, 0, 0])]);
}

#[test]
fn big_endian_layout_reaches_the_plc() {
    let config = InspectionConfig {
        byte_order: ByteOrder::Big,
        ..InspectionConfig::default()
    };
    let plc = MockPlc::new();
    let log = plc.log();
    let mut session = FieldbusSession::connect(plc, &config).unwrap();
    session.write(&config.encoder().unwrap().encode(&decide(501, 500))).unwrap();
    assert_eq!(log.borrow().writes[0].2, vec![0, 2, 0, 1]);
}

#[test]
fn wide_layout_pads_with_zeros() {
    let encoder = VerdictEncoder::new(4, 0, ByteOrder::Little).unwrap();
    let payload = encoder.encode(&Verdict::ok());
    assert_eq!(payload.as_bytes(), &[0, 0, 0, 0, 1, 0]);
}

#[test]
fn connection_released_exactly_once() {
    let plc = MockPlc::new();
    let log = plc.log();
    let mut session = Session::establish(plc, &InspectionConfig::default());
    session.disconnect();
    session.disconnect();
    drop(session);
    assert_eq!(log.borrow().disconnects, 1);
}

#[test]
fn early_return_releases_connection() {
    fn open_and_bail(plc: MockPlc) -> Result<(), &'static str> {
        let _session = FieldbusSession::connect(plc, &InspectionConfig::default()).map_err(|_| "connect")?;
        Err("camera missing")
    }
    let plc = MockPlc::new();
    let log = plc.log();
    assert!(open_and_bail(plc).is_err());
    assert_eq!(log.borrow().disconnects, 1);
}
