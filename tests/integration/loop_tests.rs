//! End-to-end inspection loop scenarios against mock devices.

use crate::mock_hw::{MockCamera, MockDisplay, MockPlc, MockStop, RecordingSink, ScriptedScores};
use surfscan::app::events::{AppEvent, StopReason, WriteOutcome};
use surfscan::app::service::{InspectionLoop, LoopPhase};
use surfscan::config::InspectionConfig;
use surfscan::error::{CaptureError, FieldbusError};
use surfscan::fieldbus::{Session, SessionHealth};
use surfscan::vision::overlay::{DEFECT_LABEL, OK_LABEL};

fn build(plc: MockPlc, scores: ScriptedScores) -> InspectionLoop<MockPlc, ScriptedScores> {
    let config = InspectionConfig::default();
    let session = Session::establish(plc, &config);
    InspectionLoop::new(&config, session, scores).unwrap()
}

fn written(plc_log: &std::cell::RefCell<crate::mock_hw::PlcLog>) -> Vec<Vec<u8>> {
    plc_log.borrow().writes.iter().map(|(_, _, d)| d.clone()).collect()
}

// ── Degrade, not crash ────────────────────────────────────────

#[test]
fn unreachable_plc_runs_hundred_cycles_in_simulation() {
    let plc = MockPlc::unreachable();
    let log = plc.log();
    let mut lp = build(plc, ScriptedScores::constant(0));
    assert!(lp.session().is_simulated());

    let mut camera = MockCamera::new(100);
    let mut display = MockDisplay::default();
    let mut sink = RecordingSink::default();
    let stats = lp.run(&mut camera, &mut display, &mut MockStop::never(), &mut sink, None);

    assert_eq!(stats.cycles, 100);
    assert_eq!(stats.simulated_writes, 100);
    assert_eq!(stats.writes_attempted, 0);
    assert!(log.borrow().writes.is_empty());
    assert_eq!(display.labels.len(), 100);
    assert!(matches!(sink.events[0], AppEvent::Started { fieldbus: None }));
    assert!(sink.cycles().all(|c| c.write == WriteOutcome::Simulated && c.fieldbus.is_none()));
    assert_eq!(lp.phase(), LoopPhase::Stopped);
}

#[test]
fn failed_verification_read_still_runs_and_writes() {
    let mut plc = MockPlc::new();
    plc.read_results.push_back(Err(FieldbusError::Item(0x0A)));
    let log = plc.log();
    let mut lp = build(plc, ScriptedScores::constant(0));

    let mut sink = RecordingSink::default();
    lp.run(&mut MockCamera::new(1), &mut MockDisplay::default(), &mut MockStop::never(), &mut sink, None);

    assert!(matches!(
        sink.events[0],
        AppEvent::Started {
            fieldbus: Some(SessionHealth::Degraded)
        }
    ));
    assert_eq!(written(&log), vec![vec![1, 0, 0, 0]]);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::HealthChanged {
            from: SessionHealth::Degraded,
            to: SessionHealth::Connected
        }
    )));
}

// ── Payloads ──────────────────────────────────────────────────

#[test]
fn clean_frame_writes_ok_payload() {
    let plc = MockPlc::new();
    let log = plc.log();
    let mut lp = build(plc, ScriptedScores::constant(0));
    let mut display = MockDisplay::default();
    lp.run(&mut MockCamera::new(1), &mut display, &mut MockStop::never(), &mut RecordingSink::default(), None);

    let writes = &log.borrow().writes;
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0], (1, 0, vec![0x01, 0x00, 0x00, 0x00]));
    assert_eq!(display.labels, [OK_LABEL]);
}

#[test]
fn stained_frame_writes_defect_payload() {
    let plc = MockPlc::new();
    let log = plc.log();
    let mut lp = build(plc, ScriptedScores::constant(600));
    let mut display = MockDisplay::default();
    let stats = lp.run(&mut MockCamera::new(1), &mut display, &mut MockStop::never(), &mut RecordingSink::default(), None);

    assert_eq!(written(&log), vec![vec![0x02, 0x00, 0x01, 0x00]]);
    assert_eq!(display.labels, [DEFECT_LABEL]);
    assert_eq!(stats.defects, 1);
}

#[test]
fn threshold_is_exclusive() {
    let plc = MockPlc::new();
    let log = plc.log();
    let mut lp = build(plc, ScriptedScores::new(&[500, 501]));
    lp.run(&mut MockCamera::new(2), &mut MockDisplay::default(), &mut MockStop::never(), &mut RecordingSink::default(), None);
    assert_eq!(written(&log), vec![vec![1, 0, 0, 0], vec![2, 0, 1, 0]]);
}

#[test]
fn unchanged_verdict_is_rewritten_every_cycle() {
    let plc = MockPlc::new();
    let log = plc.log();
    let mut lp = build(plc, ScriptedScores::constant(900));
    lp.run(&mut MockCamera::new(5), &mut MockDisplay::default(), &mut MockStop::never(), &mut RecordingSink::default(), None);
    let writes = written(&log);
    assert_eq!(writes.len(), 5);
    assert!(writes.iter().all(|w| w == &[2, 0, 1, 0]));
}

// ── Write failures ────────────────────────────────────────────

#[test]
fn failed_writes_are_retried_with_the_next_cycle() {
    let n = 3;
    let plc = MockPlc::failing_writes(n);
    let log = plc.log();
    let mut lp = build(plc, ScriptedScores::constant(0));
    let mut camera = MockCamera::endless();
    let mut display = MockDisplay::default();
    let mut stop = MockStop::never();
    let mut sink = RecordingSink::default();

    lp.start(&mut sink);
    for _ in 0..=n {
        assert_eq!(lp.cycle(&mut camera, &mut display, &mut stop, &mut sink), LoopPhase::Running);
    }

    assert_eq!(log.borrow().writes.len(), n + 1);
    let stats = lp.stats();
    assert_eq!(stats.writes_attempted, (n + 1) as u64);
    assert_eq!(stats.writes_failed, n as u64);
    assert_eq!(stats.writes_ok, 1);
    assert_eq!(lp.session().health(), Some(SessionHealth::Connected));

    let outcomes: Vec<_> = sink.cycles().map(|c| c.write).collect();
    assert_eq!(
        outcomes,
        [WriteOutcome::Failed, WriteOutcome::Failed, WriteOutcome::Failed, WriteOutcome::Written]
    );
    let changes: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::HealthChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        [
            (SessionHealth::Connected, SessionHealth::Degraded),
            (SessionHealth::Degraded, SessionHealth::Connected)
        ]
    );
}

#[test]
fn lost_transport_reconnects_on_next_cycle() {
    let mut plc = MockPlc::new();
    plc.write_results.push_back(Err(FieldbusError::Io(std::io::Error::from(
        std::io::ErrorKind::BrokenPipe,
    ))));
    let log = plc.log();
    let mut lp = build(plc, ScriptedScores::constant(0));
    let mut sink = RecordingSink::default();
    lp.run(&mut MockCamera::new(2), &mut MockDisplay::default(), &mut MockStop::never(), &mut sink, None);

    assert_eq!(log.borrow().connects, 2);
    assert_eq!(log.borrow().writes.len(), 2);
    let health: Vec<_> = sink.cycles().map(|c| c.fieldbus).collect();
    assert_eq!(health, [Some(SessionHealth::Disconnected), Some(SessionHealth::Connected)]);
}

#[test]
fn failed_reconnect_is_retried_on_the_very_next_cycle() {
    let mut plc = MockPlc::new();
    plc.write_results.push_back(Err(FieldbusError::Io(std::io::Error::from(
        std::io::ErrorKind::BrokenPipe,
    ))));
    // startup connect succeeds, the first reconnect times out
    plc.connect_results.extend([Ok(()), Err(FieldbusError::Timeout)]);
    let log = plc.log();
    let mut lp = build(plc, ScriptedScores::constant(0));
    let mut sink = RecordingSink::default();
    lp.run(&mut MockCamera::new(3), &mut MockDisplay::default(), &mut MockStop::never(), &mut sink, None);

    // cycle 1 write fails, cycle 2 reconnect fails, cycle 3 reconnects and writes
    assert_eq!(log.borrow().connects, 3);
    assert_eq!(log.borrow().writes.len(), 2);
    let writes: Vec<_> = sink.cycles().map(|c| c.write).collect();
    assert_eq!(writes, [WriteOutcome::Failed, WriteOutcome::Failed, WriteOutcome::Written]);
}

// ── Stopping ──────────────────────────────────────────────────

#[test]
fn capture_failure_stops_once_and_releases_everything() {
    let plc = MockPlc::new();
    let log = plc.log();
    let mut lp = build(plc, ScriptedScores::constant(0));
    let mut camera = MockCamera::failing_after(2, CaptureError::Device("usb gone".into()));
    let mut sink = RecordingSink::default();
    let stats = lp.run(&mut camera, &mut MockDisplay::default(), &mut MockStop::never(), &mut sink, None);

    assert_eq!(stats.cycles, 2);
    assert_eq!(camera.releases, 1);
    assert_eq!(log.borrow().disconnects, 1);

    let stopping: Vec<_> = sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::Stopping(_)))
        .collect();
    assert_eq!(stopping.len(), 1);
    assert!(matches!(stopping[0], AppEvent::Stopping(StopReason::CaptureFailed(_))));
    assert!(matches!(sink.events.last(), Some(AppEvent::Stopped(s)) if s.cycles == 2));
}

#[test]
fn end_of_stream_stops_cleanly() {
    let mut lp = build(MockPlc::new(), ScriptedScores::constant(0));
    let mut sink = RecordingSink::default();
    lp.run(&mut MockCamera::new(0), &mut MockDisplay::default(), &mut MockStop::never(), &mut sink, None);
    assert!(sink.events.iter().any(|e| matches!(e, AppEvent::Stopping(StopReason::EndOfStream))));
    assert_eq!(lp.stats().cycles, 0);
}

#[test]
fn operator_stop_completes_the_current_cycle() {
    let plc = MockPlc::new();
    let log = plc.log();
    let mut lp = build(plc, ScriptedScores::constant(0));
    let mut camera = MockCamera::endless();
    let mut stop = MockStop::after(3);
    let mut sink = RecordingSink::default();
    let stats = lp.run(&mut camera, &mut MockDisplay::default(), &mut stop, &mut sink, None);

    assert_eq!(stats.cycles, 3);
    assert_eq!(log.borrow().writes.len(), 3);
    assert_eq!(camera.reads, 3);
    assert!(sink.events.iter().any(|e| matches!(e, AppEvent::Stopping(StopReason::Operator))));
}

#[test]
fn cycle_limit_bounds_the_run() {
    let mut lp = build(MockPlc::new(), ScriptedScores::constant(0));
    let mut sink = RecordingSink::default();
    let stats = lp.run(&mut MockCamera::endless(), &mut MockDisplay::default(), &mut MockStop::never(), &mut sink, Some(10));
    assert_eq!(stats.cycles, 10);
    assert!(sink.events.iter().any(|e| matches!(e, AppEvent::Stopping(StopReason::CycleLimit))));
}

#[test]
fn shutdown_is_idempotent() {
    let plc = MockPlc::new();
    let log = plc.log();
    let mut lp = build(plc, ScriptedScores::constant(0));
    let mut camera = MockCamera::new(1);
    let mut sink = RecordingSink::default();
    lp.run(&mut camera, &mut MockDisplay::default(), &mut MockStop::never(), &mut sink, None);
    lp.shutdown(&mut camera, &mut sink);
    drop(lp);

    assert_eq!(camera.releases, 1);
    assert_eq!(log.borrow().disconnects, 1);
    let stopped = sink.events.iter().filter(|e| matches!(e, AppEvent::Stopped(_))).count();
    assert_eq!(stopped, 1);
}

#[test]
fn cycle_before_start_does_nothing() {
    let mut lp = build(MockPlc::new(), ScriptedScores::constant(0));
    let mut camera = MockCamera::endless();
    let phase = lp.cycle(&mut camera, &mut MockDisplay::default(), &mut MockStop::never(), &mut RecordingSink::default());
    assert_eq!(phase, LoopPhase::Starting);
    assert_eq!(camera.reads, 0);
}
