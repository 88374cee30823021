//! Discovery handshake against the in-memory backend.

use ardumouse::backends::virtual_hid::{VirtualBackend, VirtualDevice, WriteBehavior};
use ardumouse::timing::RecordingDelay;
use ardumouse::{
    Command, ControllerConfig, DeviceDescriptor, DiscoveryEvent, DiscoveryEventBus, Error,
    EventFilter, MouseController, OpenVia,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn keyboard() -> VirtualDevice {
    VirtualDevice::new(DeviceDescriptor {
        vendor_id: 0x2341,
        product_id: 0x8036,
        usage: Some(6),
        usage_page: Some(1),
        product_string: Some("Arduino Leonardo".into()),
        path: Some("virtual:kbd".into()),
        ..Default::default()
    })
}

fn recorder(bus: &mut DiscoveryEventBus) -> Arc<Mutex<Vec<DiscoveryEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    bus.add_listener(
        move |e: &DiscoveryEvent| sink.lock().unwrap().push(e.clone()),
        EventFilter::All,
    );
    seen
}

fn connect(
    backend: &mut VirtualBackend,
) -> (
    ardumouse::Result<MouseController<ardumouse::backends::virtual_hid::VirtualHandle>>,
    Arc<RecordingDelay>,
    Vec<DiscoveryEvent>,
) {
    let delay = Arc::new(RecordingDelay::new());
    let mut bus = DiscoveryEventBus::new();
    let seen = recorder(&mut bus);
    let res = MouseController::connect_with(
        backend,
        &ControllerConfig::default(),
        delay.clone(),
        &mut bus,
    );
    let events = seen.lock().unwrap().clone();
    (res, delay, events)
}

#[test]
fn zero_candidates_is_not_found_without_opening() {
    let kbd = keyboard();
    let kbd_log = kbd.log();
    let mut backend = VirtualBackend::new(vec![kbd]);

    let (res, delay, events) = connect(&mut backend);

    assert!(matches!(res, Err(Error::DeviceNotFound { candidates: 0 })));
    assert!(kbd_log.snapshot().opens.is_empty());
    assert!(delay.calls().is_empty());
    assert_eq!(backend.enumerations(), 1);
    assert_eq!(
        events.last(),
        Some(&DiscoveryEvent::NotFound { candidates: 0 })
    );
}

#[test]
fn empty_enumeration_is_not_found() {
    let mut backend = VirtualBackend::new(Vec::new());
    let (res, _, _) = connect(&mut backend);
    assert!(matches!(res, Err(Error::DeviceNotFound { candidates: 0 })));
}

#[test]
fn binds_first_responsive_candidate() {
    let a = VirtualDevice::arduino("virtual:a");
    let b = VirtualDevice::arduino("virtual:b");
    let (a_log, b_log) = (a.log(), b.log());
    let mut backend = VirtualBackend::new(vec![keyboard(), a, b]);

    let (res, delay, _) = connect(&mut backend);
    let mouse = res.unwrap();

    assert!(mouse.is_bound());
    assert_eq!(
        mouse.descriptor().and_then(|d| d.path.as_deref()),
        Some("virtual:a")
    );
    assert_eq!(mouse.write_format(), ardumouse::WriteFormat::ReportId);

    let a = a_log.snapshot();
    assert_eq!(a.opens, vec![OpenVia::Path]);
    assert_eq!(a.nonblocking, Some(true));
    assert_eq!(a.closes, 0);
    assert_eq!(a.commands(), vec![Command::Discover]);
    assert_eq!(a.read_timeouts, vec![Some(Duration::ZERO)]);
    assert!(b_log.snapshot().opens.is_empty());

    assert_eq!(delay.calls(), vec![Duration::from_millis(500)]);
}

#[test]
fn skips_unresponsive_writer_and_binds_second() {
    let dead = VirtualDevice::arduino("virtual:dead").with_write(WriteBehavior::Zero);
    let good = VirtualDevice::arduino("virtual:good");
    let (dead_log, good_log) = (dead.log(), good.log());
    let mut backend = VirtualBackend::new(vec![dead, good]);

    let (res, delay, events) = connect(&mut backend);
    let mouse = res.unwrap();

    assert_eq!(mouse.descriptor().unwrap().path.as_deref(), Some("virtual:good"));
    let dead = dead_log.snapshot();
    assert_eq!(dead.opens.len(), 1);
    assert_eq!(dead.closes, 1);
    assert!(dead.read_timeouts.is_empty());
    assert_eq!(good_log.snapshot().opens.len(), 1);
    // No wait was spent on the candidate whose write failed.
    assert_eq!(delay.calls().len(), 1);

    assert!(events.contains(&DiscoveryEvent::WriteFailed {
        index: 0,
        reason: "0 bytes written".into()
    }));
    assert!(matches!(events.last(), Some(DiscoveryEvent::Bound { index: 1, .. })));
}

#[test]
fn every_failure_mode_closes_and_continues() {
    let busy = VirtualDevice::arduino("virtual:busy").failing_open();
    let broken = VirtualDevice::arduino("virtual:broken").with_write(WriteBehavior::Fail);
    let silent = VirtualDevice::arduino("virtual:silent").silent();
    let imposter = VirtualDevice::arduino("virtual:imposter").with_reply(b"Teensy_Mouse".to_vec());
    let logs: Vec<_> = [&busy, &broken, &silent, &imposter]
        .iter()
        .map(|d| d.log())
        .collect();
    let mut backend = VirtualBackend::new(vec![busy, broken, silent, imposter]);

    let (res, delay, events) = connect(&mut backend);

    assert!(matches!(res, Err(Error::DeviceNotFound { candidates: 4 })));
    for log in &logs {
        assert!(!log.snapshot().is_open());
    }
    assert!(logs[0].snapshot().opens.is_empty());
    assert_eq!(delay.calls().len(), 2);

    let failures: Vec<_> = events.iter().filter(|e| e.is_failure()).collect();
    assert!(matches!(failures[0], DiscoveryEvent::OpenFailed { index: 0, .. }));
    assert!(matches!(failures[1], DiscoveryEvent::WriteFailed { index: 1, .. }));
    assert_eq!(failures[2], &DiscoveryEvent::HandshakeRejected { index: 2 });
    assert_eq!(failures[3], &DiscoveryEvent::HandshakeRejected { index: 3 });
    assert_eq!(failures[4], &DiscoveryEvent::NotFound { candidates: 4 });
}

#[test]
fn marker_may_sit_anywhere_in_reply() {
    let mut reply = vec![0u8; 64];
    reply[40..53].copy_from_slice(b"Arduino_Mouse");
    let dev = VirtualDevice::arduino("virtual:0").with_reply(reply);
    let mut backend = VirtualBackend::new(vec![dev]);

    let (res, _, _) = connect(&mut backend);
    assert!(res.unwrap().is_bound());
}

#[test]
fn opens_by_vid_pid_without_path() {
    let dev = VirtualDevice::arduino("unused").without_path();
    let log = dev.log();
    let mut backend = VirtualBackend::new(vec![dev]);

    let (res, _, events) = connect(&mut backend);
    assert!(res.unwrap().is_bound());
    assert_eq!(log.snapshot().opens, vec![OpenVia::VendorProduct]);
    assert!(events
        .iter()
        .any(|e| matches!(e, DiscoveryEvent::Opening { via: OpenVia::VendorProduct, .. })));
}

#[test]
fn nonblocking_failure_skips_candidate() {
    let bad = VirtualDevice::arduino("virtual:bad").failing_nonblocking();
    let good = VirtualDevice::arduino("virtual:good");
    let bad_log = bad.log();
    let mut backend = VirtualBackend::new(vec![bad, good]);

    let (res, delay, events) = connect(&mut backend);
    let mouse = res.unwrap();

    assert_eq!(mouse.descriptor().unwrap().path.as_deref(), Some("virtual:good"));
    let bad = bad_log.snapshot();
    assert_eq!(bad.opens.len(), 1);
    assert_eq!(bad.closes, 1);
    assert!(bad.writes.is_empty());
    assert_eq!(delay.calls().len(), 1);
    assert!(events
        .iter()
        .any(|e| matches!(e, DiscoveryEvent::ConfigureFailed { index: 0, .. })));
}

#[test]
fn read_error_after_wait_is_rejected() {
    let dev = VirtualDevice::arduino("virtual:flaky").failing_read();
    let log = dev.log();
    let mut backend = VirtualBackend::new(vec![dev]);

    let (res, delay, events) = connect(&mut backend);

    assert!(matches!(res, Err(Error::DeviceNotFound { candidates: 1 })));
    assert_eq!(delay.calls(), vec![Duration::from_millis(500)]);
    let snap = log.snapshot();
    assert_eq!(snap.read_timeouts.len(), 1);
    assert!(!snap.is_open());
    assert!(events.contains(&DiscoveryEvent::ReplyReceived {
        index: 0,
        bytes: Vec::new()
    }));
    assert!(events.contains(&DiscoveryEvent::HandshakeRejected { index: 0 }));
}

#[test]
fn opening_is_announced_before_the_open() {
    let dev = VirtualDevice::arduino("virtual:0");
    let log = dev.log();
    let mut backend = VirtualBackend::new(vec![dev]);

    let opens_at_announce = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&opens_at_announce);
    let mut bus = DiscoveryEventBus::new();
    bus.add_listener(
        move |e: &DiscoveryEvent| {
            if let DiscoveryEvent::Opening { via, .. } = e {
                assert_eq!(*via, OpenVia::Path);
                *sink.lock().unwrap() = Some(log.snapshot().opens.len());
            }
        },
        EventFilter::All,
    );

    let delay = Arc::new(RecordingDelay::new());
    let mouse =
        MouseController::connect_with(&mut backend, &ControllerConfig::default(), delay, &mut bus)
            .unwrap();

    assert!(mouse.is_bound());
    assert_eq!(*opens_at_announce.lock().unwrap(), Some(0));
}

#[test]
fn reports_every_enumerated_device() {
    let mut backend = VirtualBackend::new(vec![keyboard(), VirtualDevice::arduino("virtual:0")]);
    let (_, _, events) = connect(&mut backend);

    let seen: Vec<(usize, bool)> = events
        .iter()
        .filter_map(|e| match e {
            DiscoveryEvent::DeviceSeen { index, candidate, .. } => Some((*index, *candidate)),
            _ => None,
        })
        .collect();
    assert_eq!(seen, vec![(0, false), (1, true)]);
    assert_eq!(events[0], DiscoveryEvent::Started);
    assert!(events.contains(&DiscoveryEvent::CandidatesSelected { count: 1 }));
}

#[test]
fn custom_identity_and_wait_from_config() {
    let mut dev = VirtualDevice::arduino("virtual:sparkfun");
    dev.descriptor.vendor_id = 0x1b4f;
    let mut backend = VirtualBackend::new(vec![VirtualDevice::arduino("virtual:stock"), dev]);

    let config = ControllerConfig::from_toml_str(
        "[identity]\nvendor_id = 0x1b4f\n[timing]\nhandshake_wait_ms = 5\n",
    )
    .unwrap();
    let delay = Arc::new(RecordingDelay::new());
    let mut bus = DiscoveryEventBus::new();
    let mouse = MouseController::connect_with(&mut backend, &config, delay.clone(), &mut bus).unwrap();

    assert_eq!(mouse.descriptor().unwrap().vendor_id, 0x1b4f);
    assert_eq!(delay.calls(), vec![Duration::from_millis(5)]);
}
