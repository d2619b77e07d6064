#![cfg(feature = "dummy")]

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use iqpump::DeviceFamily;
use iqpump::DeviceSession;
use iqpump::Dummy;
use iqpump::Error;
use iqpump::GainOverride;
use iqpump::SampleFifo;
use iqpump::SessionConfig;
use iqpump::SessionState;

fn config(device_args: &str) -> SessionConfig {
    SessionConfig {
        device_args: device_args.to_string(),
        ..SessionConfig::default()
    }
}

fn started(config: SessionConfig) -> DeviceSession<Dummy> {
    let mut session = DeviceSession::new(config);
    session.start().unwrap();
    session
}

fn calls(session: &DeviceSession<Dummy>) -> Vec<String> {
    session.device().unwrap().calls()
}

#[test]
fn agc_disabled_explicitly_when_supported() {
    let session = started(config("driver=dummy"));
    assert!(calls(&session).contains(&"set_agc(false)".to_string()));
}

#[test]
fn agc_enabled_on_request() {
    let mut cfg = config("driver=dummy");
    cfg.agc = true;
    let session = started(cfg);
    assert!(calls(&session).contains(&"set_agc(true)".to_string()));
}

#[test]
fn agc_request_without_support_is_fatal() {
    let mut cfg = config("driver=dummy, agc=0");
    cfg.agc = true;
    let mut session = DeviceSession::<Dummy>::new(cfg);
    let err = session.start().unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert!(err.to_string().contains("AGC"));
    assert!(session.device().is_none());
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn agc_untouched_when_unsupported_and_unrequested() {
    let session = started(config("driver=dummy, agc=0"));
    assert!(!calls(&session).iter().any(|c| c.starts_with("set_agc")));
}

#[test]
fn wide_family_gets_wide_default_bandwidth() {
    let session = started(config("driver=sdrplay, serial=1"));
    assert_eq!(session.family(), DeviceFamily::WideBandwidthDefault);
    assert!(calls(&session).contains(&"set_bandwidth(5000000)".to_string()));
}

#[test]
fn generic_family_gets_narrow_default_bandwidth() {
    let session = started(config("driver=dummy"));
    assert_eq!(session.family(), DeviceFamily::Generic);
    assert!(calls(&session).contains(&"set_bandwidth(3000000)".to_string()));
}

#[test]
fn wide_family_sticks_across_mixed_enumeration() {
    let session = started(config("driver=dummy, enumerate='sdrplay rtlsdr'"));
    assert_eq!(session.family(), DeviceFamily::WideBandwidthDefault);
    assert!(calls(&session).contains(&"set_bandwidth(5000000)".to_string()));

    // Order of enumeration makes no difference.
    let session = started(config("driver=dummy, enumerate='rtlsdr sdrplay'"));
    assert_eq!(session.family(), DeviceFamily::WideBandwidthDefault);
}

#[test]
fn explicit_bandwidth_overrides_family_default() {
    let mut cfg = config("driver=sdrplay");
    cfg.bandwidth = Some(1_500_000.0);
    let session = started(cfg);
    assert!(calls(&session).contains(&"set_bandwidth(1500000)".to_string()));
}

#[test]
fn channel_out_of_range_is_fatal() {
    let mut cfg = config("driver=dummy, channels=1");
    cfg.channel = 1;
    let mut session = DeviceSession::<Dummy>::new(cfg);
    let err = session.start().unwrap_err();
    assert!(err.to_string().contains("1 channels"));
    assert!(session.device().is_none());
    // Closing an already-closed session is a no-op.
    session.close();
    session.close();
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn second_channel_accepted_when_present() {
    let mut cfg = config("driver=dummy, channels=2");
    cfg.channel = 1;
    let session = started(cfg);
    assert_eq!(session.state(), SessionState::Ready);
}

#[test]
fn configure_failure_rolls_back_to_closed() {
    let mut session = DeviceSession::<Dummy>::new(config("driver=dummy, fail=set_bandwidth"));
    let err = session.start().unwrap_err();
    assert!(err.to_string().contains("set_bandwidth"));
    assert!(session.device().is_none());
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn open_failure_reports_creation_error() {
    let mut session = DeviceSession::<Dummy>::new(config("driver=dummy, fail=open"));
    let err = session.start().unwrap_err();
    assert!(err.to_string().contains("failed to create device"));
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn stream_setup_failure_rolls_back() {
    let mut session = DeviceSession::<Dummy>::new(config("driver=dummy, fail=rx_stream"));
    let err = session.start().unwrap_err();
    assert!(err.to_string().contains("stream setup"));
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn gain_step_is_passed_raw() {
    let mut cfg = config("driver=dummy");
    cfg.gain_step = Some(40);
    let session = started(cfg);
    assert!(calls(&session).contains(&"set_gain(40)".to_string()));
}

#[test]
fn gain_overrides_applied_in_order() {
    let mut cfg = config("driver=dummy");
    cfg.gain_overrides = vec![
        GainOverride::new("RF", Some(10.0)),
        GainOverride::new("IF", None),
        GainOverride::new("RF", Some(20.0)),
    ];
    let session = started(cfg);
    let c = calls(&session);
    let first = c.iter().position(|x| x == "set_gain_element(RF, 10)");
    let second = c.iter().position(|x| x == "set_gain_element(RF, 20)");
    assert!(first.unwrap() < second.unwrap());
    // None leaves the element untouched.
    assert!(!c.iter().any(|x| x.starts_with("set_gain_element(IF")));
}

#[test]
fn gain_override_failure_is_fatal() {
    let mut cfg = config("driver=dummy, fail=set_gain_element");
    cfg.gain_overrides = vec![GainOverride::new("RF", Some(10.0))];
    let mut session = DeviceSession::<Dummy>::new(cfg);
    let err = session.start().unwrap_err();
    assert!(err.to_string().contains("set_gain_element for RF"));
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn antenna_applied_when_configured() {
    let mut cfg = config("driver=dummy");
    cfg.antenna = Some("AUX".to_string());
    let session = started(cfg);
    assert!(calls(&session).contains(&"set_antenna(AUX)".to_string()));
}

#[test]
fn run_delivers_scripted_blocks() {
    let session_cfg = config("driver=dummy, reads='1024 1024'");
    let fifo = SampleFifo::new(4, 131_072, 0);
    let shutdown = Arc::new(AtomicBool::new(false));
    let mut session = started(session_cfg);

    session.run(&fifo, &shutdown);
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(fifo.queued(), 2);

    // 12 MHz reference over a 2.4 MHz rate scales sample positions by 5.
    let first = fifo.dequeue().unwrap();
    assert_eq!(first.sample_timestamp, 0);
    assert_eq!(first.valid_len, 1024);
    assert!(!first.discontinuous);
    let second = fifo.dequeue().unwrap();
    assert_eq!(second.sample_timestamp, 5120);
    assert_eq!(second.valid_len, 1024);
    fifo.release(first);
    fifo.release(second);
}

#[test]
fn run_after_failed_start_is_a_no_op() {
    let mut session = DeviceSession::<Dummy>::new(config("driver=dummy, fail=open"));
    assert!(session.start().is_err());
    let fifo = SampleFifo::new(1, 1024, 0);
    let shutdown = AtomicBool::new(false);
    session.run(&fifo, &shutdown);
    assert_eq!(fifo.queued(), 0);
}
