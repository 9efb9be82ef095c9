//! Integration tests for the Runtime → features → ports pipeline.
//!
//! These run on the host (x86_64) and drive whole configurations through
//! setup, received captures, ticks and commands against mock adapters.

use crate::mock_hw::{MemStorage, MockHardware, RecordingSink};

use irdac::app::commands::{AppCommand, LightCommand};
use irdac::app::events::AppEvent;
use irdac::app::service::{Features, Runtime};
use irdac::config::{
    AnalogOutputConfig, DeviceConfig, FadeSwitchConfig, FeatureRef, LightConfig, ProximityConfig,
};
use irdac::control::FadeState;
use irdac::dac::{ChannelId, Waveform};
use irdac::error::{ConfigError, Error, TransmitError};
use irdac::ir::{BusyPolicy, Frame};
use irdac::light::RestoreMode;
use irdac::light::fade_switch::STORAGE_NAMESPACE;
use irdac::light::remote::{self, ADDRESS_DIM, ADDRESS_SET};
use irdac::sensors::ProximityState;

fn sensor() -> ProximityConfig {
    ProximityConfig {
        name: "doorway".into(),
        led_pin: Some(25),
        channel_mode: None,
        sensing_level: 1.0,
        threshold: 3,
        window_ms: 500,
        clear_timeout_ms: 2000,
    }
}

fn light(fade_switch: bool) -> LightConfig {
    LightConfig {
        name: "ceiling".into(),
        default_intensity: 0.0,
        fade_rate_per_sec: 1.0,
        color_temperature: remote::COLD_MIREDS,
        fade_switch: fade_switch.then(|| FadeSwitchConfig {
            name: "ceiling fade".into(),
            restore_mode: RestoreMode::RestoreDefaultOn,
            icon: irdac::light::fade_switch::ICON_FADE.into(),
        }),
    }
}

fn proximity_events(events: &[AppEvent]) -> Vec<ProximityState> {
    events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ProximityChanged { state, .. } => Some(*state),
            _ => None,
        })
        .collect()
}

// ── Setup ─────────────────────────────────────────────────────

#[test]
fn setup_starts_carrier_and_publishes_initial_states() {
    let mut cfg = DeviceConfig::default();
    cfg.proximity.push(sensor());
    cfg.lights.push(light(false));
    let features = Features::build(&cfg).unwrap();
    let mut rt = Runtime::new(&features, &cfg).unwrap();
    let (mut hw, storage, mut sink) = (MockHardware::new(), MemStorage::default(), RecordingSink::new());

    rt.setup(&mut hw, &storage, &mut sink);

    assert!(rt.is_started());
    assert!(features.registry().is_sealed());
    assert_eq!(
        hw.dac_writes,
        vec![(ChannelId::Right, 255, Waveform::ProximityCarrier)]
    );
    assert_eq!(
        sink.events,
        vec![
            AppEvent::ProximityChanged {
                sensor: 0,
                state: ProximityState::Clear
            },
            AppEvent::LightChanged {
                light: 0,
                state: FadeState::Steady,
                intensity: 0.0
            },
            AppEvent::Started {
                outputs: 0,
                sensors: 1,
                lights: 1
            },
        ]
    );
    // Nothing is transmitted for the power-up state.
    assert!(hw.sent.is_empty());
}

#[test]
fn dac_failure_at_setup_faults_only_that_sensor() {
    let mut cfg = DeviceConfig::default();
    cfg.proximity.push(sensor());
    let features = Features::build(&cfg).unwrap();
    let mut rt = Runtime::new(&features, &cfg).unwrap();
    let mut hw = MockHardware::new();
    hw.fail_dac = true;
    let mut sink = RecordingSink::new();

    rt.setup(&mut hw, &MemStorage::default(), &mut sink);

    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::FeatureFaulted {
            feature: FeatureRef::Proximity(0),
            ..
        }
    )));
    assert!(rt.is_started());

    // A faulted sensor ignores reflections.
    sink.take();
    for t in [0, 100, 200, 300] {
        rt.on_raw_pulses(&reflection_raw(), t, &mut sink);
    }
    assert!(proximity_events(&sink.events).is_empty());
}

// ── Proximity ─────────────────────────────────────────────────

fn reflection_raw() -> Vec<i32> {
    irdac::ir::ProtocolTable::standard()
        .encode(&Frame::reflection())
        .unwrap()
        .to_vec()
}

#[test]
fn reflections_detect_then_silence_clears() {
    let mut cfg = DeviceConfig::default();
    cfg.proximity.push(sensor());
    let features = Features::build(&cfg).unwrap();
    let mut rt = Runtime::new(&features, &cfg).unwrap();
    let (mut hw, mut sink) = (MockHardware::new(), RecordingSink::new());
    rt.setup(&mut hw, &MemStorage::default(), &mut sink);
    sink.take();

    for t in [0, 150, 300] {
        assert_eq!(rt.on_raw_pulses(&reflection_raw(), t, &mut sink), Some(Frame::reflection()));
    }
    assert_eq!(proximity_events(&sink.take()), vec![ProximityState::Detected]);

    rt.tick(2299, &mut hw, &mut sink);
    assert!(proximity_events(&sink.take()).is_empty());

    rt.tick(2300, &mut hw, &mut sink);
    assert_eq!(proximity_events(&sink.take()), vec![ProximityState::Clear]);
    assert_eq!(rt.dispatch_stats().deliveries, 3);
}

#[test]
fn noise_is_dropped_without_events() {
    let mut cfg = DeviceConfig::default();
    cfg.proximity.push(sensor());
    let features = Features::build(&cfg).unwrap();
    let mut rt = Runtime::new(&features, &cfg).unwrap();
    let (mut hw, mut sink) = (MockHardware::new(), RecordingSink::new());
    rt.setup(&mut hw, &MemStorage::default(), &mut sink);
    sink.take();

    assert_eq!(rt.on_raw_pulses(&[300, -300, 300], 0, &mut sink), None);
    assert_eq!(rt.on_raw_pulses(&[], 10, &mut sink), None);
    assert!(sink.events.is_empty());
    assert_eq!(rt.dispatch_stats().decode_failures, 2);
}

// ── Lights ────────────────────────────────────────────────────

fn light_states(events: &[AppEvent]) -> Vec<FadeState> {
    events
        .iter()
        .filter_map(|e| match e {
            AppEvent::LightChanged { state, .. } => Some(*state),
            _ => None,
        })
        .collect()
}

#[test]
fn local_fade_is_transmitted_step_by_step() {
    let mut cfg = DeviceConfig::default();
    cfg.lights.push(light(false));
    let features = Features::build(&cfg).unwrap();
    let mut rt = Runtime::new(&features, &cfg).unwrap();
    let (mut hw, mut storage, mut sink) = (MockHardware::new(), MemStorage::default(), RecordingSink::new());
    rt.setup(&mut hw, &storage, &mut sink);
    rt.tick(0, &mut hw, &mut sink);
    sink.take();

    rt.handle_command(
        AppCommand::Light {
            index: 0,
            command: LightCommand::SetTarget(1.0),
        },
        &mut hw,
        &mut storage,
        &mut sink,
    )
    .unwrap();

    let mut t = 0;
    while t < 1500 {
        t += 20;
        rt.tick(t, &mut hw, &mut sink);
    }

    let frames = hw.sent_frames();
    assert_eq!(frames.len(), 16);
    assert!(frames.iter().all(|f| f.as_nec().unwrap().address == ADDRESS_DIM));
    assert_eq!(frames.last().unwrap().as_nec().unwrap().command_byte(), 0xFF);
    assert_eq!(
        light_states(&sink.events),
        vec![FadeState::Fading, FadeState::Steady]
    );
    assert_eq!(features.lights[0].borrow().intensity(), 1.0);
}

#[test]
fn remote_frames_update_the_mirror_without_retransmitting() {
    let mut cfg = DeviceConfig::default();
    cfg.lights.push(light(false));
    let features = Features::build(&cfg).unwrap();
    let mut rt = Runtime::new(&features, &cfg).unwrap();
    let (mut hw, mut sink) = (MockHardware::new(), RecordingSink::new());
    rt.setup(&mut hw, &MemStorage::default(), &mut sink);
    rt.tick(0, &mut hw, &mut sink);

    // Wall remote: full brightness, coldest white.
    hw.inject(&remote::state_frame(1.0, 0.0, false));
    while let Some(raw) = irdac::app::ports::PulseSource::receive_raw_pulses(&mut hw) {
        let frame = rt.on_raw_pulses(&raw, 5, &mut sink).unwrap();
        assert_eq!(frame.as_nec().unwrap().address, ADDRESS_SET);
    }

    let mut t = 0;
    while t < 1500 {
        t += 20;
        rt.tick(t, &mut hw, &mut sink);
    }
    assert_eq!(features.lights[0].borrow().intensity(), 1.0);
    assert!(hw.sent.is_empty());
}

#[test]
fn disabled_fade_gate_jumps_and_sends_set_frame() {
    let mut cfg = DeviceConfig::default();
    cfg.lights.push(light(true));
    let features = Features::build(&cfg).unwrap();
    let mut rt = Runtime::new(&features, &cfg).unwrap();
    let (mut hw, mut storage, mut sink) = (MockHardware::new(), MemStorage::default(), RecordingSink::new());
    rt.setup(&mut hw, &storage, &mut sink);
    assert!(sink
        .take()
        .contains(&AppEvent::FadeSwitchChanged { light: 0, on: true }));

    for command in [LightCommand::SetFadeEnabled(false), LightCommand::SetTarget(0.6)] {
        rt.handle_command(AppCommand::Light { index: 0, command }, &mut hw, &mut storage, &mut sink)
            .unwrap();
    }
    assert!(sink
        .events
        .contains(&AppEvent::FadeSwitchChanged { light: 0, on: false }));
    assert_eq!(features.lights[0].borrow().intensity(), 0.6);

    rt.tick(20, &mut hw, &mut sink);
    let frames = hw.sent_frames();
    assert_eq!(frames.len(), 1);
    let nec = frames[0].as_nec().unwrap();
    assert_eq!(nec.address, ADDRESS_SET);
    assert_eq!(nec.command_byte(), remote::command_byte(0.6, 0.0));
}

fn receive(rt: &mut Runtime<'_>, hw: &mut MockHardware, sink: &mut RecordingSink, frame: &Frame, now_ms: u32) {
    hw.inject(frame);
    while let Some(raw) = irdac::app::ports::PulseSource::receive_raw_pulses(hw) {
        rt.on_raw_pulses(&raw, now_ms, sink).unwrap();
    }
}

#[test]
fn remote_key_equal_to_an_earlier_transmission_still_applies() {
    let mut cfg = DeviceConfig::default();
    cfg.lights.push(light(false));
    let features = Features::build(&cfg).unwrap();
    let mut rt = Runtime::new(&features, &cfg).unwrap();
    let (mut hw, mut sink) = (MockHardware::new(), RecordingSink::new());
    rt.setup(&mut hw, &MemStorage::default(), &mut sink);

    gate_off(&mut rt, &mut hw, &mut sink);
    jump_to(&mut rt, &mut hw, &mut sink, 1.0);
    rt.tick(20, &mut hw, &mut sink);
    let full = hw.sent_frames()[0];
    assert_eq!(full.as_nec().unwrap().command_byte(), 0xFF);

    // Our own frame reflected back is not a remote key press.
    receive(&mut rt, &mut hw, &mut sink, &full, 30);
    assert_eq!(features.lights[0].borrow().intensity(), 1.0);

    receive(&mut rt, &mut hw, &mut sink, &remote::state_frame(0.0, 0.0, false), 1000);
    assert_eq!(features.lights[0].borrow().intensity(), 0.0);

    // The wall remote's "full" key is the same frame we sent earlier.
    receive(&mut rt, &mut hw, &mut sink, &full, 2000);
    assert_eq!(features.lights[0].borrow().intensity(), 1.0);

    rt.tick(2020, &mut hw, &mut sink);
    assert_eq!(hw.sent_frames().len(), 1);
}

#[test]
fn fade_switch_state_survives_a_reboot() {
    let mut cfg = DeviceConfig::default();
    cfg.lights.push(light(true));
    let mut storage = MemStorage::default();

    {
        let features = Features::build(&cfg).unwrap();
        let mut rt = Runtime::new(&features, &cfg).unwrap();
        let (mut hw, mut sink) = (MockHardware::new(), RecordingSink::new());
        rt.setup(&mut hw, &storage, &mut sink);
        rt.handle_command(
            AppCommand::Light {
                index: 0,
                command: LightCommand::SetFadeEnabled(false),
            },
            &mut hw,
            &mut storage,
            &mut sink,
        )
        .unwrap();
    }
    assert!(storage
        .entries
        .contains_key(&(STORAGE_NAMESPACE.to_owned(), "fade0".to_owned())));

    let features = Features::build(&cfg).unwrap();
    let mut rt = Runtime::new(&features, &cfg).unwrap();
    let (mut hw, mut sink) = (MockHardware::new(), RecordingSink::new());
    rt.setup(&mut hw, &storage, &mut sink);
    assert!(!features.lights[0].borrow().fade_enabled());
    assert!(sink
        .events
        .contains(&AppEvent::FadeSwitchChanged { light: 0, on: false }));
}

// ── Transmitter policy ────────────────────────────────────────

fn jump_to(rt: &mut Runtime<'_>, hw: &mut MockHardware, sink: &mut RecordingSink, level: f32) {
    let mut storage = MemStorage::default();
    rt.handle_command(
        AppCommand::Light {
            index: 0,
            command: LightCommand::SetTarget(level),
        },
        hw,
        &mut storage,
        sink,
    )
    .unwrap();
}

fn gate_off(rt: &mut Runtime<'_>, hw: &mut MockHardware, sink: &mut RecordingSink) {
    let mut storage = MemStorage::default();
    rt.handle_command(
        AppCommand::Light {
            index: 0,
            command: LightCommand::SetFadeEnabled(false),
        },
        hw,
        &mut storage,
        sink,
    )
    .unwrap();
}

#[test]
fn reject_policy_reports_busy_transmitter() {
    let mut cfg = DeviceConfig::default();
    cfg.lights.push(light(false));
    cfg.transmitter.policy = BusyPolicy::Reject;
    let features = Features::build(&cfg).unwrap();
    let mut rt = Runtime::new(&features, &cfg).unwrap();
    let (mut hw, mut sink) = (MockHardware::manual_tx(), RecordingSink::new());
    rt.setup(&mut hw, &MemStorage::default(), &mut sink);
    gate_off(&mut rt, &mut hw, &mut sink);

    jump_to(&mut rt, &mut hw, &mut sink, 0.5);
    rt.tick(20, &mut hw, &mut sink);
    assert_eq!(hw.sent.len(), 1);

    jump_to(&mut rt, &mut hw, &mut sink, 0.8);
    rt.tick(40, &mut hw, &mut sink);
    assert_eq!(hw.sent.len(), 1);
    assert!(sink.events.contains(&AppEvent::TransmitRejected {
        light: 0,
        error: TransmitError::TransmitterBusy
    }));
    assert_eq!(rt.transmitter().rejected(), 1);
}

#[test]
fn queue_policy_sends_in_order_once_idle() {
    let mut cfg = DeviceConfig::default();
    cfg.lights.push(light(false));
    let features = Features::build(&cfg).unwrap();
    let mut rt = Runtime::new(&features, &cfg).unwrap();
    let (mut hw, mut sink) = (MockHardware::manual_tx(), RecordingSink::new());
    rt.setup(&mut hw, &MemStorage::default(), &mut sink);
    gate_off(&mut rt, &mut hw, &mut sink);

    jump_to(&mut rt, &mut hw, &mut sink, 0.5);
    rt.tick(20, &mut hw, &mut sink);
    jump_to(&mut rt, &mut hw, &mut sink, 0.8);
    rt.tick(40, &mut hw, &mut sink);
    assert_eq!(hw.sent.len(), 1);
    assert_eq!(rt.transmitter().pending(), 1);

    hw.complete_tx();
    rt.tick(60, &mut hw, &mut sink);
    let bytes: Vec<u8> = hw
        .sent_frames()
        .iter()
        .map(|f| f.as_nec().unwrap().command_byte())
        .collect();
    assert_eq!(
        bytes,
        vec![remote::command_byte(0.5, 0.0), remote::command_byte(0.8, 0.0)]
    );
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn analog_output_follows_level_commands() {
    let mut cfg = DeviceConfig::default();
    cfg.outputs.push(AnalogOutputConfig {
        name: "bias".into(),
        pin: None,
        channel_mode: Some(irdac::dac::ChannelMode::Left),
    });
    let features = Features::build(&cfg).unwrap();
    let mut rt = Runtime::new(&features, &cfg).unwrap();
    let (mut hw, mut storage, mut sink) = (MockHardware::new(), MemStorage::default(), RecordingSink::new());
    rt.setup(&mut hw, &storage, &mut sink);

    rt.handle_command(
        AppCommand::SetOutputLevel { index: 0, level: 0.5 },
        &mut hw,
        &mut storage,
        &mut sink,
    )
    .unwrap();
    assert_eq!(
        hw.dac_writes.last(),
        Some(&(ChannelId::Left, 128, Waveform::Constant))
    );
}

#[test]
fn commands_for_missing_features_are_rejected() {
    let cfg = DeviceConfig::default();
    let features = Features::build(&cfg).unwrap();
    let mut rt = Runtime::new(&features, &cfg).unwrap();
    let (mut hw, mut storage, mut sink) = (MockHardware::new(), MemStorage::default(), RecordingSink::new());
    rt.setup(&mut hw, &storage, &mut sink);

    let err = rt
        .handle_command(
            AppCommand::Light {
                index: 2,
                command: LightCommand::Toggle,
            },
            &mut hw,
            &mut storage,
            &mut sink,
        )
        .unwrap_err();
    assert_eq!(err, Error::Config(ConfigError::OutOfRange("light index")));
}
