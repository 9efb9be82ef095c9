//! Configuration loading and validation, end to end from JSON.

use irdac::app::service::Features;
use irdac::config::{DeviceConfig, FeatureRef};
use irdac::dac::{ChannelId, ChannelMode};
use irdac::error::ConfigError;
use irdac::ir::BusyPolicy;
use irdac::light::RestoreMode;

const FULL: &str = r#"{
    "tick_interval_ms": 10,
    "outputs": [
        { "name": "bias", "channel_mode": "LEFT" }
    ],
    "proximity": [
        { "name": "doorway", "led_pin": 25, "threshold": 4, "window_ms": 400 }
    ],
    "lights": [
        {
            "name": "ceiling",
            "default_intensity": 0.3,
            "fade_switch": { "name": "ceiling fade", "restore_mode": "ALWAYS_OFF" }
        }
    ],
    "transmitter": { "policy": "reject", "queue_depth": 2 }
}"#;

#[test]
fn full_json_config_builds() {
    let cfg = DeviceConfig::from_json(FULL).unwrap();
    assert_eq!(cfg.tick_interval_ms, 10);
    assert_eq!(cfg.proximity[0].threshold, 4);
    assert_eq!(cfg.proximity[0].clear_timeout_ms, 2000);
    assert_eq!(
        cfg.lights[0].fade_switch.as_ref().unwrap().restore_mode,
        RestoreMode::AlwaysOff
    );
    assert_eq!(cfg.transmitter.policy, BusyPolicy::Reject);

    let features = Features::build(&cfg).unwrap();
    let reg = features.registry();
    assert_eq!(reg.owner(ChannelId::Left), Some(FeatureRef::Output(0)));
    assert_eq!(reg.owner(ChannelId::Right), Some(FeatureRef::Proximity(0)));
    assert_eq!(features.lights.len(), 1);
}

#[test]
fn every_problem_is_reported_at_once() {
    let json = r#"{
        "tick_interval_ms": 0,
        "outputs": [
            { "name": "a", "pin": 27 },
            { "name": "b", "pin": 25, "channel_mode": "RIGHT" },
            { "name": "c" }
        ],
        "proximity": [
            { "name": "p", "channel_mode": "RIGHT", "window_ms": 900, "clear_timeout_ms": 100 }
        ]
    }"#;
    let cfg = DeviceConfig::from_json(json).unwrap();
    let errs = Features::build(&cfg).err().unwrap();

    assert!(errs.contains(ConfigError::OutOfRange("tick_interval_ms")));
    assert!(errs.contains(ConfigError::InvalidPinForChannel(27)));
    assert!(errs.contains(ConfigError::BothPinAndMode));
    assert!(errs.contains(ConfigError::MissingPinOrMode));
    assert!(errs.len() >= 5);
}

#[test]
fn both_mode_conflicts_with_any_other_claim() {
    let json = r#"{
        "outputs": [ { "name": "a", "channel_mode": "BOTH" } ],
        "proximity": [ { "name": "p", "led_pin": 26 } ]
    }"#;
    let cfg = DeviceConfig::from_json(json).unwrap();
    let errs = Features::build(&cfg).err().unwrap();
    assert_eq!(errs.issues()[0].feature, FeatureRef::Proximity(0));
    assert_eq!(
        errs.issues()[0].error,
        ConfigError::DuplicateChannelClaim(ChannelId::Left)
    );
}

#[test]
fn mode_names_are_uppercase() {
    let json = r#"{ "outputs": [ { "name": "a", "channel_mode": "BOTH" } ] }"#;
    let cfg = DeviceConfig::from_json(json).unwrap();
    assert_eq!(cfg.outputs[0].channel_mode, Some(ChannelMode::Both));
}
