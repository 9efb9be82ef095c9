//! Fuzz target: stored configuration blob
//!
//! Arbitrary bytes stand in for a corrupted NVS blob.  Loading must never
//! panic, and whatever decodes must either validate and build or be
//! rejected with reported issues.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use irdac::adapters::nvs::NvsAdapter;
use irdac::app::ports::{ConfigPort, StoragePort};
use irdac::app::service::Features;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut nvs) = NvsAdapter::new() else {
        return;
    };
    if nvs.write("irdac", "devcfg", data).is_err() {
        return;
    }
    if let Ok(cfg) = nvs.load() {
        match Features::build(&cfg) {
            Ok(_) => {}
            Err(issues) => assert!(!issues.is_empty()),
        }
    }
});
