//! Fuzz target: `ProtocolTable::decode`
//!
//! Feeds arbitrary raw timings (pairs of bytes read as signed µs) through
//! the receive path and asserts that decoding never panics and that any
//! decoded message encodes again.
//!
//! cargo fuzz run fuzz_ir_decode

#![no_main]

use irdac::ir::{FrameDispatcher, ProtocolTable};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw: Vec<i32> = data
        .chunks_exact(2)
        .map(|c| i32::from(i16::from_le_bytes([c[0], c[1]])))
        .collect();

    let table = ProtocolTable::standard();
    if let Ok(frame) = table.decode(&raw) {
        assert!(frame.repeats >= 1, "decoded frame must repeat at least once");
        table
            .encode(&frame.with_repeats(1))
            .expect("decoded message must encode");
    }

    // Same capture through the dispatcher with nobody listening.
    let mut dispatcher = FrameDispatcher::new(table);
    dispatcher.seal();
    let _ = dispatcher.on_raw_pulses(&raw, 0);
});
