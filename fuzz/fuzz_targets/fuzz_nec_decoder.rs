//! Fuzz target: `decode_nec`
//!
//! Arbitrary edge timings, as a noisy receiver would capture them, must
//! never panic the decoder.  Anything it accepts must survive a clean
//! re-encode and decode.
//!
//! cargo fuzz run fuzz_nec_decoder

#![no_main]

use acpilot::drivers::ir_rx::decode_nec;
use acpilot::drivers::ir_tx::nec_pulses;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let durations: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();

    if let Some(code) = decode_nec(&durations) {
        let clean: Vec<u16> = nec_pulses(code)
            .expect("every u32 encodes")
            .iter()
            .map(|p| p.duration_us)
            .collect();
        assert_eq!(decode_nec(&clean), Some(code));
    }
});
