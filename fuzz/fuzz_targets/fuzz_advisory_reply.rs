//! Fuzz target: advisory reply parsing and action resolution.
//!
//! Whatever text the inference service returns, parsing must not panic and
//! a resolved action must only carry legal values.
//!
//! cargo fuzz run fuzz_advisory_reply

#![no_main]

use acpilot::advisory::prompt::parse_response;
use acpilot::model::device::{SETPOINT_MAX_C, SETPOINT_MIN_C};
use acpilot::model::{Action, Capabilities, DeviceState};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(req) = parse_response(text) else {
        return;
    };

    for caps in [Capabilities::GENERIC, Capabilities::FULL_STATE] {
        let current = DeviceState::default();
        match req.resolve(&current, &caps) {
            Action::TurnOn { setpoint_c, fan, mode } => {
                assert!((SETPOINT_MIN_C..=SETPOINT_MAX_C).contains(&setpoint_c));
                assert!(caps.fan_levels.contains(&fan));
                assert!(caps.modes.contains(&mode));
            }
            Action::Adjust(adj) => {
                if let Some(t) = adj.setpoint_c {
                    assert!((SETPOINT_MIN_C..=SETPOINT_MAX_C).contains(&t));
                }
                let next = caps.normalize(Action::Adjust(adj).apply(&current));
                assert_eq!(caps.normalize(next), next);
            }
            Action::TurnOff | Action::Maintain => {}
        }
    }
});
