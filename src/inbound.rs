//! Inbound remote-code interpreter.
//!
//! Maps raw codes captured by the IR receiver (or injected by the
//! simulator) onto the same [`Action`] vocabulary the rule engine uses, so a
//! key press on the vendor remote and an automatic decision travel the same
//! dispatch path.  Relative keys (temp ±, mode/fan cycle, power toggle) are
//! resolved against the current device state into absolute actions.

use heapless::Vec;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::dispatch::toggle::{POWER_OFF_CODE, POWER_ON_CODE};
use crate::model::device::clamp_setpoint;
use crate::model::{Action, Adjustment, Capabilities, DeviceState};

/// "Key held down" frame sent by NEC remotes.  Never an action.
pub const NEC_REPEAT: u32 = 0xFFFF_FFFF;

/// Codes bound to one key.
pub const CODES_PER_KEY: usize = 4;
pub type KeyCodes = Vec<u32, CODES_PER_KEY>;

/// Logical remote keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKey {
    PowerOn,
    PowerOff,
    PowerToggle,
    TempUp,
    TempDown,
    ModeCycle,
    FanCycle,
}

/// Raw-code bindings for each key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keymap {
    pub power_on: KeyCodes,
    pub power_off: KeyCodes,
    pub power_toggle: KeyCodes,
    pub temp_up: KeyCodes,
    pub temp_down: KeyCodes,
    pub mode_cycle: KeyCodes,
    pub fan_cycle: KeyCodes,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            // 1/2 are the simulator's short codes.
            power_on: [1, POWER_ON_CODE].into_iter().collect(),
            power_off: [2, POWER_OFF_CODE].into_iter().collect(),
            power_toggle: [0x20DF_10EF].into_iter().collect(),
            temp_up: [0x20DF_40BF].into_iter().collect(),
            temp_down: [0x20DF_C03F].into_iter().collect(),
            mode_cycle: [0x20DF_906F].into_iter().collect(),
            fan_cycle: [0x20DF_50AF].into_iter().collect(),
        }
    }
}

impl Keymap {
    pub fn lookup(&self, code: u32) -> Option<RemoteKey> {
        [
            (&self.power_on, RemoteKey::PowerOn),
            (&self.power_off, RemoteKey::PowerOff),
            (&self.power_toggle, RemoteKey::PowerToggle),
            (&self.temp_up, RemoteKey::TempUp),
            (&self.temp_down, RemoteKey::TempDown),
            (&self.mode_cycle, RemoteKey::ModeCycle),
            (&self.fan_cycle, RemoteKey::FanCycle),
        ]
        .into_iter()
        .find(|(codes, _)| codes.contains(&code))
        .map(|(_, key)| key)
    }

    /// Translate a raw code.  Repeat frames and unknown codes yield `None`.
    pub fn interpret(
        &self,
        code: u32,
        current: &DeviceState,
        caps: &Capabilities,
    ) -> Option<Action> {
        if code == NEC_REPEAT {
            debug!("IR repeat frame ignored");
            return None;
        }
        let Some(key) = self.lookup(code) else {
            warn!("IR: unknown code 0x{:08X}", code);
            return None;
        };

        let turn_on = Action::TurnOn {
            setpoint_c: current.setpoint_c,
            fan: current.fan,
            mode: current.mode,
        };
        let adjust = |adj: Adjustment| Some(Action::Adjust(adj));

        match key {
            RemoteKey::PowerOn => Some(turn_on),
            RemoteKey::PowerOff => Some(Action::TurnOff),
            RemoteKey::PowerToggle if current.power => Some(Action::TurnOff),
            RemoteKey::PowerToggle => Some(turn_on),
            RemoteKey::TempUp => adjust(Adjustment {
                setpoint_c: Some(clamp_setpoint(i64::from(current.setpoint_c) + 1)),
                ..Adjustment::default()
            }),
            RemoteKey::TempDown => adjust(Adjustment {
                setpoint_c: Some(clamp_setpoint(i64::from(current.setpoint_c) - 1)),
                ..Adjustment::default()
            }),
            RemoteKey::ModeCycle => adjust(Adjustment {
                mode: Some(caps.next_mode(current.mode)),
                ..Adjustment::default()
            }),
            RemoteKey::FanCycle => adjust(Adjustment {
                fan: Some(caps.next_fan(current.fan)),
                ..Adjustment::default()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AcMode, FanSpeed};

    fn caps() -> Capabilities {
        Capabilities::GENERIC
    }

    #[test]
    fn simulator_codes_map_to_power() {
        let km = Keymap::default();
        let off = DeviceState::default();
        assert!(matches!(
            km.interpret(1, &off, &caps()),
            Some(Action::TurnOn { .. })
        ));
        assert_eq!(km.interpret(2, &off, &caps()), Some(Action::TurnOff));
    }

    #[test]
    fn repeat_and_unknown_codes_are_ignored() {
        let km = Keymap::default();
        let s = DeviceState::default();
        assert_eq!(km.interpret(NEC_REPEAT, &s, &caps()), None);
        assert_eq!(km.interpret(0xDEAD_BEEF, &s, &caps()), None);
    }

    #[test]
    fn temp_keys_saturate_at_limits() {
        let km = Keymap::default();
        let hot = DeviceState {
            setpoint_c: 30,
            ..DeviceState::default()
        };
        assert_eq!(
            km.interpret(0x20DF_40BF, &hot, &caps()),
            Some(Action::Adjust(Adjustment {
                setpoint_c: Some(30),
                ..Adjustment::default()
            }))
        );
    }

    #[test]
    fn toggle_follows_current_power() {
        let km = Keymap::default();
        let on = DeviceState {
            power: true,
            ..DeviceState::default()
        };
        assert_eq!(km.interpret(0x20DF_10EF, &on, &caps()), Some(Action::TurnOff));
    }

    #[test]
    fn cycle_keys_use_protocol_order() {
        let km = Keymap::default();
        let s = DeviceState {
            mode: AcMode::Auto,
            fan: FanSpeed::High,
            ..DeviceState::default()
        };
        assert_eq!(
            km.interpret(0x20DF_906F, &s, &caps()),
            Some(Action::Adjust(Adjustment {
                mode: Some(AcMode::Cool),
                ..Adjustment::default()
            }))
        );
        assert_eq!(
            km.interpret(0x20DF_50AF, &s, &caps()),
            Some(Action::Adjust(Adjustment {
                fan: Some(FanSpeed::Low),
                ..Adjustment::default()
            }))
        );
    }
}
