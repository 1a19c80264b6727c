//! Full-state protocol: every frame carries power, mode, setpoint and fan.
//!
//! ```text
//!  byte  0     1     2                    3             4          5
//!       0x23  0xCB  power<<7 | mode      setpoint−16   fan rank   checksum
//! ```
//!
//! Mode codes: Auto 0, Cool 1, Dry 2, Fan 3, Heat 4.  The checksum is the
//! low byte of the sum of bytes 0..5.  Bytes go out LSB first.

use crate::model::device::SETPOINT_MIN_C;
use crate::model::{Action, Capabilities, DeviceState};

use super::{AcProtocol, IrFrame};

pub const FRAME_LEN: usize = 6;
const HEADER: [u8; 2] = [0x23, 0xCB];

pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Encode an already-normalised state.
pub fn encode_state(state: &DeviceState) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[..2].copy_from_slice(&HEADER);
    frame[2] = (u8::from(state.power) << 7) | state.mode.code();
    frame[3] = state.setpoint_c.saturating_sub(SETPOINT_MIN_C);
    frame[4] = state.fan.rank();
    frame[5] = checksum(&frame[..5]);
    frame
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatefulProtocol;

impl AcProtocol for StatefulProtocol {
    fn name(&self) -> &'static str {
        "stateful"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL_STATE
    }

    fn encode(&self, action: &Action, next: &DeviceState) -> Option<IrFrame> {
        (!action.is_maintain()).then(|| IrFrame::Stateful(encode_state(next)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AcMode, FanSpeed};

    #[test]
    fn frame_layout() {
        let frame = encode_state(&DeviceState {
            power: true,
            setpoint_c: 22,
            mode: AcMode::Cool,
            fan: FanSpeed::High,
        });
        assert_eq!(&frame[..5], &[0x23, 0xCB, 0x81, 6, 4]);
        assert_eq!(frame[5], checksum(&frame[..5]));
    }

    #[test]
    fn power_off_clears_top_bit_only() {
        let frame = encode_state(&DeviceState {
            power: false,
            setpoint_c: 30,
            mode: AcMode::Heat,
            fan: FanSpeed::Quiet,
        });
        assert_eq!(frame[2], 0x04);
        assert_eq!(frame[3], 14);
    }
}
