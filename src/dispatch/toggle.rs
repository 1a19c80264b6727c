//! Two-code NEC protocol: one code powers the unit on, the other off.
//!
//! Setpoint, mode and fan cannot be carried.  Adjust actions update the
//! logical state only and the dispatcher records the divergence.

use crate::model::{Action, Capabilities, DeviceState};

use super::{AcProtocol, IrFrame};

/// NEC-32 code that powers the unit on.
pub const POWER_ON_CODE: u32 = 0x0002_0906;
/// NEC-32 code that powers the unit off.
pub const POWER_OFF_CODE: u32 = 0x0002_9069;

#[derive(Debug, Clone, Copy, Default)]
pub struct ToggleProtocol;

impl AcProtocol for ToggleProtocol {
    fn name(&self) -> &'static str {
        "toggle"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::GENERIC
    }

    fn encode(&self, action: &Action, _next: &DeviceState) -> Option<IrFrame> {
        match action {
            // Re-sending ON to a running unit is harmless, so no suppression.
            Action::TurnOn { .. } => Some(IrFrame::Nec(POWER_ON_CODE)),
            Action::TurnOff => Some(IrFrame::Nec(POWER_OFF_CODE)),
            Action::Adjust(_) | Action::Maintain => None,
        }
    }
}
