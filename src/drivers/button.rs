//! Polled push-button driver with press cooldown.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The driver is generic over an
//! `embedded-hal` input and is polled from the main loop at control-tick
//! rate; a press is the released → pressed transition.
//!
//! ## Cooldown
//!
//! | Condition                              | Result                  |
//! |----------------------------------------|-------------------------|
//! | First press, or ≥ cooldown since last  | press accepted          |
//! | Press within cooldown of the last one  | ignored, WARN logged    |
//! | Held down                              | nothing (edge only)     |

use embedded_hal::digital::InputPin;
use log::warn;

pub struct ButtonDriver<P> {
    pin: P,
    cooldown_ms: u64,
    was_pressed: bool,
    last_accepted_ms: Option<u64>,
}

impl<P: InputPin> ButtonDriver<P> {
    pub fn new(pin: P, cooldown_ms: u64) -> Self {
        Self {
            pin,
            cooldown_ms,
            was_pressed: false,
            last_accepted_ms: None,
        }
    }

    /// Call from the main loop each tick.  Returns `true` once per accepted
    /// press.  A pin read error counts as "released".
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let pressed = self.pin.is_low().unwrap_or(false);
        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        if !edge {
            return false;
        }

        if let Some(last) = self.last_accepted_ms {
            if now_ms.saturating_sub(last) < self.cooldown_ms {
                warn!("button pressed too fast, ignored");
                return false;
            }
        }
        self.last_accepted_ms = Some(now_ms);
        true
    }
}
