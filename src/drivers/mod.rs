//! Peripheral drivers and one-shot hardware initialisation.

pub mod button;
pub mod hw_init;
pub mod ir_rx;
pub mod ir_tx;
pub mod status_led;
