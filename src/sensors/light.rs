//! Ambient light via an LDR voltage divider on ADC1.
//!
//! Brighter light lowers the LDR resistance and raises the divider voltage,
//! so larger raw values mean a brighter room.  The raw 12-bit count is
//! reported as-is.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1_CH6 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static AtomicU16 for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_LIGHT_ADC: AtomicU16 = AtomicU16::new(2048);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_light_adc(raw: u16) {
    SIM_LIGHT_ADC.store(raw.min(ADC_MAX), Ordering::Relaxed);
}

pub const ADC_MAX: u16 = 4095;

pub struct LightSensor;

impl LightSensor {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "espidf")]
    pub fn read(&self) -> u16 {
        hw_init::adc1_read(hw_init::ADC1_CH_LDR).min(ADC_MAX)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read(&self) -> u16 {
        SIM_LIGHT_ADC.load(Ordering::Relaxed)
    }
}

impl Default for LightSensor {
    fn default() -> Self {
        Self::new()
    }
}
