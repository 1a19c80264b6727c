//! HC-SR04 ultrasonic ranger.
//!
//! A 10 µs trigger pulse starts a ping; the echo pin then stays high for
//! the round-trip time of the sound burst (58 µs per cm).  No echo within
//! [`ECHO_TIMEOUT_US`] means nothing is in range.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives TRIG and times ECHO with the high-resolution timer.
//! On host/test: reads from a static AtomicU32 (tenths of a cm) for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

/// Round-trip microseconds per centimetre at ~20 °C.
const US_PER_CM: f32 = 58.0;
/// Beyond ~4 m the module stops answering.
pub const ECHO_TIMEOUT_US: i64 = 25_000;

#[cfg(not(target_os = "espidf"))]
const NO_ECHO: u32 = u32::MAX;
#[cfg(not(target_os = "espidf"))]
static SIM_DISTANCE_DECI_CM: AtomicU32 = AtomicU32::new(NO_ECHO);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_distance_cm(distance: Option<f32>) {
    let raw = distance.map_or(NO_ECHO, |d| (d.max(0.0) * 10.0) as u32);
    SIM_DISTANCE_DECI_CM.store(raw, Ordering::Relaxed);
}

pub fn echo_to_cm(echo_us: i64) -> Option<f32> {
    (echo_us > 0 && echo_us < ECHO_TIMEOUT_US).then(|| echo_us as f32 / US_PER_CM)
}

pub struct DistanceSensor {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    trig_gpio: i32,
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    echo_gpio: i32,
}

impl DistanceSensor {
    pub fn new(trig_gpio: i32, echo_gpio: i32) -> Self {
        Self {
            trig_gpio,
            echo_gpio,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read_cm(&mut self) -> Option<f32> {
        match SIM_DISTANCE_DECI_CM.load(Ordering::Relaxed) {
            NO_ECHO => None,
            raw => Some(raw as f32 / 10.0),
        }
    }

    #[cfg(target_os = "espidf")]
    pub fn read_cm(&mut self) -> Option<f32> {
        use crate::drivers::hw_init::{gpio_read, gpio_write};
        use esp_idf_svc::sys::{esp_rom_delay_us, esp_timer_get_time};

        gpio_write(self.trig_gpio, false);
        // SAFETY: busy-wait ROM helper, no shared state.
        unsafe { esp_rom_delay_us(2) };
        gpio_write(self.trig_gpio, true);
        unsafe { esp_rom_delay_us(10) };
        gpio_write(self.trig_gpio, false);

        // SAFETY: monotonic timer reads.
        let start = unsafe { esp_timer_get_time() };
        while !gpio_read(self.echo_gpio) {
            if unsafe { esp_timer_get_time() } - start > ECHO_TIMEOUT_US {
                return None;
            }
        }
        let rise = unsafe { esp_timer_get_time() };
        while gpio_read(self.echo_gpio) {
            if unsafe { esp_timer_get_time() } - rise > ECHO_TIMEOUT_US {
                return None;
            }
        }
        echo_to_cm(unsafe { esp_timer_get_time() } - rise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_conversion() {
        let cm = echo_to_cm(5_800).unwrap();
        assert!((cm - 100.0).abs() < 0.01);
        assert_eq!(echo_to_cm(0), None);
        assert_eq!(echo_to_cm(ECHO_TIMEOUT_US), None);
    }
}
