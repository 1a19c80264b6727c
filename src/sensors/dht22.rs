//! DHT22 / AM2302 temperature and humidity sensor.
//!
//! Single-wire protocol: the host pulls the line low for >1 ms, the sensor
//! answers with an 80 µs low / 80 µs high preamble followed by 40 bits.  Each
//! bit is a 50 µs low followed by a high pulse of ~27 µs (`0`) or ~70 µs
//! (`1`).  The sensor must not be polled faster than once every 2 s.
//!
//! ## Frame layout
//!
//! ```text
//!  byte 0..1  humidity × 10       (big-endian)
//!  byte 2..3  temperature × 10    (big-endian, bit 15 = sign)
//!  byte 4     checksum            (low byte of the sum of bytes 0..3)
//! ```
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the data pin with busy-wait timing.
//! On host/test: synthesises a frame from static atomics for injection.

use crate::error::SensorError;

/// One validated temperature/humidity pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Decode and validate a raw 40-bit frame.
pub fn decode_frame(frame: [u8; 5]) -> Result<ClimateReading, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    if sum != frame[4] {
        return Err(SensorError::ReadFailure);
    }

    let humidity_raw = u16::from_be_bytes([frame[0], frame[1]]);
    let temp_raw = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]);
    let mut temperature_c = temp_raw as f32 / 10.0;
    if frame[2] & 0x80 != 0 {
        temperature_c = -temperature_c;
    }
    let humidity_pct = humidity_raw as f32 / 10.0;

    // Datasheet range: -40..80 °C, 0..100 %RH.
    if !(-40.0..=80.0).contains(&temperature_c) || !(0.0..=100.0).contains(&humidity_pct) {
        return Err(SensorError::ReadFailure);
    }
    Ok(ClimateReading {
        temperature_c,
        humidity_pct,
    })
}

/// Build a frame from engineering values (used by the host simulation).
pub fn encode_frame(temperature_c: f32, humidity_pct: f32) -> [u8; 5] {
    let hum = (humidity_pct * 10.0).round().clamp(0.0, u16::MAX as f32) as u16;
    let magnitude = (temperature_c.abs() * 10.0).round().clamp(0.0, 0x7FFF as f32) as u16;
    let mut temp = magnitude.to_be_bytes();
    if temperature_c < 0.0 {
        temp[0] |= 0x80;
    }
    let [h0, h1] = hum.to_be_bytes();
    let checksum = h0
        .wrapping_add(h1)
        .wrapping_add(temp[0])
        .wrapping_add(temp[1]);
    [h0, h1, temp[0], temp[1], checksum]
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

    static SIM_TEMP_DECI_C: AtomicI32 = AtomicI32::new(250);
    static SIM_HUMIDITY_DECI: AtomicI32 = AtomicI32::new(500);
    static SIM_FAULT: AtomicBool = AtomicBool::new(false);

    pub fn set_climate(temperature_c: f32, humidity_pct: f32) {
        SIM_TEMP_DECI_C.store((temperature_c * 10.0).round() as i32, Ordering::Relaxed);
        SIM_HUMIDITY_DECI.store((humidity_pct * 10.0).round() as i32, Ordering::Relaxed);
    }

    pub fn set_fault(fault: bool) {
        SIM_FAULT.store(fault, Ordering::Relaxed);
    }

    pub fn frame() -> Option<[u8; 5]> {
        if SIM_FAULT.load(Ordering::Relaxed) {
            return None;
        }
        let t = SIM_TEMP_DECI_C.load(Ordering::Relaxed) as f32 / 10.0;
        let h = SIM_HUMIDITY_DECI.load(Ordering::Relaxed) as f32 / 10.0;
        Some(super::encode_frame(t, h))
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_climate(temperature_c: f32, humidity_pct: f32) {
    sim::set_climate(temperature_c, humidity_pct);
}

/// Make subsequent reads time out, as a disconnected sensor would.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_fault(fault: bool) {
    sim::set_fault(fault);
}

// ── Driver ────────────────────────────────────────────────────

pub struct Dht22 {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    gpio: i32,
}

impl Dht22 {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    pub fn read(&mut self) -> Result<ClimateReading, SensorError> {
        let frame = self.read_frame()?;
        decode_frame(frame).inspect_err(|_| log::debug!("dht22: bad frame {:02x?}", frame))
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        sim::frame().ok_or(SensorError::ReadFailure)
    }

    #[cfg(target_os = "espidf")]
    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        use esp_idf_svc::sys::{
            esp_rom_delay_us, gpio_mode_t_GPIO_MODE_INPUT, gpio_mode_t_GPIO_MODE_OUTPUT_OD,
            gpio_set_direction, gpio_set_level,
        };

        let pin = self.gpio;
        // SAFETY: the data pin is owned by this driver and only touched from
        // the main loop; the calls are plain register accesses.
        unsafe {
            gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_OUTPUT_OD);
            gpio_set_level(pin, 0);
            esp_rom_delay_us(1_100);
            gpio_set_level(pin, 1);
            esp_rom_delay_us(30);
            gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_INPUT);
        }

        // Preamble: low, high, then low marks the first bit.
        wait_for_level(pin, false, 100)?;
        wait_for_level(pin, true, 100)?;
        wait_for_level(pin, false, 100)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            wait_for_level(pin, true, 80)?;
            let high_us = wait_for_level(pin, false, 100)?;
            if high_us > 40 {
                frame[bit / 8] |= 1 << (7 - bit % 8);
            }
        }
        Ok(frame)
    }
}

/// Busy-wait until the pin reads `level`; returns the elapsed microseconds.
#[cfg(target_os = "espidf")]
fn wait_for_level(pin: i32, level: bool, timeout_us: i64) -> Result<i64, SensorError> {
    use esp_idf_svc::sys::{esp_timer_get_time, gpio_get_level};

    // SAFETY: monotonic timer read and input register read.
    let start = unsafe { esp_timer_get_time() };
    loop {
        let elapsed = unsafe { esp_timer_get_time() } - start;
        if (unsafe { gpio_get_level(pin) } != 0) == level {
            return Ok(elapsed);
        }
        if elapsed > timeout_us {
            return Err(SensorError::ReadFailure);
        }
    }
}
