//! GPIO / peripheral pin assignments for the ACPilot controller board
//! (ESP32 DevKit).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Climate sensor (DHT22, single-wire open-drain)
// ---------------------------------------------------------------------------

pub const DHT_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Infrared
// ---------------------------------------------------------------------------

/// IR LED driven by RMT channel 0 with a 38 kHz carrier.
pub const IR_SEND_GPIO: i32 = 5;
/// Demodulating IR receiver (active-low output) on RMT channel 2.
pub const IR_RECV_GPIO: i32 = 18;
/// Carrier frequency for both NEC and the stateful protocol.
pub const IR_CARRIER_HZ: u32 = 38_000;

// ---------------------------------------------------------------------------
// Occupancy sensors
// ---------------------------------------------------------------------------

/// PIR motion sensor, HIGH while motion is detected.
pub const PIR_GPIO: i32 = 27;
/// HC-SR04 ultrasonic ranger.
pub const ULTRASONIC_TRIG_GPIO: i32 = 25;
pub const ULTRASONIC_ECHO_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// Ambient light (LDR divider, ADC1)
// ---------------------------------------------------------------------------

/// ADC1 channel 6 (GPIO 34 on ESP32).
pub const LDR_ADC_GPIO: i32 = 34;

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

/// Mirrors the commanded AC power state.
pub const LED_STATUS_GPIO: i32 = 2;
/// Lit while the station is associated.
pub const LED_WIFI_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// User button (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button toggling AC power.
pub const BUTTON_GPIO: i32 = 19;
