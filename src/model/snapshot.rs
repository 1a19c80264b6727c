//! Point-in-time view of the room, produced by the sensor aggregator.

use serde::Serialize;

/// A debounced occupancy/comfort snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorSnapshot {
    /// Air temperature (°C).  Last good value when the sensor faults.
    pub temperature_c: f32,
    /// Relative humidity (%).  Last good value when the sensor faults.
    pub humidity_pct: f32,
    /// True once a temperature/humidity pair has been read successfully.
    pub climate_valid: bool,

    /// Ambient light level (raw ADC, 0 – 4095).
    pub light_level: u16,

    /// Raw PIR output at the time of the snapshot.
    pub motion: bool,
    /// Distance to the nearest object, when the ranging sensor answered.
    pub occupancy_distance_cm: Option<f32>,

    /// Debounced presence: any raw occupancy signal within its window.
    pub occupied: bool,
    /// Last time any raw occupancy signal fired.
    pub last_occupied_ms: Option<u64>,

    /// Monotonic time the snapshot was taken.
    pub timestamp_ms: u64,
}

impl SensorSnapshot {
    /// How long the room has been without any occupancy signal.  A room
    /// that was never seen occupied counts from boot.
    pub fn unoccupied_for_ms(&self, now_ms: u64) -> u64 {
        if self.occupied {
            return 0;
        }
        now_ms.saturating_sub(self.last_occupied_ms.unwrap_or(0))
    }
}
