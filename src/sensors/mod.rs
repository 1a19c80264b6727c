//! Sensor subsystem: individual drivers and the [`SensorAggregator`] that
//! folds their raw readings into a debounced [`SensorSnapshot`].
//!
//! The aggregator only talks to hardware through
//! [`SensorPort`](crate::app::ports::SensorPort), so the same code runs
//! against the board adapter and against test doubles.

pub mod dht22;
pub mod distance;
pub mod light;
pub mod motion;
pub mod occupancy;

use crate::app::ports::SensorPort;
use crate::config::SystemConfig;
use crate::error::SensorError;
use crate::model::SensorSnapshot;
use occupancy::OccupancyTracker;

pub use dht22::ClimateReading;

/// Owns the last snapshot and the occupancy debounce state.
pub struct SensorAggregator {
    climate_interval_ms: u64,
    last_climate_ms: Option<u64>,
    occupancy: OccupancyTracker,
    snapshot: SensorSnapshot,
}

impl SensorAggregator {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            climate_interval_ms: u64::from(config.sensor_read_interval_ms),
            last_climate_ms: None,
            occupancy: OccupancyTracker::new(
                u64::from(config.motion_debounce_ms),
                u64::from(config.distance_debounce_ms),
                config.presence_min_cm,
                config.presence_range_cm,
            ),
            snapshot: SensorSnapshot::default(),
        }
    }

    /// Sample every sensor and update the snapshot.
    ///
    /// The temperature/humidity pair is only sampled once per
    /// `sensor_read_interval_ms`.  When that sample is unusable the previous
    /// environmental fields (temperature, humidity, light) are kept and
    /// `ReadFailure` is returned, but occupancy is still refreshed; callers
    /// can read the partial update through [`snapshot`](Self::snapshot).
    pub fn refresh(
        &mut self,
        port: &mut impl SensorPort,
        now_ms: u64,
    ) -> Result<SensorSnapshot, SensorError> {
        let mut climate = Ok(());

        let due = self
            .last_climate_ms
            .is_none_or(|t| now_ms.saturating_sub(t) >= self.climate_interval_ms);
        if due {
            self.last_climate_ms = Some(now_ms);
            match port.read_climate() {
                Ok(r) if r.temperature_c.is_finite() && r.humidity_pct.is_finite() => {
                    self.snapshot.temperature_c = r.temperature_c;
                    self.snapshot.humidity_pct = r.humidity_pct;
                    self.snapshot.climate_valid = true;
                }
                Ok(_) | Err(_) => climate = Err(SensorError::ReadFailure),
            }
        }

        let motion = port.motion_detected();
        let distance = port.distance_cm();
        if climate.is_ok() {
            self.snapshot.light_level = port.read_light();
        }
        self.snapshot.motion = motion;
        self.snapshot.occupancy_distance_cm = distance;
        self.snapshot.occupied = self.occupancy.update(now_ms, motion, distance);
        self.snapshot.last_occupied_ms = self.occupancy.last_occupied_ms();
        self.snapshot.timestamp_ms = now_ms;

        climate.map(|()| self.snapshot)
    }

    pub fn snapshot(&self) -> &SensorSnapshot {
        &self.snapshot
    }
}
