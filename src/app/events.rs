//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, push to a dashboard,
//! etc.

use serde::Serialize;

use crate::model::DeviceState;

/// Who asked for a device change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOrigin {
    /// The local rule table.
    Rules,
    /// The remote advisory service.
    Advisory,
    /// The on-board push button.
    Button,
    /// The vendor remote, captured by the IR receiver.
    Remote,
    /// A command from an outside collaborator (HTTP, voice).
    External,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The application service has started (carries the initial state).
    Started(DeviceState),

    /// The commanded device state changed.
    DeviceChanged {
        from: DeviceState,
        to: DeviceState,
        origin: ActionOrigin,
    },

    /// Debounced occupancy flipped.
    OccupancyChanged(bool),

    /// The climate sensor returned an unusable sample.
    SensorFault,

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetryData {
    pub uptime_ms: u64,
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub light_level: u16,
    pub occupied: bool,
    pub device: DeviceState,
    pub automation_enabled: bool,
    pub advisory_pending: bool,
    /// Device changes since boot.
    pub change_count: u32,
}
