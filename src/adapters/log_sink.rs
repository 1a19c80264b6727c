//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART in production), one line per event.  A dashboard push
//! would implement the same trait.

use log::{info, warn};

use crate::app::events::{AppEvent, TelemetryData};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// Single-line rendering of a telemetry snapshot.
pub fn telemetry_line(t: &TelemetryData) -> String {
    format!(
        "TELEM | up={}s | T={:.1}\u{00b0}C RH={:.0}% | light={} | occupied={} | \
         ac={} | auto={} | advisory={} | changes={}",
        t.uptime_ms / 1000,
        t.temperature_c,
        t.humidity_pct,
        t.light_level,
        if t.occupied { "yes" } else { "no" },
        t.device,
        if t.automation_enabled { "on" } else { "off" },
        if t.advisory_pending { "pending" } else { "idle" },
        t.change_count,
    )
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => info!("{}", telemetry_line(t)),
            AppEvent::DeviceChanged { from, to, origin } => {
                info!("DEVICE | {} -> {} ({:?})", from, to, origin);
            }
            AppEvent::OccupancyChanged(occupied) => {
                info!("OCCUPANCY | {}", if *occupied { "present" } else { "vacant" });
            }
            AppEvent::SensorFault => warn!("SENSOR | climate read failed"),
            AppEvent::Started(state) => info!("START | initial_device={}", state),
        }
    }
}
