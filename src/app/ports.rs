//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, IR transmitter, inputs, event sinks, the
//! advisory worker) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics, so
//! the domain core never touches hardware directly.

use crate::advisory::{AdvisoryRequest, AdvisoryResponse, RequestId};
use crate::dispatch::IrFrame;
use crate::error::{AdvisoryError, SensorError, TransmitError};
use crate::sensors::ClimateReading;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw sensor reads.  Debouncing and retention of last-good values happen
/// in the [`SensorAggregator`](crate::sensors::SensorAggregator).
pub trait SensorPort {
    /// One temperature/humidity sample.
    fn read_climate(&mut self) -> Result<ClimateReading, SensorError>;

    /// Ambient light, raw ADC (0 – 4095).
    fn read_light(&mut self) -> u16;

    /// Instantaneous PIR output.
    fn motion_detected(&mut self) -> bool;

    /// Distance to the nearest object; `None` when no echo came back.
    fn distance_cm(&mut self) -> Option<f32>;
}

// ───────────────────────────────────────────────────────────────
// IR transmit port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// The single transmit primitive.  A frame is sent whole or not at all.
pub trait IrTransmitPort {
    fn transmit(&mut self, frame: &IrFrame) -> Result<(), TransmitError>;
}

// ───────────────────────────────────────────────────────────────
// Input / status ports (manual button, IR receiver, power LED)
// ───────────────────────────────────────────────────────────────

pub trait InputPort {
    /// True once per accepted button press.  Cooldown filtering is the
    /// adapter's job.
    fn poll_button(&mut self, now_ms: u64) -> bool;

    /// Next raw code captured by the IR receiver, if any.
    fn take_ir_code(&mut self) -> Option<u32>;
}

pub trait StatusPort {
    /// Mirror AC power on the status LED.
    fn set_status_led(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log,
/// dashboard push, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Advisory transport (driven adapter: domain ↔ remote service)
// ───────────────────────────────────────────────────────────────

/// Non-blocking transport for the advisory round trip.
///
/// `start` must return immediately; the reply surfaces later through
/// `poll_response`.  Responses carry the id of the request they answer so
/// the caller can discard stale ones.
pub trait AdvisoryTransport {
    fn start(&mut self, request: AdvisoryRequest) -> Result<(), AdvisoryError>;

    fn poll_response(&mut self) -> Option<AdvisoryResponse>;

    /// Best effort: the request may still complete, its reply is ignored.
    fn cancel(&mut self, id: RequestId);
}

/// Transport for builds without an advisory service.  Every request fails
/// immediately with `Transport`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAdvisory;

impl AdvisoryTransport for NoAdvisory {
    fn start(&mut self, _request: AdvisoryRequest) -> Result<(), AdvisoryError> {
        Err(AdvisoryError::Transport)
    }

    fn poll_response(&mut self) -> Option<AdvisoryResponse> {
        None
    }

    fn cancel(&mut self, _id: RequestId) {}
}
