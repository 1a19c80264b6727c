//! Mock adapters for integration tests.
//!
//! `MockHardware` plays the room (scripted sensor values) and the unit
//! (records every IR frame), so tests can assert on the full transmit
//! history without touching real GPIO/RMT registers.

use std::collections::VecDeque;

use acpilot::advisory::{AdvisoryRequest, AdvisoryResponse, RequestId};
use acpilot::app::events::AppEvent;
use acpilot::app::ports::{
    AdvisoryTransport, EventSink, InputPort, IrTransmitPort, SensorPort, StatusPort,
};
use acpilot::dispatch::IrFrame;
use acpilot::error::{AdvisoryError, SensorError, TransmitError};
use acpilot::sensors::ClimateReading;

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub climate_fault: bool,
    pub light: u16,
    pub motion: bool,
    pub distance_cm: Option<f32>,

    pub frames: Vec<IrFrame>,
    pub tx_fault: bool,
    pub led: bool,

    pub presses: VecDeque<bool>,
    pub ir_codes: VecDeque<u32>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            temperature_c: 24.0,
            humidity_pct: 50.0,
            climate_fault: false,
            light: 2000,
            motion: false,
            distance_cm: None,
            frames: Vec::new(),
            tx_fault: false,
            led: false,
            presses: VecDeque::new(),
            ir_codes: VecDeque::new(),
        }
    }

    /// Occupied room at `temperature_c`.
    pub fn occupied_at(temperature_c: f32) -> Self {
        Self {
            temperature_c,
            motion: true,
            ..Self::new()
        }
    }

    pub fn press_button(&mut self) {
        self.presses.push_back(true);
    }

    pub fn last_frame(&self) -> Option<&IrFrame> {
        self.frames.last()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_climate(&mut self) -> Result<ClimateReading, SensorError> {
        if self.climate_fault {
            return Err(SensorError::ReadFailure);
        }
        Ok(ClimateReading {
            temperature_c: self.temperature_c,
            humidity_pct: self.humidity_pct,
        })
    }

    fn read_light(&mut self) -> u16 {
        self.light
    }

    fn motion_detected(&mut self) -> bool {
        self.motion
    }

    fn distance_cm(&mut self) -> Option<f32> {
        self.distance_cm
    }
}

impl IrTransmitPort for MockHardware {
    fn transmit(&mut self, frame: &IrFrame) -> Result<(), TransmitError> {
        if self.tx_fault {
            return Err(TransmitError::Peripheral(-1));
        }
        self.frames.push(*frame);
        Ok(())
    }
}

impl InputPort for MockHardware {
    fn poll_button(&mut self, _now_ms: u64) -> bool {
        self.presses.pop_front().unwrap_or(false)
    }

    fn take_ir_code(&mut self) -> Option<u32> {
        self.ir_codes.pop_front()
    }
}

impl StatusPort for MockHardware {
    fn set_status_led(&mut self, on: bool) {
        self.led = on;
    }
}

// ── ScriptedAdvisory ──────────────────────────────────────────

/// Records requests and cancels; replies only when the test queues one.
#[derive(Default)]
pub struct ScriptedAdvisory {
    pub started: Vec<AdvisoryRequest>,
    pub cancelled: Vec<RequestId>,
    pub replies: VecDeque<AdvisoryResponse>,
    pub refuse: bool,
}

#[allow(dead_code)]
impl ScriptedAdvisory {
    pub fn reply(&mut self, id: RequestId, text: &str) {
        self.replies.push_back(AdvisoryResponse {
            id,
            result: Ok(text.to_owned()),
        });
    }

    pub fn fail(&mut self, id: RequestId, error: AdvisoryError) {
        self.replies.push_back(AdvisoryResponse {
            id,
            result: Err(error),
        });
    }
}

impl AdvisoryTransport for ScriptedAdvisory {
    fn start(&mut self, request: AdvisoryRequest) -> Result<(), AdvisoryError> {
        if self.refuse {
            return Err(AdvisoryError::Transport);
        }
        self.started.push(request);
        Ok(())
    }

    fn poll_response(&mut self) -> Option<AdvisoryResponse> {
        self.replies.pop_front()
    }

    fn cancel(&mut self, id: RequestId) {
        self.cancelled.push(id);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device_changes(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::DeviceChanged { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
