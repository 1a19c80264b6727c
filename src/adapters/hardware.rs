//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns every sensor and actuator driver and exposes them through
//! [`SensorPort`], [`IrTransmitPort`], [`InputPort`] and [`StatusPort`].
//! This is the only module in the system that touches actual hardware.
//! On non-espidf targets the underlying drivers use cfg-gated simulation
//! stubs.

use embedded_hal::digital::InputPin;

use crate::app::ports::{InputPort, IrTransmitPort, SensorPort, StatusPort};
use crate::dispatch::IrFrame;
use crate::drivers::button::ButtonDriver;
use crate::drivers::ir_rx::IrReceiver;
use crate::drivers::ir_tx::IrTransmitter;
use crate::drivers::status_led::StatusLed;
use crate::error::{SensorError, TransmitError};
use crate::sensors::ClimateReading;
use crate::sensors::dht22::Dht22;
use crate::sensors::distance::DistanceSensor;
use crate::sensors::light::LightSensor;
use crate::sensors::motion::MotionSensor;

/// Concrete adapter that combines all hardware behind port traits.
/// `M` is the PIR input, `B` the button input.
pub struct HardwareAdapter<M, B> {
    climate: Dht22,
    light: LightSensor,
    motion: MotionSensor<M>,
    distance: DistanceSensor,
    ir_tx: IrTransmitter,
    ir_rx: IrReceiver,
    button: ButtonDriver<B>,
    led: StatusLed,
}

impl<M: InputPin, B: InputPin> HardwareAdapter<M, B> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        climate: Dht22,
        light: LightSensor,
        motion: MotionSensor<M>,
        distance: DistanceSensor,
        ir_tx: IrTransmitter,
        ir_rx: IrReceiver,
        button: ButtonDriver<B>,
        led: StatusLed,
    ) -> Self {
        Self {
            climate,
            light,
            motion,
            distance,
            ir_tx,
            ir_rx,
            button,
            led,
        }
    }

    pub fn frames_sent(&self) -> u32 {
        self.ir_tx.frames_sent()
    }

    pub fn status_led_on(&self) -> bool {
        self.led.is_on()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<M: InputPin, B: InputPin> SensorPort for HardwareAdapter<M, B> {
    fn read_climate(&mut self) -> Result<ClimateReading, SensorError> {
        self.climate.read()
    }

    fn read_light(&mut self) -> u16 {
        self.light.read()
    }

    fn motion_detected(&mut self) -> bool {
        self.motion.detected()
    }

    fn distance_cm(&mut self) -> Option<f32> {
        self.distance.read_cm()
    }
}

// ── Actuator / input implementations ──────────────────────────

impl<M: InputPin, B: InputPin> IrTransmitPort for HardwareAdapter<M, B> {
    fn transmit(&mut self, frame: &IrFrame) -> Result<(), TransmitError> {
        self.ir_tx.transmit(frame)
    }
}

impl<M: InputPin, B: InputPin> InputPort for HardwareAdapter<M, B> {
    fn poll_button(&mut self, now_ms: u64) -> bool {
        self.button.poll(now_ms)
    }

    fn take_ir_code(&mut self) -> Option<u32> {
        self.ir_rx.take_code()
    }
}

impl<M: InputPin, B: InputPin> StatusPort for HardwareAdapter<M, B> {
    fn set_status_led(&mut self, on: bool) {
        self.led.set(on);
    }
}
