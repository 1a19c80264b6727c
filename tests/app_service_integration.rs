//! Integration tests: AppService → HardwareAdapter → simulated drivers.
//!
//! Unlike `tests/integration/`, nothing here is mocked above the driver
//! layer: the sensors, IR transmitter and IR receiver run their host
//! simulation backends, driven through the `sim_*` injectors.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;
use std::sync::Mutex;

use acpilot::adapters::hardware::HardwareAdapter;
use acpilot::adapters::log_sink::LogEventSink;
use acpilot::app::ports::NoAdvisory;
use acpilot::app::service::AppService;
use acpilot::config::SystemConfig;
use acpilot::drivers::button::ButtonDriver;
use acpilot::drivers::ir_rx::{self, IrReceiver};
use acpilot::drivers::ir_tx::{self, IrTransmitter};
use acpilot::drivers::status_led::StatusLed;
use acpilot::event_log::LogLevel;
use acpilot::model::FanSpeed;
use acpilot::pins;
use acpilot::sensors::dht22::{self, Dht22};
use acpilot::sensors::distance::{self, DistanceSensor};
use acpilot::sensors::light::{self, LightSensor};
use acpilot::sensors::motion::MotionSensor;

/// The simulation backends are process-wide statics.
static SIM: Mutex<()> = Mutex::new(());

// ── Mock pin ──────────────────────────────────────────────────

#[derive(Clone)]
struct Level(Rc<Cell<bool>>);

impl Level {
    fn new(high: bool) -> Self {
        Self(Rc::new(Cell::new(high)))
    }
}

impl embedded_hal::digital::ErrorType for Level {
    type Error = Infallible;
}

impl embedded_hal::digital::InputPin for Level {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}

struct Board {
    hw: HardwareAdapter<Level, Level>,
    pir: Level,
    button: Level,
}

fn board(config: &SystemConfig) -> Board {
    let pir = Level::new(false);
    let button = Level::new(true); // pull-up, released
    let hw = HardwareAdapter::new(
        Dht22::new(pins::DHT_GPIO),
        LightSensor::new(),
        MotionSensor::new(pir.clone()),
        DistanceSensor::new(pins::ULTRASONIC_TRIG_GPIO, pins::ULTRASONIC_ECHO_GPIO),
        IrTransmitter::new(),
        IrReceiver::new(),
        ButtonDriver::new(button.clone(), u64::from(config.button_cooldown_ms)),
        StatusLed::new(pins::LED_STATUS_GPIO),
    );
    Board { hw, pir, button }
}

fn reset_sim() {
    dht22::sim_set_fault(false);
    dht22::sim_set_climate(24.0, 50.0);
    light::sim_set_light_adc(1800);
    distance::sim_set_distance_cm(None);
    ir_tx::sim_set_tx_fault(false);
}

// ── Tests ─────────────────────────────────────────────────────

#[test]
fn heat_remote_and_button_through_real_drivers() {
    let _guard = SIM.lock().unwrap_or_else(|e| e.into_inner());
    reset_sim();

    let config = SystemConfig::default();
    let mut b = board(&config);
    let mut app = AppService::new(config);
    let mut sink = LogEventSink::new();
    app.start(0, &mut b.hw, &mut sink);

    // Hot, occupied room: the rule table starts the unit.
    dht22::sim_set_climate(29.5, 55.0);
    b.pir.0.set(true);
    app.tick(0, &mut b.hw, &mut NoAdvisory, &mut sink);
    assert!(app.device().power);
    assert_eq!(app.device().fan, FanSpeed::High);
    assert_eq!(b.hw.frames_sent(), 1);
    assert!(b.hw.status_led_on());
    assert_eq!(app.snapshot().light_level, 1800);

    // Vendor remote "off" (simulator short code).
    ir_rx::sim_inject_code(2);
    app.tick(1_000, &mut b.hw, &mut NoAdvisory, &mut sink);
    assert!(!app.device().power);
    assert_eq!(b.hw.frames_sent(), 2);
    assert!(!b.hw.status_led_on());

    // Button press while the transmitter is faulty: nothing changes.
    ir_tx::sim_set_tx_fault(true);
    b.button.0.set(false);
    app.tick(2_000, &mut b.hw, &mut NoAdvisory, &mut sink);
    assert!(!app.device().power);
    assert_eq!(b.hw.frames_sent(), 2);
    assert_eq!(app.log().count_level(LogLevel::Error), 1);

    // Release, wait out the cooldown, press again with a healthy transmitter.
    ir_tx::sim_set_tx_fault(false);
    b.button.0.set(true);
    app.tick(2_100, &mut b.hw, &mut NoAdvisory, &mut sink);
    b.button.0.set(false);
    app.tick(2_700, &mut b.hw, &mut NoAdvisory, &mut sink);
    assert!(app.device().power);
    assert_eq!(b.hw.frames_sent(), 3);
}

#[test]
fn ranging_sensor_alone_counts_as_presence() {
    let _guard = SIM.lock().unwrap_or_else(|e| e.into_inner());
    reset_sim();

    let config = SystemConfig::default();
    let mut b = board(&config);
    let mut app = AppService::new(config);
    let mut sink = LogEventSink::new();

    dht22::sim_set_climate(27.0, 50.0);
    distance::sim_set_distance_cm(Some(80.0));
    app.tick(0, &mut b.hw, &mut NoAdvisory, &mut sink);

    assert!(app.snapshot().occupied);
    assert!(!app.snapshot().motion);
    assert!(app.device().power, "moderate heat with someone at 80 cm");
    assert_eq!(app.device().setpoint_c, 25);
}

#[test]
fn sensor_fault_is_logged_and_tolerated() {
    let _guard = SIM.lock().unwrap_or_else(|e| e.into_inner());
    reset_sim();

    let config = SystemConfig::default();
    let mut b = board(&config);
    let mut app = AppService::new(config);
    let mut sink = LogEventSink::new();

    app.tick(0, &mut b.hw, &mut NoAdvisory, &mut sink);
    dht22::sim_set_fault(true);
    app.tick(2_000, &mut b.hw, &mut NoAdvisory, &mut sink);
    dht22::sim_set_fault(false);

    assert_eq!(app.snapshot().temperature_c, 24.0);
    assert_eq!(app.log().count_level(LogLevel::Warn), 1);
}
