//! ACPilot Firmware: Main Entry Point
//!
//! Hexagonal architecture around a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter            LogEventSink     MonotonicClock    │
//! │  (Sensor+IR+Input+Status)   (EventSink)                        │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Sensors · Rules · Dispatcher · Keymap · Advisory      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                         │ AdvisoryLink (embassy-sync)          │
//! │                         ▼                                      │
//! │  AdvisoryWorker thread: WifiLink + HTTPS POST                  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use esp_idf_hal::gpio::{PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{error, info, warn};

use acpilot::adapters::advisory_http::{AdvisoryWorker, EspHttpPost};
use acpilot::adapters::hardware::HardwareAdapter;
use acpilot::adapters::log_sink::LogEventSink;
use acpilot::adapters::time::MonotonicClock;
use acpilot::adapters::wifi::WifiLink;
use acpilot::advisory::channels::{ADVISORY_LINK, ChannelTransport};
use acpilot::app::ports::NoAdvisory;
use acpilot::app::service::AppService;
use acpilot::config::SystemConfig;
use acpilot::decision::DecisionSource;
use acpilot::drivers::button::ButtonDriver;
use acpilot::drivers::ir_rx::IrReceiver;
use acpilot::drivers::ir_tx::IrTransmitter;
use acpilot::drivers::status_led::StatusLed;
use acpilot::drivers::hw_init;
use acpilot::pins;
use acpilot::sensors::dht22::Dht22;
use acpilot::sensors::distance::DistanceSensor;
use acpilot::sensors::light::LightSensor;
use acpilot::sensors::motion::MotionSensor;

const ADVISORY_WORKER_STACK: usize = 12 * 1024;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  ACPilot v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let clock = MonotonicClock::new();
    let peripherals = Peripherals::take()?;

    // ── 2. Raw peripheral init (ADC, plain GPIO, IR edge ISR) ──
    hw_init::init_peripherals().context("HAL init failed")?;
    if let Err(e) = hw_init::init_isr_service() {
        error!("ISR service init failed ({}), remote control disabled", e);
    }

    // ── 3. Configuration ──────────────────────────────────────
    let mut config = SystemConfig::default();
    if let Some(json) = option_env!("ACPILOT_CONFIG_JSON") {
        match SystemConfig::from_json(json) {
            Ok(cfg) => config = cfg,
            Err(e) => warn!("embedded config rejected ({}), using defaults", e),
        }
    }

    // ── 4. Advisory uplink ────────────────────────────────────
    let advisory_url = option_env!("ACPILOT_ADVISORY_URL");
    if let Some(url) = advisory_url {
        let sys_loop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;
        let esp_wifi = EspWifi::new(peripherals.modem, sys_loop.clone(), Some(nvs))?;
        let mut wifi = WifiLink::new(StatusLed::new(pins::LED_WIFI_GPIO));
        wifi.attach(BlockingWifi::wrap(esp_wifi, sys_loop)?);
        let ssid = option_env!("ACPILOT_WIFI_SSID").unwrap_or("");
        let pass = option_env!("ACPILOT_WIFI_PASS").unwrap_or("");
        if let Err(e) = wifi.set_credentials(ssid, pass) {
            warn!("Wi-Fi credentials rejected: {}", e);
        }

        let http = EspHttpPost::new(
            url,
            option_env!("ACPILOT_ADVISORY_KEY"),
            Duration::from_millis(u64::from(config.advisory_timeout_ms)),
        );
        let worker = AdvisoryWorker::new(&ADVISORY_LINK, http).with_wifi(wifi);
        thread::Builder::new()
            .name("advisory".into())
            .stack_size(ADVISORY_WORKER_STACK)
            .spawn(move || {
                worker.run();
            })?;
    } else {
        if config.decision_source == DecisionSource::RemoteAdvisory {
            warn!("no advisory endpoint built in, falling back to local rules");
        }
        config.decision_source = DecisionSource::LocalRules;
    }

    // ── 5. Construct adapters ─────────────────────────────────
    // The PinDriver and RMT pins below must match `pins::{PIR,BUTTON,IR_SEND}_GPIO`.
    let mut pir = PinDriver::input(peripherals.pins.gpio27)?;
    pir.set_pull(Pull::Down)?;
    let mut button_pin = PinDriver::input(peripherals.pins.gpio19)?;
    button_pin.set_pull(Pull::Up)?;

    let mut hw = HardwareAdapter::new(
        Dht22::new(pins::DHT_GPIO),
        LightSensor::new(),
        MotionSensor::new(pir),
        DistanceSensor::new(pins::ULTRASONIC_TRIG_GPIO, pins::ULTRASONIC_ECHO_GPIO),
        IrTransmitter::new(peripherals.rmt.channel0, peripherals.pins.gpio5)?,
        IrReceiver::new(),
        ButtonDriver::new(button_pin, u64::from(config.button_cooldown_ms)),
        StatusLed::new(pins::LED_STATUS_GPIO),
    );
    let mut log_sink = LogEventSink::new();

    // ── 6. App service ────────────────────────────────────────
    let tick = Duration::from_millis(u64::from(config.control_loop_interval_ms));
    let mut app = AppService::new(config);
    app.start(clock.uptime_ms(), &mut hw, &mut log_sink);

    let mut uplink = ChannelTransport::new(&ADVISORY_LINK);
    let mut offline = NoAdvisory;

    info!("System ready. Entering control loop.");

    // ── 7. Control loop ───────────────────────────────────────
    loop {
        let now_ms = clock.uptime_ms();
        if advisory_url.is_some() {
            app.tick(now_ms, &mut hw, &mut uplink, &mut log_sink);
        } else {
            app.tick(now_ms, &mut hw, &mut offline, &mut log_sink);
        }
        thread::sleep(tick);
    }
}
