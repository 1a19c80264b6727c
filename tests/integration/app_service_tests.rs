//! Integration tests for the AppService → rules → dispatcher pipeline.
//!
//! These run on the host (x86_64) and drive the control loop tick by tick
//! against mock adapters, checking what reaches the IR transmitter, the
//! event log and the event sink.

use crate::mock_hw::{MockHardware, RecordingSink, ScriptedAdvisory};

use acpilot::app::commands::{AppCommand, CommandReply};
use acpilot::app::events::{ActionOrigin, AppEvent};
use acpilot::app::service::AppService;
use acpilot::config::SystemConfig;
use acpilot::dispatch::IrFrame;
use acpilot::dispatch::toggle::{POWER_OFF_CODE, POWER_ON_CODE};
use acpilot::event_log::LogLevel;
use acpilot::model::{AcMode, ActionRequest, DeviceState, FanSpeed};

fn make_app() -> (AppService, ScriptedAdvisory, RecordingSink) {
    let mut app = AppService::new(SystemConfig::default());
    let mut sink = RecordingSink::new();
    app.start(0, &mut MockHardware::new(), &mut sink);
    (app, ScriptedAdvisory::default(), sink)
}

fn turn_on() -> AppCommand {
    AppCommand::SubmitAction(ActionRequest::new("turn_on"))
}

// ── Rule scenarios ────────────────────────────────────────────

#[test]
fn hot_occupied_room_turns_unit_on_aggressively() {
    let (mut app, mut adv, mut sink) = make_app();
    let mut hw = MockHardware::occupied_at(29.0);

    app.tick(0, &mut hw, &mut adv, &mut sink);

    assert_eq!(hw.frames, vec![IrFrame::Nec(POWER_ON_CODE)]);
    assert_eq!(
        *app.device(),
        DeviceState {
            power: true,
            setpoint_c: 22,
            mode: AcMode::Cool,
            fan: FanSpeed::High,
        }
    );
    assert!(hw.led, "status LED follows power");
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::DeviceChanged {
            origin: ActionOrigin::Rules,
            ..
        }
    )));
}

#[test]
fn empty_room_shuts_unit_off_after_ten_minutes() {
    let (mut app, mut adv, mut sink) = make_app();
    let mut hw = MockHardware::occupied_at(24.0);

    app.tick(0, &mut hw, &mut adv, &mut sink);
    assert!(hw.frames.is_empty(), "24 °C is comfortable");

    app.handle_command(turn_on(), 1_000, &mut hw, &mut adv, &mut sink);
    assert!(app.device().power);

    hw.motion = false;
    app.tick(601_000, &mut hw, &mut adv, &mut sink);

    assert!(!app.device().power);
    assert_eq!(
        hw.frames,
        vec![IrFrame::Nec(POWER_ON_CODE), IrFrame::Nec(POWER_OFF_CODE)]
    );
    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::OccupancyChanged(false))));
}

#[test]
fn disabled_automation_never_dispatches() {
    let (mut app, mut adv, mut sink) = make_app();
    let mut hw = MockHardware::occupied_at(29.0);

    let reply = app.handle_command(AppCommand::SetAutomation(false), 0, &mut hw, &mut adv, &mut sink);
    assert_eq!(reply, CommandReply::Automation { enabled: false });
    app.tick(0, &mut hw, &mut adv, &mut sink);
    assert!(hw.frames.is_empty());

    app.handle_command(AppCommand::ToggleAutomation, 500, &mut hw, &mut adv, &mut sink);
    app.tick(1_000, &mut hw, &mut adv, &mut sink);
    assert_eq!(hw.frames, vec![IrFrame::Nec(POWER_ON_CODE)]);
}

// ── Manual inputs ─────────────────────────────────────────────

#[test]
fn remote_toggle_key_powers_unit_on() {
    let (mut app, mut adv, mut sink) = make_app();
    let mut hw = MockHardware::new();
    hw.ir_codes.push_back(0x20DF_10EF);

    app.tick(0, &mut hw, &mut adv, &mut sink);

    assert!(app.device().power);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::DeviceChanged {
            origin: ActionOrigin::Remote,
            ..
        }
    )));
}

#[test]
fn unknown_remote_code_is_logged_once_and_repeats_are_silent() {
    let (mut app, mut adv, mut sink) = make_app();
    let mut hw = MockHardware::new();
    let warns_before = app.log().count_level(LogLevel::Warn);

    hw.ir_codes.push_back(0x1234_5678);
    app.tick(0, &mut hw, &mut adv, &mut sink);
    hw.ir_codes.push_back(0xFFFF_FFFF);
    app.tick(100, &mut hw, &mut adv, &mut sink);

    let unknown: Vec<_> = app
        .log()
        .snapshot()
        .into_iter()
        .filter(|e| e.message.contains("unknown remote code"))
        .collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].level, LogLevel::Warn);
    assert!(unknown[0].message.contains("0x12345678"));
    assert_eq!(app.log().count_level(LogLevel::Warn), warns_before + 1);
    assert!(!app.device().power);
}

#[test]
fn button_press_toggles_power_both_ways() {
    let (mut app, mut adv, mut sink) = make_app();
    let mut hw = MockHardware::new();

    hw.press_button();
    app.tick(0, &mut hw, &mut adv, &mut sink);
    assert!(app.device().power);

    hw.press_button();
    app.tick(1_000, &mut hw, &mut adv, &mut sink);
    assert!(!app.device().power);
    assert_eq!(sink.device_changes(), 2);
}

// ── External commands ─────────────────────────────────────────

#[test]
fn turn_on_twice_transmits_power_code_twice() {
    let (mut app, mut adv, mut sink) = make_app();
    let mut hw = MockHardware::new();

    for t in [0, 100] {
        let reply = app.handle_command(turn_on(), t, &mut hw, &mut adv, &mut sink);
        assert!(matches!(
            reply,
            CommandReply::Dispatched {
                transmitted: true,
                ..
            }
        ));
    }

    assert_eq!(
        hw.frames,
        vec![IrFrame::Nec(POWER_ON_CODE), IrFrame::Nec(POWER_ON_CODE)]
    );
    assert_eq!(sink.device_changes(), 1, "second ON is not a state change");
}

#[test]
fn transmit_failure_leaves_state_untouched() {
    let (mut app, mut adv, mut sink) = make_app();
    let mut hw = MockHardware::new();
    hw.tx_fault = true;

    let reply = app.handle_command(turn_on(), 0, &mut hw, &mut adv, &mut sink);

    let CommandReply::Failed { error } = reply else {
        panic!("expected failure, got {reply:?}");
    };
    assert!(error.contains("transmit failure"));
    assert_eq!(*app.device(), DeviceState::default());
    assert_eq!(app.log().count_level(LogLevel::Error), 1);
    assert_eq!(sink.device_changes(), 0);
}

#[test]
fn adjust_temperature_99_is_clamped_to_30() {
    let (mut app, mut adv, mut sink) = make_app();
    let mut hw = MockHardware::new();
    let req: ActionRequest = serde_json::from_str(r#"{"action":"adjust","temperature":99}"#).unwrap();

    app.handle_command(AppCommand::SubmitAction(req), 0, &mut hw, &mut adv, &mut sink);

    assert_eq!(app.device().setpoint_c, 30);
}

#[test]
fn queries_render_as_json() {
    let (mut app, mut adv, mut sink) = make_app();
    let mut hw = MockHardware::occupied_at(27.5);
    app.tick(0, &mut hw, &mut adv, &mut sink);

    let sensors = app.handle_command(AppCommand::QuerySensors, 10, &mut hw, &mut adv, &mut sink);
    let json = sensors.to_json().unwrap();
    assert!(json.starts_with(r#"{"type":"sensors""#));
    assert!(json.contains(r#""occupied":true"#));

    let CommandReply::Log { entries } =
        app.handle_command(AppCommand::QueryLog, 10, &mut hw, &mut adv, &mut sink)
    else {
        panic!("expected log reply");
    };
    assert!(entries[0].message.starts_with("controller started"));
}

// ── Sensors and telemetry ─────────────────────────────────────

#[test]
fn climate_fault_keeps_last_good_reading() {
    let (mut app, mut adv, mut sink) = make_app();
    let mut hw = MockHardware::occupied_at(24.0);
    app.tick(0, &mut hw, &mut adv, &mut sink);

    hw.climate_fault = true;
    hw.temperature_c = 40.0;
    app.tick(2_000, &mut hw, &mut adv, &mut sink);

    assert_eq!(app.snapshot().temperature_c, 24.0);
    assert!(app.snapshot().climate_valid);
    assert_eq!(app.log().count_level(LogLevel::Warn), 1);
    assert!(sink.events.iter().any(|e| matches!(e, AppEvent::SensorFault)));
}

#[test]
fn telemetry_follows_configured_interval() {
    let (mut app, mut adv, mut sink) = make_app();
    let mut hw = MockHardware::new();

    for t in [0, 1_000, 4_999, 5_000, 9_000] {
        app.tick(t, &mut hw, &mut adv, &mut sink);
    }

    let telemetry = sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::Telemetry(_)))
        .count();
    assert_eq!(telemetry, 2);
    assert_eq!(app.tick_count(), 5);
}
