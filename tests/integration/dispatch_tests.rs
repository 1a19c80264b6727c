//! Protocol selection through configuration: the same rule decision goes
//! out as an NEC power code or as a full-state frame.

use crate::mock_hw::{MockHardware, RecordingSink, ScriptedAdvisory};

use acpilot::app::commands::{AppCommand, CommandReply};
use acpilot::app::service::AppService;
use acpilot::config::SystemConfig;
use acpilot::dispatch::stateful::{checksum, encode_state};
use acpilot::dispatch::{IrFrame, ProtocolKind};
use acpilot::event_log::LogLevel;
use acpilot::model::{AcMode, ActionRequest, DeviceState, FanSpeed};

fn stateful_app() -> AppService {
    AppService::new(SystemConfig {
        protocol: ProtocolKind::Stateful,
        ..SystemConfig::default()
    })
}

#[test]
fn stateful_protocol_carries_the_whole_state() {
    let mut app = stateful_app();
    let mut hw = MockHardware::occupied_at(29.0);
    let (mut adv, mut sink) = (ScriptedAdvisory::default(), RecordingSink::new());

    app.tick(0, &mut hw, &mut adv, &mut sink);

    let expected = DeviceState {
        power: true,
        setpoint_c: 22,
        mode: AcMode::Cool,
        fan: FanSpeed::High,
    };
    assert_eq!(hw.frames, vec![IrFrame::Stateful(encode_state(&expected))]);
    let IrFrame::Stateful(bytes) = hw.frames[0] else {
        unreachable!()
    };
    assert_eq!(bytes[5], checksum(&bytes[..5]));
}

#[test]
fn dry_mode_limits_fan_on_full_state_unit() {
    let mut app = stateful_app();
    let mut hw = MockHardware::new();
    let (mut adv, mut sink) = (ScriptedAdvisory::default(), RecordingSink::new());
    let req: ActionRequest =
        serde_json::from_str(r#"{"action":"turn_on","mode":"dry","fan_speed":5}"#).unwrap();

    app.handle_command(AppCommand::SubmitAction(req), 0, &mut hw, &mut adv, &mut sink);

    assert_eq!(app.device().mode, AcMode::Dry);
    assert_eq!(app.device().fan, FanSpeed::Low);
}

#[test]
fn toggle_protocol_records_adjustments_it_cannot_send() {
    let mut app = AppService::new(SystemConfig::default());
    let mut hw = MockHardware::new();
    let (mut adv, mut sink) = (ScriptedAdvisory::default(), RecordingSink::new());
    let req: ActionRequest = serde_json::from_str(r#"{"action":"adjust","temperature":21}"#).unwrap();

    let reply = app.handle_command(AppCommand::SubmitAction(req), 0, &mut hw, &mut adv, &mut sink);

    assert!(matches!(
        reply,
        CommandReply::Dispatched {
            transmitted: false,
            ..
        }
    ));
    assert!(hw.frames.is_empty());
    assert_eq!(app.device().setpoint_c, 21, "logical state still moves");
    assert_eq!(app.log().count_level(LogLevel::Warn), 1);
}

#[test]
fn maintain_is_idempotent_on_every_protocol() {
    for protocol in [ProtocolKind::Toggle, ProtocolKind::Stateful] {
        let mut app = AppService::new(SystemConfig {
            protocol,
            ..SystemConfig::default()
        });
        let mut hw = MockHardware::new();
        let (mut adv, mut sink) = (ScriptedAdvisory::default(), RecordingSink::new());
        let before = *app.device();

        let reply = app.handle_command(
            AppCommand::SubmitAction(ActionRequest::new("maintain")),
            0,
            &mut hw,
            &mut adv,
            &mut sink,
        );

        assert_eq!(
            reply,
            CommandReply::Dispatched {
                state: before,
                transmitted: false
            }
        );
        assert!(hw.frames.is_empty());
        assert_eq!(sink.device_changes(), 0);
    }
}
