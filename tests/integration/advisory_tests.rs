//! Advisory channel integration: submit/poll through the AppService, the
//! timeout path and the worker-thread bridge.

use crate::mock_hw::{MockHardware, RecordingSink, ScriptedAdvisory};

use acpilot::adapters::advisory_http::{AdvisoryWorker, HttpPost};
use acpilot::advisory::channels::{AdvisoryLink, ChannelTransport};
use acpilot::app::commands::{AppCommand, CommandReply};
use acpilot::app::events::{ActionOrigin, AppEvent};
use acpilot::app::service::AppService;
use acpilot::config::SystemConfig;
use acpilot::decision::DecisionSource;
use acpilot::dispatch::IrFrame;
use acpilot::dispatch::toggle::POWER_ON_CODE;
use acpilot::error::AdvisoryError;
use acpilot::event_log::LogLevel;
use acpilot::model::{AcMode, DeviceState, FanSpeed};
use futures_lite::future::block_on;

fn advisory_app() -> AppService {
    let config = SystemConfig {
        decision_source: DecisionSource::RemoteAdvisory,
        ..SystemConfig::default()
    };
    AppService::new(config)
}

#[test]
fn timeout_degrades_to_maintain_with_one_error() {
    let mut app = advisory_app();
    let mut hw = MockHardware::occupied_at(29.0);
    let mut adv = ScriptedAdvisory::default();
    let mut sink = RecordingSink::new();

    app.tick(0, &mut hw, &mut adv, &mut sink);
    assert_eq!(adv.started.len(), 1);
    assert!(app.build_telemetry(0).advisory_pending);

    app.tick(14_999, &mut hw, &mut adv, &mut sink);
    assert!(adv.cancelled.is_empty());

    app.tick(15_000, &mut hw, &mut adv, &mut sink);
    assert_eq!(adv.cancelled, vec![1]);
    assert_eq!(app.log().count_level(LogLevel::Error), 1);
    assert!(hw.frames.is_empty(), "Maintain transmits nothing");
    assert_eq!(*app.device(), DeviceState::default());

    // The late answer to #1 is stale and ignored.
    adv.reply(1, r#"{"action":"turn_on"}"#);
    app.tick(16_000, &mut hw, &mut adv, &mut sink);
    assert!(!app.device().power);
    assert_eq!(app.log().count_level(LogLevel::Error), 1);
}

#[test]
fn valid_reply_is_clamped_and_applied() {
    let mut app = advisory_app();
    let mut hw = MockHardware::occupied_at(28.0);
    let mut adv = ScriptedAdvisory::default();
    let mut sink = RecordingSink::new();

    app.tick(0, &mut hw, &mut adv, &mut sink);
    adv.reply(
        1,
        "Sure! ```json\n{\"action\":\"turn_on\",\"temperature\":40,\"fan_speed\":\"high\",\
         \"reason\":\"warm room\"}\n```",
    );
    app.tick(500, &mut hw, &mut adv, &mut sink);

    assert_eq!(
        *app.device(),
        DeviceState {
            power: true,
            setpoint_c: 30,
            mode: AcMode::Cool,
            fan: FanSpeed::High,
        }
    );
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::DeviceChanged {
            origin: ActionOrigin::Advisory,
            ..
        }
    )));
}

#[test]
fn malformed_reply_is_one_error_and_no_change() {
    let mut app = advisory_app();
    let mut hw = MockHardware::occupied_at(28.0);
    let mut adv = ScriptedAdvisory::default();
    let mut sink = RecordingSink::new();

    app.tick(0, &mut hw, &mut adv, &mut sink);
    adv.reply(1, "I would rather not say.");
    app.tick(500, &mut hw, &mut adv, &mut sink);

    assert_eq!(app.log().count_level(LogLevel::Error), 1);
    assert!(hw.frames.is_empty());
}

#[test]
fn second_consult_while_pending_is_busy() {
    let mut app = AppService::new(SystemConfig::default());
    let mut hw = MockHardware::new();
    let mut adv = ScriptedAdvisory::default();
    let mut sink = RecordingSink::new();

    let query = || AppCommand::ConsultAdvisory {
        query: "cool it down a bit".into(),
    };
    let first = app.handle_command(query(), 0, &mut hw, &mut adv, &mut sink);
    let second = app.handle_command(query(), 10, &mut hw, &mut adv, &mut sink);

    assert_eq!(first, CommandReply::AdvisoryAccepted { request_id: 1 });
    assert_eq!(second, CommandReply::AdvisoryBusy);
    assert_eq!(adv.started.len(), 1, "busy must not reach the transport");
    assert!(adv.started[0].body.contains("User request: cool it down a bit"));
}

#[test]
fn refused_request_reports_failure() {
    let mut app = AppService::new(SystemConfig::default());
    let mut hw = MockHardware::new();
    let mut adv = ScriptedAdvisory {
        refuse: true,
        ..ScriptedAdvisory::default()
    };
    let mut sink = RecordingSink::new();

    let reply = app.handle_command(
        AppCommand::ConsultAdvisory { query: "hi".into() },
        0,
        &mut hw,
        &mut adv,
        &mut sink,
    );

    assert_eq!(
        reply,
        CommandReply::Failed {
            error: AdvisoryError::Transport.to_string()
        }
    );
    assert_eq!(app.log().count_level(LogLevel::Error), 1);
}

// ── Worker bridge ─────────────────────────────────────────────

struct CannedHttp(&'static str);

impl HttpPost for CannedHttp {
    fn post_json(&mut self, body: &str) -> Result<String, AdvisoryError> {
        assert!(body.starts_with(r#"{"query":"Room: "#));
        Ok(self.0.to_owned())
    }
}

#[test]
fn worker_round_trip_reaches_the_unit() {
    let link = AdvisoryLink::new();
    let mut transport = ChannelTransport::new(&link);
    let mut worker = AdvisoryWorker::new(
        &link,
        CannedHttp(r#"{"action":"turn_on","temperature":23,"fan_speed":3}"#),
    );

    let mut app = advisory_app();
    let mut hw = MockHardware::occupied_at(27.0);
    let mut sink = RecordingSink::new();

    app.tick(0, &mut hw, &mut transport, &mut sink);
    block_on(worker.serve_one());
    app.tick(200, &mut hw, &mut transport, &mut sink);

    assert_eq!(worker.served(), 1);
    assert_eq!(hw.frames, vec![IrFrame::Nec(POWER_ON_CODE)]);
    assert_eq!(app.device().setpoint_c, 23);
    assert_eq!(app.device().fan, FanSpeed::High);
}
