//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the control context (snapshot, device state, event
//! log, runtime flags) and every domain component.  It exposes a clean,
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!   SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!    InputPort ──▶ │          AppService          │
//!                  │ Aggregator · Rules · Gate    │ ──▶ IrTransmitPort
//! AdvisoryPort ◀─▶ │ Advisory · Dispatcher · Log  │ ──▶ StatusPort
//!                  └──────────────────────────────┘
//! ```
//!
//! Every action, whatever its origin, goes through [`AppService::submit_action`]
//! so device state only ever changes after a successful dispatch.

use log::{debug, info, warn};

use crate::advisory::{AdvisoryChannel, AdvisoryPoll, SubmitOutcome};
use crate::config::SystemConfig;
use crate::decision::rules::RuleId;
use crate::decision::{DecisionEngine, DecisionSource, EvaluationGate};
use crate::dispatch::{AcProtocol, CommandDispatcher, DispatchOutcome};
use crate::error::DispatchError;
use crate::event_log::{EventLog, LogLevel};
use crate::inbound::{Keymap, NEC_REPEAT};
use crate::model::{Action, Capabilities, DeviceState, SensorSnapshot};
use crate::sensors::SensorAggregator;

use super::commands::{AppCommand, CommandReply};
use super::events::{ActionOrigin, AppEvent, TelemetryData};
use super::ports::{AdvisoryTransport, EventSink, InputPort, IrTransmitPort, SensorPort, StatusPort};

// ───────────────────────────────────────────────────────────────
// Control context
// ───────────────────────────────────────────────────────────────

/// Mutable state shared by every stage of the loop.  Owned by the
/// service; nothing here is global.
pub struct ControlContext {
    pub snapshot: SensorSnapshot,
    pub device: DeviceState,
    pub log: EventLog,
    pub automation_enabled: bool,
    pub decision_source: DecisionSource,
    /// Successful device changes since boot.
    pub change_count: u32,
    pub last_change_ms: Option<u64>,
}

impl ControlContext {
    fn new(config: &SystemConfig) -> Self {
        Self {
            snapshot: SensorSnapshot::default(),
            device: DeviceState::default(),
            log: EventLog::new(),
            automation_enabled: config.automation_enabled,
            decision_source: config.decision_source,
            change_count: 0,
            last_change_ms: None,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    ctx: ControlContext,
    sensors: SensorAggregator,
    engine: DecisionEngine,
    gate: EvaluationGate,
    dispatcher: CommandDispatcher,
    advisory: AdvisoryChannel,
    keymap: Keymap,
    telemetry_interval_ms: u64,
    last_telemetry_ms: Option<u64>,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** announce itself; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let dispatcher = CommandDispatcher::new(config.protocol);
        let engine = DecisionEngine::new(config.rules.clone(), dispatcher.capabilities());

        Self {
            ctx: ControlContext::new(&config),
            sensors: SensorAggregator::new(&config),
            engine,
            gate: EvaluationGate::new(u64::from(config.evaluation_interval_ms)),
            dispatcher,
            advisory: AdvisoryChannel::new(u64::from(config.advisory_timeout_ms)),
            keymap: config.keymap,
            telemetry_interval_ms: u64::from(config.telemetry_interval_secs) * 1000,
            last_telemetry_ms: None,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, now_ms: u64, hw: &mut impl StatusPort, sink: &mut impl EventSink) {
        hw.set_status_led(self.ctx.device.power);
        self.ctx.log.append_fmt(
            now_ms,
            LogLevel::Info,
            format_args!(
                "controller started: {} protocol, {} decisions, automation {}",
                self.dispatcher.protocol().name(),
                self.ctx.decision_source,
                if self.ctx.automation_enabled { "on" } else { "off" }
            ),
        );
        sink.emit(&AppEvent::Started(self.ctx.device));
        info!("AppService started, device {}", self.ctx.device);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop iteration: sensors → button → IR → advisory poll →
    /// gated evaluation → telemetry.
    ///
    /// The `hw` parameter satisfies every hardware port at once; this avoids
    /// a double mutable borrow while keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + IrTransmitPort + InputPort + StatusPort),
        advisory: &mut impl AdvisoryTransport,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1. Sensors
        self.refresh_sensors(now_ms, hw, sink);

        // 2. Manual button: power toggle
        if hw.poll_button(now_ms) {
            let action = self.toggle_action();
            self.ctx.log.append_fmt(
                now_ms,
                LogLevel::Info,
                format_args!("button pressed: {}", action),
            );
            self.run_manual(action, ActionOrigin::Button, now_ms, hw, sink);
        }

        // 3. Vendor remote
        if let Some(code) = hw.take_ir_code() {
            let caps = self.capabilities();
            if let Some(action) = self.keymap.interpret(code, &self.ctx.device, &caps) {
                self.ctx.log.append_fmt(
                    now_ms,
                    LogLevel::Info,
                    format_args!("remote code 0x{:08X}: {}", code, action),
                );
                self.run_manual(action, ActionOrigin::Remote, now_ms, hw, sink);
            } else if code != NEC_REPEAT {
                self.ctx.log.append_fmt(
                    now_ms,
                    LogLevel::Warn,
                    format_args!("unknown remote code 0x{:08X}", code),
                );
            }
        }

        // 4. Advisory result, if one is due
        self.poll_advisory(now_ms, hw, advisory, sink);

        // 5. Automatic evaluation
        if self.ctx.automation_enabled && self.gate.try_pass(now_ms) {
            self.evaluate(now_ms, hw, advisory, sink);
        }

        // 6. Telemetry
        let due = self
            .last_telemetry_ms
            .is_none_or(|t| now_ms.saturating_sub(t) >= self.telemetry_interval_ms);
        if due {
            self.last_telemetry_ms = Some(now_ms);
            sink.emit(&AppEvent::Telemetry(self.build_telemetry(now_ms)));
        }
    }

    fn refresh_sensors(&mut self, now_ms: u64, hw: &mut impl SensorPort, sink: &mut impl EventSink) {
        let was_occupied = self.ctx.snapshot.occupied;
        if let Err(e) = self.sensors.refresh(hw, now_ms) {
            self.ctx.log.append_fmt(
                now_ms,
                LogLevel::Warn,
                format_args!("{}; keeping last climate reading", e),
            );
            sink.emit(&AppEvent::SensorFault);
        }
        self.ctx.snapshot = *self.sensors.snapshot();

        let occupied = self.ctx.snapshot.occupied;
        if occupied != was_occupied {
            self.ctx.log.append(
                now_ms,
                LogLevel::Info,
                if occupied { "room occupied" } else { "room empty" },
            );
            sink.emit(&AppEvent::OccupancyChanged(occupied));
        }
    }

    fn poll_advisory(
        &mut self,
        now_ms: u64,
        hw: &mut (impl IrTransmitPort + StatusPort),
        advisory: &mut impl AdvisoryTransport,
        sink: &mut impl EventSink,
    ) {
        let caps = self.capabilities();
        let polled = self
            .advisory
            .poll(now_ms, advisory, &self.ctx.device, &caps, &mut self.ctx.log);
        if let AdvisoryPoll::Resolved(action) = polled {
            if let Err(e) = self.submit_action(action, ActionOrigin::Advisory, now_ms, hw, sink) {
                warn!("advisory action not applied: {}", e);
            }
        }
    }

    fn evaluate(
        &mut self,
        now_ms: u64,
        hw: &mut (impl IrTransmitPort + StatusPort),
        advisory: &mut impl AdvisoryTransport,
        sink: &mut impl EventSink,
    ) {
        match self.ctx.decision_source {
            DecisionSource::LocalRules => {
                let decision = self.engine.decide(&self.ctx.snapshot, &self.ctx.device, now_ms);
                if decision.rule == RuleId::Fallback {
                    debug!("no rule fired");
                    return;
                }
                self.ctx
                    .log
                    .append_fmt(now_ms, LogLevel::Info, format_args!("{}", decision));
                if let Err(e) = self.submit_action(decision.action, ActionOrigin::Rules, now_ms, hw, sink) {
                    warn!("rule {} not applied: {}", decision.rule, e);
                }
            }
            DecisionSource::RemoteAdvisory => {
                let outcome = self.advisory.submit(
                    &self.ctx.snapshot,
                    &self.ctx.device,
                    None,
                    now_ms,
                    advisory,
                    &mut self.ctx.log,
                );
                if outcome == SubmitOutcome::Busy {
                    debug!("advisory busy, evaluation skipped");
                }
            }
        }
    }

    fn toggle_action(&self) -> Action {
        let d = &self.ctx.device;
        if d.power {
            Action::TurnOff
        } else {
            Action::TurnOn {
                setpoint_c: d.setpoint_c,
                fan: d.fan,
                mode: d.mode,
            }
        }
    }

    /// Manual, remote and external actions hold off automation for one
    /// full evaluation interval.
    fn run_manual(
        &mut self,
        action: Action,
        origin: ActionOrigin,
        now_ms: u64,
        hw: &mut (impl IrTransmitPort + StatusPort),
        sink: &mut impl EventSink,
    ) {
        self.gate.restart(now_ms);
        if let Err(e) = self.submit_action(action, origin, now_ms, hw, sink) {
            warn!("{:?} action not applied: {}", origin, e);
        }
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Dispatch `action` and commit the resulting state.  On failure the
    /// device state is left untouched.
    pub fn submit_action(
        &mut self,
        action: Action,
        origin: ActionOrigin,
        now_ms: u64,
        hw: &mut (impl IrTransmitPort + StatusPort),
        sink: &mut impl EventSink,
    ) -> Result<DispatchOutcome, DispatchError> {
        let from = self.ctx.device;
        let outcome = self
            .dispatcher
            .send(&action, &from, hw, &mut self.ctx.log, now_ms)?;

        if outcome.state != from {
            self.ctx.device = outcome.state;
            self.ctx.change_count = self.ctx.change_count.wrapping_add(1);
            self.ctx.last_change_ms = Some(now_ms);
            hw.set_status_led(outcome.state.power);
            sink.emit(&AppEvent::DeviceChanged {
                from,
                to: outcome.state,
                origin,
            });
        }
        Ok(outcome)
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (HTTP bridge, voice, console).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        hw: &mut (impl IrTransmitPort + StatusPort),
        advisory: &mut impl AdvisoryTransport,
        sink: &mut impl EventSink,
    ) -> CommandReply {
        match cmd {
            AppCommand::SubmitAction(req) => {
                let action = req.resolve(&self.ctx.device, &self.capabilities());
                if let Some(reason) = req.reason.as_deref() {
                    debug!("external action '{}' ({})", action, reason);
                }
                if !action.is_maintain() {
                    self.gate.restart(now_ms);
                }
                match self.submit_action(action, ActionOrigin::External, now_ms, hw, sink) {
                    Ok(o) => CommandReply::Dispatched {
                        state: o.state,
                        transmitted: o.transmitted,
                    },
                    Err(e) => CommandReply::Failed {
                        error: e.to_string(),
                    },
                }
            }
            AppCommand::QueryDeviceState => CommandReply::Device {
                state: self.ctx.device,
            },
            AppCommand::QuerySensors => CommandReply::Sensors {
                snapshot: self.ctx.snapshot,
            },
            AppCommand::QueryLog => CommandReply::Log {
                entries: self.ctx.log.snapshot(),
            },
            AppCommand::SetAutomation(enabled) => {
                self.set_automation(enabled, now_ms);
                CommandReply::Automation { enabled }
            }
            AppCommand::ToggleAutomation => {
                let enabled = !self.ctx.automation_enabled;
                self.set_automation(enabled, now_ms);
                CommandReply::Automation { enabled }
            }
            AppCommand::ConsultAdvisory { query } => {
                match self.advisory.submit(
                    &self.ctx.snapshot,
                    &self.ctx.device,
                    Some(&query),
                    now_ms,
                    advisory,
                    &mut self.ctx.log,
                ) {
                    SubmitOutcome::Accepted(request_id) => CommandReply::AdvisoryAccepted { request_id },
                    SubmitOutcome::Busy => CommandReply::AdvisoryBusy,
                    SubmitOutcome::Failed(e) => CommandReply::Failed {
                        error: e.to_string(),
                    },
                }
            }
            AppCommand::SetDecisionSource(source) => {
                if source != self.ctx.decision_source {
                    self.ctx.decision_source = source;
                    self.ctx.log.append_fmt(
                        now_ms,
                        LogLevel::Info,
                        format_args!("decision source: {}", source),
                    );
                }
                CommandReply::DecisionSource { source }
            }
        }
    }

    fn set_automation(&mut self, enabled: bool, now_ms: u64) {
        if enabled == self.ctx.automation_enabled {
            return;
        }
        self.ctx.automation_enabled = enabled;
        self.ctx.log.append(
            now_ms,
            LogLevel::Info,
            if enabled { "automation enabled" } else { "automation disabled" },
        );
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self, now_ms: u64) -> TelemetryData {
        let s = &self.ctx.snapshot;
        TelemetryData {
            uptime_ms: now_ms,
            temperature_c: s.temperature_c,
            humidity_pct: s.humidity_pct,
            light_level: s.light_level,
            occupied: s.occupied,
            device: self.ctx.device,
            automation_enabled: self.ctx.automation_enabled,
            advisory_pending: self.advisory.is_busy(),
            change_count: self.ctx.change_count,
        }
    }

    pub fn device(&self) -> &DeviceState {
        &self.ctx.device
    }

    pub fn snapshot(&self) -> &SensorSnapshot {
        &self.ctx.snapshot
    }

    pub fn log(&self) -> &EventLog {
        &self.ctx.log
    }

    pub fn context(&self) -> &ControlContext {
        &self.ctx
    }

    pub fn automation_enabled(&self) -> bool {
        self.ctx.automation_enabled
    }

    pub fn decision_source(&self) -> DecisionSource {
        self.ctx.decision_source
    }

    pub fn capabilities(&self) -> Capabilities {
        self.dispatcher.capabilities()
    }

    /// Total loop iterations since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
