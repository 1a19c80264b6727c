//! Inbound commands to the application service.
//!
//! These represent requests from the outside world (HTTP bridge, voice
//! assistant, serial console) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.
//! Replies are serde-serialisable so adapters can render them as JSON.

use serde::Serialize;

use crate::advisory::RequestId;
use crate::decision::DecisionSource;
use crate::event_log::LogEntry;
use crate::model::{ActionRequest, DeviceState, SensorSnapshot};

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Dispatch an action given in the wire schema.
    SubmitAction(ActionRequest),

    QueryDeviceState,
    QuerySensors,
    QueryLog,

    SetAutomation(bool),
    ToggleAutomation,

    /// Ask the advisory service what to do about a free-form request.
    ConsultAdvisory { query: String },

    /// Choose who proposes automatic actions.
    SetDecisionSource(DecisionSource),
}

/// Reply to an [`AppCommand`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandReply {
    /// Outcome of `SubmitAction`.
    Dispatched { state: DeviceState, transmitted: bool },
    Device { state: DeviceState },
    Sensors { snapshot: SensorSnapshot },
    Log { entries: Vec<LogEntry> },
    Automation { enabled: bool },
    DecisionSource { source: DecisionSource },
    AdvisoryAccepted { request_id: RequestId },
    /// A previous advisory request is still outstanding.
    AdvisoryBusy,
    Failed { error: String },
}

impl CommandReply {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
