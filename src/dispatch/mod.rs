//! Command dispatcher: action → protocol frame → one transmit.
//!
//! ```text
//!  Action ──apply──▶ DeviceState' ──normalize(caps)──▶ encode ──▶ IrTransmitPort
//!                                                        │
//!                                   None (toggle Adjust) └──▶ WARN, logical update only
//! ```
//!
//! Dispatch is all-or-nothing: the new state is only returned after the
//! transmit primitive accepted the whole frame.  `Maintain` short-circuits
//! before anything is computed.

pub mod stateful;
pub mod toggle;

use serde::{Deserialize, Serialize};

use crate::app::ports::IrTransmitPort;
use crate::error::DispatchError;
use crate::event_log::{EventLog, LogLevel};
use crate::model::{Action, Capabilities, DeviceState};
use stateful::StatefulProtocol;
use toggle::ToggleProtocol;

/// One complete IR transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrFrame {
    /// 32-bit NEC code.
    Nec(u32),
    /// Full-state frame, see [`stateful`].
    Stateful([u8; stateful::FRAME_LEN]),
}

/// A concrete AC remote protocol.
pub trait AcProtocol {
    fn name(&self) -> &'static str;

    /// What the protocol can express.  States are normalised against this
    /// before [`encode`](Self::encode) sees them.
    fn capabilities(&self) -> Capabilities;

    /// Frame for `action`, given the normalised resulting state.  `None`
    /// means the protocol cannot carry the change.
    fn encode(&self, action: &Action, next: &DeviceState) -> Option<IrFrame>;
}

/// Protocol selector, as stored in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    #[default]
    Toggle,
    Stateful,
}

/// Static dispatch over the supported protocols.
#[derive(Debug, Clone, Copy)]
pub enum ProtocolDriver {
    Toggle(ToggleProtocol),
    Stateful(StatefulProtocol),
}

impl From<ProtocolKind> for ProtocolDriver {
    fn from(kind: ProtocolKind) -> Self {
        match kind {
            ProtocolKind::Toggle => Self::Toggle(ToggleProtocol),
            ProtocolKind::Stateful => Self::Stateful(StatefulProtocol),
        }
    }
}

impl AcProtocol for ProtocolDriver {
    fn name(&self) -> &'static str {
        match self {
            Self::Toggle(p) => p.name(),
            Self::Stateful(p) => p.name(),
        }
    }

    fn capabilities(&self) -> Capabilities {
        match self {
            Self::Toggle(p) => p.capabilities(),
            Self::Stateful(p) => p.capabilities(),
        }
    }

    fn encode(&self, action: &Action, next: &DeviceState) -> Option<IrFrame> {
        match self {
            Self::Toggle(p) => p.encode(action, next),
            Self::Stateful(p) => p.encode(action, next),
        }
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub state: DeviceState,
    /// False for Maintain and for changes the protocol cannot carry.
    pub transmitted: bool,
}

pub struct CommandDispatcher {
    protocol: ProtocolDriver,
}

impl CommandDispatcher {
    pub fn new(kind: ProtocolKind) -> Self {
        Self {
            protocol: kind.into(),
        }
    }

    pub fn protocol(&self) -> &ProtocolDriver {
        &self.protocol
    }

    pub fn capabilities(&self) -> Capabilities {
        self.protocol.capabilities()
    }

    /// Apply `action` to `current`, transmit if the protocol can carry it,
    /// and return the state the unit is now believed to be in.
    pub fn send(
        &self,
        action: &Action,
        current: &DeviceState,
        tx: &mut impl IrTransmitPort,
        log: &mut EventLog,
        now_ms: u64,
    ) -> Result<DispatchOutcome, DispatchError> {
        if action.is_maintain() {
            return Ok(DispatchOutcome {
                state: *current,
                transmitted: false,
            });
        }

        let next = self.capabilities().normalize(action.apply(current));

        let Some(frame) = self.protocol.encode(action, &next) else {
            log.append_fmt(
                now_ms,
                LogLevel::Warn,
                format_args!(
                    "{} protocol cannot send '{}'; logical state only: {}",
                    self.protocol.name(),
                    action,
                    next
                ),
            );
            return Ok(DispatchOutcome {
                state: next,
                transmitted: false,
            });
        };

        if let Err(e) = tx.transmit(&frame) {
            log.append_fmt(
                now_ms,
                LogLevel::Error,
                format_args!("IR transmit of '{}' failed: {}", action, e),
            );
            return Err(e.into());
        }

        log.append_fmt(
            now_ms,
            LogLevel::Success,
            format_args!("IR {} sent: {}", self.protocol.name(), next),
        );
        Ok(DispatchOutcome {
            state: next,
            transmitted: true,
        })
    }
}
