//! External advisory channel.
//!
//! A remote inference service may propose an action in the same schema the
//! HTTP surface uses.  The round trip is the only long operation in the
//! system, so it is split into a non-blocking submit / poll pair driven by
//! the control loop:
//!
//! ```text
//!   submit ──▶ transport.start(req #n) ──▶ in_flight = #n, deadline
//!   poll   ──▶ response #n   ─▶ parse ─▶ Resolved(action)
//!          ──▶ response #m≠n ─▶ dropped (stale)
//!          ──▶ now ≥ deadline ─▶ cancel #n, ERROR entry, Resolved(Maintain)
//! ```
//!
//! Single-flight: while a request is outstanding, `submit` answers `Busy`
//! without touching the transport.  Every failure degrades to `Maintain`
//! and leaves exactly one ERROR entry in the event log.

pub mod channels;
pub mod prompt;

use log::{debug, warn};

use crate::app::ports::AdvisoryTransport;
use crate::error::AdvisoryError;
use crate::event_log::{EventLog, LogLevel};
use crate::model::{Action, Capabilities, DeviceState, SensorSnapshot};

pub type RequestId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryRequest {
    pub id: RequestId,
    /// JSON body, see [`prompt::request_body`].
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryResponse {
    pub id: RequestId,
    /// Raw reply text, or why there is none.
    pub result: Result<String, AdvisoryError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(RequestId),
    /// Another request is still outstanding.
    Busy,
    Failed(AdvisoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryPoll {
    /// Nothing outstanding.
    Idle,
    Pending,
    /// The outstanding request finished; failures resolve to `Maintain`.
    Resolved(Action),
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    id: RequestId,
    deadline_ms: u64,
}

pub struct AdvisoryChannel {
    timeout_ms: u64,
    next_id: RequestId,
    in_flight: Option<InFlight>,
}

impl AdvisoryChannel {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            next_id: 1,
            in_flight: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn submit(
        &mut self,
        snapshot: &SensorSnapshot,
        device: &DeviceState,
        user_query: Option<&str>,
        now_ms: u64,
        transport: &mut impl AdvisoryTransport,
        log: &mut EventLog,
    ) -> SubmitOutcome {
        if let Some(f) = self.in_flight {
            debug!("advisory: request #{} still outstanding", f.id);
            return SubmitOutcome::Busy;
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);

        let started = prompt::request_body(snapshot, device, user_query)
            .and_then(|body| transport.start(AdvisoryRequest { id, body }));
        match started {
            Ok(()) => {
                self.in_flight = Some(InFlight {
                    id,
                    deadline_ms: now_ms.saturating_add(self.timeout_ms),
                });
                log.append_fmt(now_ms, LogLevel::Info, format_args!("advisory request #{id} sent"));
                SubmitOutcome::Accepted(id)
            }
            Err(e) => {
                log.append_fmt(now_ms, LogLevel::Error, format_args!("advisory request failed: {e}"));
                SubmitOutcome::Failed(e)
            }
        }
    }

    /// Collect the outstanding result, if any.  Must be called every loop
    /// iteration so timeouts are enforced.
    pub fn poll(
        &mut self,
        now_ms: u64,
        transport: &mut impl AdvisoryTransport,
        current: &DeviceState,
        caps: &Capabilities,
        log: &mut EventLog,
    ) -> AdvisoryPoll {
        while let Some(resp) = transport.poll_response() {
            match self.in_flight {
                Some(f) if f.id == resp.id => {
                    self.in_flight = None;
                    return AdvisoryPoll::Resolved(Self::resolve(resp, now_ms, current, caps, log));
                }
                _ => warn!("advisory: dropping stale response #{}", resp.id),
            }
        }

        let Some(f) = self.in_flight else {
            return AdvisoryPoll::Idle;
        };
        if now_ms < f.deadline_ms {
            return AdvisoryPoll::Pending;
        }

        transport.cancel(f.id);
        self.in_flight = None;
        log.append_fmt(
            now_ms,
            LogLevel::Error,
            format_args!("advisory #{}: {} after {} ms", f.id, AdvisoryError::Timeout, self.timeout_ms),
        );
        AdvisoryPoll::Resolved(Action::Maintain)
    }

    fn resolve(
        resp: AdvisoryResponse,
        now_ms: u64,
        current: &DeviceState,
        caps: &Capabilities,
        log: &mut EventLog,
    ) -> Action {
        match resp.result.and_then(|text| prompt::parse_response(&text)) {
            Ok(req) => {
                let action = req.resolve(current, caps);
                log.append_fmt(
                    now_ms,
                    LogLevel::Info,
                    format_args!(
                        "advisory #{} proposes {} ({})",
                        resp.id,
                        action,
                        req.reason.as_deref().unwrap_or("no reason")
                    ),
                );
                action
            }
            Err(e) => {
                log.append_fmt(now_ms, LogLevel::Error, format_args!("advisory #{}: {}", resp.id, e));
                Action::Maintain
            }
        }
    }
}
