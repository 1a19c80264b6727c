//! Advisory worker channels.
//!
//! The HTTP round trip blocks for seconds, so on the device it runs on its
//! own thread.  `embassy-sync` bounded channels bridge that worker with the
//! synchronous control loop without heap-allocated queues.
//!
//! ```text
//! ┌──────────────┐ AdvisoryRequest  ┌──────────────┐
//! │ Control Loop │─────────────────▶│    Worker    │
//! │  (sync)      │◀─────────────────│  (blocking)  │
//! └──────────────┘ AdvisoryResponse └──────────────┘
//! ```
//!
//! Cancellation is advisory only: the worker cannot abort an HTTP request
//! in flight, but a response for a cancelled id is dropped before it
//! reaches the loop.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, warn};

use super::{AdvisoryRequest, AdvisoryResponse, RequestId};
use crate::app::ports::AdvisoryTransport;
use crate::error::AdvisoryError;

/// Only one request is ever outstanding.
const REQ_DEPTH: usize = 1;
/// Room for a late reply plus the current one.
const RESP_DEPTH: usize = 2;

/// Request/response pair shared by the loop and the worker.
pub struct AdvisoryLink {
    pub requests: Channel<CriticalSectionRawMutex, AdvisoryRequest, REQ_DEPTH>,
    pub responses: Channel<CriticalSectionRawMutex, AdvisoryResponse, RESP_DEPTH>,
    /// Most recently cancelled request id (0 = none).
    cancelled: AtomicU32,
}

impl AdvisoryLink {
    pub const fn new() -> Self {
        Self {
            requests: Channel::new(),
            responses: Channel::new(),
            cancelled: AtomicU32::new(0),
        }
    }

    pub fn cancel(&self, id: RequestId) {
        self.cancelled.store(id, Ordering::Release);
    }

    pub fn is_cancelled(&self, id: RequestId) -> bool {
        self.cancelled.load(Ordering::Acquire) == id
    }

    /// Worker side: wait for the next request.
    pub async fn next_request(&self) -> AdvisoryRequest {
        self.requests.receive().await
    }

    /// Worker side: hand a finished round trip back to the loop.
    pub fn complete(&self, response: AdvisoryResponse) {
        if self.is_cancelled(response.id) {
            debug!("advisory #{} finished after cancel, dropped", response.id);
            return;
        }
        if self.responses.try_send(response).is_err() {
            warn!("advisory: response queue full, reply dropped");
        }
    }
}

impl Default for AdvisoryLink {
    fn default() -> Self {
        Self::new()
    }
}

/// The link shared by `main` and the worker thread.
pub static ADVISORY_LINK: AdvisoryLink = AdvisoryLink::new();

/// Loop-side [`AdvisoryTransport`] over an [`AdvisoryLink`].
pub struct ChannelTransport<'a> {
    link: &'a AdvisoryLink,
}

impl<'a> ChannelTransport<'a> {
    pub fn new(link: &'a AdvisoryLink) -> Self {
        Self { link }
    }
}

impl AdvisoryTransport for ChannelTransport<'_> {
    fn start(&mut self, request: AdvisoryRequest) -> Result<(), AdvisoryError> {
        self.link
            .requests
            .try_send(request)
            .map_err(|_| AdvisoryError::Transport)
    }

    fn poll_response(&mut self) -> Option<AdvisoryResponse> {
        self.link.responses.try_receive().ok()
    }

    fn cancel(&mut self, id: RequestId) {
        self.link.cancel(id);
    }
}
