//! Error types for the ACPilot firmware.
//!
//! Every variant is `Copy` so errors can be logged, stored in the event log
//! and returned through the control loop without allocation.  Nothing in this
//! taxonomy is fatal: each failure path logs and returns to the next loop
//! iteration.

use core::fmt;

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// A physical reading could not be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The temperature/humidity pair was not-a-number, timed out or failed
    /// its checksum.  The previous environmental reading is retained.
    ReadFailure,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailure => write!(f, "sensor read failure"),
        }
    }
}

// ---------------------------------------------------------------------------
// IR transmit / dispatch errors
// ---------------------------------------------------------------------------

/// Failure reported by the IR transmit primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitError {
    /// The RMT peripheral rejected the pulse train (ESP-IDF error code).
    Peripheral(i32),
    /// The encoded frame does not fit the transmit buffer.
    FrameTooLong,
}

impl fmt::Display for TransmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peripheral(rc) => write!(f, "RMT transmit failed (rc={rc})"),
            Self::FrameTooLong => write!(f, "IR frame exceeds transmit buffer"),
        }
    }
}

/// Errors surfaced by the command dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The transmit primitive failed; the device state was not updated.
    TransmitFailure(TransmitError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransmitFailure(e) => write!(f, "transmit failure: {e}"),
        }
    }
}

impl From<TransmitError> for DispatchError {
    fn from(e: TransmitError) -> Self {
        Self::TransmitFailure(e)
    }
}

// ---------------------------------------------------------------------------
// Advisory errors
// ---------------------------------------------------------------------------

/// Failures of the remote advisory call.  Always recovered locally: the
/// channel degrades to `Maintain` and appends one ERROR log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryError {
    /// No response arrived within the configured bound.
    Timeout,
    /// The request could not be delivered or the service returned an error.
    Transport,
    /// The response did not contain a usable action object.
    Malformed,
}

impl fmt::Display for AdvisoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "advisory timeout"),
            Self::Transport => write!(f, "advisory transport error"),
            Self::Malformed => write!(f, "malformed advisory payload"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from loading or validating [`SystemConfig`](crate::config::SystemConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The document is not valid JSON for the config schema.
    Parse,
    /// A field failed range or consistency validation.
    /// The `&'static str` names the field and the violated constraint.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "config parse error"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
