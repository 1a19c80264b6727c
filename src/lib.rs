//! ACPilot firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod advisory;
pub mod app;
pub mod config;
pub mod decision;
pub mod dispatch;
pub mod error;
pub mod event_log;
pub mod inbound;
pub mod model;
pub mod pins;

// Hardware-facing modules; simulation backends stand in on the host.
pub mod adapters;
pub mod drivers;
pub mod sensors;
