//! Domain data model: sensor snapshot, device state, and the action
//! vocabulary that every decision source speaks.

pub mod action;
pub mod device;
pub mod snapshot;

pub use action::{Action, ActionRequest, Adjustment, FanField};
pub use device::{AcMode, Capabilities, DeviceState, FanSpeed};
pub use snapshot::SensorSnapshot;
