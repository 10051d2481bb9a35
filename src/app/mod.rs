//! Application core: the inspection loop and its boundary.
//!
//! All interaction with the camera, the PLC transport, the operator
//! screen and the stop input happens through **port traits** defined in
//! [`ports`], keeping this layer testable without real devices.

pub mod events;
pub mod ports;
pub mod service;
