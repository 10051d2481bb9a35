//! Surfscan: camera surface inspection with verdicts reported to an S7 PLC.
//!
//! Each frame is scored, decided OK or DEFECT, encoded into a small
//! data-block payload and written to the PLC.  When no PLC answers the
//! loop keeps running in simulation mode.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod codec;
pub mod config;
pub mod error;
pub mod fieldbus;
pub mod verdict;
pub mod vision;
