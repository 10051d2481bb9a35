//! Inspection configuration.
//!
//! All tunable parameters of the controller.  Built once in `main` from
//! defaults, an optional TOML file and `SURFSCAN_*` environment overrides
//! (see [`crate::adapters::config_file`]), validated, then passed down by
//! reference.  Nothing mutates it after startup.

use serde::{Deserialize, Serialize};

use crate::codec::VerdictEncoder;
use crate::error::{ConfigError, LayoutError};

/// Byte order of the 16-bit integers in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Little,
    /// S7 `INT` storage order.
    Big,
}

/// Core inspection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionConfig {
    // --- PLC endpoint ---
    /// PLC IP address or host name.
    pub plc_address: String,
    /// ISO-on-TCP port.
    pub plc_port: u16,
    pub rack: u16,
    /// CPU slot (1 for S7-1200/1500, 2 for S7-300).
    pub slot: u16,

    // --- Data block channel ---
    /// Data block number holding the inspection interface.
    pub db_number: u16,
    /// Byte offset of the result INT (1 = OK, 2 = DEFECT).
    pub offset_result: u16,
    /// Byte offset of the defect-kind INT (0 = none).
    pub offset_defect: u16,
    pub byte_order: ByteOrder,

    // --- Transport ---
    /// Deadline for one fieldbus operation, reconnect included (milliseconds).
    pub io_timeout_ms: u32,

    // --- Detection ---
    /// Defect score above which a frame is rejected.
    pub score_threshold: u32,

    // --- Camera ---
    /// Capture device index for live cameras.
    pub camera_index: i32,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            // PLC endpoint
            plc_address: "192.168.10.200".to_owned(),
            plc_port: 102,
            rack: 0,
            slot: 1,

            // DB_AI_Communication: Result INT at byte 0, Defect INT at byte 2
            db_number: 1,
            offset_result: 0,
            offset_defect: 2,
            byte_order: ByteOrder::Little,

            // Transport
            io_timeout_ms: 2000,

            // Detection
            score_threshold: 500,

            // Camera
            camera_index: 0,
        }
    }
}

impl InspectionConfig {
    /// `address:port` of the PLC, for logs and socket resolution.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.plc_address, self.plc_port)
    }

    /// Payload encoder described by the offsets and byte order.
    pub fn encoder(&self) -> Result<VerdictEncoder, LayoutError> {
        VerdictEncoder::new(self.offset_result, self.offset_defect, self.byte_order)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plc_address.trim().is_empty() {
            return Err(ConfigError::Validation("plc_address must not be empty"));
        }
        if self.plc_port == 0 {
            return Err(ConfigError::Validation("plc_port must be non-zero"));
        }
        if self.rack > 7 {
            return Err(ConfigError::Validation("rack must be 0–7"));
        }
        if self.slot > 31 {
            return Err(ConfigError::Validation("slot must be 0–31"));
        }
        if self.db_number == 0 {
            return Err(ConfigError::Validation("db_number must be ≥ 1"));
        }
        self.encoder()?;
        if !(100..=60_000).contains(&self.io_timeout_ms) {
            return Err(ConfigError::Validation("io_timeout_ms must be 100–60000"));
        }
        if self.camera_index < 0 {
            return Err(ConfigError::Validation("camera_index must be ≥ 0"));
        }
        Ok(())
    }
}
