//! File + environment configuration adapter.
//!
//! Implements [`ConfigPort`].  Resolution order, later wins:
//!
//! 1. [`InspectionConfig::default`]
//! 2. the TOML file, when one is given and exists
//! 3. `SURFSCAN_*` environment variables
//!
//! The merged result is validated before it is returned.

use std::path::PathBuf;
use std::str::FromStr;
use std::{fs, io};

use log::{info, warn};

use crate::app::ports::ConfigPort;
use crate::config::{ByteOrder, InspectionConfig};
use crate::error::ConfigError;

type EnvLookup = Box<dyn Fn(&str) -> Option<String>>;

pub struct FileConfig {
    path: Option<PathBuf>,
    env: EnvLookup,
}

impl FileConfig {
    /// Read `path` (if any) and the process environment.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self::with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as [`new`](Self::new) with an explicit variable lookup.
    pub fn with_env(path: Option<PathBuf>, env: impl Fn(&str) -> Option<String> + 'static) -> Self {
        Self {
            path,
            env: Box::new(env),
        }
    }

    fn read_file(&self) -> Result<InspectionConfig, ConfigError> {
        let Some(path) = &self.path else {
            info!("FileConfig: no config file given, using defaults");
            return Ok(InspectionConfig::default());
        };
        match fs::read_to_string(path) {
            Ok(text) => {
                let cfg = toml::from_str(&text)?;
                info!("FileConfig: loaded {}", path.display());
                Ok(cfg)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("FileConfig: {} not found, using defaults", path.display());
                Ok(InspectionConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn apply_env(&self, cfg: &mut InspectionConfig) -> Result<(), ConfigError> {
        if let Some(v) = (self.env)("SURFSCAN_PLC_ADDRESS") {
            cfg.plc_address = v;
        }
        self.parse_into("SURFSCAN_PLC_PORT", &mut cfg.plc_port)?;
        self.parse_into("SURFSCAN_RACK", &mut cfg.rack)?;
        self.parse_into("SURFSCAN_SLOT", &mut cfg.slot)?;
        self.parse_into("SURFSCAN_DB_NUMBER", &mut cfg.db_number)?;
        self.parse_into("SURFSCAN_OFFSET_RESULT", &mut cfg.offset_result)?;
        self.parse_into("SURFSCAN_OFFSET_DEFECT", &mut cfg.offset_defect)?;
        self.parse_into("SURFSCAN_IO_TIMEOUT_MS", &mut cfg.io_timeout_ms)?;
        self.parse_into("SURFSCAN_SCORE_THRESHOLD", &mut cfg.score_threshold)?;
        self.parse_into("SURFSCAN_CAMERA_INDEX", &mut cfg.camera_index)?;
        if let Some(v) = (self.env)("SURFSCAN_BYTE_ORDER") {
            cfg.byte_order = match v.to_ascii_lowercase().as_str() {
                "little" => ByteOrder::Little,
                "big" => ByteOrder::Big,
                _ => {
                    return Err(ConfigError::Env {
                        var: "SURFSCAN_BYTE_ORDER",
                        value: v,
                    });
                }
            };
        }
        Ok(())
    }

    fn parse_into<T: FromStr>(&self, var: &'static str, slot: &mut T) -> Result<(), ConfigError> {
        if let Some(v) = (self.env)(var) {
            *slot = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Env { var, value: v.clone() })?;
        }
        Ok(())
    }
}

impl ConfigPort for FileConfig {
    fn load(&self) -> Result<InspectionConfig, ConfigError> {
        let mut cfg = self.read_file()?;
        self.apply_env(&mut cfg)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
