//! Controller configuration.
//!
//! Every field defaults to the values the firmware ships with, so an empty document
//! (or [`ControllerConfig::default`]) is enough for a stock Arduino Leonardo/Micro sketch.
//!
//! ```toml
//! [identity]
//! vendor_id = 0x2341
//! usage_page = 65472
//! usage = 3072
//!
//! [timing]
//! handshake_wait_ms = 500
//! click_hold_ms = 10
//!
//! [handshake]
//! marker = "Arduino_Mouse"
//! reply_len = 64
//! ```

use crate::error::{Error, Result};
use crate::matcher::DeviceIdentity;
use crate::report::{HANDSHAKE_MARKER, REPORT_LEN};
use crate::timing::Timing;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub identity: DeviceIdentity,
    pub timing: Timing,
    pub handshake: HandshakeConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeConfig {
    /// ASCII marker the reply must contain.
    pub marker: String,
    /// Maximum reply bytes read.
    pub reply_len: usize,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            marker: String::from_utf8_lossy(HANDSHAKE_MARKER).into_owned(),
            reply_len: REPORT_LEN,
        }
    }
}

impl ControllerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.handshake.marker.is_empty() {
            return Err(Error::InvalidArgument("handshake.marker must not be empty".into()));
        }
        if self.handshake.reply_len == 0 || self.handshake.reply_len > REPORT_LEN {
            return Err(Error::InvalidArgument(format!(
                "handshake.reply_len must be in 1..={REPORT_LEN}, got {}",
                self.handshake.reply_len
            )));
        }
        Ok(())
    }
}
