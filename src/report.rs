//! The collected report and its encodings
//!
//! One document with four top-level keys:
//!
//! ```text
//! {
//!   "init":        { "apache2_service": "enabled", ... },
//!   "status":      { "apache2_service": "active", ... },
//!   "established": { "sshd": { "41478": "10.0.2.2" }, ... },
//!   "listening":   { "apache2": { "80": "::" }, ... }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::facts::{EnablementMap, SocketMap, StatusMap};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub init: EnablementMap,
    pub status: StatusMap,
    pub established: SocketMap,
    pub listening: SocketMap,
}

impl Report {
    /// Assemble resolver outputs; no I/O, no failure
    pub fn aggregate(
        init: EnablementMap,
        status: StatusMap,
        listening: SocketMap,
        established: SocketMap,
    ) -> Self {
        Self {
            init,
            status,
            established,
            listening,
        }
    }

    pub fn encode(&self, format: Format) -> Result<Vec<u8>, ReportError> {
        let mut bytes = match format {
            Format::Json => serde_json::to_vec_pretty(self)?,
            Format::CompactJson => serde_json::to_vec(self)?,
            Format::MsgPack => return Ok(rmp_serde::to_vec_named(self)?),
        };
        bytes.push(b'\n');
        Ok(bytes)
    }
}

/// Output encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    CompactJson,
    MsgPack,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MessagePack encoding failed: {0}")]
    MsgPack(#[from] rmp_serde::encode::Error),
}
