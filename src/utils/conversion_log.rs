//! Observational record of encode/decode invocations.
//!
//! Front ends log one entry per conversion and mark it downloaded once the
//! output has been handed to the user. Nothing in the codec reads this log.

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::errors::{CodecError, CodecResult};

pub type ConversionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionMode {
    Encode,
    Decode,
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionMode::Encode => write!(f, "encode"),
            ConversionMode::Decode => write!(f, "decode"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRecord {
    pub id: ConversionId,
    pub file_name: String,
    pub mode: ConversionMode,
    pub timestamp: DateTime<Utc>,
    pub downloaded: bool,
    pub downloaded_at: Option<DateTime<Utc>>,
}

pub trait ConversionLog: Send + Sync {
    fn record_conversion(&self, file_name: &str, mode: ConversionMode) -> ConversionId;

    fn record_download(&self, id: ConversionId) -> CodecResult<()>;
}

/// Keeps records in memory and emits a `tracing` event for each one.
#[derive(Debug, Default)]
pub struct TracingConversionLog {
    records: Mutex<Vec<ConversionRecord>>,
}

impl TracingConversionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ConversionRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl ConversionLog for TracingConversionLog {
    fn record_conversion(&self, file_name: &str, mode: ConversionMode) -> ConversionId {
        let mut records = match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let record = ConversionRecord {
            id: records.len() as ConversionId,
            file_name: file_name.trim().to_owned(),
            mode,
            timestamp: Utc::now(),
            downloaded: false,
            downloaded_at: None,
        };
        info!(
            id = record.id,
            file_name = %record.file_name,
            mode = %record.mode,
            timestamp = %record.timestamp.to_rfc3339(),
            "conversion logged"
        );
        let id = record.id;
        records.push(record);
        id
    }

    fn record_download(&self, id: ConversionId) -> CodecResult<()> {
        let mut records = match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(CodecError::UnknownConversion(id))?;

        let now = Utc::now();
        record.downloaded = true;
        record.downloaded_at = Some(now);
        info!(id, downloaded_at = %now.to_rfc3339(), "download logged");
        Ok(())
    }
}
