//! Value formats for stored responses.

use bytes::Bytes;
use shelter_core::{FetchResponse, Raw};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// Encodes response snapshots to and from raw bytes.
pub trait Format: Send + Sync {
    fn serialize(&self, value: &FetchResponse) -> Result<Raw, FormatError>;

    fn deserialize(&self, data: &Raw) -> Result<FetchResponse, FormatError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn serialize(&self, value: &FetchResponse) -> Result<Raw, FormatError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|error| FormatError::Serialize(Box::new(error)))
    }

    fn deserialize(&self, data: &Raw) -> Result<FetchResponse, FormatError> {
        serde_json::from_slice(data).map_err(|error| FormatError::Deserialize(Box::new(error)))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
