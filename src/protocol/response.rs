//! Response definitions
//!
//! Represents responses returned by a store endpoint.

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Response result codes
///
/// Sent as the single code byte below, not as a variant index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum ResultCode {
    Ok = 0x00,
    ServerError = 0x01,
    KeyNotFound = 0x02,
    GenerationMismatch = 0x03,
    ParameterError = 0x04,
    Timeout = 0x09,
    BinTypeMismatch = 0x0c,
}

impl From<ResultCode> for u8 {
    fn from(code: ResultCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for ResultCode {
    type Error = String;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x00 => Ok(ResultCode::Ok),
            0x01 => Ok(ResultCode::ServerError),
            0x02 => Ok(ResultCode::KeyNotFound),
            0x03 => Ok(ResultCode::GenerationMismatch),
            0x04 => Ok(ResultCode::ParameterError),
            0x09 => Ok(ResultCode::Timeout),
            0x0c => Ok(ResultCode::BinTypeMismatch),
            other => Err(format!("unknown result code 0x{:02x}", other)),
        }
    }
}

/// Response payload by request type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseBody {
    /// Writes and not-found replies
    Empty,

    /// Reply to PING
    Pong,

    /// Reply to GET, GET_HEADER and OPERATE
    Record(Record),

    /// Reply to EXISTS
    Exists(bool),

    /// Reply to DELETE: whether a record was removed
    Deleted(bool),

    /// Reply to BATCH_GET, aligned with the request keys
    Batch(Vec<Option<Record>>),

    /// Error detail
    Message(String),
}

/// A response from a store endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub code: ResultCode,
    pub body: ResponseBody,
}

impl Response {
    /// Create an OK response
    pub fn ok(body: ResponseBody) -> Self {
        Self {
            code: ResultCode::Ok,
            body,
        }
    }

    /// Create a KEY_NOT_FOUND response
    pub fn not_found() -> Self {
        Self {
            code: ResultCode::KeyNotFound,
            body: ResponseBody::Empty,
        }
    }

    /// Create an error response
    pub fn error(code: ResultCode, message: &str) -> Self {
        Self {
            code,
            body: ResponseBody::Message(message.to_string()),
        }
    }

    /// Error detail carried by the body, if any
    pub fn message(&self) -> &str {
        match &self.body {
            ResponseBody::Message(message) => message,
            _ => "",
        }
    }
}
