//! Protocol Module
//!
//! Defines the wire protocol between the client and store endpoints.
//!
//! ## Frame Format (V1)
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Ver (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! The payload is a bincode-encoded [`Request`] or [`Response`].
//!
//! ### Requests
//! The body is tagged by its bincode variant index, in this order:
//! - 0: PING
//! - 1: PUT        - key + bins
//! - 2: ADD        - key + numeric bins
//! - 3: GET        - key + optional bin names
//! - 4: GET_HEADER - key
//! - 5: EXISTS     - key
//! - 6: DELETE     - key
//! - 7: OPERATE    - key + ordered operations
//! - 8: BATCH_GET  - keys + optional bin names
//!
//! [`RequestKind`] names these for logging; it is never sent.
//!
//! ### Result Codes
//! Sent as one explicit byte at the start of the response payload:
//! - 0x00: OK
//! - 0x01: SERVER_ERROR
//! - 0x02: KEY_NOT_FOUND
//! - 0x03: GENERATION_MISMATCH
//! - 0x04: PARAMETER_ERROR
//! - 0x09: TIMEOUT
//! - 0x0c: BIN_TYPE_MISMATCH

mod codec;
mod request;
mod response;

pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_frame, write_frame,
    HEADER_SIZE, MAX_PAYLOAD_SIZE, PROTOCOL_VERSION,
};
pub use request::{Request, RequestBody, RequestHeader, RequestKind};
pub use response::{Response, ResponseBody, ResultCode};
