//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! Requests and responses share one frame layout:
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Ver (1)  │ Len (4)  │   Payload (bincode)         │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! `Len` is big-endian and counts payload bytes only.

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};

use super::{Request, Response};
use crate::error::{ClientError, Result};

/// Current protocol version
pub const PROTOCOL_VERSION: u8 = 1;

/// Header size: 1 byte version + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Message Encoding/Decoding
// =============================================================================

/// Encode a request into a complete frame
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    let payload = bincode::serialize(request)?;
    frame(&payload)
}

/// Decode a request from a complete frame
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let payload = unframe(bytes)?;
    Ok(bincode::deserialize(payload)?)
}

/// Encode a response into a complete frame
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let payload = bincode::serialize(response)?;
    frame(&payload)
}

/// Decode a response from a complete frame
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let payload = unframe(bytes)?;
    Ok(bincode::deserialize(payload)?)
}

fn frame(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(ClientError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    buf.put_u8(PROTOCOL_VERSION);
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    Ok(buf.to_vec())
}

/// Parse and validate a frame header
///
/// Returns the payload length announced by the header.
fn parse_header(header: &[u8]) -> Result<usize> {
    if header.len() < HEADER_SIZE {
        return Err(ClientError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            header.len()
        )));
    }

    if header[0] != PROTOCOL_VERSION {
        return Err(ClientError::Protocol(format!(
            "Unsupported protocol version: {}",
            header[0]
        )));
    }

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(ClientError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    Ok(payload_len as usize)
}

fn unframe(bytes: &[u8]) -> Result<&[u8]> {
    let payload_len = parse_header(bytes)?;
    let total_len = HEADER_SIZE + payload_len;

    if bytes.len() != total_len {
        return Err(ClientError::Protocol(format!(
            "Frame length mismatch: header says {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok(&bytes[HEADER_SIZE..])
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame (header included) from a stream
///
/// Blocks until the frame is received or the stream fails.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;
    let payload_len = parse_header(&header)?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload_len);
    frame.extend_from_slice(&header);
    frame.resize(HEADER_SIZE + payload_len, 0);
    if payload_len > 0 {
        reader.read_exact(&mut frame[HEADER_SIZE..])?;
    }

    Ok(frame)
}

/// Write one complete frame to a stream
pub fn write_frame<W: Write>(writer: &mut W, frame: &[u8]) -> Result<()> {
    writer.write_all(frame)?;
    writer.flush()?;
    Ok(())
}
