//! Codec for encoding and decoding Pulse values.
//!
//! Binary frames are MessagePack with a length prefix; JSON is offered for
//! human-readable logs.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use pulse_core::{Pulsable, Pulse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use thiserror::Error;

/// Maximum frame size (16 MiB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Length prefix size in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Frame exceeds maximum size.
    #[error("Frame size {0} exceeds maximum {MAX_FRAME_SIZE}")]
    FrameTooLarge(usize),

    /// Not enough data to decode frame.
    #[error("Incomplete frame: need {0} more bytes")]
    Incomplete(usize),

    /// MessagePack encoding error.
    #[error("Encoding error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// MessagePack decoding error.
    #[error("Decoding error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn payload<M: Serialize + ?Sized>(value: &M) -> Result<Vec<u8>, CodecError> {
    let payload = rmp_serde::to_vec_named(value)?;
    if payload.len() > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge(payload.len()));
    }
    Ok(payload)
}

/// Encode a value to bytes.
///
/// The encoded format is:
/// - 4 bytes: Big-endian length prefix
/// - N bytes: MessagePack-encoded value (named fields)
///
/// # Errors
///
/// Returns an error if the value is too large or encoding fails.
pub fn encode<M: Serialize + ?Sized>(value: &M) -> Result<Bytes, CodecError> {
    let payload = payload(value)?;

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.extend_from_slice(&payload);

    Ok(buf.freeze())
}

/// Encode a value into an existing buffer.
///
/// # Errors
///
/// Returns an error if the value is too large or encoding fails.
pub fn encode_into<M: Serialize + ?Sized>(value: &M, buf: &mut BytesMut) -> Result<(), CodecError> {
    let payload = payload(value)?;

    buf.reserve(LENGTH_PREFIX_SIZE + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.extend_from_slice(&payload);

    Ok(())
}

fn frame_length(data: &[u8]) -> Result<usize, CodecError> {
    let length = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if length > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge(length));
    }
    Ok(length)
}

/// Decode a value from bytes.
///
/// # Errors
///
/// Returns an error if the data is incomplete, too large, or invalid.
pub fn decode<M: DeserializeOwned>(data: &[u8]) -> Result<M, CodecError> {
    if data.len() < LENGTH_PREFIX_SIZE {
        return Err(CodecError::Incomplete(LENGTH_PREFIX_SIZE - data.len()));
    }

    let length = frame_length(data)?;
    let total_size = LENGTH_PREFIX_SIZE + length;
    if data.len() < total_size {
        return Err(CodecError::Incomplete(total_size - data.len()));
    }

    let value = rmp_serde::from_slice(&data[LENGTH_PREFIX_SIZE..total_size])?;
    Ok(value)
}

/// Try to decode a value from a buffer, advancing it if successful.
///
/// Returns `Ok(Some(value))` if a complete frame was decoded,
/// `Ok(None)` if more data is needed, or `Err` on a malformed frame.
///
/// # Errors
///
/// Returns an error if the frame is too large or invalid.
pub fn decode_from<M: DeserializeOwned>(buf: &mut BytesMut) -> Result<Option<M>, CodecError> {
    if buf.len() < LENGTH_PREFIX_SIZE {
        return Ok(None);
    }

    let length = frame_length(buf)?;
    if buf.len() < LENGTH_PREFIX_SIZE + length {
        return Ok(None);
    }

    buf.advance(LENGTH_PREFIX_SIZE);
    let payload = buf.split_to(length);
    let value = rmp_serde::from_slice(&payload)?;

    Ok(Some(value))
}

/// Render a value as JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json<M: Serialize + ?Sized>(value: &M) -> Result<String, CodecError> {
    Ok(serde_json::to_string(value)?)
}

/// Parse a value from JSON.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or does not match `M`.
pub fn from_json<M: DeserializeOwned>(json: &str) -> Result<M, CodecError> {
    Ok(serde_json::from_str(json)?)
}

/// Typed codec for `Pulse<T>` frames.
#[derive(Debug)]
pub struct PulseCodec<T> {
    _payload: PhantomData<fn() -> T>,
}

impl<T> Default for PulseCodec<T> {
    fn default() -> Self {
        Self {
            _payload: PhantomData,
        }
    }
}

impl<T: Pulsable> PulseCodec<T> {
    /// Create a new codec instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a pulse to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode(&self, pulse: &Pulse<T>) -> Result<Bytes, CodecError> {
        encode(pulse)
    }

    /// Decode a pulse from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode(&self, data: &[u8]) -> Result<Pulse<T>, CodecError> {
        decode(data)
    }

    /// Try to decode a pulse from a buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is invalid.
    pub fn decode_from(&self, buf: &mut BytesMut) -> Result<Option<Pulse<T>>, CodecError> {
        decode_from(buf)
    }
}
