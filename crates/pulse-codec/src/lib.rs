//! # pulse-codec
//!
//! Structured encoding for Pulse envelopes.
//!
//! Pulses, their metadata and sources, and stream release notices are all
//! plain serde values. This crate gives collaborators that log or persist
//! them a binary framing (length-prefixed MessagePack) and a JSON form.
//!
//! ## Example
//!
//! ```rust
//! use pulse_codec::codec;
//! use pulse_core::{Priority, Pulse};
//!
//! let pulse = Pulse::new(42u32).priority(Priority::High).tagged(["audit"]);
//!
//! let encoded = codec::encode(&pulse).unwrap();
//! let decoded: Pulse<u32> = codec::decode(&encoded).unwrap();
//! assert_eq!(decoded, pulse);
//! ```

pub mod codec;

pub use codec::{decode, encode, from_json, to_json, CodecError, PulseCodec};
