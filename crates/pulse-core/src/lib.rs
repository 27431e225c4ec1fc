//! # pulse-core
//!
//! Typed in-process messaging for Pulse.
//!
//! This crate provides the fundamental building blocks:
//!
//! - **Pulse** - Immutable envelope: id, timestamp, payload, metadata
//! - **PulseMeta** - Debug flag, trace, source, echo, priority and tags
//! - **Channel** - Release-able delivery to a single async handler
//! - **Stream** - Channel that notifies both sides when released
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  send   ┌─────────────┐  spawn_at(priority)  ┌─────────────┐
//! │  Pulse<T>   │────────▶│ Channel<T>  │─────────────────────▶│  Handler    │
//! └─────────────┘         └─────────────┘                      └─────────────┘
//!                                ▲
//!                         ┌──────┴──────┐  release   ┌──────────────────────┐
//!                         │  Stream<T>  │───────────▶│ upstream/downstream  │
//!                         └─────────────┘            └──────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use pulse_core::{Channel, Priority, Pulse};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let channel = Channel::new(|pulse: Pulse<String>| async move {
//!     println!("{} at {}", pulse.data(), Priority::current());
//! });
//!
//! let request = Pulse::new("ping".to_string()).priority(Priority::High);
//! channel.send(request).await.unwrap();
//! channel.release().await.unwrap();
//! assert!(channel.send(Pulse::new("late".to_string())).await.is_err());
//! # }
//! ```

pub mod channel;
pub mod handler;
pub mod meta;
pub mod priority;
pub mod pulse;
pub mod source;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::{Channel, ChannelError};
pub use handler::Handler;
pub use meta::{MetaOverrides, PulseMeta};
pub use priority::{spawn_at, Priority};
pub use pulse::{Pulsable, Pulse};
pub use source::{PulseSource, Representable};
pub use stream::{Stream, StreamReleased};
