//! Streams: channels that announce their own release.
//!
//! A [`Stream`] delivers data pulses through a primary [`Channel`] and, when
//! released, sends a [`StreamReleased`] pulse to up to two notification
//! channels, one for each side of the stream.

use crate::channel::{Channel, ChannelError};
use crate::handler::Handler;
use crate::pulse::{Pulse, Pulsable};
use crate::source::{short_type_name, Representable};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Payload announcing that a stream was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamReleased {
    /// Identifier of the released stream.
    pub stream_id: Uuid,
}

struct StreamState<T: Pulsable> {
    primary: Option<Channel<T>>,
    upstream: Option<Channel<StreamReleased>>,
    downstream: Option<Channel<StreamReleased>>,
}

/// A channel-like primitive with release notification in both directions.
pub struct Stream<T: Pulsable> {
    id: Uuid,
    state: Mutex<StreamState<T>>,
}

impl<T: Pulsable> Stream<T> {
    /// Create an active stream delivering data to `handler`, with no
    /// release notifiers.
    #[must_use]
    pub fn new<H: Handler<T>>(handler: H) -> Self {
        let stream = Self {
            id: Uuid::new_v4(),
            state: Mutex::new(StreamState {
                primary: Some(Channel::new(handler)),
                upstream: None,
                downstream: None,
            }),
        };
        debug!(stream = %stream.id, payload = %short_type_name::<T>(), "Stream created");
        stream
    }

    /// Notify `handler` on the upstream side when the stream is released.
    #[must_use]
    pub fn with_upstream<H: Handler<StreamReleased>>(mut self, handler: H) -> Self {
        self.state.get_mut().upstream = Some(Channel::new(handler));
        self
    }

    /// Notify `handler` on the downstream side when the stream is released.
    #[must_use]
    pub fn with_downstream<H: Handler<StreamReleased>>(mut self, handler: H) -> Self {
        self.state.get_mut().downstream = Some(Channel::new(handler));
        self
    }

    /// Schedule delivery of `pulse` to the data handler.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Released`] if the stream has been released.
    pub async fn send(&self, pulse: Pulse<T>) -> Result<(), ChannelError> {
        let state = self.state.lock().await;
        match state.primary.as_ref() {
            Some(primary) => primary.send(pulse).await,
            None => {
                trace!(stream = %self.id, pulse = %pulse.id(), "Send on released stream");
                Err(ChannelError::Released)
            }
        }
    }

    /// Release the stream.
    ///
    /// Each configured notifier is sent one [`StreamReleased`] pulse sourced
    /// from this stream. Notifier failures are logged and do not abort the
    /// release; notifier completion is not awaited.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Released`] if the stream was already released.
    pub async fn release(&self) -> Result<(), ChannelError> {
        let mut state = self.state.lock().await;
        if state.primary.is_none() {
            return Err(ChannelError::Released);
        }

        let notice = Pulse::new(StreamReleased { stream_id: self.id }).from_source(self);
        let notifiers = [
            ("upstream", state.upstream.take()),
            ("downstream", state.downstream.take()),
        ];
        for (side, notifier) in notifiers {
            let Some(notifier) = notifier else { continue };
            if let Err(e) = notifier.send(notice.clone()).await {
                warn!(stream = %self.id, side, error = %e, "Release notification not delivered");
            }
        }

        state.primary = None;
        debug!(stream = %self.id, "Stream released");
        Ok(())
    }

    /// Check whether the stream has been released.
    pub async fn is_released(&self) -> bool {
        self.state.lock().await.primary.is_none()
    }
}

impl<T: Pulsable> Representable for Stream<T> {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> String {
        format!("Stream:{}", short_type_name::<T>())
    }
}

impl<T: Pulsable> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
