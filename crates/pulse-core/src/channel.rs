//! Release-able single-handler delivery.
//!
//! A [`Channel`] hands each accepted pulse to its handler on a freshly
//! spawned task running at the pulse's priority. Once released it refuses
//! every further operation with [`ChannelError::Released`].

use crate::handler::Handler;
use crate::priority::spawn_at;
use crate::pulse::{Pulse, Pulsable};
use crate::source::{short_type_name, Representable};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, trace};
use uuid::Uuid;

/// Delivery errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The channel or stream no longer accepts operations.
    #[error("Released")]
    Released,
}

/// A release-able, asynchronous, single-handler delivery primitive.
pub struct Channel<T: Pulsable> {
    /// Channel identifier.
    id: Uuid,
    /// Registered handler; `None` once released.
    handler: Mutex<Option<Arc<dyn Handler<T>>>>,
}

impl<T: Pulsable> Channel<T> {
    /// Create an active channel delivering to `handler`.
    #[must_use]
    pub fn new<H: Handler<T>>(handler: H) -> Self {
        Self::with_handler(Arc::new(handler))
    }

    /// Create an active channel around an already shared handler.
    #[must_use]
    pub fn with_handler(handler: Arc<dyn Handler<T>>) -> Self {
        let channel = Self {
            id: Uuid::new_v4(),
            handler: Mutex::new(Some(handler)),
        };
        debug!(channel = %channel.id, payload = %short_type_name::<T>(), "Channel created");
        channel
    }

    /// Schedule delivery of `pulse` to the handler.
    ///
    /// Returns as soon as the delivery task is spawned; the handler runs at
    /// the pulse's priority and its completion is not awaited.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Released`] if the channel has been released.
    /// Nothing is scheduled in that case.
    pub async fn send(&self, pulse: Pulse<T>) -> Result<(), ChannelError> {
        let guard = self.handler.lock().await;
        let Some(handler) = guard.as_ref() else {
            trace!(channel = %self.id, pulse = %pulse.id(), "Send on released channel");
            return Err(ChannelError::Released);
        };

        let handler = Arc::clone(handler);
        let priority = pulse.scheduling_priority();
        trace!(channel = %self.id, pulse = %pulse.id(), %priority, "Scheduling delivery");
        spawn_at(priority, async move {
            handler.handle(pulse).await;
        });

        Ok(())
    }

    /// Release the channel, dropping its handler.
    ///
    /// Deliveries already scheduled still run to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Released`] if the channel was already released.
    pub async fn release(&self) -> Result<(), ChannelError> {
        let mut guard = self.handler.lock().await;
        if guard.take().is_none() {
            return Err(ChannelError::Released);
        }
        debug!(channel = %self.id, "Channel released");
        Ok(())
    }

    /// Check whether the channel has been released.
    pub async fn is_released(&self) -> bool {
        self.handler.lock().await.is_none()
    }
}

impl<T: Pulsable> Representable for Channel<T> {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> String {
        format!("Channel:{}", short_type_name::<T>())
    }
}

impl<T: Pulsable> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::Priority;
    use crate::testing::{collect, recorder};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{mpsc, oneshot};

    #[tokio::test]
    async fn test_channel_name() {
        let (handler, _rx) = recorder::<String>();
        let channel = Channel::new(handler);
        assert_eq!(channel.name(), "Channel:String");
        assert_eq!(channel.description(), format!("Channel:String:{}", channel.id()));
    }

    #[tokio::test]
    async fn test_release_twice() {
        let (handler, mut rx) = recorder::<u32>();
        let channel = Channel::new(handler);

        assert!(!channel.is_released().await);
        assert_eq!(channel.release().await, Ok(()));
        assert!(channel.is_released().await);
        assert_eq!(channel.release().await, Err(ChannelError::Released));
        assert_eq!(channel.send(Pulse::new(1)).await, Err(ChannelError::Released));

        // The handler was the only sender; it is gone without delivering.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_delivers_each_pulse_once() {
        let (handler, mut rx) = recorder::<u32>();
        let channel = Channel::new(handler);

        for i in 0..50 {
            channel.send(Pulse::new(i)).await.unwrap();
        }

        let received: Vec<u32> = collect(&mut rx, 50)
            .await
            .into_iter()
            .map(Pulse::into_data)
            .collect();
        let unique: HashSet<u32> = received.iter().copied().collect();
        assert_eq!(received.len(), 50);
        assert_eq!(unique, (0..50).collect());

        channel.release().await.unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_scenario_log() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let sink = Arc::clone(&log);
        let channel = Channel::new(move |pulse: Pulse<String>| {
            let sink = Arc::clone(&sink);
            let done_tx = done_tx.clone();
            async move {
                sink.lock().unwrap().push(pulse.into_data());
                let _ = done_tx.send(());
            }
        });

        for value in ["a", "b", "c"] {
            channel.send(Pulse::new(value.to_string())).await.unwrap();
        }
        collect(&mut done_rx, 3).await;

        let mut entries = log.lock().unwrap().clone();
        entries.sort();
        assert_eq!(entries, vec!["a", "b", "c"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_handler_observes_pulse_priority() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let channel = Channel::new(move |pulse: Pulse<u8>| {
            let tx = tx.clone();
            async move {
                let _ = tx.send((pulse.into_data(), Priority::current()));
            }
        });

        channel.send(Pulse::new(1).priority(Priority::High)).await.unwrap();
        channel.send(Pulse::new(2).priority(Priority::Background)).await.unwrap();
        channel.send(Pulse::new(3)).await.unwrap();

        let mut seen = collect(&mut rx, 3).await;
        seen.sort();
        assert_eq!(
            seen,
            vec![
                (1, Priority::High),
                (2, Priority::Background),
                (3, Priority::Medium)
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_release_does_not_cancel_in_flight() {
        let (gate_tx, gate_rx) = oneshot::channel::<()>();
        let gate = Arc::new(Mutex::new(Some(gate_rx)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let channel = Channel::new(move |pulse: Pulse<u32>| {
            let gate = Arc::clone(&gate);
            let tx = tx.clone();
            async move {
                if let Some(gate) = gate.lock().await.take() {
                    let _ = gate.await;
                }
                let _ = tx.send(pulse.into_data());
            }
        });

        channel.send(Pulse::new(7)).await.unwrap();
        channel.release().await.unwrap();
        gate_tx.send(()).unwrap();

        assert_eq!(collect(&mut rx, 1).await, vec![7]);
    }

    #[tokio::test]
    async fn test_concurrent_release_succeeds_once() {
        let (handler, _rx) = recorder::<u32>();
        let channel = Arc::new(Channel::new(handler));
        let successes = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let channel = Arc::clone(&channel);
            let successes = Arc::clone(&successes);
            tasks.push(tokio::spawn(async move {
                if channel.release().await.is_ok() {
                    successes.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(successes.load(Ordering::SeqCst), 1);
    }
}
