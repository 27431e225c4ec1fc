//! Handlers invoked by channels and streams.

use crate::pulse::{Pulse, Pulsable};
use async_trait::async_trait;
use std::future::Future;

/// Receives pulses delivered by a [`Channel`](crate::Channel) or
/// [`Stream`](crate::Stream).
///
/// Handlers run on arbitrary runtime worker threads, at the priority of the
/// pulse they receive. Their outcome is never observed by the sender.
#[async_trait]
pub trait Handler<T: Pulsable>: Send + Sync + 'static {
    async fn handle(&self, pulse: Pulse<T>);
}

#[async_trait]
impl<T, F, Fut> Handler<T> for F
where
    T: Pulsable,
    F: Fn(Pulse<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, pulse: Pulse<T>) {
        (self)(pulse).await;
    }
}
