//! Helpers shared by the delivery tests.

use crate::handler::Handler;
use crate::pulse::{Pulse, Pulsable};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::timeout;

/// A handler forwarding every pulse it receives, plus the receiving end.
pub(crate) fn recorder<T: Pulsable>() -> (impl Handler<T>, UnboundedReceiver<Pulse<T>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler = move |pulse: Pulse<T>| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(pulse);
        }
    };
    (handler, rx)
}

/// Receive exactly `n` items, failing the test if they take too long.
pub(crate) async fn collect<T>(rx: &mut UnboundedReceiver<T>, n: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let item = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for delivery")
            .expect("handler dropped before delivery");
        out.push(item);
    }
    out
}
