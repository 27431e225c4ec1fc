//! Demo scenario.
//!
//! Sensor readings flow through a [`Stream`]; each reading is answered with an
//! acknowledgement pulse on a [`Channel`], continuing the reading's trace.
//! Releasing the stream notifies both of its sides.

use crate::config::Config;
use crate::metrics;
use anyhow::{Context, Result};
use pulse_codec::codec;
use pulse_core::{Channel, Handler, Priority, Pulse, Representable, Stream, StreamReleased};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// A sensor reading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reading {
    pub sensor: String,
    pub value: i64,
}

/// Acknowledgement of a reading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ack {
    pub reading: Uuid,
}

/// A named participant in the demo.
#[derive(Debug)]
pub struct Sensor {
    id: Uuid,
    name: String,
}

impl Sensor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

impl Representable for Sensor {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Outcome of a demo run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Readings accepted by the stream.
    pub sent: usize,
    /// Sends refused because the target was released.
    pub rejected: usize,
    /// Acknowledgements handled.
    pub acknowledged: usize,
    /// Release notices handled.
    pub notices: usize,
}

fn notifier(side: &'static str, count: &Arc<AtomicUsize>) -> impl Handler<StreamReleased> {
    let count = Arc::clone(count);
    move |pulse: Pulse<StreamReleased>| {
        let count = Arc::clone(&count);
        async move {
            metrics::record_stream_released(side);
            count.fetch_add(1, Ordering::SeqCst);
            info!(side, stream = %pulse.data().stream_id, "Stream released");
        }
    }
}

/// Run the demo scenario.
///
/// # Errors
///
/// Returns an error if the configured priority is invalid or a primitive is
/// released more than once.
pub async fn run(config: &Config) -> Result<RunSummary> {
    let sensor = Sensor::new("thermo-1");
    let desk = Arc::new(Sensor::new("ack-desk"));
    let acknowledged = Arc::new(AtomicUsize::new(0));
    let notices = Arc::new(AtomicUsize::new(0));

    let ack_count = Arc::clone(&acknowledged);
    let acks = Arc::new(Channel::new(move |pulse: Pulse<Ack>| {
        let ack_count = Arc::clone(&ack_count);
        async move {
            metrics::record_delivered("ack");
            ack_count.fetch_add(1, Ordering::SeqCst);
            debug!(trace = %pulse.meta().trace(), reading = %pulse.data().reading, "Acknowledged");
        }
    }));

    let ack_target = Arc::clone(&acks);
    let stream = Stream::new(move |pulse: Pulse<Reading>| {
        let acks = Arc::clone(&ack_target);
        let desk = Arc::clone(&desk);
        async move {
            metrics::record_delivered("reading");
            info!(
                pulse = %pulse,
                priority = %Priority::current(),
                value = pulse.data().value,
                "Reading received"
            );
            if let Ok(json) = codec::to_json(&pulse) {
                trace!(%json, "Reading envelope");
            }

            let ack = Pulse::respond_from(&pulse, Ack { reading: pulse.id() }, desk.as_ref());
            if let Err(e) = acks.send(ack).await {
                metrics::record_rejected();
                warn!(error = %e, "Acknowledgement refused");
            }
        }
    })
    .with_upstream(notifier("upstream", &notices))
    .with_downstream(notifier("downstream", &notices));

    let mut summary = RunSummary::default();
    for index in 0..config.pulses {
        let priority = config.priority_for(index)?;
        let pulse = Pulse::new(Reading {
            sensor: sensor.name(),
            value: index as i64 * 3,
        })
        .from_source(&sensor)
        .priority(priority)
        .debug(config.debug)
        .tagged(config.tags.iter().cloned());

        match stream.send(pulse).await {
            Ok(()) => {
                metrics::record_sent(priority);
                summary.sent += 1;
            }
            Err(e) => {
                metrics::record_rejected();
                summary.rejected += 1;
                warn!(error = %e, "Reading refused");
            }
        }
    }

    stream.release().await.context("Stream was already released")?;

    let late = Pulse::new(Reading {
        sensor: sensor.name(),
        value: -1,
    });
    if let Err(e) = stream.send(late).await {
        metrics::record_rejected();
        summary.rejected += 1;
        debug!(error = %e, "Late reading refused");
    }

    // Wait for in-flight handlers, bounded by the settle time.
    let deadline = Instant::now() + config.settle();
    while Instant::now() < deadline
        && (acknowledged.load(Ordering::SeqCst) < summary.sent || notices.load(Ordering::SeqCst) < 2)
    {
        sleep(Duration::from_millis(5)).await;
    }

    acks.release().await.context("Acknowledgement channel was already released")?;

    summary.acknowledged = acknowledged.load(Ordering::SeqCst);
    summary.notices = notices.load(Ordering::SeqCst);
    Ok(summary)
}
