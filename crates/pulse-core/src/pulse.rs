//! The pulse envelope.
//!
//! A [`Pulse`] is an immutable value: every modifier returns a new pulse that
//! keeps the receiver's `id` and `timestamp`. Only [`Pulse::respond`] creates a
//! new identity, continuing the causal chain of the pulse it answers.

use crate::meta::{MetaOverrides, PulseMeta};
use crate::priority::Priority;
use crate::source::{short_type_name, PulseSource, Representable};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use uuid::Uuid;

/// Contract for pulse payloads.
///
/// Implemented automatically for every type that satisfies the bounds.
pub trait Pulsable:
    Send + Sync + Clone + Eq + Hash + fmt::Debug + Serialize + DeserializeOwned + 'static
{
}

impl<T> Pulsable for T where
    T: Send + Sync + Clone + Eq + Hash + fmt::Debug + Serialize + DeserializeOwned + 'static
{
}

/// Immutable message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(bound = "T: Pulsable")]
pub struct Pulse<T> {
    id: Uuid,
    timestamp: DateTime<Utc>,
    data: T,
    meta: PulseMeta,
}

impl<T: Pulsable> Pulse<T> {
    /// Wrap `data` with a fresh id, the current time and default metadata.
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            data,
            meta: PulseMeta::default(),
        }
    }

    /// Start a new causal step answering `to`.
    ///
    /// The result has a fresh id and timestamp, shares `to`'s trace and echoes
    /// `to`. Debug flag, priority and tags start from defaults.
    #[must_use]
    pub fn respond<U: Pulsable>(to: &Pulse<U>, data: T) -> Self {
        Self::respond_with(to, data, None)
    }

    /// Like [`Pulse::respond`], recording `source` as the sender.
    #[must_use]
    pub fn respond_from<U, R>(to: &Pulse<U>, data: T, source: &R) -> Self
    where
        U: Pulsable,
        R: Representable + ?Sized,
    {
        Self::respond_with(to, data, Some(PulseSource::from(source)))
    }

    fn respond_with<U: Pulsable>(to: &Pulse<U>, data: T, source: Option<PulseSource>) -> Self {
        let mut overrides = MetaOverrides::new()
            .trace(to.meta.trace())
            .echoes(PulseSource::from(to));
        if let Some(source) = source {
            overrides = overrides.source(source);
        }

        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            data,
            meta: PulseMeta::with(overrides),
        }
    }

    /// Copy with `data` and/or `meta` replaced, keeping id and timestamp.
    ///
    /// Also usable in associated form: `Pulse::fluently(&pulse, data, meta)`.
    #[must_use]
    pub fn fluently(&self, data: Option<T>, meta: Option<PulseMeta>) -> Self {
        Self {
            id: self.id,
            timestamp: self.timestamp,
            data: data.unwrap_or_else(|| self.data.clone()),
            meta: meta.unwrap_or_else(|| self.meta.clone()),
        }
    }

    fn with_meta(&self, overrides: MetaOverrides) -> Self {
        self.fluently(None, Some(self.meta.fluently(overrides)))
    }

    #[must_use]
    pub fn debug(&self, enabled: bool) -> Self {
        self.with_meta(MetaOverrides::new().debug(enabled))
    }

    /// Link this pulse causally to `other`: adopt its trace and echo it.
    #[must_use]
    pub fn echoes<U: Pulsable>(&self, other: &Pulse<U>) -> Self {
        self.with_meta(
            MetaOverrides::new()
                .trace(other.meta.trace())
                .echoes(PulseSource::from(other)),
        )
    }

    /// Record `entity` as the sender of this pulse.
    #[must_use]
    pub fn from_source<R: Representable + ?Sized>(&self, entity: &R) -> Self {
        self.with_meta(MetaOverrides::new().source(PulseSource::from(entity)))
    }

    #[must_use]
    pub fn priority(&self, priority: Priority) -> Self {
        self.with_meta(MetaOverrides::new().priority(priority))
    }

    /// Add `tags` to the existing tag set.
    #[must_use]
    pub fn tagged<I, S>(&self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tagged_with(tags, false)
    }

    /// Replace the tag set with exactly `tags`.
    #[must_use]
    pub fn retagged<I, S>(&self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tagged_with(tags, true)
    }

    /// Union `tags` into the tag set, or replace it when `reset` is set.
    #[must_use]
    pub fn tagged_with<I, S>(&self, tags: I, reset: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        let tags = if reset {
            tags
        } else {
            self.meta.tags().iter().cloned().chain(tags).collect()
        };
        self.with_meta(MetaOverrides::new().tags(tags))
    }

    /// Adopt all of `other`'s metadata.
    #[must_use]
    pub fn like<U: Pulsable>(&self, other: &Pulse<U>) -> Self {
        self.fluently(None, Some(other.meta.clone()))
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Creation time. Preserved by every modifier except `respond`.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn data(&self) -> &T {
        &self.data
    }

    #[must_use]
    pub fn meta(&self) -> &PulseMeta {
        &self.meta
    }

    /// Consume the pulse, returning its payload.
    #[must_use]
    pub fn into_data(self) -> T {
        self.data
    }

    /// `Pulse:<payload type>`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("Pulse:{}", short_type_name::<T>())
    }

    /// Typed view of the metadata priority.
    #[must_use]
    pub fn scheduling_priority(&self) -> Priority {
        Priority::from_raw(self.meta.priority())
    }

    /// `name:id`.
    #[must_use]
    pub fn description(&self) -> String {
        format!("{}:{}", self.name(), self.id)
    }
}

impl<T: Pulsable> Representable for Pulse<T> {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> String {
        Pulse::name(self)
    }
}

impl<T: Pulsable> fmt::Display for Pulse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    struct A;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    struct B;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    struct C {
        value: u32,
    }

    struct Worker {
        id: Uuid,
    }

    impl Representable for Worker {
        fn id(&self) -> Uuid {
            self.id
        }

        fn name(&self) -> String {
            "Worker".to_string()
        }
    }

    fn tags(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pulse_creation() {
        let pulse = Pulse::new(C { value: 7 });
        assert_eq!(pulse.data().value, 7);
        assert_eq!(pulse.name(), "Pulse:C");
        assert_eq!(pulse.description(), format!("Pulse:C:{}", pulse.id()));
        assert_eq!(pulse.to_string(), pulse.description());
        assert_eq!(pulse.scheduling_priority(), Priority::Medium);
        assert!(!pulse.meta().debug());
    }

    #[test]
    fn test_unique_pulse_ids() {
        assert_ne!(Pulse::new(A).id(), Pulse::new(A).id());
    }

    #[test]
    fn test_modifiers_preserve_identity() {
        let other = Pulse::new(B);
        let worker = Worker { id: Uuid::new_v4() };
        let p = Pulse::new(C { value: 1 });
        let before = p.clone();

        let variants = vec![
            p.debug(true),
            p.echoes(&other),
            p.from_source(&worker),
            p.priority(Priority::High),
            p.tagged(["a"]),
            p.retagged(["b"]),
            p.like(&other),
            p.fluently(Some(C { value: 2 }), None),
            Pulse::fluently(&p, None, Some(PulseMeta::new())),
        ];

        for variant in variants {
            assert_eq!(variant.id(), p.id());
            assert_eq!(variant.timestamp(), p.timestamp());
        }
        assert_eq!(p, before);
    }

    #[test]
    fn test_fluently_replaces_only_supplied_fields() {
        let p = Pulse::new(C { value: 1 }).debug(true);

        let data_only = p.fluently(Some(C { value: 2 }), None);
        assert_eq!(data_only.data().value, 2);
        assert_eq!(data_only.meta(), p.meta());

        let unchanged = p.fluently(None, None);
        assert_eq!(unchanged, p);
    }

    #[test]
    fn test_last_write_wins() {
        let p = Pulse::new(A)
            .debug(true)
            .priority(Priority::High)
            .debug(false)
            .priority(Priority::Low);
        assert!(!p.meta().debug());
        assert_eq!(p.scheduling_priority(), Priority::Low);
        assert_eq!(p.meta().priority(), 17);
    }

    #[test]
    fn test_echoes_links_trace() {
        let origin = Pulse::new(B);
        let p = Pulse::new(A).echoes(&origin);

        assert_eq!(p.meta().trace(), origin.meta().trace());
        let echoed = p.meta().echoes().unwrap();
        assert_eq!(echoed.id(), origin.id());
        assert_eq!(echoed.name(), "Pulse:B");
    }

    #[test]
    fn test_from_source() {
        let worker = Worker { id: Uuid::new_v4() };
        let p = Pulse::new(A).from_source(&worker);
        let source = p.meta().source().unwrap();
        assert_eq!(source.id(), worker.id);
        assert_eq!(source.name(), "Worker");
    }

    #[test]
    fn test_tag_semantics() {
        let p = Pulse::new(A).tagged(["a"]).tagged(["b"]);
        assert_eq!(p.meta().tags(), &tags(&["a", "b"]));

        let reset = Pulse::new(A).tagged(["a", "b"]).retagged(["c"]);
        assert_eq!(reset.meta().tags(), &tags(&["c"]));

        let noop = p.tagged(Vec::<String>::new());
        assert_eq!(noop.meta().tags(), p.meta().tags());

        let cleared = p.tagged_with(Vec::<String>::new(), true);
        assert!(cleared.meta().tags().is_empty());
    }

    #[test]
    fn test_like_adopts_metadata() {
        let worker = Worker { id: Uuid::new_v4() };
        let template = Pulse::new(B)
            .debug(true)
            .tagged(["t"])
            .from_source(&worker)
            .priority(Priority::Background);
        let p = Pulse::new(C { value: 3 });
        let adopted = p.like(&template);

        assert_eq!(adopted.meta(), template.meta());
        assert_eq!(adopted.data(), p.data());
        assert_eq!(adopted.id(), p.id());
    }

    #[test]
    fn test_causal_chain() {
        let p1 = Pulse::new(A).debug(true).tagged(["root"]).priority(Priority::High);
        let p2 = Pulse::respond(&p1, B);
        let p3 = Pulse::respond(&p2, C { value: 9 });

        assert_eq!(p1.meta().trace(), p2.meta().trace());
        assert_eq!(p2.meta().trace(), p3.meta().trace());
        assert_eq!(p2.meta().echoes().map(PulseSource::id), Some(p1.id()));
        assert_eq!(p3.meta().echoes().map(PulseSource::id), Some(p2.id()));

        assert_ne!(p2.id(), p1.id());
        assert!(!p2.meta().debug());
        assert!(p2.meta().tags().is_empty());
        assert_eq!(p2.scheduling_priority(), Priority::Medium);
        assert!(p2.meta().source().is_none());
    }

    #[test]
    fn test_respond_from_records_source() {
        let worker = Worker { id: Uuid::new_v4() };
        let request = Pulse::new(A);
        let reply = Pulse::respond_from(&request, B, &worker);

        assert_eq!(reply.meta().source().map(PulseSource::id), Some(worker.id));
        assert_eq!(reply.meta().echoes().map(PulseSource::id), Some(request.id()));
        assert_eq!(reply.meta().trace(), request.meta().trace());
    }

    #[test]
    fn test_pulse_json_roundtrip() {
        let worker = Worker { id: Uuid::new_v4() };
        let origin = Pulse::new(A);
        let p = Pulse::new(C { value: 42 })
            .echoes(&origin)
            .from_source(&worker)
            .tagged(["x", "y"])
            .priority(Priority::High)
            .debug(true);

        let json = serde_json::to_string(&p).unwrap();
        let back: Pulse<C> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert_eq!(back.timestamp(), p.timestamp());
    }
}
