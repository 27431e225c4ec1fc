//! Metadata carried by every pulse.

use crate::priority::Priority;
use crate::source::PulseSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Immutable metadata bundle attached to a [`Pulse`](crate::Pulse).
///
/// Changes are made by [`PulseMeta::fluently`], which always returns a new
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PulseMeta {
    debug: bool,
    trace: Uuid,
    source: Option<PulseSource>,
    echoes: Option<PulseSource>,
    priority: u8,
    tags: BTreeSet<String>,
}

impl Default for PulseMeta {
    fn default() -> Self {
        Self {
            debug: false,
            trace: Uuid::new_v4(),
            source: None,
            echoes: None,
            priority: Priority::Medium.raw(),
            tags: BTreeSet::new(),
        }
    }
}

impl PulseMeta {
    /// Default metadata with a fresh trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata built from `overrides`; anything not overridden is default.
    #[must_use]
    pub fn with(overrides: MetaOverrides) -> Self {
        Self::default().fluently(overrides)
    }

    /// Copy of `self` with the supplied fields replaced.
    ///
    /// Also usable in associated form: `PulseMeta::fluently(&meta, overrides)`.
    #[must_use]
    pub fn fluently(&self, overrides: MetaOverrides) -> Self {
        let MetaOverrides {
            debug,
            trace,
            source,
            echoes,
            priority,
            tags,
        } = overrides;

        Self {
            debug: debug.unwrap_or(self.debug),
            trace: trace.unwrap_or(self.trace),
            source: source.or_else(|| self.source.clone()),
            echoes: echoes.or_else(|| self.echoes.clone()),
            priority: priority.unwrap_or(self.priority),
            tags: tags.unwrap_or_else(|| self.tags.clone()),
        }
    }

    /// Whether the pulse is flagged for debugging.
    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Identifier shared by every pulse in a causal chain.
    #[must_use]
    pub fn trace(&self) -> Uuid {
        self.trace
    }

    /// Entity the pulse was sent from, if recorded.
    #[must_use]
    pub fn source(&self) -> Option<&PulseSource> {
        self.source.as_ref()
    }

    /// Pulse this one was produced in response to, if any.
    #[must_use]
    pub fn echoes(&self) -> Option<&PulseSource> {
        self.echoes.as_ref()
    }

    /// Raw priority value.
    #[must_use]
    pub fn priority(&self) -> u8 {
        self.priority
    }

    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

/// Field overrides for [`PulseMeta::fluently`] and [`PulseMeta::with`].
///
/// Unset fields leave the receiver's value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaOverrides {
    debug: Option<bool>,
    trace: Option<Uuid>,
    source: Option<PulseSource>,
    echoes: Option<PulseSource>,
    priority: Option<u8>,
    tags: Option<BTreeSet<String>>,
}

impl MetaOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    #[must_use]
    pub fn trace(mut self, trace: Uuid) -> Self {
        self.trace = Some(trace);
        self
    }

    #[must_use]
    pub fn source(mut self, source: PulseSource) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn echoes(mut self, echoes: PulseSource) -> Self {
        self.echoes = Some(echoes);
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority.raw());
        self
    }

    /// Override the raw priority value directly.
    #[must_use]
    pub fn raw_priority(mut self, raw: u8) -> Self {
        self.priority = Some(raw);
        self
    }

    /// Replace the whole tag set.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// True if no field is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
