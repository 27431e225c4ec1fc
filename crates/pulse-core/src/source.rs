//! Identity of the entities pulses come from.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An entity with a stable identity and a human-readable name.
///
/// Anything that can originate a pulse, or be echoed by one, implements this.
pub trait Representable {
    /// Stable unique identifier. Repeated calls return the same value.
    fn id(&self) -> Uuid;

    /// Human-readable name.
    fn name(&self) -> String;

    /// `name:id`.
    fn description(&self) -> String {
        format!("{}:{}", self.name(), self.id())
    }
}

/// Snapshot of a [`Representable`]'s identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PulseSource {
    id: Uuid,
    name: String,
}

impl PulseSource {
    /// Capture the identity of `entity`.
    #[must_use]
    pub fn from<R: Representable + ?Sized>(entity: &R) -> Self {
        Self {
            id: entity.id(),
            name: entity.name(),
        }
    }

    /// Identifier of the captured entity.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the captured entity.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Representable for PulseSource {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

impl fmt::Display for PulseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.id)
    }
}

/// Short, path-free name of `T`, e.g. `Vec<String>` instead of
/// `alloc::vec::Vec<alloc::string::String>`.
pub(crate) fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            segment.push(c);
        } else {
            out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
    out
}
