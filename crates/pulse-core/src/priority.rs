//! Pulse priorities and priority-scoped task submission.
//!
//! Tokio has no native notion of task priority, so each delivery task carries
//! its pulse's priority in a task-local. Handlers read it back with
//! [`Priority::current`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use tokio::task::JoinHandle;

tokio::task_local! {
    static CURRENT_PRIORITY: Priority;
}

/// Scheduling priority of a pulse.
///
/// Stored in [`PulseMeta`](crate::PulseMeta) as its raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Priority {
    Background = 9,
    Low = 17,
    #[default]
    Medium = 21,
    High = 25,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Priority; 4] = [
        Priority::Background,
        Priority::Low,
        Priority::Medium,
        Priority::High,
    ];

    /// Raw value of this priority.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Map any raw value onto the highest priority not above it.
    ///
    /// Values below [`Priority::Background`] map to `Background`.
    #[must_use]
    pub fn from_raw(raw: u8) -> Self {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|p| p.raw() <= raw)
            .unwrap_or(Priority::Background)
    }

    /// Priority of the pulse task currently executing.
    ///
    /// Outside of a task started by [`spawn_at`] this is `Medium`.
    #[must_use]
    pub fn current() -> Self {
        CURRENT_PRIORITY.try_with(|p| *p).unwrap_or_default()
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            9 => Ok(Priority::Background),
            17 => Ok(Priority::Low),
            21 => Ok(Priority::Medium),
            25 => Ok(Priority::High),
            _ => Err("Invalid priority"),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Background => "background",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        f.write_str(name)
    }
}

impl FromStr for Priority {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "background" => Ok(Priority::Background),
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err("Unknown priority"),
        }
    }
}

/// Spawn a detached task that runs `future` at `priority`.
///
/// The priority is visible inside the task through [`Priority::current`]
/// and does not leak from the spawning task. Must be called from within a
/// tokio runtime.
pub fn spawn_at<F>(priority: Priority, future: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(CURRENT_PRIORITY.scope(priority, future))
}
