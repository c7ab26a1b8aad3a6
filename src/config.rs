//! Root configuration.
//!
//! ```ignore
//! let config = RootConfig::default()
//!     .time_slice(Duration::from_millis(8))
//!     .event_system(EventSystem::Direct);
//! let root = create_root_with_config(host, container, config);
//! ```

use std::time::Duration;

use crate::events::TRACKED_EVENTS;

/// Default wall-clock budget of one scheduler slice.
pub const DEFAULT_TIME_SLICE: Duration = Duration::from_millis(5);

/// How handler props reach the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventSystem {
    /// One listener per tracked event type on the container. Handler prop
    /// changes never touch the host.
    #[default]
    Delegated,
    /// Every handler prop becomes a native listener on its own host node.
    Direct,
}

/// Settings of one root.
#[derive(Debug, Clone, PartialEq)]
pub struct RootConfig {
    pub time_slice: Duration,
    pub tracked_events: Vec<String>,
    pub event_system: EventSystem,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            time_slice: DEFAULT_TIME_SLICE,
            tracked_events: TRACKED_EVENTS.iter().map(|e| e.to_string()).collect(),
            event_system: EventSystem::Delegated,
        }
    }
}

impl RootConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_slice(mut self, slice: Duration) -> Self {
        self.time_slice = slice;
        self
    }

    /// Replace the native event types installed by `listen_to_all_events`.
    pub fn tracked_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tracked_events = events.into_iter().map(Into::into).collect();
        self
    }

    pub fn event_system(mut self, system: EventSystem) -> Self {
        self.event_system = system;
        self
    }
}
