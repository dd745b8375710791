// Shared router state
// Built once at startup and cloned into every handler; never mutated afterwards

use crate::polls::PollStore;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Source of the current time
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Main application state
#[derive(Clone)]
pub struct AppState {
    /// Poll store shared by all requests
    pub store: Arc<dyn PollStore>,
    /// Key required to create polls; `None` rejects every creation request
    admin_key: Option<Arc<str>>,
    clock: Clock,
}

impl AppState {
    /// Create state around an injected store, using the system clock
    pub fn new(store: Arc<dyn PollStore>, admin_key: Option<String>) -> Self {
        Self {
            store,
            admin_key: admin_key.map(Arc::from),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the clock (used to pin time in tests)
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the configured clock
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Check a presented admin credential against the configured key
    ///
    /// Always false when no key is configured.
    pub fn admin_key_matches(&self, presented: &str) -> bool {
        match &self.admin_key {
            Some(expected) => constant_time_eq(expected.as_bytes(), presented.as_bytes()),
            None => false,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("admin_key_configured", &self.admin_key.is_some())
            .finish_non_exhaustive()
    }
}

// Comparison time depends only on the lengths, not on where the bytes differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
