// Application state management
// Holds the injected poll store, the admin credential and the clock

/// Router state shared by all handlers
pub mod app_state;

pub use app_state::{AppState, Clock};
