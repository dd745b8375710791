//! Voting Service Library
//!
//! HTTP API for yes/no polls: list active polls, cast votes and create polls
//! with an admin key. The main binary is in `src/main.rs`.

pub mod api;
pub mod config;
pub mod error;
pub mod polls;
pub mod server;
/// Application state management
///
/// Holds the injected poll store, admin credential and clock.
pub mod state;
