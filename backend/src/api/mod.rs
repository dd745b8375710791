//! API module
//!
//! Contains HTTP request handlers for the voting endpoints

/// Admin-key middleware
pub mod auth;
/// Liveness endpoint
pub mod health;
/// Poll listing, voting and creation
pub mod polls;
