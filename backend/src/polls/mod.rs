//! Polls module
//!
//! Poll records, the store port and its SQLite implementation.

/// SQLite implementation of the store
pub mod db;
/// Poll records and vote choices
pub mod models;
/// Store port and errors
pub mod store;

pub use db::SqlitePollStore;
pub use models::{NewPoll, Poll, PollId, PollStatus, VoteChoice};
pub use store::{PollStore, StoreError, VoteOutcome};
