//! Poll store port
//!
//! The request handlers only talk to the store through [`PollStore`], so the
//! concrete backend is chosen once at startup and injected into the router.

use crate::polls::models::{NewPoll, Poll, VoteChoice};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by a poll store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying database call failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Preparing the database location failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Applying the schema failed
    #[error("Migration failed: {0}")]
    Migration(String),

    /// The poll is open but the vote update matched no row
    #[error("Vote for open poll {0} was not applied")]
    VoteNotApplied(String),

    /// A stored row could not be turned into a poll
    #[error("Corrupt poll record {id}: {reason}")]
    Corrupt {
        /// Identifier of the offending row
        id: String,
        /// What was wrong with it
        reason: String,
    },
}

/// Outcome of an atomic vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote was counted; holds the poll after the increment
    Recorded(Poll),
    /// No poll has the given identifier
    NotFound,
    /// The poll exists but its voting window has ended
    Closed(Poll),
}

/// Persistent poll storage
#[async_trait]
pub trait PollStore: Send + Sync {
    /// All polls with `closes_at >= now`, soonest-closing first
    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Poll>, StoreError>;

    /// Fetch a poll by identifier
    ///
    /// Returns `Ok(None)` if no poll exists.
    async fn get(&self, id: &str) -> Result<Option<Poll>, StoreError>;

    /// Persist a new poll with zeroed counters and return it with its assigned id
    async fn create(&self, poll: NewPoll) -> Result<Poll, StoreError>;

    /// Count one vote for `choice` if the poll exists and `now < closes_at`
    ///
    /// The chosen counter and `total_votes` are incremented in a single atomic
    /// store operation, so concurrent votes are never lost.
    async fn record_vote(
        &self,
        id: &str,
        choice: VoteChoice,
        now: DateTime<Utc>,
    ) -> Result<VoteOutcome, StoreError>;
}
