//! Poll data models
//!
//! Defines the poll record, the accepted vote choices and the derived
//! open/closed status.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a poll
pub type PollId = String;

/// Milliseconds in one hour
const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// A single yes/no poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    /// Store-assigned identifier
    #[serde(rename = "_id", alias = "id")]
    pub id: PollId,
    /// Poll title
    pub title: String,
    /// Poll description
    pub description: String,
    /// Number of "yes" votes
    pub yes: u64,
    /// Number of "no" votes
    pub no: u64,
    /// Always `yes + no`
    pub total_votes: u64,
    /// End of the voting window
    pub closes_at: DateTime<Utc>,
}

impl Poll {
    /// Derive the poll status at `now`
    pub fn status_at(&self, now: DateTime<Utc>) -> PollStatus {
        if now < self.closes_at {
            PollStatus::Open
        } else {
            PollStatus::Closed
        }
    }

    /// Whether votes are accepted at `now`
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == PollStatus::Open
    }
}

/// Open/closed state of a poll, derived from `closes_at` and never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// Votes are accepted
    Open,
    /// The voting window has ended
    Closed,
}

/// A validated poll that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewPoll {
    /// Poll title (non-empty)
    pub title: String,
    /// Poll description (non-empty)
    pub description: String,
    /// End of the voting window
    pub closes_at: DateTime<Utc>,
    /// When the poll was created
    pub created_at: DateTime<Utc>,
}

impl NewPoll {
    /// Build a poll that closes `duration_hours` after `now`
    ///
    /// # Returns
    /// * `Ok(NewPoll)` with trimmed title and description
    /// * `Err(String)` if a field is blank or the duration is not a positive number
    pub fn open_for(
        title: &str,
        description: &str,
        duration_hours: f64,
        now: DateTime<Utc>,
    ) -> Result<Self, String> {
        let title = title.trim();
        let description = description.trim();
        if title.is_empty() {
            return Err("Poll title cannot be empty".to_string());
        }
        if description.is_empty() {
            return Err("Poll description cannot be empty".to_string());
        }

        let duration = hours_to_duration(duration_hours)
            .ok_or_else(|| format!("Invalid poll duration: {} hours", duration_hours))?;
        let closes_at = now
            .checked_add_signed(duration)
            .ok_or_else(|| format!("Poll duration out of range: {} hours", duration_hours))?;

        Ok(Self {
            title: title.to_string(),
            description: description.to_string(),
            closes_at,
            created_at: now,
        })
    }
}

fn hours_to_duration(hours: f64) -> Option<Duration> {
    if !hours.is_finite() || hours <= 0.0 {
        return None;
    }
    let millis = (hours * MILLIS_PER_HOUR).round();
    if millis < 1.0 || millis > i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64)
}

/// A single vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChoice {
    /// Vote in favour
    Yes,
    /// Vote against
    No,
}

impl VoteChoice {
    /// Convert the choice to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::Yes => "yes",
            VoteChoice::No => "no",
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not exactly `"yes"` or `"no"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidChoice;

impl FromStr for VoteChoice {
    type Err = InvalidChoice;

    // Case-sensitive: only the two literals are accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(VoteChoice::Yes),
            "no" => Ok(VoteChoice::No),
            _ => Err(InvalidChoice),
        }
    }
}
