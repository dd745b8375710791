//! SQLite poll store
//!
//! Implements [`PollStore`] on top of an sqlx connection pool. Votes are
//! counted with a single conditional `UPDATE … RETURNING` statement, so SQLite
//! serializes concurrent votes on the same poll.

use crate::polls::models::{NewPoll, Poll, VoteChoice};
use crate::polls::store::{PollStore, StoreError, VoteOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// How long a writer waits for a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// `created_at` stays in SQL only, as a listing tie-breaker
const POLL_COLUMNS: &str =
    "id, title, description, yes_count, no_count, total_votes, closes_at";

/// Raw `polls` row; timestamps are Unix milliseconds
#[derive(Debug, FromRow)]
struct PollRow {
    id: String,
    title: String,
    description: String,
    yes_count: i64,
    no_count: i64,
    total_votes: i64,
    closes_at: i64,
}

impl TryFrom<PollRow> for Poll {
    type Error = StoreError;

    fn try_from(row: PollRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: &str| StoreError::Corrupt {
            id: row.id.clone(),
            reason: reason.to_string(),
        };

        let yes = u64::try_from(row.yes_count).map_err(|_| corrupt("negative yes count"))?;
        let no = u64::try_from(row.no_count).map_err(|_| corrupt("negative no count"))?;
        let total_votes =
            u64::try_from(row.total_votes).map_err(|_| corrupt("negative total votes"))?;
        let closes_at = DateTime::from_timestamp_millis(row.closes_at)
            .ok_or_else(|| corrupt("closing time out of range"))?;

        Ok(Poll {
            id: row.id,
            title: row.title,
            description: row.description,
            yes,
            no,
            total_votes,
            closes_at,
        })
    }
}

/// Poll store backed by SQLite
#[derive(Clone)]
pub struct SqlitePollStore {
    pool: SqlitePool,
}

impl SqlitePollStore {
    /// Connect to the database and apply migrations
    ///
    /// # Arguments
    /// * `database_url` - `sqlite:` URL or bare path to the database file
    /// * `max_connections` - Pool size
    ///
    /// # Returns
    /// * `Ok(SqlitePollStore)` if successful
    /// * `Err(StoreError)` if connection or migration failed
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let connection_string = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite:{}", database_url)
        };

        // Ensure parent directory exists
        if let Some(path) = database_file(&connection_string) {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::from_str(&connection_string)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        info!("Connected to SQLite database at: {}", database_url);

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Connect to `primary`, falling back to `fallback` if that fails
    pub async fn connect_with_fallback(
        primary: &str,
        fallback: Option<&str>,
        max_connections: u32,
    ) -> Result<Self, StoreError> {
        match Self::connect(primary, max_connections).await {
            Ok(store) => Ok(store),
            Err(e) => {
                error!("Poll store connection failed for {}: {}", primary, e);
                let Some(fallback) = fallback else {
                    return Err(e);
                };
                warn!("Falling back to local poll store at {}", fallback);
                Self::connect(fallback, max_connections).await
            }
        }
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), StoreError> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../../migrations/001_create_polls.sql");

        for statement in migration_statements(migration_sql) {
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    StoreError::Migration(format!(
                        "{} - Statement: {}",
                        e,
                        statement.chars().take(100).collect::<String>()
                    ))
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }
}

/// Split a migration script into statements, dropping `--` comments
fn migration_statements(sql: &str) -> Vec<String> {
    let mut cleaned_sql = String::new();
    for line in sql.lines() {
        let without_comments = match line.find("--") {
            Some(pos) => &line[..pos],
            None => line,
        };
        let trimmed = without_comments.trim();
        if trimmed.is_empty() {
            continue;
        }
        cleaned_sql.push_str(trimmed);
        cleaned_sql.push(' ');
    }

    cleaned_sql
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// File path behind a `sqlite:` URL, or `None` for in-memory databases
fn database_file(connection_string: &str) -> Option<PathBuf> {
    let path = connection_string.strip_prefix("sqlite:")?;
    let path = path.strip_prefix("//").unwrap_or(path);
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(PathBuf::from(path))
}

#[async_trait]
impl PollStore for SqlitePollStore {
    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Poll>, StoreError> {
        let rows = sqlx::query_as::<_, PollRow>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls WHERE closes_at >= ? \
             ORDER BY closes_at ASC, created_at ASC"
        ))
        .bind(now.timestamp_millis())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Poll::try_from).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Poll>, StoreError> {
        let row = sqlx::query_as::<_, PollRow>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Poll::try_from).transpose()
    }

    async fn create(&self, poll: NewPoll) -> Result<Poll, StoreError> {
        let id = Uuid::new_v4().to_string();

        let row = sqlx::query_as::<_, PollRow>(&format!(
            "INSERT INTO polls (id, title, description, closes_at, created_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {POLL_COLUMNS}"
        ))
        .bind(&id)
        .bind(&poll.title)
        .bind(&poll.description)
        .bind(poll.closes_at.timestamp_millis())
        .bind(poll.created_at.timestamp_millis())
        .fetch_one(&self.pool)
        .await?;

        debug!("Created poll: {}", id);
        Poll::try_from(row)
    }

    async fn record_vote(
        &self,
        id: &str,
        choice: VoteChoice,
        now: DateTime<Utc>,
    ) -> Result<VoteOutcome, StoreError> {
        let counter = match choice {
            VoteChoice::Yes => "yes_count",
            VoteChoice::No => "no_count",
        };

        let updated = sqlx::query_as::<_, PollRow>(&format!(
            "UPDATE polls SET {counter} = {counter} + 1, total_votes = total_votes + 1 \
             WHERE id = ? AND closes_at > ? RETURNING {POLL_COLUMNS}"
        ))
        .bind(id)
        .bind(now.timestamp_millis())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            debug!("Recorded {} vote for poll {}", choice, id);
            return Ok(VoteOutcome::Recorded(Poll::try_from(row)?));
        }

        // Nothing matched: either the poll is missing or its window has ended
        unmatched_vote_outcome(id, self.get(id).await?, now)
    }
}

/// Explain why the conditional vote update matched no row
fn unmatched_vote_outcome(
    id: &str,
    poll: Option<Poll>,
    now: DateTime<Utc>,
) -> Result<VoteOutcome, StoreError> {
    match poll {
        None => Ok(VoteOutcome::NotFound),
        Some(poll) if !poll.is_open_at(now) => Ok(VoteOutcome::Closed(poll)),
        Some(_) => Err(StoreError::VoteNotApplied(id.to_string())),
    }
}
