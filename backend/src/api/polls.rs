//! Poll API handlers
//!
//! Listing active polls, casting votes and creating polls. Each handler
//! validates its input before touching the store and re-reads every poll from
//! the store; nothing is cached between requests.

use crate::error::{AppError, ListError};
use crate::polls::{NewPoll, Poll, PollId, VoteChoice, VoteOutcome};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Vote request body
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    /// Must be "yes" or "no"; anything else is rejected
    #[serde(default)]
    pub choice: Option<String>,
}

/// Vote response
#[derive(Debug, Serialize)]
pub struct VoteResponse {
    /// Always true for a recorded vote
    pub success: bool,
    /// Human-readable confirmation
    pub message: String,
    /// Poll after the vote was counted
    pub vote: Poll,
}

/// Create poll request body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    /// Poll title
    #[serde(default)]
    pub title: Option<String>,
    /// Poll description
    #[serde(default)]
    pub description: Option<String>,
    /// How long the poll stays open, in hours
    #[serde(default)]
    pub duration_hours: Option<f64>,
}

/// Create poll response
#[derive(Debug, Serialize)]
pub struct CreatePollResponse {
    /// Always true for a created poll
    pub success: bool,
    /// The stored poll, including its assigned id
    pub vote: Poll,
}

/// GET /api/votes - List open polls, soonest-closing first
pub async fn list_polls(State(state): State<AppState>) -> Result<Json<Vec<Poll>>, ListError> {
    let polls = state
        .store
        .list_active(state.now())
        .await
        .map_err(AppError::store("Failed to fetch votes"))?;

    Ok(Json(polls))
}

/// POST /api/votes/:id - Cast a vote
pub async fn submit_vote(
    State(state): State<AppState>,
    Path(id): Path<PollId>,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteResponse>, AppError> {
    let choice = parse_choice(body)?;

    let outcome = state
        .store
        .record_vote(&id, choice, state.now())
        .await
        .map_err(AppError::store("Failed to submit vote"))?;

    match outcome {
        VoteOutcome::Recorded(poll) => {
            info!(
                poll_id = %poll.id,
                choice = %choice,
                total_votes = poll.total_votes,
                "Vote recorded"
            );
            Ok(Json(VoteResponse {
                success: true,
                message: "Vote recorded".to_string(),
                vote: poll,
            }))
        }
        VoteOutcome::NotFound => Err(AppError::PollNotFound(id)),
        VoteOutcome::Closed(_) => Err(AppError::VotingClosed(id)),
    }
}

/// POST /api/votes/create - Create a poll (admin only, see [`crate::api::auth`])
pub async fn create_poll(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CreatePollResponse>, AppError> {
    let request = parse_create_body(&headers, &body)?;
    let new_poll = validate_create_request(&request, &state)?;

    let poll = state
        .store
        .create(new_poll)
        .await
        .map_err(AppError::store("Failed to create vote"))?;

    info!(poll_id = %poll.id, closes_at = %poll.closes_at, "Poll created");

    Ok(Json(CreatePollResponse {
        success: true,
        vote: poll,
    }))
}

// A malformed body or missing field counts as an invalid choice
fn parse_choice(body: Result<Json<VoteRequest>, JsonRejection>) -> Result<VoteChoice, AppError> {
    let Ok(Json(request)) = body else {
        return Err(AppError::InvalidChoice);
    };

    request
        .choice
        .as_deref()
        .and_then(|choice| choice.parse().ok())
        .ok_or(AppError::InvalidChoice)
}

// An empty or non-JSON body reads as `{}`, so it fails as missing fields
fn parse_create_body(headers: &HeaderMap, body: &[u8]) -> Result<CreatePollRequest, AppError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_ascii_lowercase())
        .is_some_and(|value| value.starts_with("application/json"));

    if !is_json || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CreatePollRequest::default());
    }

    serde_json::from_slice(body).map_err(|e| AppError::InvalidBody(e.to_string()))
}

fn validate_create_request(
    request: &CreatePollRequest,
    state: &AppState,
) -> Result<NewPoll, AppError> {
    let (Some(title), Some(description), Some(duration_hours)) = (
        request.title.as_deref(),
        request.description.as_deref(),
        request.duration_hours,
    ) else {
        return Err(AppError::MissingFields(
            "title, description and durationHours are required".to_string(),
        ));
    };

    NewPoll::open_for(title, description, duration_hours, state.now())
        .map_err(AppError::MissingFields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polls::{PollStore, SqlitePollStore, StoreError};
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    async fn create_test_state(now: DateTime<Utc>) -> (AppState, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polls.db");
        let store = SqlitePollStore::connect(path.to_str().unwrap(), 5)
            .await
            .unwrap();
        let state = AppState::new(Arc::new(store), Some("key".to_string()))
            .with_clock(Arc::new(move || now));
        (state, dir)
    }

    fn create_request(title: &str, description: &str, hours: Option<f64>) -> Value {
        json!({ "title": title, "description": description, "durationHours": hours })
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    async fn create(state: &AppState, body: Value) -> Result<Json<CreatePollResponse>, AppError> {
        let body = Bytes::from(body.to_string());
        create_poll(State(state.clone()), json_headers(), body).await
    }

    fn vote(choice: &str) -> Result<Json<VoteRequest>, JsonRejection> {
        Ok(Json(VoteRequest {
            choice: Some(choice.to_string()),
        }))
    }

    struct FailingStore;

    #[async_trait]
    impl PollStore for FailingStore {
        async fn list_active(&self, _now: DateTime<Utc>) -> Result<Vec<Poll>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn get(&self, _id: &str) -> Result<Option<Poll>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn create(&self, _poll: NewPoll) -> Result<Poll, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn record_vote(
            &self,
            _id: &str,
            _choice: VoteChoice,
            _now: DateTime<Utc>,
        ) -> Result<VoteOutcome, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn test_list_polls_empty() {
        let (state, _dir) = create_test_state(t0()).await;
        let Json(polls) = list_polls(State(state)).await.unwrap();
        assert!(polls.is_empty());
    }

    #[tokio::test]
    async fn test_create_poll() {
        let (state, _dir) = create_test_state(t0()).await;
        let request = create_request("T", "D", Some(1.0));

        let Json(response) = create(&state, request).await.unwrap();
        assert!(response.success);
        assert_eq!(response.vote.title, "T");
        assert_eq!(response.vote.yes, 0);
        assert_eq!(response.vote.no, 0);
        assert_eq!(response.vote.total_votes, 0);
        assert_eq!(response.vote.closes_at, t0() + Duration::hours(1));

        let Json(polls) = list_polls(State(state)).await.unwrap();
        assert_eq!(polls, vec![response.vote]);
    }

    #[tokio::test]
    async fn test_create_poll_missing_fields() {
        let (state, _dir) = create_test_state(t0()).await;

        let cases = vec![
            create_request("T", "D", None),
            create_request("", "D", Some(1.0)),
            create_request("T", "  ", Some(1.0)),
            create_request("T", "D", Some(0.0)),
            create_request("T", "D", Some(-2.0)),
            json!({ "description": "D", "durationHours": 1.0 }),
        ];

        for request in cases {
            let result = create(&state, request).await;
            match result.unwrap_err() {
                AppError::MissingFields(_) => {}
                other => panic!("Expected MissingFields error, got: {:?}", other),
            }
        }

        let Json(polls) = list_polls(State(state)).await.unwrap();
        assert!(polls.is_empty());
    }

    #[tokio::test]
    async fn test_vote_scenario() {
        let (state, _dir) = create_test_state(t0()).await;
        let Json(created) = create(&state, create_request("T", "D", Some(1.0)))
            .await
            .unwrap();
        let id = created.vote.id.clone();

        let Json(response) = submit_vote(State(state.clone()), Path(id.clone()), vote("yes"))
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.message, "Vote recorded");
        assert_eq!(response.vote.yes, 1);
        assert_eq!(response.vote.no, 0);
        assert_eq!(response.vote.total_votes, 1);

        // Same store, one second past the closing time
        let later = t0() + Duration::hours(1) + Duration::seconds(1);
        let late_state = state.clone().with_clock(Arc::new(move || later));
        let result = submit_vote(State(late_state), Path(id.clone()), vote("yes")).await;
        match result.unwrap_err() {
            AppError::VotingClosed(closed_id) => assert_eq!(closed_id, id),
            other => panic!("Expected VotingClosed error, got: {:?}", other),
        }

        let poll = state.store.get(&id).await.unwrap().unwrap();
        assert_eq!((poll.yes, poll.no, poll.total_votes), (1, 0, 1));
    }

    #[tokio::test]
    async fn test_invalid_choice_leaves_counters_unchanged() {
        let (state, _dir) = create_test_state(t0()).await;
        let Json(created) = create(&state, create_request("T", "D", Some(1.0)))
            .await
            .unwrap();
        let id = created.vote.id;

        for choice in ["maybe", "Yes", ""] {
            let result = submit_vote(State(state.clone()), Path(id.clone()), vote(choice)).await;
            assert!(matches!(result, Err(AppError::InvalidChoice)));
        }
        let missing = Ok(Json(VoteRequest { choice: None }));
        let result = submit_vote(State(state.clone()), Path(id.clone()), missing).await;
        assert!(matches!(result, Err(AppError::InvalidChoice)));

        let poll = state.store.get(&id).await.unwrap().unwrap();
        assert_eq!((poll.yes, poll.no, poll.total_votes), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_invalid_choice_checked_before_lookup() {
        let (state, _dir) = create_test_state(t0()).await;
        let result = submit_vote(State(state), Path("missing".to_string()), vote("maybe")).await;
        assert!(matches!(result, Err(AppError::InvalidChoice)));
    }

    #[tokio::test]
    async fn test_vote_poll_not_found() {
        let (state, _dir) = create_test_state(t0()).await;
        let result = submit_vote(State(state), Path("missing".to_string()), vote("no")).await;
        match result.unwrap_err() {
            AppError::PollNotFound(id) => assert_eq!(id, "missing"),
            other => panic!("Expected PollNotFound error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_store_failures_map_to_store_errors() {
        let state = AppState::new(Arc::new(FailingStore), Some("key".to_string()));

        let ListError(error) = list_polls(State(state.clone())).await.unwrap_err();
        assert_eq!(error.to_string(), "Failed to fetch votes");

        let error = submit_vote(State(state.clone()), Path("p".to_string()), vote("yes"))
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Failed to submit vote");

        let error = create(&state, create_request("T", "D", Some(1.0)))
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Failed to create vote");
    }

    #[tokio::test]
    async fn test_create_poll_without_json_body() {
        let (state, _dir) = create_test_state(t0()).await;
        let valid = Bytes::from(create_request("T", "D", Some(1.0)).to_string());

        let cases = vec![
            (json_headers(), Bytes::new()),
            (json_headers(), Bytes::from_static(b"  \n")),
            (HeaderMap::new(), valid.clone()),
        ];
        for (headers, body) in cases {
            let result = create_poll(State(state.clone()), headers, body).await;
            match result.unwrap_err() {
                AppError::MissingFields(_) => {}
                other => panic!("Expected MissingFields error, got: {:?}", other),
            }
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("Application/JSON; charset=utf-8"),
        );
        let Json(response) = create_poll(State(state.clone()), headers, valid)
            .await
            .unwrap();
        assert_eq!(response.vote.title, "T");

        let result = create_poll(State(state), json_headers(), Bytes::from("{not json")).await;
        match result.unwrap_err() {
            AppError::InvalidBody(_) => {}
            other => panic!("Expected InvalidBody error, got: {:?}", other),
        }
    }
}
