//! HTTP request handlers for the HackDuel server.
//!
//! Thin axum layer over the engine: pair selection, voting, leaderboards,
//! archiving and health.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use hackduel_domain::{Entry, EntryId, MatchOutcome};
use hackduel_engine::{Engine, EngineError, Leaderboard, VoteResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Rating and matchmaking engine
    pub engine: Arc<Engine>,
}

/// Query for `GET /projects/next-pair`
#[derive(Debug, Default, Deserialize)]
pub struct PairQuery {
    /// Category scope; absent or "All" for the whole pool
    pub category: Option<String>,
    /// Judge session, used to avoid repeating pairs
    pub session: Option<String>,
}

/// Two entries to compare
#[derive(Debug, Serialize, Deserialize)]
pub struct PairResponse {
    /// Shown first
    pub entry_a: Entry,
    /// Shown second
    pub entry_b: Entry,
}

/// Body of `POST /vote`
#[derive(Debug, Serialize, Deserialize)]
pub struct VoteRequest {
    /// Entry judged better
    pub winner_id: EntryId,
    /// Entry judged worse
    pub loser_id: EntryId,
}

/// Query for `GET /leaderboard`
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    /// Category scope
    pub category: Option<String>,
    /// Maximum entries returned
    pub limit: Option<usize>,
}

/// Query for `GET /archived`
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    /// Category scope
    pub category: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// "healthy", or "degraded" once any write has been abandoned
    pub status: String,
    /// Entries in memory
    pub project_count: usize,
    /// Entries in the active pool
    pub active_count: usize,
    /// Flushes waiting for the sync worker
    pub pending_flushes: usize,
    /// Writes abandoned after retries
    pub durability_gaps: u64,
}

/// Response of `POST /reset-rankings`
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    /// Entries put back at the initial rating
    pub reset: usize,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Rejected engine operation
    Engine(EngineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Engine(e) = self;
        let status = match &e {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::InvalidEntry(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::EmptyPool | EngineError::Conflict { .. } => StatusCode::CONFLICT,
            EngineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse { error: e.to_string() });
        (status, body).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        AppError::Engine(e)
    }
}

/// GET /projects/next-pair - Next comparison for a judge
async fn next_pair(
    State(state): State<AppState>,
    Query(query): Query<PairQuery>,
) -> Result<Json<PairResponse>, AppError> {
    let (entry_a, entry_b) = state
        .engine
        .next_pair(query.category.as_deref(), query.session.as_deref())?;
    Ok(Json(PairResponse { entry_a, entry_b }))
}

/// POST /vote - Record a comparison
async fn vote(
    State(state): State<AppState>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResult>, AppError> {
    let outcome = MatchOutcome::now(request.winner_id, request.loser_id);
    Ok(Json(state.engine.vote(&outcome)?))
}

/// GET /leaderboard - Ranked active entries with confidence
async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<Leaderboard> {
    Json(state.engine.leaderboard(query.category.as_deref(), query.limit))
}

/// GET /projects/:id - One entry
async fn get_project(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Entry>, AppError> {
    Ok(Json(state.engine.get(&EntryId::new(id))?))
}

/// POST /projects/:id/archive - Remove an entry from the active pool
async fn archive_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Entry>, AppError> {
    Ok(Json(state.engine.archive(&EntryId::new(id))?))
}

/// GET /archived - Archived entries
async fn archived(State(state): State<AppState>, Query(query): Query<CategoryQuery>) -> Json<Vec<Entry>> {
    Json(state.engine.archived(query.category.as_deref()))
}

/// POST /reset-rankings - Put every entry back at the initial rating
async fn reset_rankings(State(state): State<AppState>) -> Json<ResetResponse> {
    Json(ResetResponse {
        reset: state.engine.reset_ratings(),
    })
}

/// GET /health - Pool size and write-behind state
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    let health = state.engine.health();

    let status = if health.durability_gaps == 0 { "healthy" } else { "degraded" };

    Json(HealthCheckResponse {
        status: status.to_string(),
        project_count: health.project_count,
        active_count: health.active_count,
        pending_flushes: health.pending_flushes,
        durability_gaps: health.durability_gaps,
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/projects/next-pair", get(next_pair))
        .route("/projects/:id", get(get_project))
        .route("/projects/:id/archive", post(archive_project))
        .route("/vote", post(vote))
        .route("/leaderboard", get(leaderboard))
        .route("/archived", get(archived))
        .route("/reset-rankings", post(reset_rankings))
        .route("/health", get(health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use hackduel_domain::{EntryMetadata, RatingConfig};
    use hackduel_engine::{EngineConfig, EntryStore};
    use hackduel_sync::{FlushQueue, FlushReceiver, SyncConfig};
    use tower::ServiceExt; // for oneshot

    fn create_test_state() -> (AppState, FlushReceiver) {
        let config = RatingConfig::default();
        let store = Arc::new(EntryStore::new());
        store
            .insert_many(vec![
                Entry::new(EntryId::new("1"), "AI", EntryMetadata::titled("Rover"), &config),
                Entry::new(EntryId::new("2"), "AI", EntryMetadata::titled("Lander"), &config),
            ])
            .unwrap();
        let (queue, receiver) = FlushQueue::channel(&SyncConfig::default());
        let engine = Arc::new(Engine::new(store, queue, EngineConfig::default()));
        (AppState { engine }, receiver)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (state, _receiver) = create_test_state();
        let app = create_router(state);

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_project_is_404() {
        let (state, _receiver) = create_test_state();
        let app = create_router(state);

        let request = Request::builder()
            .uri("/projects/999")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_self_vote_is_422() {
        let (state, _receiver) = create_test_state();
        let app = create_router(state);

        let request = Request::builder()
            .method("POST")
            .uri("/vote")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"winner_id": "1", "loser_id": "1"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (EngineError::NotFound(EntryId::new("x")), StatusCode::NOT_FOUND),
            (EngineError::InvalidEntry("x".to_string()), StatusCode::UNPROCESSABLE_ENTITY),
            (EngineError::EmptyPool, StatusCode::CONFLICT),
            (
                EngineError::Conflict {
                    id: EntryId::new("x"),
                    expected: 1,
                    actual: 2,
                },
                StatusCode::CONFLICT,
            ),
            (EngineError::Config("x".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(AppError::from(error).into_response().status(), status);
        }
    }
}
