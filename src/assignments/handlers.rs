use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{
    assignments::{
        dto::{
            AssignmentDetail, AssignmentListItem, AssignmentStatusResponse, CourseQuery, ListQuery,
            SolveMode, SolveRequest, SolveResponse,
        },
        services::{self, ListFilter},
    },
    auth::{handlers::record, CurrentSession},
    db::Action,
    error::ApiError,
    state::AppState,
};

pub fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/:assignment_hash", get(detail))
        .route("/:assignment_hash/solve", post(solve))
        .route("/:assignment_hash/status", get(status))
}

#[instrument(skip(state, session))]
pub async fn list(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AssignmentListItem>>, ApiError> {
    let limit = query
        .limit()
        .ok_or_else(|| ApiError::BadRequest("limit must be between 1 and 500".into()))?;
    let filter = ListFilter {
        course_hash: query.course_hash.as_deref(),
        status: query.status.as_deref(),
        difficulty: query.difficulty.as_deref(),
        limit,
    };
    let items = services::list_assignments(state.platform.as_ref(), session.jar(), &filter).await?;
    Ok(Json(items))
}

#[instrument(skip(state, session))]
pub async fn detail(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(assignment_hash): Path<String>,
    Query(query): Query<CourseQuery>,
) -> Result<Json<AssignmentDetail>, ApiError> {
    let detail = services::assignment_detail(
        state.platform.as_ref(),
        session.jar(),
        &query.course_hash,
        &assignment_hash,
    )
    .await?;
    Ok(Json(detail))
}

#[instrument(skip(state, session, payload))]
pub async fn solve(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(assignment_hash): Path<String>,
    Query(query): Query<CourseQuery>,
    Json(payload): Json<SolveRequest>,
) -> Result<Json<SolveResponse>, ApiError> {
    let solver = state.solver()?;
    if payload.mode == SolveMode::AutoSubmit {
        warn!(email = %session.user_email, "auto_submit requested; refusing");
        return Err(ApiError::BadRequest(
            "automatic submission is not supported; use learning mode".into(),
        ));
    }

    let outcome = services::solve_assignment(
        state.platform.as_ref(),
        solver,
        session.jar(),
        &query.course_hash,
        &assignment_hash,
        payload.questions.as_deref(),
    )
    .await?;

    let solved = outcome.results.iter().filter(|r| r.solved).count();
    record(
        &state,
        &session.user_email,
        Action::SolveAssignment,
        json!({
            "course_hash": query.course_hash,
            "assignment_hash": assignment_hash,
            "assessment_hash": outcome.assessment_hash,
            "mode": "learning",
            "questions_solved": solved,
            "xp": outcome.xp,
        }),
    )
    .await;

    info!(solved, total = outcome.results.len(), "assignment solved");
    Ok(Json(SolveResponse {
        status: "completed".into(),
        mode: "learning".into(),
        results: outcome.results,
    }))
}

#[instrument(skip(state, session))]
pub async fn status(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(assignment_hash): Path<String>,
    Query(query): Query<CourseQuery>,
) -> Result<Json<AssignmentStatusResponse>, ApiError> {
    let status = services::assignment_status(
        state.platform.as_ref(),
        session.jar(),
        &query.course_hash,
        &assignment_hash,
    )
    .await?;
    Ok(Json(status))
}
