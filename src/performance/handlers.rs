use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{instrument, warn};

use crate::{
    auth::CurrentSession,
    db::ActivityLog,
    error::ApiError,
    performance::{
        dto::{CoursePerformance, PerformanceOverview},
        services,
    },
    state::AppState,
};

pub fn performance_routes() -> Router<AppState> {
    Router::new()
        .route("/overview", get(overview))
        .route("/course/:course_hash", get(course))
        .route("/courses", get(courses))
}

#[instrument(skip(state, session))]
pub async fn overview(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<PerformanceOverview>, ApiError> {
    let rows = services::course_performances(state.platform.as_ref(), session.jar()).await?;
    let performances: Vec<_> = rows.into_iter().map(|(_, p)| p).collect();

    let streak = match ActivityLog::success_days(&state.db, &session.user_email).await {
        Ok(days) => services::streak_days(&days, OffsetDateTime::now_utc().date()),
        Err(e) => {
            warn!(error = %e, "streak lookup failed; reporting 0");
            0
        }
    };

    Ok(Json(services::summarize(&performances, streak)))
}

#[instrument(skip(state, session))]
pub async fn course(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(course_hash): Path<String>,
) -> Result<Json<CoursePerformance>, ApiError> {
    let c = services::single_course(state.platform.as_ref(), session.jar(), &course_hash).await?;
    Ok(Json(c))
}

#[instrument(skip(state, session))]
pub async fn courses(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<CoursePerformance>>, ApiError> {
    let rows = services::course_performances(state.platform.as_ref(), session.jar()).await?;
    Ok(Json(rows.into_iter().map(|(c, _)| c).collect()))
}
