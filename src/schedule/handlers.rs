use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use time::OffsetDateTime;
use tracing::{info, instrument};

use crate::{
    auth::{handlers::record, CurrentSession},
    db::Action,
    error::ApiError,
    platform::{offset_from_minutes, TimeWindow},
    schedule::{
        dto::{ClassSession, JoinClassRequest, JoinClassResponse, WeekQuery},
        services::{self, TimeLabel},
    },
    state::AppState,
};

pub fn schedule_routes() -> Router<AppState> {
    Router::new()
        .route("/today", get(today))
        .route("/week", get(week))
        .route("/join-class", post(join_class))
}

#[instrument(skip(state, session))]
pub async fn today(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<ClassSession>>, ApiError> {
    let offset = offset_from_minutes(state.config.schedule_utc_offset_minutes);
    let window = TimeWindow::today(OffsetDateTime::now_utc(), offset)
        .ok_or_else(|| ApiError::Internal("current date out of range".into()))?;
    let classes = services::collect_classes(
        state.platform.as_ref(),
        session.jar(),
        window,
        offset,
        TimeLabel::Day,
    )
    .await?;
    Ok(Json(classes))
}

#[instrument(skip(state, session))]
pub async fn week(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<WeekQuery>,
) -> Result<Json<Vec<ClassSession>>, ApiError> {
    let offset = offset_from_minutes(state.config.schedule_utc_offset_minutes);
    let start = match query.start_date.as_deref() {
        Some(raw) => services::parse_start_date(raw)?,
        None => OffsetDateTime::now_utc().to_offset(offset).date(),
    };
    let window = services::week_window(start, offset)?;
    let classes = services::collect_classes(
        state.platform.as_ref(),
        session.jar(),
        window,
        offset,
        TimeLabel::Week,
    )
    .await?;
    Ok(Json(classes))
}

#[instrument(skip(state, session))]
pub async fn join_class(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<JoinClassRequest>,
) -> Result<Json<JoinClassResponse>, ApiError> {
    let join_url = services::find_join_url(
        state.platform.as_ref(),
        session.jar(),
        &payload.lecture_slot_hash,
        OffsetDateTime::now_utc(),
    )
    .await?;

    record(
        &state,
        &session.user_email,
        Action::JoinClass,
        json!({ "lecture_slot_hash": payload.lecture_slot_hash }),
    )
    .await;
    info!(slot = %payload.lecture_slot_hash, "join link resolved");

    Ok(Json(JoinClassResponse {
        join_url,
        status: "opened".into(),
    }))
}
