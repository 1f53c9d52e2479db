use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use time::{Duration, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthStatus, LoginRequest, LoginResponse, MessageResponse, ValidateResponse},
        extractors::CurrentSession,
        services::{acquire_platform_session, display_name, generate_session_token, is_valid_email},
    },
    db::{save_login, Action, ActivityLog, Session, User},
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/status", get(status))
        .route("/user/me", get(me))
        .route("/validate", get(validate))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    let (cookies, profile) =
        match acquire_platform_session(&state, &payload.email, &payload.password).await {
            Ok(acquired) => acquired,
            Err(e) => {
                record_failure(&state, &payload.email, Action::Login, &e).await;
                return Err(e);
            }
        };

    let token = generate_session_token();
    let expires_at = OffsetDateTime::now_utc() + Duration::days(state.config.session_ttl_days);
    let user = save_login(
        &state.db,
        &payload.email,
        display_name(&profile),
        &profile,
        &token,
        &cookies,
        expires_at,
    )
    .await
    .map_err(|e| {
        error!(error = %e, "saving login failed");
        ApiError::Internal(e.to_string())
    })?;

    record(&state, &user.email, Action::Login, json!({ "cookies": cookies.len() })).await;

    info!(user_id = %user.id, email = %user.email, "login successful");
    Ok(Json(LoginResponse {
        session_id: token,
        user: profile,
        message: "Login successful".into(),
    }))
}

#[instrument(skip(state, session))]
pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<MessageResponse>, ApiError> {
    Session::deactivate(&state.db, session.id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    record(&state, &session.user_email, Action::Logout, json!({})).await;
    info!(email = %session.user_email, "logged out");
    Ok(Json(MessageResponse {
        message: "Logout successful".into(),
    }))
}

#[instrument(skip(state, session))]
pub async fn status(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<AuthStatus>, ApiError> {
    let user = User::find_by_email(&state.db, &session.user_email)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(AuthStatus {
        authenticated: true,
        user: user.map(|u| u.profile),
    }))
}

#[instrument(skip(state, session))]
pub async fn me(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<serde_json::Value>, ApiError> {
    let profile = state.platform.user_info(session.jar()).await?;
    Ok(Json(profile))
}

/// Checks whether the stored platform cookies are still accepted upstream.
#[instrument(skip(state, session))]
pub async fn validate(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Json<ValidateResponse> {
    let valid = match state.platform.user_info(session.jar()).await {
        Ok(_) => true,
        Err(e) => {
            warn!(email = %session.user_email, error = %e, "platform session no longer valid");
            false
        }
    };
    Json(ValidateResponse { valid })
}

/// Activity logging never fails the request it describes.
pub(crate) async fn record(state: &AppState, email: &str, action: Action, details: serde_json::Value) {
    write_activity(state, email, action, details, true).await;
}

pub(crate) async fn record_failure(state: &AppState, email: &str, action: Action, err: &ApiError) {
    write_activity(state, email, action, failure_details(err), false).await;
}

fn failure_details(err: &ApiError) -> serde_json::Value {
    json!({ "error": err.to_string(), "status": err.status().as_u16() })
}

async fn write_activity(
    state: &AppState,
    email: &str,
    action: Action,
    details: serde_json::Value,
    success: bool,
) {
    if let Err(e) = ActivityLog::record(&state.db, email, action, details, success).await {
        error!(error = %e, action = action.as_str(), "activity log write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_serialization() {
        let response = LoginResponse {
            session_id: "tok".into(),
            user: json!({"name": "Asha"}),
            message: "Login successful".into(),
        };
        let v = serde_json::to_value(&response).unwrap();
        assert_eq!(v["session_id"], "tok");
        assert_eq!(v["user"]["name"], "Asha");
        assert_eq!(v["message"], "Login successful");
    }

    #[test]
    fn failed_sign_in_details_carry_error_and_status() {
        let details = failure_details(&ApiError::Unauthorized("Authentication failed: timeout".into()));
        assert_eq!(
            details,
            json!({"error": "Authentication failed: timeout", "status": 401})
        );
    }

    #[test]
    fn status_serializes_null_user() {
        let v = serde_json::to_value(AuthStatus {
            authenticated: true,
            user: None,
        })
        .unwrap();
        assert_eq!(v, json!({"authenticated": true, "user": null}));
    }
}
