use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use time::OffsetDateTime;
use tracing::{error, warn};

use crate::{db::Session, error::ApiError, state::AppState};

/// The caller's active session, resolved from `Authorization: Bearer <token>`.
pub struct CurrentSession(pub Session);

pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))?;

    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .unwrap_or(auth)
        .trim();
    if token.is_empty() {
        return Err(ApiError::Unauthorized("Not authenticated".into()));
    }
    Ok(token)
}

/// An `Err` here means the session must be deactivated before rejecting.
pub(crate) fn check_expiry(session: &Session, now: OffsetDateTime) -> Result<(), ApiError> {
    if session.is_expired(now) {
        return Err(ApiError::Unauthorized("Session expired".into()));
    }
    Ok(())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        let session = Session::find_active(&state.db, token)
            .await
            .map_err(|e| {
                error!(error = %e, "session lookup failed");
                ApiError::Unauthorized("Authentication failed".into())
            })?
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired session".into()))?;

        if let Err(rejection) = check_expiry(&session, OffsetDateTime::now_utc()) {
            warn!(session_id = %session.id, user = %session.user_email, "session expired");
            if let Err(e) = Session::deactivate(&state.db, session.id).await {
                error!(error = %e, "deactivate expired session failed");
            }
            return Err(rejection);
        }

        Ok(CurrentSession(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use sqlx::types::Json;
    use time::macros::datetime;
    use uuid::Uuid;

    use crate::platform::CookieJar;

    fn session(expires_at: OffsetDateTime) -> Session {
        Session {
            id: Uuid::new_v4(),
            token: "tok".into(),
            user_email: "a@b.co".into(),
            cookies: Json(CookieJar::new()),
            is_active: true,
            created_at: datetime!(2024-01-01 0:00 UTC),
            expires_at,
        }
    }

    #[test]
    fn expired_session_is_rejected_with_401() {
        let s = session(datetime!(2024-01-08 0:00 UTC));
        let err = check_expiry(&s, datetime!(2024-01-08 0:00:01 UTC)).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Session expired");
    }

    #[test]
    fn live_session_passes() {
        let s = session(datetime!(2024-01-08 0:00 UTC));
        assert!(check_expiry(&s, datetime!(2024-01-07 12:00 UTC)).is_ok());
        assert!(check_expiry(&s, datetime!(2024-01-08 0:00 UTC)).is_ok());
    }

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_prefix_is_optional() {
        assert_eq!(bearer_token(&headers("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(&headers("bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(&headers("abc")).unwrap(), "abc");
    }

    #[test]
    fn missing_or_blank_header_is_unauthorized() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            bearer_token(&headers("Bearer  ")),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
