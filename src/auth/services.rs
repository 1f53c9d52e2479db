use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use tracing::{error, info, warn};

use crate::{error::ApiError, platform::CookieJar, state::AppState};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// 32 random bytes, URL-safe base64 without padding.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn display_name(profile: &serde_json::Value) -> Option<&str> {
    profile.get("name").and_then(|n| n.as_str())
}

/// Signs in through the browser and fetches the platform profile with the
/// resulting cookies.
pub async fn acquire_platform_session(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<(CookieJar, serde_json::Value), ApiError> {
    info!(%email, "attempting platform login");
    let cookies = state
        .browser
        .sign_in(email, password)
        .await
        .map_err(|e| {
            warn!(%email, error = %e, "browser sign-in failed");
            ApiError::Unauthorized(format!("{e:#}"))
        })?;

    if cookies.is_empty() {
        return Err(ApiError::Unauthorized("Authentication failed".into()));
    }

    let profile = state.platform.user_info(&cookies).await.map_err(|e| {
        error!(%email, error = %e, "fetching user info failed");
        ApiError::upstream("Login failed", e)
    })?;

    Ok((cookies, profile))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::platform::fakes::FakePlatform;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("student@newtonschool.co"));
        assert!(!is_valid_email("student"));
        assert!(!is_valid_email("a b@c.d"));
    }

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn display_name_reads_profile() {
        assert_eq!(display_name(&json!({"name": "Asha"})), Some("Asha"));
        assert_eq!(display_name(&json!({"name": null})), None);
    }

    #[tokio::test]
    async fn acquire_returns_cookies_and_profile() {
        let mut state = AppState::fake();
        state.platform = Arc::new(FakePlatform {
            user: Some(json!({"name": "Asha", "username": "asha"})),
            ..Default::default()
        });
        let (cookies, profile) = acquire_platform_session(&state, "a@b.co", "pw")
            .await
            .unwrap();
        assert_eq!(cookies.get("sessionid").map(String::as_str), Some("fake"));
        assert_eq!(profile["username"], "asha");
    }

    #[tokio::test]
    async fn rejected_cookies_surface_as_upstream_failure() {
        let state = AppState::fake();
        let err = acquire_platform_session(&state, "a@b.co", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
    }
}
