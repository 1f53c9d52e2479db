use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::platform::CookieJar;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub profile: serde_json::Value,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, profile, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Inserts on first login, refreshes name and profile afterwards.
    pub async fn upsert_from_login_tx(
        tx: &mut Transaction<'_, Postgres>,
        email: &str,
        name: Option<&str>,
        profile: &serde_json::Value,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, profile)
            VALUES ($1, COALESCE($2, ''), $3)
            ON CONFLICT (email) DO UPDATE
               SET name = COALESCE($2, users.name),
                   profile = EXCLUDED.profile,
                   updated_at = now()
            RETURNING id, email, name, profile, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(profile)
        .fetch_one(&mut **tx)
        .await
        .context("upsert user")?;
        Ok(user)
    }
}

/// Persists a successful sign-in: the user row and its new session commit together.
pub async fn save_login(
    db: &PgPool,
    email: &str,
    name: Option<&str>,
    profile: &serde_json::Value,
    token: &str,
    cookies: &CookieJar,
    expires_at: OffsetDateTime,
) -> anyhow::Result<User> {
    let mut tx = db.begin().await.context("begin tx")?;
    let user = User::upsert_from_login_tx(&mut tx, email, name, profile).await?;
    Session::create_tx(&mut tx, token, &user.email, cookies, expires_at).await?;
    tx.commit().await.context("commit tx")?;
    Ok(user)
}

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub token: String,
    pub user_email: String,
    pub cookies: Json<CookieJar>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Session {
    pub async fn create_tx(
        tx: &mut Transaction<'_, Postgres>,
        token: &str,
        user_email: &str,
        cookies: &CookieJar,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token, user_email, cookies, is_active, expires_at)
            VALUES ($1, $2, $3, TRUE, $4)
            RETURNING id, token, user_email, cookies, is_active, created_at, expires_at
            "#,
        )
        .bind(token)
        .bind(user_email)
        .bind(Json(cookies))
        .bind(expires_at)
        .fetch_one(&mut **tx)
        .await
        .context("insert session")?;
        Ok(session)
    }

    pub async fn find_active(db: &PgPool, token: &str) -> anyhow::Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, token, user_email, cookies, is_active, created_at, expires_at
            FROM sessions
            WHERE token = $1 AND is_active
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(session)
    }

    pub async fn deactivate(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE sessions SET is_active = FALSE WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub fn jar(&self) -> &CookieJar {
        &self.cookies.0
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Logout,
    SolveAssignment,
    JoinClass,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Login => "login",
            Action::Logout => "logout",
            Action::SolveAssignment => "solve_assignment",
            Action::JoinClass => "join_class",
        }
    }
}

pub fn status_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failed"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_email: String,
    pub action_type: String,
    pub details: serde_json::Value,
    pub status: String,
    pub created_at: OffsetDateTime,
}

impl ActivityLog {
    pub async fn record(
        db: &PgPool,
        user_email: &str,
        action: Action,
        details: serde_json::Value,
        success: bool,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (user_email, action_type, details, status)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_email)
        .bind(action.as_str())
        .bind(details)
        .bind(status_label(success))
        .execute(db)
        .await?;
        Ok(())
    }

    /// Distinct UTC days with at least one successful activity, newest first.
    pub async fn success_days(db: &PgPool, user_email: &str) -> anyhow::Result<Vec<Date>> {
        let days = sqlx::query_scalar::<_, Date>(
            r#"
            SELECT DISTINCT (created_at AT TIME ZONE 'UTC')::date AS day
            FROM activity_logs
            WHERE user_email = $1 AND status = 'success'
            ORDER BY day DESC
            LIMIT 400
            "#,
        )
        .bind(user_email)
        .fetch_all(db)
        .await?;
        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn session(expires_at: OffsetDateTime) -> Session {
        Session {
            id: Uuid::new_v4(),
            token: "t".into(),
            user_email: "a@b.co".into(),
            cookies: Json(CookieJar::new()),
            is_active: true,
            created_at: datetime!(2024-01-01 0:00 UTC),
            expires_at,
        }
    }

    #[test]
    fn expiry_is_strictly_after() {
        let s = session(datetime!(2024-01-08 0:00 UTC));
        assert!(!s.is_expired(datetime!(2024-01-07 23:59 UTC)));
        assert!(!s.is_expired(datetime!(2024-01-08 0:00 UTC)));
        assert!(s.is_expired(datetime!(2024-01-08 0:01 UTC)));
    }

    #[test]
    fn activity_status_labels() {
        assert_eq!(status_label(true), "success");
        assert_eq!(status_label(false), "failed");
    }

    #[test]
    fn action_names() {
        assert_eq!(Action::SolveAssignment.as_str(), "solve_assignment");
        assert_eq!(Action::JoinClass.as_str(), "join_class");
    }
}
