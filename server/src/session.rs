//! # Sessions
//!
//! Redis-backed session records.
//!
//! Core purpose is to map an opaque cookie token to a verified identity
//! without re-fetching the user row on every request.
//!
//! ## Requirements
//!
//! - O(1) lookup per request
//! - Server-side expiry (the cookie itself carries no lifetime)
//! - Small records: one JSON identity snapshot per logged-in user
//!
//! ## Implementation
//!
//! - One key per session: `session:{uuid}` -> identity JSON
//! - TTL from config (default 24h), refreshed only by a new login
//! - The snapshot (id, role, email, fullname, ward/department) is captured
//!   at login/signup and NOT re-read per request; profile edits become
//!   visible at the next login
//! - A corrupt record is treated as a missing session, not an error
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use depot::models::{Category, Role, User};
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub const SESSION_COOKIE: &str = "sid";

/// Request-scoped verified identity, injected into handlers by the
/// extractor below. This is the only way domain code learns who is
/// calling; there is no ambient session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
    pub email: String,
    pub fullname: String,
    pub ward: Option<String>,
    pub department: Option<Category>,
}

impl Identity {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            email: user.email.clone(),
            fullname: user.fullname.clone(),
            ward: user.ward.clone(),
            department: user.department,
        }
    }
}

pub async fn init_sessions(redis_url: &str) -> ConnectionManager {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url).unwrap();

    client
        .get_connection_manager_with_config(config)
        .await
        .unwrap()
}

pub async fn create(state: &AppState, identity: &Identity) -> Result<String, AppError> {
    let token = Uuid::new_v4().to_string();
    let payload = serde_json::to_string(identity)?;

    let mut conn = state.sessions.clone();
    let _: () = conn
        .set_ex(key(&token), payload, state.config.session_ttl_secs)
        .await?;

    #[cfg(feature = "verbose")]
    tracing::info!("session created for {}", identity.id);

    Ok(token)
}

pub async fn fetch(state: &AppState, token: &str) -> Result<Option<Identity>, AppError> {
    let mut conn = state.sessions.clone();
    let raw: Option<String> = conn.get(key(token)).await?;

    Ok(raw.and_then(|r| serde_json::from_str(&r).ok()))
}

pub async fn destroy(state: &AppState, token: &str) -> Result<(), AppError> {
    let mut conn = state.sessions.clone();
    let _: () = conn.del(key(token)).await?;

    Ok(())
}

/// Session cookie. No Max-Age: expiry is enforced by the Redis TTL, so a
/// stale cookie simply stops resolving.
pub fn cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

fn key(token: &str) -> String {
    format!("session:{token}")
}

impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(AppError::Unauthenticated("not authenticated, please login"))?;

        fetch(state, &token)
            .await?
            .ok_or(AppError::Unauthenticated("not authenticated, please login"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_snapshot_round_trips() {
        let identity = Identity {
            id: Uuid::new_v4(),
            role: Role::Staff,
            email: "s1@example.com".to_string(),
            fullname: "S One".to_string(),
            ward: None,
            department: Some(Category::Roads),
        };

        let raw = serde_json::to_string(&identity).unwrap();
        let back: Identity = serde_json::from_str(&raw).unwrap();

        assert_eq!(back.id, identity.id);
        assert_eq!(back.department, Some(Category::Roads));
    }

    #[test]
    fn session_cookie_is_scoped_and_http_only() {
        let cookie = cookie("token".to_string());

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn session_keys_are_namespaced() {
        assert_eq!(key("abc"), "session:abc");
    }
}
