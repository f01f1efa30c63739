//! Identity lifecycle: signup, login, logout, the session probe, and
//! self-service profile edits. Passwords are argon2id hashes; the clear
//! text never leaves these handlers.

use std::str::FromStr;
use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use depot::models::{Category, NewUser, Role, User};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    error::AppError,
    policy::{self, Action, Resource},
    session::{self, Identity, SESSION_COOKIE},
    state::AppState,
};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::Hashing)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

pub(crate) fn required(value: Option<String>, field: &'static str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{field} is required"))),
    }
}

/// The signup form carries one `ward_department` field; which side of the
/// user row it lands on is decided by the role (admins get neither).
fn split_ward_department(
    role: Role,
    value: Option<String>,
) -> Result<(Option<String>, Option<Category>), AppError> {
    let value = value.filter(|v| !v.trim().is_empty());

    match role {
        Role::Citizen => {
            let ward = value
                .ok_or_else(|| AppError::Validation("ward is required for citizens".into()))?;
            Ok((Some(ward), None))
        }
        Role::Staff => {
            let raw = value
                .ok_or_else(|| AppError::Validation("department is required for staff".into()))?;
            let department = Category::from_str(&raw)
                .map_err(|_| AppError::Validation("unknown department".into()))?;
            Ok((None, Some(department)))
        }
        Role::Admin => Ok((None, None)),
    }
}

#[derive(Deserialize)]
pub struct SignupPayload {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub ward_department: Option<String>,
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<SignupPayload>,
) -> Result<(StatusCode, CookieJar, Json<Value>), AppError> {
    let fullname = required(payload.fullname, "fullname")?;
    let email = required(payload.email, "email")?;
    let password = required(payload.password, "password")?;
    let role = Role::from_str(&required(payload.role, "role")?)
        .map_err(|_| AppError::Validation("unknown role".into()))?;
    let (ward, department) = split_ward_department(role, payload.ward_department)?;

    let existing: Option<User> = state.depot.from("users").eq("email", &email).one().await?;
    if existing.is_some() {
        return Err(AppError::Validation("email already registered".into()));
    }

    let user: User = state
        .depot
        .insert(
            "users",
            &NewUser {
                fullname,
                email,
                password: hash_password(&password)?,
                role,
                ward,
                department,
                resolved: 0,
            },
        )
        .await?;

    let identity = Identity::from_user(&user);
    let token = session::create(&state, &identity).await?;

    Ok((
        StatusCode::CREATED,
        jar.add(session::cookie(token)),
        Json(json!({
            "message": "user created successfully",
            "user": user.public(),
        })),
    ))
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<(StatusCode, CookieJar, Json<Value>), AppError> {
    let (Some(email), Some(password), Some(role)) =
        (payload.email, payload.password, payload.role)
    else {
        return Err(AppError::Validation(
            "email, password, and role are required".into(),
        ));
    };
    let role =
        Role::from_str(&role).map_err(|_| AppError::Validation("unknown role".into()))?;

    let user: User = state
        .depot
        .from("users")
        .eq("email", &email)
        .eq("role", role)
        .one()
        .await?
        .ok_or(AppError::Unauthenticated("invalid email or role"))?;

    if !verify_password(&password, &user.password) {
        return Err(AppError::Unauthenticated("invalid password"));
    }

    let identity = Identity::from_user(&user);
    let token = session::create(&state, &identity).await?;

    Ok((
        StatusCode::OK,
        jar.add(session::cookie(token)),
        Json(json!({
            "message": "login successful",
            "user": user.public(),
        })),
    ))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        session::destroy(&state, cookie.value()).await?;
    }

    Ok((
        jar.remove(session::removal_cookie()),
        Json(json!({ "message": "logged out successfully" })),
    ))
}

/// Session probe: returns the identity snapshot captured at login, without
/// touching the data store.
pub async fn me(identity: Identity) -> Json<Value> {
    Json(json!({ "user": identity }))
}

#[derive(Deserialize)]
pub struct ProfilePayload {
    pub fullname: Option<String>,
    pub ward: Option<String>,
    pub password: Option<String>,
}

pub async fn edit_profile(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(payload): Json<ProfilePayload>,
) -> Result<Json<Value>, AppError> {
    policy::require(&identity, Resource::User, Action::Update)?;

    let fullname = required(payload.fullname, "fullname")?;
    let mut patch = serde_json::Map::new();
    patch.insert("fullname".to_string(), json!(fullname));

    // ward is a citizen-only attribute; staff and admin rows keep it null
    if identity.role == Role::Citizen {
        let ward = required(payload.ward, "ward")?;
        patch.insert("ward".to_string(), json!(ward));
    }

    if let Some(password) = payload.password.filter(|p| !p.trim().is_empty()) {
        patch.insert("password".to_string(), json!(hash_password(&password)?));
    }

    let rows: Vec<User> = state
        .depot
        .from("users")
        .eq("id", identity.id)
        .update(&Value::Object(patch))
        .await?;
    let user = rows.into_iter().next().ok_or(AppError::NotFound("user"))?;

    Ok(Json(json!({
        "message": "profile updated successfully",
        "user": user.public(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("hunter2").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not-a-hash"));
    }

    #[test]
    fn ward_and_department_are_mutually_exclusive() {
        let (ward, department) =
            split_ward_department(Role::Citizen, Some("ward 12".into())).unwrap();
        assert_eq!(ward.as_deref(), Some("ward 12"));
        assert_eq!(department, None);

        let (ward, department) =
            split_ward_department(Role::Staff, Some("water".into())).unwrap();
        assert_eq!(ward, None);
        assert_eq!(department, Some(Category::Water));

        let (ward, department) = split_ward_department(Role::Admin, None).unwrap();
        assert_eq!((ward, department), (None, None));
    }

    #[test]
    fn staff_department_must_be_a_known_category() {
        assert!(split_ward_department(Role::Staff, Some("finance".into())).is_err());
        assert!(split_ward_department(Role::Staff, None).is_err());
        assert!(split_ward_department(Role::Citizen, Some("  ".into())).is_err());
    }

    #[test]
    fn required_rejects_missing_and_blank() {
        assert!(required(None, "title").is_err());
        assert!(required(Some("   ".into()), "title").is_err());
        assert_eq!(required(Some("ok".into()), "title").unwrap(), "ok");
    }
}
