//! Administrative views: the dashboard, generic complaint edits,
//! allocation, user management, department overview, the staff directory,
//! and the resolved-counter reconciliation.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use depot::models::{Category, Complaint, PublicUser, Role, Status, User};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    auth::required,
    error::AppError,
    lifecycle,
    policy::{self, Action, Resource},
    session::Identity,
    state::AppState,
    stats,
};

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Value>, AppError> {
    policy::require_global(&identity, Resource::User, Action::Read)?;

    let complaints: Vec<Complaint> = state
        .depot
        .from("complaints")
        .order_desc("created_at")
        .fetch()
        .await?;
    let users: Vec<User> = state.depot.from("users").fetch().await?;

    let public_users: Vec<PublicUser> = users.iter().map(User::public).collect();

    Ok(Json(json!({
        "stats": stats::dashboard(&complaints, &users),
        "complaints": complaints,
        "users": public_users,
    })))
}

#[derive(Deserialize)]
pub struct EditForm {
    pub title: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct EditComplaintPayload {
    pub id: Option<Uuid>,
    pub edit_form: Option<EditForm>,
}

/// Generic complaint edit. The status part is routed through the lifecycle
/// plan, so resolving here behaves exactly like resolving from the staff
/// queue (stamp + counter once), and un-resolving debits the recorded
/// resolver.
pub async fn edit_complaint(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(payload): Json<EditComplaintPayload>,
) -> Result<Json<Value>, AppError> {
    policy::require_global(&identity, Resource::Complaint, Action::Update)?;

    let (Some(id), Some(form)) = (payload.id, payload.edit_form) else {
        return Err(AppError::Validation("missing complaint id or edit data".into()));
    };

    let target = form
        .status
        .as_deref()
        .and_then(|raw| Status::from_str(raw).ok())
        .ok_or(AppError::InvalidStatus)?;

    let mut extra = serde_json::Map::new();
    if let Some(title) = form.title {
        extra.insert("title".to_string(), json!(title));
    }
    if let Some(location) = form.location {
        extra.insert("location".to_string(), json!(location));
    }
    if let Some(description) = form.description {
        extra.insert("description".to_string(), json!(description));
    }
    if let Some(raw) = form.category {
        let category = Category::from_str(&raw)
            .map_err(|_| AppError::Validation("unknown category".into()))?;
        extra.insert("category".to_string(), json!(category));
    }
    if let Some(raw) = form.priority {
        let priority = depot::models::Priority::from_str(&raw)
            .map_err(|_| AppError::Validation("unknown priority".into()))?;
        extra.insert("priority".to_string(), json!(priority));
    }

    let complaint: Complaint = state
        .depot
        .from("complaints")
        .eq("id", id)
        .one()
        .await?
        .ok_or(AppError::NotFound("complaint"))?;

    let updated =
        lifecycle::apply_status(&state, &complaint, target, &identity, Value::Object(extra))
            .await?;

    Ok(Json(json!({ "complaint": updated })))
}

pub async fn allocation_list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Value>, AppError> {
    policy::require_global(&identity, Resource::Complaint, Action::Allocate)?;

    let complaints: Vec<Complaint> = state
        .depot
        .from("complaints")
        .eq("status", Status::Pending)
        .order_desc("created_at")
        .fetch()
        .await?;
    let staff: Vec<User> = state
        .depot
        .from("users")
        .eq("role", Role::Staff)
        .fetch()
        .await?;

    let staff: Vec<PublicUser> = staff.iter().map(User::public).collect();

    Ok(Json(json!({ "complaints": complaints, "staff": staff })))
}

#[derive(Deserialize)]
pub struct AllocatePayload {
    pub complaint_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
}

pub async fn allocate(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(payload): Json<AllocatePayload>,
) -> Result<Json<Value>, AppError> {
    policy::require_global(&identity, Resource::Complaint, Action::Allocate)?;

    let (Some(complaint_id), Some(staff_id)) = (payload.complaint_id, payload.staff_id) else {
        return Err(AppError::Validation("missing complaint id or staff id".into()));
    };

    let complaint = lifecycle::allocate(&state, complaint_id, staff_id).await?;

    Ok(Json(json!({
        "message": "complaint allocated successfully",
        "complaint": complaint,
    })))
}

#[derive(Deserialize)]
pub struct DeleteUserPayload {
    pub id: Option<Uuid>,
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(payload): Json<DeleteUserPayload>,
) -> Result<Json<Value>, AppError> {
    policy::require_global(&identity, Resource::User, Action::Delete)?;

    let id = payload
        .id
        .ok_or_else(|| AppError::Validation("id is required".into()))?;

    // No cascade: complaints keep their denormalized resolver/assignee
    // name snapshots after the user row is gone.
    state.depot.from("users").eq("id", id).delete().await?;

    Ok(Json(json!({ "message": "user deleted successfully" })))
}

#[derive(Deserialize)]
pub struct UserEditForm {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub ward: Option<String>,
    pub department: Option<String>,
}

#[derive(Deserialize)]
pub struct EditUserPayload {
    pub id: Option<Uuid>,
    pub edit_form: Option<UserEditForm>,
}

pub async fn edit_user(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(payload): Json<EditUserPayload>,
) -> Result<Json<Value>, AppError> {
    policy::require_global(&identity, Resource::User, Action::Update)?;

    let (Some(id), Some(form)) = (payload.id, payload.edit_form) else {
        return Err(AppError::Validation("missing user id or edit data".into()));
    };

    // Admins cannot be minted through this form.
    let role = match form.role.as_deref() {
        Some("citizen") => Role::Citizen,
        Some("staff") => Role::Staff,
        _ => return Err(AppError::Validation("invalid role value".into())),
    };

    let mut patch = serde_json::Map::new();
    patch.insert("role".to_string(), json!(role));
    if let Some(fullname) = form.fullname {
        patch.insert("fullname".to_string(), json!(fullname));
    }
    if let Some(email) = form.email {
        patch.insert("email".to_string(), json!(email));
    }

    // Keep the ward/department exclusivity invariant intact.
    match role {
        Role::Citizen => {
            let ward = required(form.ward, "ward")?;
            patch.insert("ward".to_string(), json!(ward));
            patch.insert("department".to_string(), Value::Null);
        }
        Role::Staff => {
            let department = Category::from_str(&required(form.department, "department")?)
                .map_err(|_| AppError::Validation("unknown department".into()))?;
            patch.insert("department".to_string(), json!(department));
            patch.insert("ward".to_string(), Value::Null);
        }
        Role::Admin => unreachable!("admin role rejected above"),
    }

    let rows: Vec<User> = state
        .depot
        .from("users")
        .eq("id", id)
        .update(&Value::Object(patch))
        .await?;
    let user = rows.into_iter().next().ok_or(AppError::NotFound("user"))?;

    Ok(Json(json!({ "user": user.public() })))
}

pub async fn reconcile_counters(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Value>, AppError> {
    policy::require_global(&identity, Resource::User, Action::Update)?;

    let fixes = lifecycle::reconcile(&state.depot).await?;

    Ok(Json(json!({
        "message": "resolved counters reconciled",
        "adjustments": fixes,
    })))
}

pub async fn departments(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Value>, AppError> {
    policy::require_global(&identity, Resource::Department, Action::Read)?;

    let complaints: Vec<Complaint> = state.depot.from("complaints").fetch().await?;
    let staff: Vec<User> = state
        .depot
        .from("users")
        .eq("role", Role::Staff)
        .fetch()
        .await?;

    Ok(Json(json!({
        "departments": stats::department_overview(&complaints, &staff),
    })))
}

#[derive(Deserialize)]
pub struct DirectoryQuery {
    pub department: Option<String>,
    pub search: Option<String>,
}

pub async fn staff_directory(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Query(query): Query<DirectoryQuery>,
) -> Result<Json<Value>, AppError> {
    policy::require_global(&identity, Resource::User, Action::Read)?;

    let mut rows = state.depot.from("users").eq("role", Role::Staff);
    if let Some(raw) = query.department.as_deref().filter(|d| *d != "all") {
        let department = Category::from_str(raw)
            .map_err(|_| AppError::Validation("unknown department".into()))?;
        rows = rows.eq("department", department);
    }
    let staff: Vec<User> = rows.fetch().await?;

    // One count query per distinct department rather than per staff row.
    let mut assigned: BTreeMap<Category, u64> = BTreeMap::new();
    for user in &staff {
        if let Some(department) = user.department {
            if !assigned.contains_key(&department) {
                let count = state
                    .depot
                    .from("complaints")
                    .eq("category", department)
                    .count()
                    .await?;
                assigned.insert(department, count);
            }
        }
    }

    let needle = query.search.unwrap_or_default();
    let entries: Vec<stats::StaffEntry> = staff
        .iter()
        .map(|user| {
            let count = user
                .department
                .and_then(|d| assigned.get(&d).copied())
                .unwrap_or(0);
            stats::StaffEntry::new(user, count)
        })
        .filter(|entry| entry.matches(&needle))
        .collect();

    Ok(Json(json!({ "staff": entries })))
}
