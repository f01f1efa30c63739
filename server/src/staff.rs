//! Department queue for staff. A staff member sees and updates exactly the
//! complaints whose category matches their department; admins see all.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use depot::models::{Category, Complaint, Priority, Status};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    error::AppError,
    lifecycle,
    policy::{self, Action, Resource, Scope},
    session::Identity,
    state::AppState,
    stats,
};

#[derive(Serialize)]
struct QueueItem {
    id: Uuid,
    title: String,
    category: Category,
    location: String,
    description: String,
    priority: Priority,
    status: Status,
    date: String,
    department: Category,
}

impl QueueItem {
    fn from_complaint(complaint: &Complaint) -> Self {
        Self {
            id: complaint.id,
            title: complaint.title.clone(),
            category: complaint.category,
            location: complaint.location.clone(),
            description: complaint.description.clone(),
            priority: complaint.priority,
            status: complaint.status,
            date: stats::queue_date(complaint.created_at),
            // category doubles as the owning department
            department: complaint.category,
        }
    }
}

pub async fn queue(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Value>, AppError> {
    let scope = policy::require(&identity, Resource::Complaint, Action::Read)?;

    let complaints: Vec<Complaint> = match scope {
        Scope::Global => {
            state
                .depot
                .from("complaints")
                .order_desc("created_at")
                .fetch()
                .await?
        }
        Scope::Department => {
            let department = identity
                .department
                .ok_or(AppError::Forbidden("no department on record"))?;

            state
                .depot
                .from("complaints")
                .eq("category", department)
                .order_desc("created_at")
                .fetch()
                .await?
        }
        Scope::Own => return Err(AppError::Forbidden("staff access required")),
    };

    let counts = stats::status_counts(&complaints);
    let items: Vec<QueueItem> = complaints.iter().map(QueueItem::from_complaint).collect();

    Ok(Json(json!({
        "complaints": items,
        "total": counts.total,
        "pending": counts.pending,
        "inprogress": counts.inprogress,
        "resolved": counts.resolved,
    })))
}

#[derive(Deserialize)]
pub struct StatusPayload {
    pub status: Option<String>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    identity: Identity,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<Value>, AppError> {
    let target = payload
        .status
        .as_deref()
        .and_then(|raw| Status::from_str(raw).ok())
        .ok_or(AppError::InvalidStatus)?;

    let complaint: Complaint = state
        .depot
        .from("complaints")
        .eq("id", id)
        .one()
        .await?
        .ok_or(AppError::NotFound("complaint"))?;

    // Permission check happens after the fetch (the complaint's category
    // decides it) but before any write.
    let scope = policy::require(&identity, Resource::Complaint, Action::Update)?;
    policy::check_department(&identity, scope, complaint.category)?;

    let updated = lifecycle::apply_status(&state, &complaint, target, &identity, json!({})).await?;

    Ok(Json(json!({
        "message": "complaint status updated successfully",
        "complaint": updated,
    })))
}
