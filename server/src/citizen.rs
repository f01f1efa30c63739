//! Citizen self-service: complaint submission (multipart with a photo),
//! listing, deletion, the personal dashboard rollup, and support messages.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
};
use depot::models::{
    Category, Complaint, NewComplaint, NewSupportMessage, Priority, Status,
};
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
};

struct Upload {
    filename: Option<String>,
    content_type: String,
    data: Bytes,
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    policy::require(&identity, Resource::Complaint, Action::Create)?;

    let mut title = None;
    let mut category = None;
    let mut location = None;
    let mut description = None;
    let mut priority = None;
    let mut image: Option<Upload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::Validation("malformed multipart body".into()))?
    {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };

        if name == "image" {
            let filename = field.file_name().map(ToString::to_string);
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|_| AppError::Validation("could not read uploaded image".into()))?;

            image = Some(Upload {
                filename,
                content_type,
                data,
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|_| AppError::Validation("malformed multipart body".into()))?;

        match name.as_str() {
            "title" => title = Some(value),
            "category" => category = Some(value),
            "location" => location = Some(value),
            "description" => description = Some(value),
            "priority" => priority = Some(value),
            _ => {}
        }
    }

    // Everything is validated before the first store call.
    let image = image
        .filter(|upload| !upload.data.is_empty())
        .ok_or_else(|| AppError::Validation("image is required".into()))?;
    let title = required(title, "title")?;
    let location = required(location, "location")?;
    let description = required(description, "description")?;
    let category = Category::from_str(&required(category, "category")?)
        .map_err(|_| AppError::Validation("unknown category".into()))?;
    let priority = match priority.filter(|p| !p.trim().is_empty()) {
        Some(raw) => Priority::from_str(&raw)
            .map_err(|_| AppError::Validation("unknown priority".into()))?,
        None => Priority::Medium,
    };

    let extension = image
        .filename
        .as_deref()
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .unwrap_or("jpg");
    let object = format!("images/{}.{extension}", Uuid::new_v4());

    state
        .depot
        .upload(
            &state.config.storage_bucket,
            &object,
            image.data,
            &image.content_type,
        )
        .await?;
    let imageurl = state.depot.public_url(&state.config.storage_bucket, &object);

    let complaint: Complaint = state
        .depot
        .insert(
            "complaints",
            &NewComplaint {
                user_id: identity.id,
                user_email: identity.email.clone(),
                title,
                category,
                location,
                description,
                priority,
                status: Status::Pending,
                imageurl,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "complaint submitted successfully",
            "complaint": complaint,
        })),
    ))
}

pub async fn my_complaints(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Value>, AppError> {
    policy::require(&identity, Resource::Complaint, Action::Read)?;

    let complaints: Vec<Complaint> = state
        .depot
        .from("complaints")
        .eq("user_id", identity.id)
        .order_desc("created_at")
        .fetch()
        .await?;

    Ok(Json(json!({ "complaints": complaints })))
}

#[derive(Deserialize)]
pub struct DeletePayload {
    pub id: Option<Uuid>,
}

pub async fn delete_complaint(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(payload): Json<DeletePayload>,
) -> Result<Json<Value>, AppError> {
    let id = payload
        .id
        .ok_or_else(|| AppError::Validation("id is required".into()))?;

    lifecycle::delete(&state, id, &identity).await?;

    Ok(Json(json!({ "message": "complaint deleted successfully" })))
}

pub async fn my_stats(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Value>, AppError> {
    policy::require(&identity, Resource::Complaint, Action::Read)?;

    let complaints: Vec<Complaint> = state
        .depot
        .from("complaints")
        .eq("user_id", identity.id)
        .fetch()
        .await?;

    Ok(Json(serde_json::to_value(crate::stats::breakdown(
        &complaints,
    ))?))
}

/// `[CATEGORY] subject`, the shape the admin inbox expects.
fn support_subject(category: &str, subject: &str) -> String {
    format!("[{}] {}", category.to_uppercase(), subject)
}

#[derive(Deserialize)]
pub struct SupportPayload {
    pub subject: Option<String>,
    pub category: Option<String>,
    pub message: Option<String>,
}

pub async fn support(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(payload): Json<SupportPayload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    policy::require(&identity, Resource::SupportMessage, Action::Create)?;

    let subject = required(payload.subject, "subject")?;
    let category = required(payload.category, "category")?;
    let message = required(payload.message, "message")?;

    let _: Value = state
        .depot
        .insert(
            "supportmessages",
            &NewSupportMessage {
                user_id: identity.id,
                user_email: identity.email.clone(),
                name: identity.fullname.clone(),
                subject: support_subject(&category, &subject),
                message,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "message sent successfully to administrator" })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn support_subjects_carry_the_category_prefix() {
        assert_eq!(
            support_subject("billing", "Wrong ward on file"),
            "[BILLING] Wrong ward on file"
        );
        assert_eq!(support_subject("other", "hi"), "[OTHER] hi");
    }
}
