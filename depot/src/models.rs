//! Row types for the three store tables (`users`, `complaints`,
//! `supportmessages`) and the enums shared across the workspace.
//!
//! Status, category, priority, and role arrive from clients as strings;
//! `FromStr` is the single place those strings are validated.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Citizen,
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "citizen" => Ok(Role::Citizen),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complaint category. Doubles as the staff department: a staff user acts
/// on exactly the complaints whose category equals their department.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Roads,
    Water,
    Power,
    Sanitation,
    Other,
}

pub const CATEGORIES: [Category; 5] = [
    Category::Roads,
    Category::Water,
    Category::Power,
    Category::Sanitation,
    Category::Other,
];

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Roads => "roads",
            Category::Water => "water",
            Category::Power => "power",
            Category::Sanitation => "sanitation",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "roads" => Ok(Category::Roads),
            "water" => Ok(Category::Water),
            "power" => Ok(Category::Power),
            "sanitation" => Ok(Category::Sanitation),
            "other" => Ok(Category::Other),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Progress,
    Resolved,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Progress => "progress",
            Status::Resolved => "resolved",
        }
    }
}

impl FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "progress" => Ok(Status::Progress),
            "resolved" => Ok(Status::Resolved),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full `users` row. Never serialized into a response directly; the
/// password hash leaves the server only toward the store.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub department: Option<Category>,
    #[serde(default)]
    pub resolved: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            fullname: self.fullname.clone(),
            email: self.email.clone(),
            role: self.role,
            ward: self.ward.clone(),
            department: self.department,
            resolved: self.resolved,
            created_at: self.created_at,
        }
    }
}

/// Response-safe projection of a user row.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub role: Role,
    pub ward: Option<String>,
    pub department: Option<Category>,
    pub resolved: u32,
    pub created_at: DateTime<Utc>,
}

/// Outbound `users` insert. Exactly one of ward/department is set,
/// determined by role; admins carry neither.
#[derive(Debug, Serialize)]
pub struct NewUser {
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub ward: Option<String>,
    pub department: Option<Category>,
    pub resolved: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub title: String,
    pub category: Category,
    pub location: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub imageurl: String,
    #[serde(default)]
    pub assignedto_id: Option<Uuid>,
    #[serde(default)]
    pub assignedto_name: Option<String>,
    #[serde(default)]
    pub resolvedby_id: Option<Uuid>,
    #[serde(default)]
    pub resolvedby_name: Option<String>,
    #[serde(default)]
    pub resolved_on: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Outbound `complaints` insert. New complaints always enter at
/// `pending` with no assignment and no resolution stamp.
#[derive(Debug, Serialize)]
pub struct NewComplaint {
    pub user_id: Uuid,
    pub user_email: String,
    pub title: String,
    pub category: Category,
    pub location: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub imageurl: String,
}

/// Outbound `supportmessages` insert. Write-only table; nothing in the
/// application reads it back.
#[derive(Debug, Serialize)]
pub struct NewSupportMessage {
    pub user_id: Uuid,
    pub user_email: String,
    pub name: String,
    pub subject: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for s in ["pending", "progress", "resolved"] {
            assert_eq!(Status::from_str(s).unwrap().as_str(), s);
        }
        assert!(Status::from_str("done").is_err());
        assert!(Status::from_str("Resolved").is_err());
    }

    #[test]
    fn category_strings_round_trip() {
        for c in CATEGORIES {
            assert_eq!(Category::from_str(c.as_str()), Ok(c));
        }
        assert!(Category::from_str("garbage").is_err());
    }

    #[test]
    fn role_and_priority_parse() {
        assert_eq!(Role::from_str("admin"), Ok(Role::Admin));
        assert!(Role::from_str("superuser").is_err());
        assert_eq!(Priority::from_str("high"), Ok(Priority::High));
        assert!(Priority::from_str("urgent").is_err());
    }

    #[test]
    fn user_row_deserializes_and_projects() {
        let raw = serde_json::json!({
            "id": "7f2f9c5e-1f7d-4b2a-9a52-0a4f6b8a1c2d",
            "fullname": "Asha Rao",
            "email": "asha@example.com",
            "password": "$argon2id$...",
            "role": "staff",
            "ward": null,
            "department": "roads",
            "resolved": 3,
            "created_at": "2026-07-01T10:00:00+00:00"
        });

        let user: User = serde_json::from_value(raw).unwrap();
        assert_eq!(user.department, Some(Category::Roads));

        let public = serde_json::to_value(user.public()).unwrap();
        assert!(public.get("password").is_none());
        assert_eq!(public["resolved"], 3);
    }
}
