//! Read-only rollups for the dashboards. Every view fetches the relevant
//! complaint collection (scoped by store-side filters) and reduces it in
//! memory; nothing here is cached or maintained incrementally.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use depot::models::{CATEGORIES, Category, Complaint, Role, Status, User};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub inprogress: usize,
    pub resolved: usize,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub roads: usize,
    pub water: usize,
    pub power: usize,
    pub sanitation: usize,
    pub other: usize,
}

/// Status + category rollup; the citizen dashboard payload.
#[derive(Debug, Serialize)]
pub struct ComplaintBreakdown {
    #[serde(flatten)]
    pub status: StatusCounts,
    #[serde(flatten)]
    pub categories: CategoryCounts,
}

pub fn status_counts(complaints: &[Complaint]) -> StatusCounts {
    StatusCounts {
        total: complaints.len(),
        pending: by_status(complaints, Status::Pending),
        inprogress: by_status(complaints, Status::Progress),
        resolved: by_status(complaints, Status::Resolved),
    }
}

pub fn category_counts(complaints: &[Complaint]) -> CategoryCounts {
    CategoryCounts {
        roads: by_category(complaints, Category::Roads),
        water: by_category(complaints, Category::Water),
        power: by_category(complaints, Category::Power),
        sanitation: by_category(complaints, Category::Sanitation),
        other: by_category(complaints, Category::Other),
    }
}

pub fn breakdown(complaints: &[Complaint]) -> ComplaintBreakdown {
    ComplaintBreakdown {
        status: status_counts(complaints),
        categories: category_counts(complaints),
    }
}

fn by_status(complaints: &[Complaint], status: Status) -> usize {
    complaints.iter().filter(|c| c.status == status).count()
}

fn by_category(complaints: &[Complaint], category: Category) -> usize {
    complaints.iter().filter(|c| c.category == category).count()
}

/// Departments that currently have at least one complaint.
pub fn active_departments(categories: &CategoryCounts) -> usize {
    [
        categories.roads,
        categories.water,
        categories.power,
        categories.sanitation,
        categories.other,
    ]
    .iter()
    .filter(|&&n| n > 0)
    .count()
}

/// Percentage of resolved complaints, rounded; 0 when there is nothing to
/// resolve.
pub fn resolution_rate(resolved: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        ((resolved as f64 / total as f64) * 100.0).round() as u32
    }
}

/// Admin dashboard headline numbers.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    #[serde(flatten)]
    pub complaints: ComplaintBreakdown,
    pub total_users: usize,
    pub staff: usize,
    pub citizens: usize,
    pub total_departments: usize,
}

pub fn dashboard(complaints: &[Complaint], users: &[User]) -> DashboardStats {
    let rollup = breakdown(complaints);
    let total_departments = active_departments(&rollup.categories);

    DashboardStats {
        complaints: rollup,
        total_users: users.len(),
        staff: users.iter().filter(|u| u.role == Role::Staff).count(),
        citizens: users.iter().filter(|u| u.role == Role::Citizen).count(),
        total_departments,
    }
}

#[derive(Debug, Serialize)]
pub struct DepartmentStats {
    pub total_staff: usize,
    pub total_complaints: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub resolution_rate: u32,
}

/// Per-department staffing and complaint rollup for the admin overview.
pub fn department_overview(
    complaints: &[Complaint],
    staff: &[User],
) -> BTreeMap<Category, DepartmentStats> {
    CATEGORIES
        .into_iter()
        .map(|department| {
            let in_dept: Vec<&Complaint> = complaints
                .iter()
                .filter(|c| c.category == department)
                .collect();

            let total = in_dept.len();
            let pending = in_dept.iter().filter(|c| c.status == Status::Pending).count();
            let resolved = in_dept
                .iter()
                .filter(|c| c.status == Status::Resolved)
                .count();

            let stats = DepartmentStats {
                total_staff: staff
                    .iter()
                    .filter(|s| s.role == Role::Staff && s.department == Some(department))
                    .count(),
                total_complaints: total,
                pending,
                in_progress: total - pending - resolved,
                resolved,
                resolution_rate: resolution_rate(resolved, total),
            };

            (department, stats)
        })
        .collect()
}

/// One row of the admin staff directory.
#[derive(Debug, Serialize)]
pub struct StaffEntry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: Option<Category>,
    pub created: String,
    pub assigned_count: u64,
    pub resolved_count: u32,
}

impl StaffEntry {
    pub fn new(user: &User, assigned_count: u64) -> Self {
        Self {
            id: user.id,
            name: user.fullname.clone(),
            email: user.email.clone(),
            department: user.department,
            created: user.created_at.format("%Y-%m-%d").to_string(),
            assigned_count,
            resolved_count: user.resolved,
        }
    }

    /// Case-insensitive substring match across the visible columns.
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }

        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.email.to_lowercase().contains(&needle)
            || self
                .department
                .map(|d| d.as_str().contains(&needle))
                .unwrap_or(false)
            || self.id.to_string().contains(&needle)
            || self.assigned_count.to_string().contains(&needle)
            || self.resolved_count.to_string().contains(&needle)
    }
}

/// Display date for the staff queue (DD/MM/YYYY).
pub fn queue_date(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use depot::models::Priority;

    fn complaint(category: Category, status: Status) -> Complaint {
        Complaint {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_email: "c@example.com".to_string(),
            title: "t".to_string(),
            category,
            location: "l".to_string(),
            description: "d".to_string(),
            priority: Priority::Medium,
            status,
            imageurl: "http://img".to_string(),
            assignedto_id: None,
            assignedto_name: None,
            resolvedby_id: None,
            resolvedby_name: None,
            resolved_on: None,
            created_at: Utc.with_ymd_and_hms(2026, 7, 1, 9, 30, 0).unwrap(),
        }
    }

    fn staff_user(department: Category) -> User {
        User {
            id: Uuid::new_v4(),
            fullname: "S".to_string(),
            email: "s@example.com".to_string(),
            password: "hash".to_string(),
            role: Role::Staff,
            ward: None,
            department: Some(department),
            resolved: 0,
            created_at: Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn rollup_counts_by_status_and_category() {
        let complaints = vec![
            complaint(Category::Roads, Status::Pending),
            complaint(Category::Roads, Status::Resolved),
            complaint(Category::Water, Status::Progress),
        ];

        let rollup = breakdown(&complaints);
        assert_eq!(rollup.status.total, 3);
        assert_eq!(rollup.status.pending, 1);
        assert_eq!(rollup.status.inprogress, 1);
        assert_eq!(rollup.status.resolved, 1);
        assert_eq!(rollup.categories.roads, 2);
        assert_eq!(rollup.categories.water, 1);
        assert_eq!(rollup.categories.power, 0);

        assert_eq!(active_departments(&rollup.categories), 2);
    }

    #[test]
    fn resolution_rate_rounds_and_handles_empty() {
        assert_eq!(resolution_rate(0, 0), 0);
        assert_eq!(resolution_rate(1, 3), 33);
        assert_eq!(resolution_rate(2, 3), 67);
        assert_eq!(resolution_rate(3, 3), 100);
    }

    #[test]
    fn department_overview_counts_staff_and_rates() {
        let complaints = vec![
            complaint(Category::Roads, Status::Resolved),
            complaint(Category::Roads, Status::Pending),
            complaint(Category::Water, Status::Progress),
        ];
        let staff = vec![staff_user(Category::Roads), staff_user(Category::Roads)];

        let overview = department_overview(&complaints, &staff);

        let roads = &overview[&Category::Roads];
        assert_eq!(roads.total_staff, 2);
        assert_eq!(roads.total_complaints, 2);
        assert_eq!(roads.in_progress, 0);
        assert_eq!(roads.resolution_rate, 50);

        let water = &overview[&Category::Water];
        assert_eq!(water.total_staff, 0);
        assert_eq!(water.in_progress, 1);
        assert_eq!(water.resolution_rate, 0);

        // every department appears, complaints or not
        assert_eq!(overview.len(), CATEGORIES.len());
    }

    #[test]
    fn staff_entries_match_on_any_column() {
        let mut user = staff_user(Category::Sanitation);
        user.fullname = "Asha Rao".to_string();
        user.resolved = 12;

        let entry = StaffEntry::new(&user, 4);
        assert!(entry.matches(""));
        assert!(entry.matches("asha"));
        assert!(entry.matches("sanit"));
        assert!(entry.matches("12"));
        assert!(!entry.matches("nobody"));
    }

    #[test]
    fn queue_dates_are_day_first() {
        let at = Utc.with_ymd_and_hms(2026, 7, 1, 9, 30, 0).unwrap();
        assert_eq!(queue_date(at), "01/07/2026");
    }
}
