use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{admin, auth, citizen, staff, state::AppState};

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/user/edit", post(auth::edit_profile))
        .route("/submit", post(citizen::submit))
        .route("/complaints", get(citizen::my_complaints))
        .route("/complaints/delete", post(citizen::delete_complaint))
        .route("/complaints/data", get(citizen::my_stats))
        .route("/support", post(citizen::support))
        .route("/staff/complaints", get(staff::queue))
        .route("/staff/complaints/{id}", put(staff::update_status))
        .route("/admin/complaints", get(admin::dashboard))
        .route("/admin/complaints/edit", post(admin::edit_complaint))
        .route("/admin/complaints/allocation", get(admin::allocation_list))
        .route("/admin/complaints/allocate", post(admin::allocate))
        .route("/admin/users/delete", post(admin::delete_user))
        .route("/admin/users/edit", post(admin::edit_user))
        .route("/admin/users/reconcile", post(admin::reconcile_counters))
        .route("/admin/departments", get(admin::departments))
        .route("/admin/staff", get(admin::staff_directory));

    Router::new().nest("/api", api).with_state(state)
}
