//! # Complaint lifecycle
//!
//! States run `pending -> progress -> resolved`. Alongside the status, a
//! derived counter lives on the resolving user's row: `users.resolved`
//! equals the number of complaints that user currently has in `resolved`
//! state. Every entry point that can change a status (staff update, admin
//! edit, allocation, deletion) goes through [`plan`], so the counter is
//! mutated in exactly one place.
//!
//! ## Transition rules
//!
//! - non-resolved -> resolved: stamp resolver id/name + timestamp on the
//!   complaint, increment the acting user's counter.
//! - resolved -> resolved: nothing (re-saving a resolved complaint must not
//!   inflate the counter).
//! - resolved -> non-resolved: clear the stamp, decrement the RECORDED
//!   resolver (not the actor), clamped at zero.
//! - deleting a resolved complaint: decrement the recorded resolver,
//!   best effort only; a failed decrement is logged and never blocks the
//!   deletion.
//!
//! ## Consistency
//!
//! The counter write and the status write are two independent round trips
//! against the store; there is no multi-row transaction. A crash between
//! them leaves the counter drifted. [`reconcile`] recomputes every
//! counter from the complaints table and patches the drifted ones.
use chrono::Utc;
use depot::{
    Depot, DepotError,
    models::{Complaint, Role, Status, User},
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    policy::{self, Action, Resource},
    session::Identity,
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampChange {
    Keep,
    SetToActor,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterAction {
    None,
    Increment(Uuid),
    Decrement(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub stamp: StampChange,
    pub counter: CounterAction,
}

/// Decide what a status change does to the resolution stamp and the
/// resolver counter. Pure; every status-changing handler consumes this.
pub fn plan(
    current: Status,
    recorded_resolver: Option<Uuid>,
    target: Status,
    actor_id: Uuid,
) -> TransitionPlan {
    match (current, target) {
        (Status::Resolved, Status::Resolved) => TransitionPlan {
            stamp: StampChange::Keep,
            counter: CounterAction::None,
        },
        (_, Status::Resolved) => TransitionPlan {
            stamp: StampChange::SetToActor,
            counter: CounterAction::Increment(actor_id),
        },
        (Status::Resolved, _) => TransitionPlan {
            stamp: StampChange::Clear,
            counter: match recorded_resolver {
                Some(resolver) => CounterAction::Decrement(resolver),
                None => CounterAction::None,
            },
        },
        _ => TransitionPlan {
            stamp: StampChange::Keep,
            counter: CounterAction::None,
        },
    }
}

pub fn clamped(current: u32, delta: i64) -> u32 {
    (current as i64 + delta).max(0) as u32
}

/// Read-modify-write on `users.resolved`, clamped at zero. A missing user
/// (resolver deleted since) is a no-op, not an error.
pub async fn adjust_resolved(depot: &Depot, user_id: Uuid, delta: i64) -> Result<(), DepotError> {
    let Some(user) = depot.from("users").eq("id", user_id).one::<User>().await? else {
        return Ok(());
    };

    let next = clamped(user.resolved, delta);
    depot
        .from("users")
        .eq("id", user_id)
        .update::<User>(&json!({ "resolved": next }))
        .await?;

    #[cfg(feature = "verbose")]
    tracing::info!("resolved count for {user_id}: {} -> {next}", user.resolved);

    Ok(())
}

/// Apply a status change (plus any extra field edits) to a complaint.
/// The counter write happens first, then the row write; see the module
/// doc for what happens when the second step fails.
pub async fn apply_status(
    state: &AppState,
    complaint: &Complaint,
    target: Status,
    actor: &Identity,
    extra: Value,
) -> Result<Complaint, AppError> {
    let plan = plan(complaint.status, complaint.resolvedby_id, target, actor.id);

    match plan.counter {
        CounterAction::Increment(user) => adjust_resolved(&state.depot, user, 1).await?,
        CounterAction::Decrement(user) => adjust_resolved(&state.depot, user, -1).await?,
        CounterAction::None => {}
    }

    let mut patch = match extra {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    patch.insert("status".to_string(), json!(target));

    match plan.stamp {
        StampChange::SetToActor => {
            patch.insert("resolvedby_id".to_string(), json!(actor.id));
            patch.insert("resolvedby_name".to_string(), json!(actor.fullname));
            patch.insert("resolved_on".to_string(), json!(Utc::now()));
        }
        StampChange::Clear => {
            patch.insert("resolvedby_id".to_string(), Value::Null);
            patch.insert("resolvedby_name".to_string(), Value::Null);
            patch.insert("resolved_on".to_string(), Value::Null);
        }
        StampChange::Keep => {}
    }

    let rows: Vec<Complaint> = state
        .depot
        .from("complaints")
        .eq("id", complaint.id)
        .update(&Value::Object(patch))
        .await?;

    rows.into_iter().next().ok_or(AppError::NotFound("complaint"))
}

/// Admin allocation: pin a staff member to a complaint and force it into
/// `progress`. Refused outright for resolved complaints.
pub async fn allocate(
    state: &AppState,
    complaint_id: Uuid,
    staff_id: Uuid,
) -> Result<Complaint, AppError> {
    let complaint: Complaint = state
        .depot
        .from("complaints")
        .eq("id", complaint_id)
        .one()
        .await?
        .ok_or(AppError::NotFound("complaint"))?;

    if complaint.status == Status::Resolved {
        return Err(AppError::AllocationInvalid);
    }

    let staff: User = state
        .depot
        .from("users")
        .eq("id", staff_id)
        .eq("role", Role::Staff)
        .one()
        .await?
        .ok_or(AppError::NotFound("staff member"))?;

    let rows: Vec<Complaint> = state
        .depot
        .from("complaints")
        .eq("id", complaint_id)
        .update(&json!({
            "assignedto_id": staff.id,
            "assignedto_name": staff.fullname,
            "status": Status::Progress,
        }))
        .await?;

    rows.into_iter().next().ok_or(AppError::NotFound("complaint"))
}

/// Delete a complaint, decrementing the recorded resolver's counter first
/// when the complaint is resolved. The decrement is best effort.
pub async fn delete(state: &AppState, complaint_id: Uuid, actor: &Identity) -> Result<(), AppError> {
    let complaint: Complaint = state
        .depot
        .from("complaints")
        .eq("id", complaint_id)
        .one()
        .await?
        .ok_or(AppError::NotFound("complaint"))?;

    let scope = policy::require(actor, Resource::Complaint, Action::Delete)?;
    policy::check_owner(actor, scope, complaint.user_id)?;

    if complaint.status == Status::Resolved {
        if let Some(resolver) = complaint.resolvedby_id {
            if let Err(err) = adjust_resolved(&state.depot, resolver, -1).await {
                warn!("resolved count decrement for {resolver} failed, deleting anyway: {err}");
            }
        }
    }

    state
        .depot
        .from("complaints")
        .eq("id", complaint_id)
        .delete()
        .await?;

    info!("complaint {complaint_id} deleted");
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CounterFix {
    pub user_id: Uuid,
    pub fullname: String,
    pub recorded: u32,
    pub actual: u32,
}

/// Recompute `users.resolved` from the complaints table and patch any
/// drifted counters. Citizens never resolve, so they are skipped.
pub async fn reconcile(depot: &Depot) -> Result<Vec<CounterFix>, DepotError> {
    let users: Vec<User> = depot.from("users").fetch().await?;
    let mut fixes = Vec::new();

    for user in users.into_iter().filter(|u| u.role != Role::Citizen) {
        let actual = depot
            .from("complaints")
            .eq("resolvedby_id", user.id)
            .eq("status", Status::Resolved)
            .count()
            .await? as u32;

        if actual != user.resolved {
            depot
                .from("users")
                .eq("id", user.id)
                .update::<User>(&json!({ "resolved": actual }))
                .await?;

            warn!(
                "resolved count drift for {}: recorded {} actual {actual}",
                user.id, user.resolved
            );

            fixes.push(CounterFix {
                user_id: user.id,
                fullname: user.fullname,
                recorded: user.resolved,
                actual,
            });
        }
    }

    Ok(fixes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolving_stamps_and_increments_the_actor() {
        let actor = Uuid::new_v4();

        for current in [Status::Pending, Status::Progress] {
            let plan = plan(current, None, Status::Resolved, actor);
            assert_eq!(plan.stamp, StampChange::SetToActor);
            assert_eq!(plan.counter, CounterAction::Increment(actor));
        }
    }

    #[test]
    fn resaving_a_resolved_complaint_does_not_double_count() {
        let actor = Uuid::new_v4();
        let resolver = Uuid::new_v4();

        let plan = plan(Status::Resolved, Some(resolver), Status::Resolved, actor);
        assert_eq!(plan.stamp, StampChange::Keep);
        assert_eq!(plan.counter, CounterAction::None);
    }

    #[test]
    fn unresolving_clears_the_stamp_and_debits_the_recorded_resolver() {
        let actor = Uuid::new_v4();
        let resolver = Uuid::new_v4();

        for target in [Status::Pending, Status::Progress] {
            let plan = plan(Status::Resolved, Some(resolver), target, actor);
            assert_eq!(plan.stamp, StampChange::Clear);
            // the actor may differ from whoever resolved it originally
            assert_eq!(plan.counter, CounterAction::Decrement(resolver));
        }
    }

    #[test]
    fn unresolving_without_a_recorded_resolver_touches_no_counter() {
        let plan = plan(Status::Resolved, None, Status::Pending, Uuid::new_v4());
        assert_eq!(plan.stamp, StampChange::Clear);
        assert_eq!(plan.counter, CounterAction::None);
    }

    #[test]
    fn plain_moves_touch_nothing() {
        let actor = Uuid::new_v4();

        let plan = plan(Status::Pending, None, Status::Progress, actor);
        assert_eq!(plan.stamp, StampChange::Keep);
        assert_eq!(plan.counter, CounterAction::None);
    }

    #[test]
    fn counter_clamps_at_zero() {
        assert_eq!(clamped(0, -1), 0);
        assert_eq!(clamped(1, -1), 0);
        assert_eq!(clamped(5, -1), 4);
        assert_eq!(clamped(0, 1), 1);
    }
}
