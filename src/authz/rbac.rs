use std::collections::HashSet;

use sea_orm::DatabaseConnection;

use crate::errors::VivariaError;
use crate::store::{self, RoleGrant, User};

/// Does `user` hold the (resource_type, action) permission in the
/// context of `team_id`?
///
/// Scope rules: a global role (no team of its own) counts when its
/// assignment context matches `team_id`, or unconditionally when no
/// `team_id` is asked for; a team-scoped role counts only for its own
/// team, and only while assigned there. With `allow_any_team` the check
/// instead succeeds if the user
/// holds the permission in any team they belong to.
///
/// Fails closed: missing users, roles, or permissions yield `false`.
/// Only a grant-store fetch failure is an error.
pub async fn has_permission(
    db: &DatabaseConnection,
    user: &User,
    resource_type: &str,
    action: &str,
    team_id: Option<i64>,
    allow_any_team: bool,
) -> Result<bool, VivariaError> {
    if user.is_super_admin {
        return Ok(true);
    }

    let grants = store::get_role_grants(db, user.id).await?;
    let candidates: Vec<i64> = grants
        .iter()
        .filter(|grant| allow_any_team || role_in_scope(grant, team_id))
        .map(|grant| grant.role_id)
        .collect();

    if candidates.is_empty() {
        return Ok(false);
    }

    let held = store::get_permissions_for_roles(db, &candidates).await?;
    Ok(held.contains(&(resource_type.to_string(), action.to_string())))
}

/// Every (resource_type, action) pair the user holds within one team,
/// derived from their role assignments. Shared by the single-resource
/// and bulk resolvers to compute all capability flags for an owning team
/// in a bounded number of fetches.
pub async fn team_permission_set(
    db: &DatabaseConnection,
    user_id: i64,
    team_id: i64,
) -> Result<HashSet<(String, String)>, VivariaError> {
    let grants = store::get_role_grants(db, user_id).await?;
    let candidates: Vec<i64> = grants
        .iter()
        .filter(|grant| role_in_scope(grant, Some(team_id)))
        .map(|grant| grant.role_id)
        .collect();

    store::get_permissions_for_roles(db, &candidates).await
}

fn role_in_scope(grant: &RoleGrant, team_id: Option<i64>) -> bool {
    match grant.role_team_id {
        // Global role: applies wherever assigned; when a team context is
        // requested, the assignment's context team must match it.
        None => match team_id {
            None => true,
            Some(team) => grant.context_team_id == team,
        },
        // Team-scoped role: only within its own team, and only while
        // the assignment was made there.
        Some(role_team) => team_id == Some(role_team) && grant.context_team_id == role_team,
    }
}
