use sea_orm::DatabaseConnection;

use crate::authz::cache::PermissionCache;
use crate::authz::rbac;
use crate::authz::types::EffectivePermissionSet;
use crate::errors::VivariaError;
use crate::store::{self, Project, User};

/// Resolve the effective permissions one user holds on one project,
/// memoized through the request-scoped cache.
///
/// The caller is responsible for having validated that the project
/// exists; permissions are never resolved for a project that does not.
pub async fn resolve(
    db: &DatabaseConnection,
    cache: &mut PermissionCache,
    user: &User,
    project: &Project,
) -> Result<EffectivePermissionSet, VivariaError> {
    if let Some(hit) = cache.get(user.id, project.id) {
        return Ok(hit);
    }

    let resolved = resolve_uncached(db, user, project).await?;
    cache.insert(user.id, project.id, resolved);
    Ok(resolved)
}

/// One pass over the three grant sources, OR-combined:
/// owner-team RBAC, then the direct user-share, then any team-shares.
/// A user with no memberships and no shares gets the all-false set.
async fn resolve_uncached(
    db: &DatabaseConnection,
    user: &User,
    project: &Project,
) -> Result<EffectivePermissionSet, VivariaError> {
    if user.is_super_admin {
        return Ok(EffectivePermissionSet::all_granted());
    }

    let team_ids = store::get_user_team_ids(db, user.id).await?;

    // Ownership is one grant path among several, not a gate: a
    // non-member still gets whatever the shares below provide.
    let mut set = if team_ids.contains(&project.owner_team_id) {
        let held = rbac::team_permission_set(db, user.id, project.owner_team_id).await?;
        EffectivePermissionSet::from_team_rbac(&held)
    } else {
        EffectivePermissionSet::default()
    };

    if let Some(share) = store::get_user_share(db, project.id, user.id).await? {
        set.apply_share(&share);
    }

    for (_, share) in store::get_team_shares(db, &[project.id], &team_ids).await? {
        set.apply_share(&share);
    }

    tracing::debug!(
        user_id = user.id,
        project_id = project.id,
        "resolved project permissions"
    );

    Ok(set)
}
