use std::collections::HashMap;

use sea_orm::DatabaseConnection;

use crate::authz::cache::PermissionCache;
use crate::authz::rbac;
use crate::authz::types::EffectivePermissionSet;
use crate::errors::VivariaError;
use crate::store::{self, Project, ShareGrant, User};

/// Resolve effective permissions for many projects at once.
///
/// List views render permission-gated controls for 25-100+ rows; doing a
/// per-project `resolve` would cost O(N) grant-store round trips. This
/// path covers the whole uncached set with two batched share fetches and
/// a per-owning-team RBAC memo, and must return exactly what `resolve`
/// would return for every (user, project) pair.
///
/// Any fetch failure aborts the whole call: a partial failure must not
/// hand back under-populated permission sets for a subset of projects.
pub async fn resolve_many(
    db: &DatabaseConnection,
    cache: &mut PermissionCache,
    user: &User,
    projects: &[Project],
) -> Result<HashMap<i64, EffectivePermissionSet>, VivariaError> {
    let mut results = HashMap::with_capacity(projects.len());

    let mut pending: Vec<&Project> = Vec::new();
    for project in projects {
        match cache.get(user.id, project.id) {
            Some(hit) => {
                results.insert(project.id, hit);
            }
            None => pending.push(project),
        }
    }

    if pending.is_empty() {
        return Ok(results);
    }

    if user.is_super_admin {
        for project in pending {
            let set = EffectivePermissionSet::all_granted();
            cache.insert(user.id, project.id, set);
            results.insert(project.id, set);
        }
        return Ok(results);
    }

    let team_ids = store::get_user_team_ids(db, user.id).await?;
    let project_ids: Vec<i64> = pending.iter().map(|p| p.id).collect();

    // Two batched fetches cover every share row for the whole set
    let user_shares = store::get_user_shares(db, &project_ids, user.id).await?;
    let mut team_shares: HashMap<i64, Vec<ShareGrant>> = HashMap::new();
    for (project_id, share) in store::get_team_shares(db, &project_ids, &team_ids).await? {
        team_shares.entry(project_id).or_default().push(share);
    }

    // RBAC flags are keyed by owning team, not project; the distinct
    // owning teams across a page are few, so memoize per team.
    let mut rbac_by_team: HashMap<i64, EffectivePermissionSet> = HashMap::new();

    for project in pending {
        let mut set = if team_ids.contains(&project.owner_team_id) {
            match rbac_by_team.get(&project.owner_team_id) {
                Some(derived) => *derived,
                None => {
                    let held =
                        rbac::team_permission_set(db, user.id, project.owner_team_id).await?;
                    let derived = EffectivePermissionSet::from_team_rbac(&held);
                    rbac_by_team.insert(project.owner_team_id, derived);
                    derived
                }
            }
        } else {
            EffectivePermissionSet::default()
        };

        if let Some(share) = user_shares.get(&project.id) {
            set.apply_share(share);
        }
        if let Some(shares) = team_shares.get(&project.id) {
            for share in shares {
                set.apply_share(share);
            }
        }

        cache.insert(user.id, project.id, set);
        results.insert(project.id, set);
    }

    tracing::debug!(
        user_id = user.id,
        resolved = results.len(),
        "bulk-resolved project permissions"
    );

    Ok(results)
}
