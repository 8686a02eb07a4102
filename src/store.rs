use std::collections::{HashMap, HashSet};

use crate::entities;
use crate::errors::VivariaError;
use crate::settings::Database as DbCfg;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_super_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub owner_team_id: i64,
}

/// One role held by a user, together with the team context the
/// assignment was made in. `role_team_id` is None for global roles.
#[derive(Debug, Clone)]
pub struct RoleGrant {
    pub role_id: i64,
    pub role_name: String,
    pub role_team_id: Option<i64>,
    pub context_team_id: i64,
}

/// The fixed capability bitset carried by both user-level and team-level
/// share rows. Field names line up one-to-one with the capability fields
/// of `authz::EffectivePermissionSet`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGrant {
    pub can_view_project: bool,
    pub can_create_exp_groups: bool,
    pub can_edit_exp_groups: bool,
    pub can_delete_exp_groups: bool,
    pub can_create_datatables: bool,
    pub can_edit_datatables: bool,
    pub can_delete_datatables: bool,
    pub can_view_unblinded: bool,
}

impl ShareGrant {
    pub fn view_only() -> Self {
        Self {
            can_view_project: true,
            ..Default::default()
        }
    }
}

impl From<entities::project_user_share::Model> for ShareGrant {
    fn from(m: entities::project_user_share::Model) -> Self {
        Self {
            can_view_project: m.can_view_project != 0,
            can_create_exp_groups: m.can_create_exp_groups != 0,
            can_edit_exp_groups: m.can_edit_exp_groups != 0,
            can_delete_exp_groups: m.can_delete_exp_groups != 0,
            can_create_datatables: m.can_create_datatables != 0,
            can_edit_datatables: m.can_edit_datatables != 0,
            can_delete_datatables: m.can_delete_datatables != 0,
            can_view_unblinded: m.can_view_unblinded != 0,
        }
    }
}

impl From<entities::project_team_share::Model> for ShareGrant {
    fn from(m: entities::project_team_share::Model) -> Self {
        Self {
            can_view_project: m.can_view_project != 0,
            can_create_exp_groups: m.can_create_exp_groups != 0,
            can_edit_exp_groups: m.can_edit_exp_groups != 0,
            can_delete_exp_groups: m.can_delete_exp_groups != 0,
            can_create_datatables: m.can_create_datatables != 0,
            can_edit_datatables: m.can_edit_datatables != 0,
            can_delete_datatables: m.can_delete_datatables != 0,
            can_view_unblinded: m.can_view_unblinded != 0,
        }
    }
}

pub async fn init(cfg: &DbCfg) -> Result<DatabaseConnection, VivariaError> {
    let db = Database::connect(&cfg.url).await?;
    Ok(db)
}

// User and team management

pub async fn create_user(
    db: &DatabaseConnection,
    username: &str,
    is_super_admin: bool,
) -> Result<User, VivariaError> {
    let user = entities::user::ActiveModel {
        username: Set(username.to_string()),
        is_super_admin: Set(if is_super_admin { 1 } else { 0 }),
        created_at: Set(Utc::now().timestamp()),
        ..Default::default()
    };

    let model = user.insert(db).await?;

    Ok(User {
        id: model.id,
        username: model.username,
        is_super_admin: model.is_super_admin != 0,
    })
}

pub async fn get_user(db: &DatabaseConnection, id: i64) -> Result<Option<User>, VivariaError> {
    let model = entities::user::Entity::find_by_id(id).one(db).await?;

    Ok(model.map(|m| User {
        id: m.id,
        username: m.username,
        is_super_admin: m.is_super_admin != 0,
    }))
}

pub async fn get_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<User>, VivariaError> {
    use entities::user::{Column, Entity};

    let model = Entity::find()
        .filter(Column::Username.eq(username))
        .one(db)
        .await?;

    Ok(model.map(|m| User {
        id: m.id,
        username: m.username,
        is_super_admin: m.is_super_admin != 0,
    }))
}

pub async fn create_team(db: &DatabaseConnection, name: &str) -> Result<Team, VivariaError> {
    let team = entities::team::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(Utc::now().timestamp()),
        ..Default::default()
    };

    let model = team.insert(db).await?;

    Ok(Team {
        id: model.id,
        name: model.name,
    })
}

pub async fn add_team_member(
    db: &DatabaseConnection,
    user_id: i64,
    team_id: i64,
) -> Result<(), VivariaError> {
    let membership = entities::team_membership::ActiveModel {
        user_id: Set(user_id),
        team_id: Set(team_id),
        ..Default::default()
    };

    membership.insert(db).await?;
    Ok(())
}

pub async fn get_user_teams(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<Team>, VivariaError> {
    use entities::team_membership::{Column, Entity};

    let memberships = Entity::find()
        .filter(Column::UserId.eq(user_id))
        .all(db)
        .await?;

    let team_ids: Vec<i64> = memberships.iter().map(|m| m.team_id).collect();
    if team_ids.is_empty() {
        return Ok(Vec::new());
    }

    let teams = entities::team::Entity::find()
        .filter(entities::team::Column::Id.is_in(team_ids))
        .all(db)
        .await?;

    Ok(teams
        .into_iter()
        .map(|t| Team {
            id: t.id,
            name: t.name,
        })
        .collect())
}

pub async fn get_user_team_ids(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<i64>, VivariaError> {
    use entities::team_membership::{Column, Entity};

    let memberships = Entity::find()
        .filter(Column::UserId.eq(user_id))
        .all(db)
        .await?;

    Ok(memberships.into_iter().map(|m| m.team_id).collect())
}

// RBAC grant records

pub async fn create_role(
    db: &DatabaseConnection,
    name: &str,
    team_id: Option<i64>,
) -> Result<entities::role::Model, VivariaError> {
    let role = entities::role::ActiveModel {
        name: Set(name.to_string()),
        team_id: Set(team_id),
        ..Default::default()
    };

    Ok(role.insert(db).await?)
}

pub async fn find_permission(
    db: &DatabaseConnection,
    resource_type: &str,
    action: &str,
) -> Result<Option<entities::permission::Model>, VivariaError> {
    use entities::permission::{Column, Entity};

    Ok(Entity::find()
        .filter(Column::ResourceType.eq(resource_type))
        .filter(Column::Action.eq(action))
        .one(db)
        .await?)
}

/// Find or create the (resource_type, action) permission row. The store
/// holds at most one row per pair.
pub async fn ensure_permission(
    db: &DatabaseConnection,
    resource_type: &str,
    action: &str,
) -> Result<entities::permission::Model, VivariaError> {
    if let Some(existing) = find_permission(db, resource_type, action).await? {
        return Ok(existing);
    }

    let permission = entities::permission::ActiveModel {
        resource_type: Set(resource_type.to_string()),
        action: Set(action.to_string()),
        ..Default::default()
    };

    Ok(permission.insert(db).await?)
}

pub async fn grant_role_permission(
    db: &DatabaseConnection,
    role_id: i64,
    permission_id: i64,
) -> Result<(), VivariaError> {
    let edge = entities::role_permission::ActiveModel {
        role_id: Set(role_id),
        permission_id: Set(permission_id),
        ..Default::default()
    };

    edge.insert(db).await?;
    Ok(())
}

pub async fn assign_role(
    db: &DatabaseConnection,
    user_id: i64,
    team_id: i64,
    role_id: i64,
) -> Result<(), VivariaError> {
    let assignment = entities::role_assignment::ActiveModel {
        user_id: Set(user_id),
        team_id: Set(team_id),
        role_id: Set(role_id),
        ..Default::default()
    };

    assignment.insert(db).await?;
    Ok(())
}

pub async fn remove_role_assignments(
    db: &DatabaseConnection,
    user_id: i64,
    role_id: i64,
) -> Result<(), VivariaError> {
    use entities::role_assignment::{Column, Entity};

    Entity::delete_many()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::RoleId.eq(role_id))
        .exec(db)
        .await?;

    Ok(())
}

/// Every role the user holds, joined with the role's own scope.
pub async fn get_role_grants(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<RoleGrant>, VivariaError> {
    use entities::role_assignment::{Column, Entity};

    let assignments = Entity::find()
        .filter(Column::UserId.eq(user_id))
        .all(db)
        .await?;

    if assignments.is_empty() {
        return Ok(Vec::new());
    }

    let role_ids: Vec<i64> = assignments.iter().map(|a| a.role_id).collect();
    let roles: HashMap<i64, entities::role::Model> = entities::role::Entity::find()
        .filter(entities::role::Column::Id.is_in(role_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    let mut grants = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        // Assignment pointing at a deleted role: skip, fail closed
        if let Some(role) = roles.get(&assignment.role_id) {
            grants.push(RoleGrant {
                role_id: role.id,
                role_name: role.name.clone(),
                role_team_id: role.team_id,
                context_team_id: assignment.team_id,
            });
        }
    }

    Ok(grants)
}

/// All (resource_type, action) pairs granted by any of the given roles.
pub async fn get_permissions_for_roles(
    db: &DatabaseConnection,
    role_ids: &[i64],
) -> Result<HashSet<(String, String)>, VivariaError> {
    if role_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let edges = entities::role_permission::Entity::find()
        .filter(entities::role_permission::Column::RoleId.is_in(role_ids.to_vec()))
        .all(db)
        .await?;

    let permission_ids: Vec<i64> = edges.iter().map(|e| e.permission_id).collect();
    if permission_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let permissions = entities::permission::Entity::find()
        .filter(entities::permission::Column::Id.is_in(permission_ids))
        .all(db)
        .await?;

    Ok(permissions
        .into_iter()
        .map(|p| (p.resource_type, p.action))
        .collect())
}

// Projects

pub async fn create_project(
    db: &DatabaseConnection,
    name: &str,
    owner_team_id: i64,
) -> Result<Project, VivariaError> {
    let project = entities::project::ActiveModel {
        name: Set(name.to_string()),
        owner_team_id: Set(owner_team_id),
        created_at: Set(Utc::now().timestamp()),
        ..Default::default()
    };

    let model = project.insert(db).await?;

    Ok(Project {
        id: model.id,
        name: model.name,
        owner_team_id: model.owner_team_id,
    })
}

pub async fn get_project(
    db: &DatabaseConnection,
    id: i64,
) -> Result<Option<Project>, VivariaError> {
    let model = entities::project::Entity::find_by_id(id).one(db).await?;

    Ok(model.map(|m| Project {
        id: m.id,
        name: m.name,
        owner_team_id: m.owner_team_id,
    }))
}

// Share records

pub async fn set_user_share(
    db: &DatabaseConnection,
    project_id: i64,
    user_id: i64,
    grant: &ShareGrant,
) -> Result<(), VivariaError> {
    use entities::project_user_share::{ActiveModel, Column, Entity};
    use sea_orm::sea_query::OnConflict;

    let share = ActiveModel {
        project_id: Set(project_id),
        user_id: Set(user_id),
        can_view_project: Set(if grant.can_view_project { 1 } else { 0 }),
        can_create_exp_groups: Set(if grant.can_create_exp_groups { 1 } else { 0 }),
        can_edit_exp_groups: Set(if grant.can_edit_exp_groups { 1 } else { 0 }),
        can_delete_exp_groups: Set(if grant.can_delete_exp_groups { 1 } else { 0 }),
        can_create_datatables: Set(if grant.can_create_datatables { 1 } else { 0 }),
        can_edit_datatables: Set(if grant.can_edit_datatables { 1 } else { 0 }),
        can_delete_datatables: Set(if grant.can_delete_datatables { 1 } else { 0 }),
        can_view_unblinded: Set(if grant.can_view_unblinded { 1 } else { 0 }),
        ..Default::default()
    };

    Entity::insert(share)
        .on_conflict(
            OnConflict::columns([Column::ProjectId, Column::UserId])
                .update_columns([
                    Column::CanViewProject,
                    Column::CanCreateExpGroups,
                    Column::CanEditExpGroups,
                    Column::CanDeleteExpGroups,
                    Column::CanCreateDatatables,
                    Column::CanEditDatatables,
                    Column::CanDeleteDatatables,
                    Column::CanViewUnblinded,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;

    Ok(())
}

pub async fn remove_user_share(
    db: &DatabaseConnection,
    project_id: i64,
    user_id: i64,
) -> Result<(), VivariaError> {
    use entities::project_user_share::{Column, Entity};

    Entity::delete_many()
        .filter(Column::ProjectId.eq(project_id))
        .filter(Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    Ok(())
}

pub async fn set_team_share(
    db: &DatabaseConnection,
    project_id: i64,
    team_id: i64,
    grant: &ShareGrant,
) -> Result<(), VivariaError> {
    use entities::project_team_share::{ActiveModel, Column, Entity};
    use sea_orm::sea_query::OnConflict;

    let share = ActiveModel {
        project_id: Set(project_id),
        team_id: Set(team_id),
        can_view_project: Set(if grant.can_view_project { 1 } else { 0 }),
        can_create_exp_groups: Set(if grant.can_create_exp_groups { 1 } else { 0 }),
        can_edit_exp_groups: Set(if grant.can_edit_exp_groups { 1 } else { 0 }),
        can_delete_exp_groups: Set(if grant.can_delete_exp_groups { 1 } else { 0 }),
        can_create_datatables: Set(if grant.can_create_datatables { 1 } else { 0 }),
        can_edit_datatables: Set(if grant.can_edit_datatables { 1 } else { 0 }),
        can_delete_datatables: Set(if grant.can_delete_datatables { 1 } else { 0 }),
        can_view_unblinded: Set(if grant.can_view_unblinded { 1 } else { 0 }),
        ..Default::default()
    };

    Entity::insert(share)
        .on_conflict(
            OnConflict::columns([Column::ProjectId, Column::TeamId])
                .update_columns([
                    Column::CanViewProject,
                    Column::CanCreateExpGroups,
                    Column::CanEditExpGroups,
                    Column::CanDeleteExpGroups,
                    Column::CanCreateDatatables,
                    Column::CanEditDatatables,
                    Column::CanDeleteDatatables,
                    Column::CanViewUnblinded,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;

    Ok(())
}

pub async fn remove_team_share(
    db: &DatabaseConnection,
    project_id: i64,
    team_id: i64,
) -> Result<(), VivariaError> {
    use entities::project_team_share::{Column, Entity};

    Entity::delete_many()
        .filter(Column::ProjectId.eq(project_id))
        .filter(Column::TeamId.eq(team_id))
        .exec(db)
        .await?;

    Ok(())
}

pub async fn get_user_share(
    db: &DatabaseConnection,
    project_id: i64,
    user_id: i64,
) -> Result<Option<ShareGrant>, VivariaError> {
    use entities::project_user_share::{Column, Entity};

    let model = Entity::find()
        .filter(Column::ProjectId.eq(project_id))
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?;

    Ok(model.map(ShareGrant::from))
}

/// Batched variant of `get_user_share`: one query for the whole project
/// set, keyed by project id in the result.
pub async fn get_user_shares(
    db: &DatabaseConnection,
    project_ids: &[i64],
    user_id: i64,
) -> Result<HashMap<i64, ShareGrant>, VivariaError> {
    use entities::project_user_share::{Column, Entity};

    if project_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let models = Entity::find()
        .filter(Column::ProjectId.is_in(project_ids.to_vec()))
        .filter(Column::UserId.eq(user_id))
        .all(db)
        .await?;

    Ok(models
        .into_iter()
        .map(|m| (m.project_id, ShareGrant::from(m)))
        .collect())
}

/// All team-shares on the given projects granted to any of the given
/// teams. A project may appear several times when shared with more than
/// one of the teams.
pub async fn get_team_shares(
    db: &DatabaseConnection,
    project_ids: &[i64],
    team_ids: &[i64],
) -> Result<Vec<(i64, ShareGrant)>, VivariaError> {
    use entities::project_team_share::{Column, Entity};

    if project_ids.is_empty() || team_ids.is_empty() {
        return Ok(Vec::new());
    }

    let models = Entity::find()
        .filter(Column::ProjectId.is_in(project_ids.to_vec()))
        .filter(Column::TeamId.is_in(team_ids.to_vec()))
        .all(db)
        .await?;

    Ok(models
        .into_iter()
        .map(|m| (m.project_id, ShareGrant::from(m)))
        .collect())
}
