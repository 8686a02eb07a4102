use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::store::ShareGrant;

pub const RESOURCE_PROJECT: &str = "Project";
pub const RESOURCE_EXP_GROUP: &str = "ExperimentalGroup";
pub const RESOURCE_DATATABLE: &str = "DataTable";

/// The derived, per-(user, project) permission record. Every
/// authorization decision consults this and nothing else.
///
/// A fixed-shape struct rather than a string-keyed map, so adding or
/// renaming a capability is a compile-time-checked change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissionSet {
    pub can_view_project: bool,
    pub can_create_exp_groups: bool,
    pub can_edit_exp_groups: bool,
    pub can_delete_exp_groups: bool,
    pub can_create_datatables: bool,
    pub can_edit_datatables: bool,
    pub can_delete_datatables: bool,
    pub can_view_unblinded: bool,
    /// The user belongs to the project's owning team
    pub is_owner_team_member: bool,
    /// Authority over project settings ("Project"/"edit" via RBAC)
    pub is_admin: bool,
}

impl EffectivePermissionSet {
    /// Super-admins hold every capability on every project.
    pub fn all_granted() -> Self {
        Self {
            can_view_project: true,
            can_create_exp_groups: true,
            can_edit_exp_groups: true,
            can_delete_exp_groups: true,
            can_create_datatables: true,
            can_edit_datatables: true,
            can_delete_datatables: true,
            can_view_unblinded: true,
            is_owner_team_member: true,
            is_admin: true,
        }
    }

    /// Derive the RBAC-granted flags from the (resource_type, action)
    /// pairs the user holds within the project's owning team. Only
    /// called for owner-team members, so `is_owner_team_member` is set.
    pub fn from_team_rbac(held: &HashSet<(String, String)>) -> Self {
        let holds = |resource_type: &str, action: &str| {
            held.contains(&(resource_type.to_string(), action.to_string()))
        };

        Self {
            can_view_project: holds(RESOURCE_PROJECT, "read"),
            can_create_exp_groups: holds(RESOURCE_EXP_GROUP, "create"),
            can_edit_exp_groups: holds(RESOURCE_EXP_GROUP, "edit"),
            can_delete_exp_groups: holds(RESOURCE_EXP_GROUP, "delete"),
            can_create_datatables: holds(RESOURCE_DATATABLE, "create"),
            can_edit_datatables: holds(RESOURCE_DATATABLE, "edit"),
            can_delete_datatables: holds(RESOURCE_DATATABLE, "delete"),
            can_view_unblinded: holds(RESOURCE_PROJECT, "view_unblinded"),
            is_owner_team_member: true,
            is_admin: holds(RESOURCE_PROJECT, "edit"),
        }
    }

    /// OR a share's capability bits into this set. Monotonic: a share can
    /// only add capabilities. Both the single-resource and bulk paths go
    /// through this one function so their merge semantics cannot drift.
    pub fn apply_share(&mut self, share: &ShareGrant) {
        self.can_view_project |= share.can_view_project;
        self.can_create_exp_groups |= share.can_create_exp_groups;
        self.can_edit_exp_groups |= share.can_edit_exp_groups;
        self.can_delete_exp_groups |= share.can_delete_exp_groups;
        self.can_create_datatables |= share.can_create_datatables;
        self.can_edit_datatables |= share.can_edit_datatables;
        self.can_delete_datatables |= share.can_delete_datatables;
        self.can_view_unblinded |= share.can_view_unblinded;
    }
}
