use sea_orm::DatabaseConnection;
use vivaria::entities;
use vivaria::store::{self, ShareGrant};

/// Builder for creating test users with memberships and role assignments
pub struct UserBuilder {
    username: String,
    is_super_admin: bool,
    teams: Vec<i64>,
    assignments: Vec<(i64, i64)>, // (team_id, role_id)
}

impl UserBuilder {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            is_super_admin: false,
            teams: Vec::new(),
            assignments: Vec::new(),
        }
    }

    pub fn super_admin(mut self) -> Self {
        self.is_super_admin = true;
        self
    }

    pub fn in_team(mut self, team_id: i64) -> Self {
        self.teams.push(team_id);
        self
    }

    pub fn with_role(mut self, team_id: i64, role_id: i64) -> Self {
        self.assignments.push((team_id, role_id));
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> store::User {
        let user = store::create_user(db, &self.username, self.is_super_admin)
            .await
            .expect("Failed to create test user");

        for team_id in self.teams {
            store::add_team_member(db, user.id, team_id)
                .await
                .expect("Failed to add team membership");
        }

        for (team_id, role_id) in self.assignments {
            store::assign_role(db, user.id, team_id, role_id)
                .await
                .expect("Failed to assign role");
        }

        user
    }
}

/// Builder for creating test roles together with their permissions
pub struct RoleBuilder {
    name: String,
    team_id: Option<i64>,
    permissions: Vec<(String, String)>,
}

impl RoleBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            team_id: None,
            permissions: Vec::new(),
        }
    }

    /// Scope the role to one team; without this the role is global
    pub fn team_scoped(mut self, team_id: i64) -> Self {
        self.team_id = Some(team_id);
        self
    }

    pub fn granting(mut self, resource_type: &str, action: &str) -> Self {
        self.permissions
            .push((resource_type.to_string(), action.to_string()));
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> entities::role::Model {
        let role = store::create_role(db, &self.name, self.team_id)
            .await
            .expect("Failed to create test role");

        for (resource_type, action) in self.permissions {
            let permission = store::ensure_permission(db, &resource_type, &action)
                .await
                .expect("Failed to ensure permission");
            store::grant_role_permission(db, role.id, permission.id)
                .await
                .expect("Failed to grant role permission");
        }

        role
    }
}

/// Builder for creating test projects with share grants
pub struct ProjectBuilder {
    name: String,
    owner_team_id: i64,
    user_shares: Vec<(i64, ShareGrant)>,
    team_shares: Vec<(i64, ShareGrant)>,
}

impl ProjectBuilder {
    pub fn new(name: &str, owner_team_id: i64) -> Self {
        Self {
            name: name.to_string(),
            owner_team_id,
            user_shares: Vec::new(),
            team_shares: Vec::new(),
        }
    }

    pub fn shared_with_user(mut self, user_id: i64, grant: ShareGrant) -> Self {
        self.user_shares.push((user_id, grant));
        self
    }

    pub fn shared_with_team(mut self, team_id: i64, grant: ShareGrant) -> Self {
        self.team_shares.push((team_id, grant));
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> store::Project {
        let project = store::create_project(db, &self.name, self.owner_team_id)
            .await
            .expect("Failed to create test project");

        for (user_id, grant) in self.user_shares {
            store::set_user_share(db, project.id, user_id, &grant)
                .await
                .expect("Failed to set user share");
        }

        for (team_id, grant) in self.team_shares {
            store::set_team_share(db, project.id, team_id, &grant)
                .await
                .expect("Failed to set team share");
        }

        project
    }
}
