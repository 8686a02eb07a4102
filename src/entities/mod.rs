pub mod permission;
pub mod project;
pub mod project_team_share;
pub mod project_user_share;
pub mod role;
pub mod role_assignment;
pub mod role_permission;
pub mod team;
pub mod team_membership;
pub mod user;
