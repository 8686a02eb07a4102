use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Users
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::IsSuperAdmin)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // Teams
        manager
            .create_table(
                Table::create()
                    .table(Teams::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Teams::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Teams::Name).string().not_null())
                    .col(ColumnDef::new(Teams::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // Team memberships (user <-> team)
        manager
            .create_table(
                Table::create()
                    .table(TeamMemberships::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeamMemberships::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TeamMemberships::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeamMemberships::TeamId)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_membership_user_team")
                    .table(TeamMemberships::Table)
                    .col(TeamMemberships::UserId)
                    .col(TeamMemberships::TeamId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Roles; team_id NULL means the role is globally scoped
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Roles::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Roles::Name).string().not_null())
                    .col(ColumnDef::new(Roles::TeamId).big_integer())
                    .to_owned(),
            )
            .await?;

        // Atomic permissions: unique (resource_type, action) pairs
        manager
            .create_table(
                Table::create()
                    .table(Permissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Permissions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Permissions::ResourceType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Permissions::Action).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_permission_type_action")
                    .table(Permissions::Table)
                    .col(Permissions::ResourceType)
                    .col(Permissions::Action)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Role -> permission edges
        manager
            .create_table(
                Table::create()
                    .table(RolePermissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RolePermissions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RolePermissions::RoleId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RolePermissions::PermissionId)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_role_permission_pair")
                    .table(RolePermissions::Table)
                    .col(RolePermissions::RoleId)
                    .col(RolePermissions::PermissionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Role assignments: a user holds a role within a team context
        manager
            .create_table(
                Table::create()
                    .table(RoleAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoleAssignments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RoleAssignments::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RoleAssignments::TeamId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RoleAssignments::RoleId)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_role_assignment_user")
                    .table(RoleAssignments::Table)
                    .col(RoleAssignments::UserId)
                    .to_owned(),
            )
            .await?;

        // Projects, each owned by exactly one team
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(
                        ColumnDef::new(Projects::OwnerTeamId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Projects::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // Per-user project shares: at most one row per (project, user).
        // Both share tables carry the same capability bitset; only the
        // grantee column differs.
        manager
            .create_table(
                Table::create()
                    .table(ProjectUserShares::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectUserShares::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProjectUserShares::ProjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectUserShares::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(capability(ProjectUserShares::CanViewProject))
                    .col(capability(ProjectUserShares::CanCreateExpGroups))
                    .col(capability(ProjectUserShares::CanEditExpGroups))
                    .col(capability(ProjectUserShares::CanDeleteExpGroups))
                    .col(capability(ProjectUserShares::CanCreateDatatables))
                    .col(capability(ProjectUserShares::CanEditDatatables))
                    .col(capability(ProjectUserShares::CanDeleteDatatables))
                    .col(capability(ProjectUserShares::CanViewUnblinded))
                    .to_owned(),
            )
            .await?;

        // Per-team project shares: at most one row per (project, team)
        manager
            .create_table(
                Table::create()
                    .table(ProjectTeamShares::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectTeamShares::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProjectTeamShares::ProjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectTeamShares::TeamId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(capability(ProjectTeamShares::CanViewProject))
                    .col(capability(ProjectTeamShares::CanCreateExpGroups))
                    .col(capability(ProjectTeamShares::CanEditExpGroups))
                    .col(capability(ProjectTeamShares::CanDeleteExpGroups))
                    .col(capability(ProjectTeamShares::CanCreateDatatables))
                    .col(capability(ProjectTeamShares::CanEditDatatables))
                    .col(capability(ProjectTeamShares::CanDeleteDatatables))
                    .col(capability(ProjectTeamShares::CanViewUnblinded))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProjectTeamShares::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectUserShares::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RoleAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RolePermissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Permissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TeamMemberships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Teams::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

fn capability<C: IntoIden>(name: C) -> ColumnDef {
    let mut col = ColumnDef::new(name);
    col.integer().not_null().default(0);
    col
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    IsSuperAdmin,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Teams {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TeamMemberships {
    Table,
    Id,
    UserId,
    TeamId,
}

#[derive(DeriveIden)]
enum Roles {
    Table,
    Id,
    Name,
    TeamId,
}

#[derive(DeriveIden)]
enum Permissions {
    Table,
    Id,
    ResourceType,
    Action,
}

#[derive(DeriveIden)]
enum RolePermissions {
    Table,
    Id,
    RoleId,
    PermissionId,
}

#[derive(DeriveIden)]
enum RoleAssignments {
    Table,
    Id,
    UserId,
    TeamId,
    RoleId,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    Name,
    OwnerTeamId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ProjectUserShares {
    Table,
    Id,
    ProjectId,
    UserId,
    CanViewProject,
    CanCreateExpGroups,
    CanEditExpGroups,
    CanDeleteExpGroups,
    CanCreateDatatables,
    CanEditDatatables,
    CanDeleteDatatables,
    CanViewUnblinded,
}

#[derive(DeriveIden)]
enum ProjectTeamShares {
    Table,
    Id,
    ProjectId,
    TeamId,
    CanViewProject,
    CanCreateExpGroups,
    CanEditExpGroups,
    CanDeleteExpGroups,
    CanCreateDatatables,
    CanEditDatatables,
    CanDeleteDatatables,
    CanViewUnblinded,
}
