use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // At most one user-share per (project, user)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_share_project_user")
                    .table(ProjectUserShares::Table)
                    .col(ProjectUserShares::ProjectId)
                    .col(ProjectUserShares::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // At most one team-share per (project, team)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_team_share_project_team")
                    .table(ProjectTeamShares::Table)
                    .col(ProjectTeamShares::ProjectId)
                    .col(ProjectTeamShares::TeamId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Batched lookups filter team-shares by team id
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_team_share_team")
                    .table(ProjectTeamShares::Table)
                    .col(ProjectTeamShares::TeamId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_user_share_project_user")
                    .table(ProjectUserShares::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_team_share_project_team")
                    .table(ProjectTeamShares::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_team_share_team")
                    .table(ProjectTeamShares::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum ProjectUserShares {
    Table,
    ProjectId,
    UserId,
}

#[derive(DeriveIden)]
enum ProjectTeamShares {
    Table,
    ProjectId,
    TeamId,
}
