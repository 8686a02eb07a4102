use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_user_shares")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub can_view_project: i64,
    pub can_create_exp_groups: i64,
    pub can_edit_exp_groups: i64,
    pub can_delete_exp_groups: i64,
    pub can_create_datatables: i64,
    pub can_edit_datatables: i64,
    pub can_delete_datatables: i64,
    pub can_view_unblinded: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
