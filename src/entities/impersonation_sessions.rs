use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "impersonation_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Bearer token scoped to one admin+seller pair
    #[sea_orm(unique)]
    pub token: String,

    pub admin_id: i32,

    pub seller_id: i32,

    pub started_at: String,

    pub expires_at: String,

    /// Set exactly once; a session with `ended_at` is terminally ended
    pub ended_at: Option<String>,

    pub end_ip: Option<String>,

    pub end_user_agent: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
