use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    /// Random API key material (64-char hex string)
    #[sea_orm(unique)]
    pub key: String,

    pub label: String,

    /// JSON array of granted scope strings; always non-empty
    #[sea_orm(column_type = "Text")]
    pub scopes: String,

    /// JSON array of allowed caller IPs; empty array means unrestricted
    #[sea_orm(column_type = "Text")]
    pub allowed_ips: String,

    pub expires_at: Option<String>,

    pub revoked_at: Option<String>,

    pub created_at: String,

    pub last_used_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
