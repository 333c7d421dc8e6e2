use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,

    pub name: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// One of the closed role set (`USER`, `SELLER`, `ADMIN`, `SUPER_ADMIN`, `OWNER`)
    pub role: String,

    /// `pending`, `approved` or `rejected`
    pub status: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::pix_wallets::Entity")]
    PixWallet,
    #[sea_orm(has_many = "super::api_keys::Entity")]
    ApiKeys,
}

impl Related<super::pix_wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PixWallet.def()
    }
}

impl Related<super::api_keys::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApiKeys.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
