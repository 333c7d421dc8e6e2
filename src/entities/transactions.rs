use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owner of the credited wallet; None when the callback arrived before
    /// any local transaction was created
    pub user_id: Option<i32>,

    /// Provider-side order id used for idempotent correlation
    #[sea_orm(unique)]
    pub external_id: String,

    pub amount_cents: i64,

    pub currency: String,

    /// `pending`, `confirmed` or `failed`
    pub status: String,

    pub payer_name: Option<String>,

    pub payer_document: Option<String>,

    pub created_at: String,

    pub confirmed_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
