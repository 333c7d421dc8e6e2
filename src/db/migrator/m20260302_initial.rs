use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Default API key for the seeded owner (regenerate before exposing anything)
const DEFAULT_API_KEY: &str = "pixgate_default_api_key_please_regenerate";

/// Hash the default password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"password";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(PixWallets)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(ApiKeys)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(ImpersonationSessions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(Transactions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seed the owner account with a hashed password
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_default_password();

        let insert_owner = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::Email,
                crate::entities::users::Column::Name,
                crate::entities::users::Column::PasswordHash,
                crate::entities::users::Column::Role,
                crate::entities::users::Column::Status,
                crate::entities::users::Column::CreatedAt,
                crate::entities::users::Column::UpdatedAt,
            ])
            .values_panic([
                "owner@pixgate.local".into(),
                "Owner".into(),
                password_hash.into(),
                "OWNER".into(),
                "approved".into(),
                now.clone().into(),
                now.clone().into(),
            ])
            .to_owned();

        manager.exec_stmt(insert_owner).await?;

        // Seed a read-only API key for the owner so a fresh install can be
        // exercised end to end before any key is provisioned.
        let insert_key = sea_orm_migration::sea_query::Query::insert()
            .into_table(ApiKeys)
            .columns([
                crate::entities::api_keys::Column::UserId,
                crate::entities::api_keys::Column::Key,
                crate::entities::api_keys::Column::Label,
                crate::entities::api_keys::Column::Scopes,
                crate::entities::api_keys::Column::AllowedIps,
                crate::entities::api_keys::Column::CreatedAt,
            ])
            .values_panic([
                1.into(),
                DEFAULT_API_KEY.into(),
                "default".into(),
                r#"["payments:read"]"#.into(),
                "[]".into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert_key).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ImpersonationSessions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApiKeys).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PixWallets).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
