use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::pix_wallets;

/// Wallet balance snapshot, integer BRL cents throughout
#[derive(Debug, Clone)]
pub struct Wallet {
    pub user_id: i32,
    pub brl_cents: i64,
    pub total_deposited_cents: i64,
    pub total_withdrawn_cents: i64,
}

impl From<pix_wallets::Model> for Wallet {
    fn from(model: pix_wallets::Model) -> Self {
        Self {
            user_id: model.user_id,
            brl_cents: model.brl_cents,
            total_deposited_cents: model.total_deposited_cents,
            total_withdrawn_cents: model.total_withdrawn_cents,
        }
    }
}

pub struct WalletRepository {
    conn: DatabaseConnection,
}

impl WalletRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Fetch the wallet for a user, creating a zeroed one on first access.
    pub async fn get_or_create(&self, user_id: i32) -> Result<Wallet> {
        let existing = pix_wallets::Entity::find()
            .filter(pix_wallets::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query wallet")?;

        if let Some(wallet) = existing {
            return Ok(Wallet::from(wallet));
        }

        let now = chrono::Utc::now().to_rfc3339();
        let active = pix_wallets::ActiveModel {
            user_id: Set(user_id),
            brl_cents: Set(0),
            total_deposited_cents: Set(0),
            total_withdrawn_cents: Set(0),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to create wallet")?;

        tracing::info!(user_id, "Created PIX wallet");

        Ok(Wallet::from(model))
    }

    /// Credit a confirmed deposit to the user's wallet.
    pub async fn apply_deposit(&self, user_id: i32, amount_cents: i64) -> Result<Wallet> {
        // get_or_create first so a deposit for a brand-new user works
        self.get_or_create(user_id).await?;

        let model = pix_wallets::Entity::find()
            .filter(pix_wallets::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query wallet for deposit")?
            .ok_or_else(|| anyhow::anyhow!("Wallet missing for user {user_id}"))?;

        let now = chrono::Utc::now().to_rfc3339();

        let brl_cents = model.brl_cents + amount_cents;
        let total_deposited = model.total_deposited_cents + amount_cents;

        let mut active: pix_wallets::ActiveModel = model.into();
        active.brl_cents = Set(brl_cents);
        active.total_deposited_cents = Set(total_deposited);
        active.updated_at = Set(now);
        let model = active.update(&self.conn).await?;

        Ok(Wallet::from(model))
    }
}
