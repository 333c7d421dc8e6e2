use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::impersonation_sessions;

pub use crate::entities::impersonation_sessions::Model as ImpersonationRecord;

pub struct ImpersonationRepository {
    conn: DatabaseConnection,
}

impl ImpersonationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        token: &str,
        admin_id: i32,
        seller_id: i32,
        started_at: &str,
        expires_at: &str,
    ) -> Result<ImpersonationRecord> {
        let active = impersonation_sessions::ActiveModel {
            token: Set(token.to_string()),
            admin_id: Set(admin_id),
            seller_id: Set(seller_id),
            started_at: Set(started_at.to_string()),
            expires_at: Set(expires_at.to_string()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert impersonation session")
    }

    pub async fn get_by_token(&self, token: &str) -> Result<Option<ImpersonationRecord>> {
        impersonation_sessions::Entity::find()
            .filter(impersonation_sessions::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query impersonation session")
    }

    /// Record the single legitimate end event for a session.
    pub async fn mark_ended(
        &self,
        record: ImpersonationRecord,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: impersonation_sessions::ActiveModel = record.into();
        active.ended_at = Set(Some(now));
        active.end_ip = Set(ip.map(ToString::to_string));
        active.end_user_agent = Set(user_agent.map(ToString::to_string));
        active.update(&self.conn).await?;

        Ok(())
    }
}
