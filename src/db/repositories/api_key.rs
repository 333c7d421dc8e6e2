use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entities::api_keys;

use super::user::generate_token;

/// API key with its scope and IP lists parsed out of their JSON columns
#[derive(Debug, Clone)]
pub struct ApiKey {
    pub id: i32,
    pub user_id: i32,
    pub key: String,
    pub label: String,
    pub scopes: Vec<String>,
    pub allowed_ips: Vec<String>,
    pub expires_at: Option<String>,
    pub revoked_at: Option<String>,
    pub created_at: String,
    pub last_used_at: Option<String>,
}

impl From<api_keys::Model> for ApiKey {
    fn from(model: api_keys::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            key: model.key,
            label: model.label,
            scopes: parse_string_list(&model.scopes),
            allowed_ips: parse_string_list(&model.allowed_ips),
            expires_at: model.expires_at,
            revoked_at: model.revoked_at,
            created_at: model.created_at,
            last_used_at: model.last_used_at,
        }
    }
}

fn parse_string_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub struct ApiKeyRepository {
    conn: DatabaseConnection,
}

impl ApiKeyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a key for a user. The caller has already validated scopes and
    /// IP entries; this is the only place key material is generated.
    pub async fn create(
        &self,
        user_id: i32,
        label: &str,
        scopes: &[String],
        allowed_ips: &[String],
        expires_at: Option<String>,
    ) -> Result<ApiKey> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = api_keys::ActiveModel {
            user_id: Set(user_id),
            key: Set(generate_token()),
            label: Set(label.to_string()),
            scopes: Set(serde_json::to_string(scopes)?),
            allowed_ips: Set(serde_json::to_string(allowed_ips)?),
            expires_at: Set(expires_at),
            created_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert API key")?;

        Ok(ApiKey::from(model))
    }

    pub async fn get_by_key(&self, key: &str) -> Result<Option<ApiKey>> {
        let model = api_keys::Entity::find()
            .filter(api_keys::Column::Key.eq(key))
            .one(&self.conn)
            .await
            .context("Failed to query API key")?;

        Ok(model.map(ApiKey::from))
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<ApiKey>> {
        let models = api_keys::Entity::find()
            .filter(api_keys::Column::UserId.eq(user_id))
            .order_by_asc(api_keys::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list API keys")?;

        Ok(models.into_iter().map(ApiKey::from).collect())
    }

    /// Revoke a key owned by the given user. Returns false when no such key
    /// exists (or it belongs to someone else).
    pub async fn revoke(&self, id: i32, user_id: i32) -> Result<bool> {
        let model = api_keys::Entity::find_by_id(id)
            .filter(api_keys::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query API key for revocation")?;

        let Some(model) = model else {
            return Ok(false);
        };

        if model.revoked_at.is_some() {
            return Ok(true);
        }

        let now = chrono::Utc::now().to_rfc3339();
        let mut active: api_keys::ActiveModel = model.into();
        active.revoked_at = Set(Some(now));
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn touch_last_used(&self, id: i32) -> Result<()> {
        let model = api_keys::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query API key for usage update")?;

        if let Some(model) = model {
            let now = chrono::Utc::now().to_rfc3339();
            let mut active: api_keys::ActiveModel = model.into();
            active.last_used_at = Set(Some(now));
            active.update(&self.conn).await?;
        }

        Ok(())
    }
}
