//! `SeaORM` implementation of the `ImpersonationService` trait.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::db::repositories::user::generate_token;
use crate::db::{ImpersonationRecord, Store};
use crate::domain::Role;
use crate::services::impersonation_service::{
    ImpersonationError, ImpersonationGrant, ImpersonationService, ImpersonationSession,
};

pub struct SeaOrmImpersonationService {
    store: Store,
    ttl_minutes: i64,
}

impl SeaOrmImpersonationService {
    #[must_use]
    pub const fn new(store: Store, ttl_minutes: i64) -> Self {
        Self { store, ttl_minutes }
    }
}

fn is_expired(record: &ImpersonationRecord, now: DateTime<Utc>) -> bool {
    DateTime::parse_from_rfc3339(&record.expires_at)
        .map_or(true, |expires_at| now >= expires_at.with_timezone(&Utc))
}

fn session_from(record: &ImpersonationRecord) -> ImpersonationSession {
    ImpersonationSession {
        token: record.token.clone(),
        admin_id: record.admin_id,
        seller_id: record.seller_id,
        started_at: record.started_at.clone(),
        expires_at: record.expires_at.clone(),
    }
}

#[async_trait]
impl ImpersonationService for SeaOrmImpersonationService {
    async fn start(
        &self,
        admin_id: i32,
        seller_id: i32,
    ) -> Result<ImpersonationGrant, ImpersonationError> {
        let seller = self
            .store
            .get_user_by_id(seller_id)
            .await?
            .ok_or(ImpersonationError::SellerNotFound)?;

        if seller.role != Role::Seller {
            return Err(ImpersonationError::SellerNotFound);
        }

        let now = Utc::now();
        let token = generate_token();
        let started_at = now.to_rfc3339();
        let expires_at = (now + Duration::minutes(self.ttl_minutes)).to_rfc3339();

        self.store
            .create_impersonation_session(&token, admin_id, seller_id, &started_at, &expires_at)
            .await?;

        tracing::info!(admin_id, seller_id, "Impersonation session started");

        Ok(ImpersonationGrant { token, expires_at })
    }

    async fn validate(
        &self,
        token: &str,
    ) -> Result<Option<ImpersonationSession>, ImpersonationError> {
        let Some(record) = self.store.get_impersonation_session(token).await? else {
            return Ok(None);
        };

        if record.ended_at.is_some() || is_expired(&record, Utc::now()) {
            return Ok(None);
        }

        Ok(Some(session_from(&record)))
    }

    async fn end(
        &self,
        token: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), ImpersonationError> {
        let record = self
            .store
            .get_impersonation_session(token)
            .await?
            .ok_or(ImpersonationError::InvalidSession)?;

        if record.ended_at.is_some() {
            return Err(ImpersonationError::AlreadyEnded);
        }

        let admin_id = record.admin_id;
        let seller_id = record.seller_id;

        self.store
            .end_impersonation_session(record, ip, user_agent)
            .await?;

        tracing::info!(admin_id, seller_id, "Impersonation session ended");

        Ok(())
    }
}
