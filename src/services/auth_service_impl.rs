//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;

use crate::db::{Store, User};
use crate::domain::UserStatus;
use crate::services::auth_service::{AuthError, AuthService, Identity};

pub struct SeaOrmAuthService {
    store: Store,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn identity_from(user: User) -> Identity {
    Identity {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let user = self
            .store
            .verify_user_password(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if user.status != UserStatus::Approved {
            return Err(AuthError::AccountNotApproved);
        }

        tracing::info!(user_id = user.id, "Login successful");

        Ok(identity_from(user))
    }

    async fn get_identity(&self, user_id: i32) -> Result<Identity, AuthError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(identity_from(user))
    }
}
