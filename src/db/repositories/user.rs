use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::domain::{Role, UserStatus};
use crate::entities::users;

/// User data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            // Unknown strings cannot appear through this crate's write paths;
            // degrade to the least-privileged values rather than erroring.
            role: Role::parse(&model.role).unwrap_or(Role::User),
            status: UserStatus::parse(&model.status).unwrap_or(UserStatus::Pending),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Create a user with a hashed password. New accounts start `pending`
    /// until approved through the admin flow.
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        password: &str,
        role: Role,
        status: UserStatus,
        security: &SecurityConfig,
    ) -> Result<User> {
        let password = password.to_string();
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            email: Set(email.to_string()),
            name: Set(name.to_string()),
            password_hash: Set(password_hash),
            role: Set(role.as_str().to_string()),
            status: Set(status.as_str().to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    /// Verify password for a user by email, returning the user on success.
    /// Argon2 verification runs in a blocking task; it is CPU-bound and would
    /// stall the async runtime otherwise.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    pub async fn list(&self, status: Option<UserStatus>, limit: u64) -> Result<Vec<User>> {
        let mut query = users::Entity::find().order_by_asc(users::Column::Id);

        if let Some(status) = status {
            query = query.filter(users::Column::Status.eq(status.as_str()));
        }

        let models = query
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(models.into_iter().map(User::from).collect())
    }

    pub async fn set_status(&self, id: i32, status: UserStatus) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for status update")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(now);
        let model = active.update(&self.conn).await?;

        Ok(Some(User::from(model)))
    }
}

/// Hash a password using Argon2id with the configured params.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random bearer token / API key (64 character hex string)
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
