use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::entities::{prelude::*, users};
use crate::utils::auth::create_jwt;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// Account creation, authentication and token issuance.
pub struct UserService {
    db: DatabaseConnection,
    config: AppConfig,
}

impl UserService {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self { db, config }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, AppError> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<users::Model>, AppError> {
        let user = Users::find_by_id(user_id).one(&self.db).await?;
        Ok(user)
    }

    /// Create a new account. The email lookup is an exact, case-sensitive
    /// match; the unique index backstops concurrent signups with the same
    /// rejection.
    pub async fn create(&self, email: &str, password: &str) -> Result<users::Model, AppError> {
        if self.find_by_email(email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(e.to_string()))?
            .to_string();

        let now = Utc::now();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let user = user
            .insert(&self.db)
            .await
            .map_err(|_| AppError::BadRequest("Email already registered".to_string()))?;

        Ok(user)
    }

    /// Verify credentials. Unknown email, wrong password and deactivated
    /// accounts all come back as `None` so callers cannot tell them apart.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<users::Model>, AppError> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };

        if !user.is_active {
            return Ok(None);
        }

        let Ok(parsed_hash) = PasswordHash::new(&user.password_hash) else {
            return Ok(None);
        };

        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_err()
        {
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Issue a signed access token for the user. `remember_me` selects the
    /// extended expiry class; both durations come from configuration.
    pub fn issue_token(&self, user: &users::Model, remember_me: bool) -> Result<String, AppError> {
        let expires_minutes = if remember_me {
            self.config.remember_me_expire_minutes
        } else {
            self.config.access_token_expire_minutes
        };

        create_jwt(&user.id, &self.config.jwt_secret, expires_minutes)
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
