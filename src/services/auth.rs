//! Authentication service: password verification and token issuance

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, Role, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Verify credentials and issue a JWT
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|e| AppError::Internal(format!("Stored password hash is invalid: {}", e)))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AppError::Authentication("Invalid credentials".to_string()))?;

        let claims = UserClaims::new(&user, self.config.jwt_expiration_hours);
        let token = claims.to_token(&self.config.jwt_secret)?;

        Ok((token, user))
    }

    /// Register a new user (defaults to the READER role)
    pub async fn create_user(&self, request: CreateUser) -> AppResult<User> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(request.password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?
            .to_string();

        self.repository
            .users
            .create(
                &request.name,
                &request.email,
                &hash,
                request.role.unwrap_or(Role::Reader),
            )
            .await
    }

    /// Get user by ID
    pub async fn get_user(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create the configured admin account when it does not exist yet
    pub async fn ensure_bootstrap_admin(&self) -> AppResult<()> {
        let (Some(email), Some(password)) = (
            self.config.bootstrap_admin_email.clone(),
            self.config.bootstrap_admin_password.clone(),
        ) else {
            return Ok(());
        };

        if self.repository.users.find_by_email(&email).await?.is_some() {
            return Ok(());
        }

        self.create_user(CreateUser {
            name: "Administrator".to_string(),
            email: email.clone(),
            password,
            role: Some(Role::Admin),
        })
        .await?;

        tracing::warn!(
            "Created bootstrap admin account {}; change its password",
            email
        );
        Ok(())
    }
}
