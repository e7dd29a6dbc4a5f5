use std::sync::Arc;

use auth::PasswordHasher;
use chrono::Utc;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::NewPassword;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::domain::user::models::UserChanges;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserPatch;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;

/// Owner of user records.
///
/// Wraps a [`UserRepository`] and is the only write path for passwords: a
/// [`NewPassword`] handed to `create` or `update` is hashed here before it
/// reaches storage.
pub struct UserStore<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    password_hasher: PasswordHasher,
}

impl<UR> UserStore<UR>
where
    UR: UserRepository,
{
    pub fn new(repository: Arc<UR>, password_hasher: PasswordHasher) -> Self {
        Self {
            repository,
            password_hasher,
        }
    }

    pub async fn find_by_id(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }

    pub async fn find_by_email(&self, email: &EmailAddress) -> Result<User, UserError> {
        self.repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| UserError::NotFound(email.to_string()))
    }

    pub async fn find_by_username(&self, username: &Username) -> Result<User, UserError> {
        self.repository
            .find_by_username(username)
            .await?
            .ok_or_else(|| UserError::NotFound(username.to_string()))
    }

    pub async fn find_by_email_or_username(
        &self,
        email: &EmailAddress,
        username: &Username,
    ) -> Result<User, UserError> {
        self.repository
            .find_by_email_or_username(email, username)
            .await?
            .ok_or_else(|| UserError::NotFound(format!("{} / {}", email, username)))
    }

    pub async fn list_live(&self) -> Result<Vec<User>, UserError> {
        self.repository.list_live().await
    }

    /// Create a user, hashing `password` first.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` / `EmailAlreadyExists` - Raised by the repository at insert time
    /// * `Password` - Hashing failed
    pub async fn create(
        &self,
        username: Username,
        email: EmailAddress,
        password: NewPassword,
        role: Role,
    ) -> Result<User, UserError> {
        let password_hash = self.hash(password).await?;
        let now = Utc::now();

        let user = User {
            id: UserId::new(),
            username,
            email,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.repository.create(user).await
    }

    /// Fail if `username` or `email` is held by a live user other than `id`.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` / `EmailAlreadyExists` - Value used by another live user
    pub async fn ensure_available(
        &self,
        id: &UserId,
        username: Option<&Username>,
        email: Option<&EmailAddress>,
    ) -> Result<(), UserError> {
        if let Some(username) = username {
            if let Some(other) = self.repository.find_by_username(username).await? {
                if other.id != *id {
                    return Err(UserError::UsernameAlreadyExists(username.to_string()));
                }
            }
        }

        if let Some(email) = email {
            if let Some(other) = self.repository.find_by_email(email).await? {
                if other.id != *id {
                    return Err(UserError::EmailAlreadyExists(email.to_string()));
                }
            }
        }

        Ok(())
    }

    /// Apply a partial update to a live user.
    ///
    /// Username and email are checked against other live users before writing;
    /// the repository re-checks atomically on write. Only the fields set in
    /// `patch` are written, so a concurrent update of other fields survives.
    ///
    /// # Errors
    /// * `NotFound` - No live user with this id
    /// * `UsernameAlreadyExists` / `EmailAlreadyExists` - Value used by another live user
    /// * `Password` - Hashing failed
    pub async fn update(&self, id: &UserId, patch: UserPatch) -> Result<User, UserError> {
        self.ensure_available(id, patch.username.as_ref(), patch.email.as_ref())
            .await?;

        let password_hash = match patch.new_password {
            Some(password) => Some(self.hash(password).await?),
            None => None,
        };

        let changes = UserChanges {
            username: patch.username,
            email: patch.email,
            role: patch.role,
            password_hash,
        };

        self.repository.update(id, changes, Utc::now()).await
    }

    /// Soft-delete a live user.
    ///
    /// # Errors
    /// * `NotFound` - No live user with this id
    pub async fn soft_delete(&self, id: &UserId) -> Result<(), UserError> {
        self.repository.soft_delete(id, Utc::now()).await
    }

    async fn hash(&self, password: NewPassword) -> Result<String, UserError> {
        let hasher = self.password_hasher.clone();

        tokio::task::spawn_blocking(move || hasher.hash(password.expose()))
            .await
            .map_err(|e| UserError::Unknown(format!("Password hashing task failed: {}", e)))?
            .map_err(UserError::from)
    }
}
