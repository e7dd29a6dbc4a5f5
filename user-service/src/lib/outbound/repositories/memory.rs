use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserChanges;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Process-local user storage.
///
/// Used when no database is configured and in tests. Uniqueness checks and
/// writes happen under the same write guard, so concurrent registrations of
/// one identity cannot both succeed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Find a live user other than `id` that already holds the username or email.
fn conflict_with(users: &HashMap<UserId, User>, candidate: &User) -> Option<UserError> {
    let others = users
        .values()
        .filter(|u| !u.is_deleted() && u.id != candidate.id);

    let mut username_taken = false;
    for other in others {
        if other.email == candidate.email {
            return Some(UserError::EmailAlreadyExists(candidate.email.to_string()));
        }
        if other.username == candidate.username {
            username_taken = true;
        }
    }

    username_taken.then(|| UserError::UsernameAlreadyExists(candidate.username.to_string()))
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;

        if let Some(conflict) = conflict_with(&users, &user) {
            return Err(conflict);
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let users = self.users.read().await;
        Ok(users.get(id).filter(|u| !u.is_deleted()).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| !u.is_deleted() && u.username == *username)
            .cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| !u.is_deleted() && u.email == *email)
            .cloned())
    }

    async fn find_by_email_or_username(
        &self,
        email: &EmailAddress,
        username: &Username,
    ) -> Result<Option<User>, UserError> {
        if let Some(user) = self.find_by_email(email).await? {
            return Ok(Some(user));
        }
        self.find_by_username(username).await
    }

    async fn list_live(&self) -> Result<Vec<User>, UserError> {
        let users = self.users.read().await;

        let mut live: Vec<User> = users.values().filter(|u| !u.is_deleted()).cloned().collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(live)
    }

    async fn update(
        &self,
        id: &UserId,
        changes: UserChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<User, UserError> {
        let mut users = self.users.write().await;

        let mut user = match users.get(id) {
            Some(existing) if !existing.is_deleted() => existing.clone(),
            _ => return Err(UserError::NotFound(id.to_string())),
        };
        changes.apply_to(&mut user);
        user.updated_at = updated_at;

        if let Some(conflict) = conflict_with(&users, &user) {
            return Err(conflict);
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn soft_delete(&self, id: &UserId, deleted_at: DateTime<Utc>) -> Result<(), UserError> {
        let mut users = self.users.write().await;

        match users.get_mut(id) {
            Some(user) if !user.is_deleted() => {
                user.deleted_at = Some(deleted_at);
                user.updated_at = deleted_at;
                Ok(())
            }
            _ => Err(UserError::NotFound(id.to_string())),
        }
    }
}
