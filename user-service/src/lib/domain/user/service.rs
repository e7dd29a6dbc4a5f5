use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;

use crate::domain::access::context::AuthContext;
use crate::domain::access::context::AuthContextResolver;
use crate::domain::access::guard::require_auth;
use crate::domain::access::guard::require_role;
use crate::domain::user::models::AuthSession;
use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::NewPassword;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::Role;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserPatch;
use crate::domain::user::store::UserStore;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for identity operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    store: Arc<UserStore<UR>>,
    authenticator: Arc<Authenticator>,
    resolver: AuthContextResolver<UR>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `authenticator` - Password and token handling; its hasher is also used on the store's write path
    pub fn new(repository: Arc<UR>, authenticator: Arc<Authenticator>) -> Self {
        let store = Arc::new(UserStore::new(
            repository,
            authenticator.password_hasher().clone(),
        ));
        let resolver = AuthContextResolver::new(Arc::clone(&store), Arc::clone(&authenticator));

        Self {
            store,
            authenticator,
            resolver,
        }
    }

    fn issue_session(&self, user: User) -> Result<AuthSession, UserError> {
        let token = self.authenticator.issue_token(&user.id.to_string())?;
        Ok(AuthSession { token, user })
    }

    async fn verify_password(&self, password: String, stored_hash: String) -> bool {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || authenticator.verify_password(&password, &stored_hash))
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Password verification task failed");
                false
            })
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn resolve_context(&self, authorization: Option<&str>) -> AuthContext {
        self.resolver.resolve(authorization).await
    }

    async fn register(&self, command: RegisterCommand) -> Result<AuthSession, UserError> {
        match self
            .store
            .find_by_email_or_username(&command.email, &command.username)
            .await
        {
            Ok(existing) if existing.email == command.email => {
                return Err(UserError::EmailAlreadyExists(command.email.to_string()))
            }
            Ok(_) => {
                return Err(UserError::UsernameAlreadyExists(
                    command.username.to_string(),
                ))
            }
            Err(UserError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let password = NewPassword::new(command.password)?;
        let role = command.role.unwrap_or_default();

        let user = self
            .store
            .create(command.username, command.email, password, role)
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        self.issue_session(user)
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthSession, UserError> {
        let email = EmailAddress::new(command.email).map_err(|_| UserError::InvalidCredentials)?;

        let user = self.store.find_by_email(&email).await.map_err(|e| match e {
            UserError::NotFound(_) => UserError::InvalidCredentials,
            other => other,
        })?;

        let authenticator = Arc::clone(&self.authenticator);
        let password = command.password;
        let stored_hash = user.password_hash.clone();
        let subject = user.id.to_string();

        let result = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&password, &stored_hash, &subject)
        })
        .await
        .map_err(|e| UserError::Unknown(format!("Authentication task failed: {}", e)))?;

        match result {
            Ok(authentication) => {
                tracing::info!(user_id = %user.id, "User logged in");
                Ok(AuthSession {
                    token: authentication.access_token,
                    user,
                })
            }
            Err(AuthenticationError::InvalidCredentials) => {
                tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
                Err(UserError::InvalidCredentials)
            }
            Err(AuthenticationError::JwtError(e)) => Err(UserError::Token(e)),
        }
    }

    async fn me(&self, ctx: &AuthContext) -> Result<User, UserError> {
        require_auth(ctx).cloned()
    }

    async fn get_user(&self, ctx: &AuthContext, id: &UserId) -> Result<User, UserError> {
        let caller = require_auth(ctx)?;
        let user = self.store.find_by_id(id).await?;

        if caller.id != user.id && caller.role != Role::Manager {
            return Err(UserError::Forbidden(
                "Only managers can view other users".to_string(),
            ));
        }

        Ok(user)
    }

    async fn list_users(&self, ctx: &AuthContext) -> Result<Vec<User>, UserError> {
        require_role(ctx, Role::Manager)?;
        self.store.list_live().await
    }

    async fn update_profile(
        &self,
        ctx: &AuthContext,
        command: UpdateProfileCommand,
    ) -> Result<User, UserError> {
        let caller = require_auth(ctx)?;

        self.store
            .ensure_available(&caller.id, command.username.as_ref(), command.email.as_ref())
            .await?;

        if command.role.is_some() && caller.role != Role::Manager {
            return Err(UserError::Forbidden(
                "Only managers can change roles".to_string(),
            ));
        }

        let patch = UserPatch {
            username: command.username,
            email: command.email,
            role: command.role,
            new_password: None,
        };

        let user = self.store.update(&caller.id, patch).await?;

        tracing::info!(user_id = %user.id, "Profile updated");

        Ok(user)
    }

    async fn change_password(
        &self,
        ctx: &AuthContext,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError> {
        let caller = require_auth(ctx)?;

        if !self
            .verify_password(command.current_password, caller.password_hash.clone())
            .await
        {
            return Err(UserError::InvalidCredentials);
        }

        let patch = UserPatch {
            new_password: Some(NewPassword::new(command.new_password)?),
            ..Default::default()
        };

        self.store.update(&caller.id, patch).await?;

        tracing::info!(user_id = %caller.id, "Password changed");

        Ok(())
    }

    async fn delete_user(&self, ctx: &AuthContext, id: &UserId) -> Result<(), UserError> {
        let caller = require_role(ctx, Role::Manager)?;

        if caller.id == *id {
            return Err(UserError::SelfDeletion);
        }

        self.store.soft_delete(id).await?;

        tracing::info!(user_id = %id, deleted_by = %caller.id, "User soft-deleted");

        Ok(())
    }
}
