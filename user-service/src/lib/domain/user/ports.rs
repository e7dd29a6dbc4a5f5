use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::access::context::AuthContext;
use crate::domain::user::models::AuthSession;
use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserChanges;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;

/// Port for the identity operations exposed to transports.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Build the authentication context of an inbound request.
    ///
    /// # Arguments
    /// * `authorization` - Raw `Authorization` header value, if any
    ///
    /// # Returns
    /// Anonymous or authenticated context; never fails
    async fn resolve_context(&self, authorization: Option<&str>) -> AuthContext;

    /// Register a new account and log it in.
    ///
    /// # Returns
    /// Token and created user
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` / `EmailAlreadyExists` - Identity already in use by a live user
    /// * `WeakPassword` - Password shorter than the policy minimum
    async fn register(&self, command: RegisterCommand) -> Result<AuthSession, UserError>;

    /// Exchange email and password for a token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password, indistinguishably
    async fn login(&self, command: LoginCommand) -> Result<AuthSession, UserError>;

    /// Return the caller's own record.
    ///
    /// # Errors
    /// * `Unauthenticated` - No authenticated caller
    async fn me(&self, ctx: &AuthContext) -> Result<User, UserError>;

    /// Return a user by id. Managers may read anyone; others only themselves.
    ///
    /// # Errors
    /// * `Unauthenticated` - No authenticated caller
    /// * `NotFound` - No live user with this id
    /// * `Forbidden` - Caller is neither the target nor a manager
    async fn get_user(&self, ctx: &AuthContext, id: &UserId) -> Result<User, UserError>;

    /// List all live users, most recently created first. Managers only.
    ///
    /// # Errors
    /// * `Unauthenticated` - No authenticated caller
    /// * `Forbidden` - Caller is not a manager
    async fn list_users(&self, ctx: &AuthContext) -> Result<Vec<User>, UserError>;

    /// Update the caller's username, email or role.
    ///
    /// # Errors
    /// * `Unauthenticated` - No authenticated caller
    /// * `UsernameAlreadyExists` / `EmailAlreadyExists` - Value used by another live user
    /// * `Forbidden` - Role change requested by a non-manager
    async fn update_profile(
        &self,
        ctx: &AuthContext,
        command: UpdateProfileCommand,
    ) -> Result<User, UserError>;

    /// Replace the caller's password after checking the current one.
    ///
    /// # Errors
    /// * `Unauthenticated` - No authenticated caller
    /// * `InvalidCredentials` - Current password does not verify
    /// * `WeakPassword` - New password shorter than the policy minimum
    async fn change_password(
        &self,
        ctx: &AuthContext,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError>;

    /// Soft-delete another user. Managers only.
    ///
    /// # Errors
    /// * `Unauthenticated` - No authenticated caller
    /// * `Forbidden` - Caller is not a manager
    /// * `SelfDeletion` - Target is the caller
    /// * `NotFound` - No live user with this id
    async fn delete_user(&self, ctx: &AuthContext, id: &UserId) -> Result<(), UserError>;
}

/// Persistence operations for user aggregate.
///
/// Every read is scoped to live (non-deleted) records. Implementations must
/// enforce username and email uniqueness among live records atomically with
/// the write, not with a separate read.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is taken by a live user
    /// * `EmailAlreadyExists` - Email is taken by a live user
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve live user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve live user by username.
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError>;

    /// Retrieve live user by email address.
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;

    /// Retrieve a live user matching either the email or the username.
    ///
    /// When two different users match, the one owning the email wins.
    async fn find_by_email_or_username(
        &self,
        email: &EmailAddress,
        username: &Username,
    ) -> Result<Option<User>, UserError>;

    /// Retrieve all live users, most recently created first.
    async fn list_live(&self) -> Result<Vec<User>, UserError>;

    /// Apply `changes` to a live user and stamp `updated_at`, as one atomic write.
    ///
    /// Fields not set in `changes` keep their current stored value.
    ///
    /// # Returns
    /// The record as stored after the write
    ///
    /// # Errors
    /// * `NotFound` - No live user with this id
    /// * `UsernameAlreadyExists` - New username is taken by another live user
    /// * `EmailAlreadyExists` - New email is taken by another live user
    /// * `DatabaseError` - Database operation failed
    async fn update(
        &self,
        id: &UserId,
        changes: UserChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<User, UserError>;

    /// Mark a live user as deleted.
    ///
    /// # Errors
    /// * `NotFound` - No live user with this id (including already deleted ones)
    /// * `DatabaseError` - Database operation failed
    async fn soft_delete(&self, id: &UserId, deleted_at: DateTime<Utc>) -> Result<(), UserError>;
}
