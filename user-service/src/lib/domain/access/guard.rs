use crate::domain::access::context::AuthContext;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::user::errors::UserError;

/// Return the authenticated caller.
///
/// # Errors
/// * `Unauthenticated` - Context is anonymous
pub fn require_auth(ctx: &AuthContext) -> Result<&User, UserError> {
    ctx.user().ok_or(UserError::Unauthenticated)
}

/// Return the authenticated caller if it holds exactly `role`.
///
/// Roles are not hierarchical: a manager does not pass a member check.
///
/// # Errors
/// * `Unauthenticated` - Context is anonymous
/// * `Forbidden` - Caller has another role
pub fn require_role(ctx: &AuthContext, role: Role) -> Result<&User, UserError> {
    let user = require_auth(ctx)?;

    if user.role != role {
        return Err(UserError::Forbidden(format!("Required role: {}", role)));
    }

    Ok(user)
}
