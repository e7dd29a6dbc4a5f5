use std::sync::Arc;

use auth::Authenticator;
use auth::JwtError;

use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::store::UserStore;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;

/// Identity of the caller of one request, resolved before the operation runs.
#[derive(Debug, Clone)]
pub enum AuthContext {
    /// No usable credentials. `reason` is set when a token was presented but rejected.
    Anonymous { reason: Option<JwtError> },
    Authenticated(User),
}

impl AuthContext {
    pub fn anonymous() -> Self {
        AuthContext::Anonymous { reason: None }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthContext::Authenticated(user) => Some(user),
            AuthContext::Anonymous { .. } => None,
        }
    }
}

/// Extract the token from a `Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Turns an `Authorization` header into an [`AuthContext`].
///
/// Never fails: every problem degrades to an anonymous context and the
/// access guards decide what that means for the operation.
pub struct AuthContextResolver<UR>
where
    UR: UserRepository,
{
    store: Arc<UserStore<UR>>,
    authenticator: Arc<Authenticator>,
}

impl<UR> AuthContextResolver<UR>
where
    UR: UserRepository,
{
    pub fn new(store: Arc<UserStore<UR>>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            store,
            authenticator,
        }
    }

    pub async fn resolve(&self, authorization: Option<&str>) -> AuthContext {
        let Some(token) = authorization.and_then(bearer_token) else {
            return AuthContext::anonymous();
        };

        let subject = match self.authenticator.verify_token(token) {
            Ok(subject) => subject,
            Err(reason) => {
                match &reason {
                    JwtError::InvalidSignature => {
                        tracing::warn!("Rejected bearer token with invalid signature")
                    }
                    other => tracing::debug!(error = %other, "Rejected bearer token"),
                }
                return AuthContext::Anonymous {
                    reason: Some(reason),
                };
            }
        };

        let user_id = match UserId::from_string(&subject) {
            Ok(user_id) => user_id,
            Err(e) => {
                tracing::warn!(error = %e, "Bearer token carries an unparsable subject");
                return AuthContext::Anonymous {
                    reason: Some(JwtError::Malformed(e.to_string())),
                };
            }
        };

        match self.store.find_by_id(&user_id).await {
            Ok(user) => AuthContext::Authenticated(user),
            Err(UserError::NotFound(_)) => {
                tracing::debug!(user_id = %user_id, "Token subject no longer exists");
                AuthContext::anonymous()
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Failed to load token subject");
                AuthContext::anonymous()
            }
        }
    }
}
