use axum::extract::Request;
use axum::extract::State;
use axum::http;
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::access::context::AuthContext;
use crate::inbound::http::router::AppState;

/// Middleware that resolves the caller's [`AuthContext`] and stores it in request extensions.
///
/// Never rejects a request: missing or invalid credentials produce an anonymous
/// context and each operation decides whether that is acceptable.
pub async fn resolve_auth_context(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let authorization = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let ctx: AuthContext = state
        .user_service
        .resolve_context(authorization.as_deref())
        .await;

    if let Some(user) = ctx.user() {
        tracing::debug!(user_id = %user.id, role = %user.role, "Request authenticated");
    }

    req.extensions_mut().insert(ctx);

    next.run(req).await
}
