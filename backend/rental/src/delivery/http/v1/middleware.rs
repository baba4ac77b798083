use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::domain::user::{Actor, Role};
use crate::usecase::error::UsecaseError;
use crate::AppState;

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.user_id,
            role: self.role,
        }
    }
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

/// Resolves the bearer token to a live user on every request, so role
/// changes and deletions take effect before the token expires.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, UsecaseError> {
    let Some(token) = bearer_token(&request) else {
        tracing::warn!("missing or invalid authorization header");
        return Err(UsecaseError::Unauthenticated("Please authenticate.".to_string()));
    };

    let user = state.auth_usecase.authenticate(&token).await?;

    let authenticated_user = AuthenticatedUser {
        user_id: user.id,
        email: user.email,
        role: user.role,
    };

    tracing::debug!(?authenticated_user, "user authenticated successfully");
    request.extensions_mut().insert(authenticated_user);

    Ok(next.run(request).await)
}
