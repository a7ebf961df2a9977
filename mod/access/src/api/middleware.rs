//! Bearer token middleware.
//!
//! Every `/api/v1` route except signup and login requires an
//! `Authorization: jwt <token>` header. The middleware checks the
//! signature and expiry, then re-fetches the live user record — claims
//! carry only the subject id, never authorization state, so a deleted
//! account is locked out the moment its row is gone even if its token
//! has time left.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use warden_core::ServiceError;

use crate::api::AppState;
use crate::model::UserView;
use crate::service::AccessError;

/// Endpoints reachable without a token.
const PUBLIC_PATHS: &[&str] = &["/api/v1/users/signup", "/api/v1/users/login"];

/// The authenticated caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserView);

pub async fn require_token(
    State(svc): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if PUBLIC_PATHS.contains(&path) {
        return next.run(request).await;
    }

    let token = match request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("jwt "))
    {
        Some(token) => token,
        None => {
            return ServiceError::Unauthorized("missing authorization token".into())
                .into_response();
        }
    };

    let claims = match svc.verify_token(token) {
        Ok(claims) => claims,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    // The token only proves identity; the account must still exist.
    // Anything other than a missing account is a real failure and
    // keeps its own status.
    let user = match svc.get_user(&claims.sub) {
        Ok(user) => user,
        Err(AccessError::NotFound(_)) => {
            return ServiceError::Unauthorized("account no longer exists".into())
                .into_response();
        }
        Err(e) => return ServiceError::from(e).into_response(),
    };

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}
