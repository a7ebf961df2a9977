mod extract;
mod middleware;
mod permissions;
mod roles;
mod users;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};

use crate::service::AccessService;

pub use middleware::CurrentUser;

pub(crate) use extract::{Body, Params};

/// Shared application state.
pub type AppState = Arc<AccessService>;

/// Build the complete access API router.
///
/// All resource routes live under `/api/v1`; everything except signup
/// and login sits behind the token middleware.
pub fn build_router(svc: Arc<AccessService>) -> Router {
    let api = Router::new()
        .merge(permissions::routes())
        .merge(roles::routes())
        .merge(users::routes());

    Router::new()
        .nest("/api/v1", api)
        .layer(axum::middleware::from_fn_with_state(
            svc.clone(),
            middleware::require_token,
        ))
        .with_state(svc)
}

/// Wrap a JSON object body with the protocol's `success` flag.
///
/// `success` is computed from the status, not asserted by handlers:
/// 200, 201 and 206 are the success statuses, everything else is not.
pub(crate) fn envelope(status: StatusCode, body: serde_json::Value) -> Response {
    let mut body = body;
    if let Some(obj) = body.as_object_mut() {
        obj.insert(
            "success".to_string(),
            serde_json::Value::Bool(is_success(status)),
        );
    }
    (status, Json(body)).into_response()
}

fn is_success(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::OK | StatusCode::CREATED | StatusCode::PARTIAL_CONTENT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body as HttpBody;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::service::test_support::test_service;

    #[test]
    fn test_success_statuses() {
        assert!(is_success(StatusCode::OK));
        assert!(is_success(StatusCode::CREATED));
        assert!(is_success(StatusCode::PARTIAL_CONTENT));
        assert!(!is_success(StatusCode::NO_CONTENT));
        assert!(!is_success(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_envelope_preserves_status() {
        let created = envelope(StatusCode::CREATED, serde_json::json!({"id": "x"}));
        assert_eq!(created.status(), StatusCode::CREATED);
    }

    fn test_router() -> Router {
        build_router(test_service())
    }

    async fn send(
        app: &Router,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("jwt {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(HttpBody::from(json.to_string()))
                .unwrap(),
            None => builder.body(HttpBody::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn signup(app: &Router) -> (String, String) {
        let (status, body) = send(
            app,
            "POST",
            "/api/v1/users/signup",
            None,
            Some(serde_json::json!({
                "email": "alice@example.com",
                "userName": "alice",
                "firstName": "Alice",
                "lastName": "Warden",
                "password": "Abc123",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_collection_routes_accept_trailing_slash() {
        let app = test_router();
        let (token, _) = signup(&app).await;

        for path in [
            "/api/v1/permissions",
            "/api/v1/permissions/",
            "/api/v1/roles",
            "/api/v1/roles/",
            "/api/v1/users",
            "/api/v1/users/",
        ] {
            let (status, body) = send(&app, "GET", path, Some(&token), None).await;
            assert_eq!(status, StatusCode::OK, "GET {}", path);
            assert_eq!(body["success"], serde_json::json!(true), "GET {}", path);
        }

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/roles/",
            Some(&token),
            Some(serde_json::json!({"name": "auditor"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_token_scheme_is_required() {
        let app = test_router();
        let (token, _) = signup(&app).await;

        // No header at all.
        let (status, body) = send(&app, "GET", "/api/v1/roles", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], serde_json::json!(false));

        // Wrong scheme: the same token behind "Bearer" is not accepted.
        let request = Request::builder()
            .method("GET")
            .uri("/api/v1/roles")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(HttpBody::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // The documented scheme works.
        let (status, _) = send(&app, "GET", "/api/v1/roles", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_transport_rejections_use_envelope() {
        let app = test_router();
        let (token, _) = signup(&app).await;

        // Syntactically broken JSON body.
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/users/signup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(HttpBody::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], serde_json::json!(false));
        assert_eq!(body["code"], serde_json::json!("VALIDATION_FAILED"));

        // Non-numeric pagination parameter.
        let (status, body) = send(
            &app,
            "GET",
            "/api/v1/permissions?limit=abc",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], serde_json::json!(false));
        assert_eq!(body["code"], serde_json::json!("VALIDATION_FAILED"));
    }

    #[tokio::test]
    async fn test_deleted_account_token_is_rejected() {
        let app = test_router();
        let (token, user_id) = signup(&app).await;

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/v1/users/{}", user_id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // The token is still signed and unexpired, but the account is gone.
        let (status, body) = send(&app, "GET", "/api/v1/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], serde_json::json!(false));
    }
}
