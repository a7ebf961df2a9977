use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, patch, post};
use axum::Router;

use warden_core::{ListParams, ServiceError};

use crate::api::{envelope, AppState, Body, CurrentUser, Params};
use crate::model::SignUp;

pub fn routes() -> Router<AppState> {
    let collection = get(list_users);
    Router::new()
        .route("/users", collection.clone())
        .route("/users/", collection)
        .route("/users/signup", post(sign_up))
        .route("/users/login", post(login))
        .route("/users/me", get(me))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/{id}/add-roles", patch(add_roles))
        .route("/users/{id}/remove-roles", patch(remove_roles))
}

async fn sign_up(
    State(svc): State<AppState>,
    Body(input): Body<SignUp>,
) -> Result<Response, ServiceError> {
    let payload = svc.sign_up(input)?;
    Ok(envelope(
        StatusCode::CREATED,
        serde_json::json!({ "user": payload.user, "token": payload.token }),
    ))
}

/// Login body: `identifier` is an email iff it contains `@`,
/// otherwise a user name.
#[derive(Debug, serde::Deserialize)]
struct LoginBody {
    identifier: String,
    password: String,
}

async fn login(
    State(svc): State<AppState>,
    Body(body): Body<LoginBody>,
) -> Result<Response, ServiceError> {
    let payload = svc.authenticate(&body.identifier, &body.password)?;
    Ok(envelope(
        StatusCode::OK,
        serde_json::json!({ "user": payload.user, "token": payload.token }),
    ))
}

/// The caller's own record, resolved by the token middleware.
async fn me(
    axum::Extension(current): axum::Extension<CurrentUser>,
) -> Result<Response, ServiceError> {
    Ok(envelope(
        StatusCode::OK,
        serde_json::json!({ "user": current.0 }),
    ))
}

async fn list_users(
    State(svc): State<AppState>,
    Params(params): Params<ListParams>,
) -> Result<Response, ServiceError> {
    let result = svc.list_users(&params)?;
    Ok(envelope(
        StatusCode::OK,
        serde_json::json!({ "users": result.items, "total": result.total }),
    ))
}

async fn get_user(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let user = svc.get_user(&id)?;
    Ok(envelope(StatusCode::OK, serde_json::json!({ "user": user })))
}

async fn update_user(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Body(patch): Body<serde_json::Value>,
) -> Result<Response, ServiceError> {
    let user = svc.update_user(&id, &patch)?;
    Ok(envelope(StatusCode::OK, serde_json::json!({ "user": user })))
}

#[derive(Debug, serde::Deserialize)]
struct RolesBody {
    #[serde(default)]
    roles: Vec<String>,
}

async fn add_roles(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Body(body): Body<RolesBody>,
) -> Result<Response, ServiceError> {
    let user = svc.add_user_roles(&id, &body.roles)?;
    Ok(envelope(StatusCode::OK, serde_json::json!({ "user": user })))
}

async fn remove_roles(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Body(body): Body<RolesBody>,
) -> Result<Response, ServiceError> {
    let user = svc.remove_user_roles(&id, &body.roles)?;
    Ok(envelope(StatusCode::OK, serde_json::json!({ "user": user })))
}

async fn delete_user(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let user = svc.delete_user(&id)?;
    Ok(envelope(
        StatusCode::OK,
        serde_json::json!({
            "message": format!("User {} successfully deleted.", user.user_name),
        }),
    ))
}
