use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, patch};
use axum::Router;

use warden_core::{ListParams, ServiceError};

use crate::api::{envelope, AppState, Body, Params};
use crate::model::{CreateRole, PermissionPair};

pub fn routes() -> Router<AppState> {
    let collection = get(list_roles).post(create_role);
    Router::new()
        .route("/roles", collection.clone())
        .route("/roles/", collection)
        .route("/roles/{id}", get(get_role).delete(delete_role))
        .route("/roles/{id}/add-permissions", patch(add_permissions))
        .route("/roles/{id}/remove-permissions", patch(remove_permissions))
        .route("/roles/{id}/rename", patch(rename_role))
}

async fn create_role(
    State(svc): State<AppState>,
    Body(input): Body<CreateRole>,
) -> Result<Response, ServiceError> {
    let role = svc.create_role(input)?;
    Ok(envelope(
        StatusCode::CREATED,
        serde_json::json!({ "role": role }),
    ))
}

async fn list_roles(
    State(svc): State<AppState>,
    Params(params): Params<ListParams>,
) -> Result<Response, ServiceError> {
    let result = svc.list_roles(&params)?;
    Ok(envelope(
        StatusCode::OK,
        serde_json::json!({ "roles": result.items, "total": result.total }),
    ))
}

async fn get_role(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let role = svc.get_role(&id)?;
    Ok(envelope(StatusCode::OK, serde_json::json!({ "role": role })))
}

#[derive(Debug, serde::Deserialize)]
struct PermissionsBody {
    #[serde(default)]
    permissions: Vec<PermissionPair>,
}

async fn add_permissions(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Body(body): Body<PermissionsBody>,
) -> Result<Response, ServiceError> {
    let role = svc.add_role_permissions(&id, &body.permissions)?;
    Ok(envelope(
        StatusCode::CREATED,
        serde_json::json!({ "role": role }),
    ))
}

async fn remove_permissions(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Body(body): Body<PermissionsBody>,
) -> Result<Response, ServiceError> {
    let role = svc.remove_role_permissions(&id, &body.permissions)?;
    Ok(envelope(
        StatusCode::CREATED,
        serde_json::json!({ "role": role }),
    ))
}

#[derive(Debug, serde::Deserialize)]
struct RenameBody {
    name: String,
}

async fn rename_role(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Body(body): Body<RenameBody>,
) -> Result<Response, ServiceError> {
    let role = svc.rename_role(&id, &body.name)?;
    Ok(envelope(StatusCode::OK, serde_json::json!({ "role": role })))
}

async fn delete_role(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let role = svc.delete_role(&id)?;
    Ok(envelope(
        StatusCode::OK,
        serde_json::json!({
            "message": format!("Role {} successfully deleted.", role.name),
        }),
    ))
}
