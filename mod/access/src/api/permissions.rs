use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::Router;

use warden_core::{ListParams, ServiceError};

use crate::api::{envelope, AppState, Body, Params};
use crate::model::{PermissionInput, PermissionPatch};

pub fn routes() -> Router<AppState> {
    // Collection endpoints answer with and without a trailing slash.
    let collection = post(create_permissions).get(list_permissions);
    Router::new()
        .route("/permissions", collection.clone())
        .route("/permissions/", collection)
        .route("/permissions/delete-permission", delete(delete_permission))
        .route("/permissions/{id}", get(get_permission).patch(update_permission))
}

/// Create body: either a single `permission` or a `permissions` batch.
/// Both are resolved find-or-create.
#[derive(Debug, serde::Deserialize)]
struct CreateBody {
    #[serde(default)]
    permission: Option<PermissionInput>,

    #[serde(default)]
    permissions: Option<Vec<PermissionInput>>,
}

async fn create_permissions(
    State(svc): State<AppState>,
    Body(body): Body<CreateBody>,
) -> Result<Response, ServiceError> {
    match (body.permission, body.permissions) {
        (Some(input), None) => {
            let permission = svc.find_or_create_permission(&input.action, &input.subject)?;
            Ok(envelope(
                StatusCode::CREATED,
                serde_json::json!({ "permission": permission }),
            ))
        }
        (None, Some(inputs)) => {
            let mut created = Vec::with_capacity(inputs.len());
            for input in &inputs {
                created.push(svc.find_or_create_permission(&input.action, &input.subject)?);
            }
            Ok(envelope(
                StatusCode::CREATED,
                serde_json::json!({ "permissions": created }),
            ))
        }
        _ => Err(ServiceError::Validation(
            "body must contain either 'permission' or 'permissions'".into(),
        )),
    }
}

async fn list_permissions(
    State(svc): State<AppState>,
    Params(params): Params<ListParams>,
) -> Result<Response, ServiceError> {
    let result = svc.list_permissions(&params)?;
    Ok(envelope(
        StatusCode::OK,
        serde_json::json!({ "permissions": result.items, "total": result.total }),
    ))
}

async fn get_permission(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let permission = svc.get_permission(&id)?;
    Ok(envelope(
        StatusCode::OK,
        serde_json::json!({ "permission": permission }),
    ))
}

async fn update_permission(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Body(patch): Body<PermissionPatch>,
) -> Result<Response, ServiceError> {
    let permission = svc.update_permission(&id, &patch)?;
    Ok(envelope(
        StatusCode::OK,
        serde_json::json!({ "permission": permission }),
    ))
}

/// Deletion addresses the pair, not the id. The body carries the
/// `(action, subject)` to remove.
async fn delete_permission(
    State(svc): State<AppState>,
    Body(input): Body<PermissionInput>,
) -> Result<Response, ServiceError> {
    let permission = svc.delete_permission(&input.action, &input.subject)?;
    Ok(envelope(
        StatusCode::OK,
        serde_json::json!({
            "message": format!(
                "Permission ('{}', '{}') successfully deleted.",
                permission.action, permission.subject,
            ),
        }),
    ))
}
