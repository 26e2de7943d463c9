use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use service::records::MenuRecord;
use service::validation::{parse_description, DisplayName};

use crate::errors::JsonApiError;
use crate::routes::auth::{ServerState, SessionUser};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct MenuRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl MenuRequest {
    fn validate(&self) -> Result<(DisplayName, Option<String>), JsonApiError> {
        Ok((DisplayName::parse(&self.name)?, parse_description(self.description.as_deref())?))
    }
}

#[utoipa::path(get, path = "/api/menus", tag = "menus", responses((status = 200, description = "Owner's menus, newest first"), (status = 401, description = "Unauthorized")))]
pub async fn list(State(state): State<ServerState>, Extension(user): Extension<SessionUser>) -> Result<Json<Vec<MenuRecord>>, JsonApiError> {
    Ok(Json(state.menus.list(user.id).await?))
}

#[utoipa::path(post, path = "/api/menus", tag = "menus", request_body = MenuRequest, responses((status = 201, description = "Created"), (status = 400, description = "Validation Error")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Json(input): Json<MenuRequest>,
) -> Result<(StatusCode, Json<MenuRecord>), JsonApiError> {
    let (name, description) = input.validate()?;
    let created = state.menus.create(user.id, name, description).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/api/menus/{id}", tag = "menus", params(("id" = Uuid, Path, description = "Menu id")), responses((status = 200, description = "Menu"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MenuRecord>, JsonApiError> {
    Ok(Json(state.menus.get(user.id, id).await?))
}

#[utoipa::path(put, path = "/api/menus/{id}", tag = "menus", params(("id" = Uuid, Path, description = "Menu id")), request_body = MenuRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<MenuRequest>,
) -> Result<Json<MenuRecord>, JsonApiError> {
    let (name, description) = input.validate()?;
    Ok(Json(state.menus.update(user.id, id, name, description).await?))
}

#[utoipa::path(delete, path = "/api/menus/{id}", tag = "menus", params(("id" = Uuid, Path, description = "Menu id")), responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    state.menus.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
