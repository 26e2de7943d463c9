use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use service::records::CategoryRecord;
use service::validation::{DisplayName, ImagePayload, PositionUpdate, Reorder};

use crate::errors::JsonApiError;
use crate::routes::auth::{ServerState, SessionUser};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub menu_id: Uuid,
    pub name: String,
    /// Base64 picture, optionally as a `data:` URL.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[utoipa::path(get, path = "/api/menus/{id}/categories", tag = "categories", params(("id" = Uuid, Path, description = "Menu id")), responses((status = 200, description = "Categories with items, by position"), (status = 404, description = "Not Found")))]
pub async fn get_all(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Path(menu_id): Path<Uuid>,
) -> Result<Json<Vec<CategoryRecord>>, JsonApiError> {
    Ok(Json(state.categories.get_all(user.id, menu_id).await?))
}

#[utoipa::path(post, path = "/api/categories", tag = "categories", request_body = CreateCategoryRequest, responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"), (status = 404, description = "Menu Not Found"), (status = 502, description = "Image Store Error")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Json(input): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryRecord>), JsonApiError> {
    let name = DisplayName::parse(&input.name)?;
    let image = ImagePayload::parse_optional(input.image.as_deref())?;
    info!(menu_id = %input.menu_id, with_image = image.is_some(), "category_create_request");
    let created = state.categories.create(user.id, input.menu_id, name, image).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(put, path = "/api/categories/{id}", tag = "categories", params(("id" = Uuid, Path, description = "Category id")), request_body = UpdateCategoryRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryRecord>, JsonApiError> {
    let name = DisplayName::parse(&input.name)?;
    let image = ImagePayload::parse_optional(input.image.as_deref())?;
    Ok(Json(state.categories.update(user.id, id, name, image).await?))
}

#[utoipa::path(delete, path = "/api/categories/{id}", tag = "categories", params(("id" = Uuid, Path, description = "Category id")), responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    state.categories.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(put, path = "/api/categories/positions", tag = "categories", request_body = Vec<crate::openapi::PositionUpdateDoc>, responses((status = 204, description = "Reordered"), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found")))]
pub async fn update_position(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Json(updates): Json<Vec<PositionUpdate>>,
) -> Result<StatusCode, JsonApiError> {
    let reorder = Reorder::new(updates)?;
    state.categories.update_position(user.id, reorder).await?;
    Ok(StatusCode::NO_CONTENT)
}
