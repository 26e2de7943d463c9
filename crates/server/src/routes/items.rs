use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use service::menu_item::NewItemInput;
use service::records::MenuItemRecord;
use service::validation::{parse_description, parse_price, DisplayName, ImagePayload, PositionUpdate, Reorder};

use crate::errors::JsonApiError;
use crate::routes::auth::{ServerState, SessionUser};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    /// Required on create, ignored on update.
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Minor currency units.
    pub price: i64,
    #[serde(default)]
    pub image: Option<String>,
}

impl ItemRequest {
    fn validate(&self) -> Result<NewItemInput, JsonApiError> {
        Ok(NewItemInput {
            name: DisplayName::parse(&self.name)?,
            description: parse_description(self.description.as_deref())?,
            price: parse_price(self.price)?,
            image: ImagePayload::parse_optional(self.image.as_deref())?,
        })
    }
}

#[utoipa::path(post, path = "/api/items", tag = "items", request_body = ItemRequest, responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"), (status = 404, description = "Category Not Found"), (status = 502, description = "Image Store Error")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Json(input): Json<ItemRequest>,
) -> Result<(StatusCode, Json<MenuItemRecord>), JsonApiError> {
    let Some(category_id) = input.category_id else {
        return Err(JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some("categoryId is required".into())));
    };
    let fields = input.validate()?;
    let created = state.items.create(user.id, category_id, fields).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(put, path = "/api/items/{id}", tag = "items", params(("id" = Uuid, Path, description = "Item id")), request_body = ItemRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<ItemRequest>,
) -> Result<Json<MenuItemRecord>, JsonApiError> {
    let fields = input.validate()?;
    Ok(Json(state.items.update(user.id, id, fields).await?))
}

#[utoipa::path(delete, path = "/api/items/{id}", tag = "items", params(("id" = Uuid, Path, description = "Item id")), responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    state.items.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(put, path = "/api/items/positions", tag = "items", request_body = Vec<crate::openapi::PositionUpdateDoc>, responses((status = 204, description = "Reordered"), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found")))]
pub async fn update_position(
    State(state): State<ServerState>,
    Extension(user): Extension<SessionUser>,
    Json(updates): Json<Vec<PositionUpdate>>,
) -> Result<StatusCode, JsonApiError> {
    state.items.update_position(user.id, Reorder::new(updates)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
