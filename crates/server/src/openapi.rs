use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ErrorBody;
use crate::routes::auth::{CredentialsRequest, SessionResponse, SessionUserBody};
use crate::routes::categories::{CreateCategoryRequest, UpdateCategoryRequest};
use crate::routes::items::ItemRequest;
use crate::routes::menus::MenuRequest;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

/// One entry of a reorder request body.
#[derive(ToSchema, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdateDoc { pub id: Uuid, pub new_position: i32 }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::signin_google,
        crate::routes::auth::callback_google,
        crate::routes::auth::callback_credentials,
        crate::routes::auth::session,
        crate::routes::auth::signout,
        crate::routes::menus::list,
        crate::routes::menus::create,
        crate::routes::menus::get,
        crate::routes::menus::update,
        crate::routes::menus::delete,
        crate::routes::categories::get_all,
        crate::routes::categories::create,
        crate::routes::categories::update,
        crate::routes::categories::delete,
        crate::routes::categories::update_position,
        crate::routes::items::create,
        crate::routes::items::update,
        crate::routes::items::delete,
        crate::routes::items::update_position,
    ),
    components(
        schemas(
            HealthResponse,
            PositionUpdateDoc,
            ErrorBody,
            CredentialsRequest,
            SessionResponse,
            SessionUserBody,
            MenuRequest,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            ItemRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "menus"),
        (name = "categories"),
        (name = "items")
    )
)]
pub struct ApiDoc;
