//! Author handlers.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::Author;
use crate::errors::{AppError, AppResult};

/// Create author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAuthorRequest {
    /// Author display name
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    #[schema(example = "test_author")]
    pub name: String,
}

/// Update author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthorRequest {
    /// Author to rename
    #[schema(example = 1)]
    pub id: i32,
    /// New display name
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    #[schema(example = "renamed_author")]
    pub name: String,
}

/// Create author routes
pub fn author_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/authors",
            get(list_authors).post(create_author).put(update_author),
        )
        .route("/authors/:id", get(get_author))
}

/// List all authors
#[utoipa::path(
    get,
    path = "/authors",
    tag = "Authors",
    responses(
        (status = 200, description = "List of authors", body = Vec<Author>),
        (status = 500, description = "Database error")
    )
)]
pub async fn list_authors(State(state): State<AppState>) -> AppResult<Json<Vec<Author>>> {
    let authors = state.author_service.list_authors().await?;
    Ok(Json(authors))
}

/// Get author by ID
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "Authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author found", body = Author),
        (status = 400, description = "Invalid author ID"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<Author>> {
    let Path(id) = id.map_err(|e| AppError::bad_request(e.body_text()))?;
    let author = state.author_service.get_author(id).await?;
    Ok(Json(author))
}

/// Create a new author
#[utoipa::path(
    post,
    path = "/authors",
    tag = "Authors",
    request_body = CreateAuthorRequest,
    responses(
        (status = 201, description = "Author created"),
        (status = 400, description = "Validation error")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateAuthorRequest>,
) -> AppResult<StatusCode> {
    state.author_service.create_author(payload.name).await?;
    Ok(StatusCode::CREATED)
}

/// Rename an existing author
#[utoipa::path(
    put,
    path = "/authors",
    tag = "Authors",
    request_body = UpdateAuthorRequest,
    responses(
        (status = 200, description = "Author updated"),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdateAuthorRequest>,
) -> AppResult<StatusCode> {
    state
        .author_service
        .update_author(payload.id, payload.name)
        .await?;
    Ok(StatusCode::OK)
}
