//! OpenAPI documentation served through Swagger UI.

use utoipa::OpenApi;

use crate::api::handlers::author_handler;
use crate::domain::Author;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Author API",
        version = "0.1.0",
        description = "Author records over PostgreSQL with a retrying startup connector"
    ),
    servers((url = "http://localhost:8080", description = "Local development server")),
    paths(
        author_handler::list_authors,
        author_handler::get_author,
        author_handler::create_author,
        author_handler::update_author,
    ),
    components(schemas(
        Author,
        author_handler::CreateAuthorRequest,
        author_handler::UpdateAuthorRequest,
    )),
    tags((name = "Authors", description = "Author management operations"))
)]
pub struct ApiDoc;
