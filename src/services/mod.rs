//! Application services layer - Use cases and business logic.
//!
//! Services depend on repository traits rather than concrete stores.

mod author_service;

pub use author_service::{AuthorManager, AuthorService};

#[cfg(any(test, feature = "test-utils"))]
pub use author_service::MockAuthorService;
