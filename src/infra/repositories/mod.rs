//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence,
//! following the Repository pattern for clean separation of concerns.

mod author_repository;
pub mod entities;

pub use author_repository::{AuthorRepository, AuthorStore};

// Export mock for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use author_repository::MockAuthorRepository;
