//! Infrastructure layer - External systems integration
//!
//! Database connection management, migrations, and repositories.

pub mod db;
pub mod repositories;

pub use db::{ConnectError, Database, HealthCheck, Migrator};
pub use repositories::{AuthorRepository, AuthorStore};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::MockAuthorRepository;
