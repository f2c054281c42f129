//! Author service - Handles author-related use cases.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::Author;
use crate::errors::{AppResult, OptionExt};
use crate::infra::AuthorRepository;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

const AUTHOR_RESOURCE: &str = "Author";

/// Author service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuthorService: Send + Sync {
    /// List all authors
    async fn list_authors(&self) -> AppResult<Vec<Author>>;

    /// Get author by ID
    async fn get_author(&self, id: i32) -> AppResult<Author>;

    /// Create an author with the given name
    async fn create_author(&self, name: String) -> AppResult<()>;

    /// Rename an existing author
    async fn update_author(&self, id: i32, name: String) -> AppResult<()>;
}

/// Concrete implementation of AuthorService.
pub struct AuthorManager {
    repo: Arc<dyn AuthorRepository>,
}

impl AuthorManager {
    pub fn new(repo: Arc<dyn AuthorRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AuthorService for AuthorManager {
    async fn list_authors(&self) -> AppResult<Vec<Author>> {
        self.repo.list().await
    }

    async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_not_found(AUTHOR_RESOURCE)
    }

    async fn create_author(&self, name: String) -> AppResult<()> {
        self.repo.create(name).await
    }

    async fn update_author(&self, id: i32, name: String) -> AppResult<()> {
        // Existence check first so a missing id surfaces as 404
        self.get_author(id).await?;

        let rows = self.repo.update(id, name).await?;
        tracing::debug!(author_id = id, rows, "Author updated");
        Ok(())
    }
}
