//! Author repository backed by fixed SQL statements.

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, Statement};

use super::entities::AuthorEntity;
use crate::domain::Author;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

const LIST_AUTHORS_SQL: &str = "SELECT id, name FROM authors";
const FIND_AUTHOR_SQL: &str = "SELECT * FROM authors WHERE id = $1";
const INSERT_AUTHOR_SQL: &str = "INSERT INTO authors (name) VALUES ($1)";
const UPDATE_AUTHOR_SQL: &str = "UPDATE authors SET name = $1 WHERE id = $2";

/// Author repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// List every author
    async fn list(&self) -> AppResult<Vec<Author>>;

    /// Find author by ID
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Author>>;

    /// Insert a new author
    async fn create(&self, name: String) -> AppResult<()>;

    /// Rename an author, returning the number of rows changed
    async fn update(&self, id: i32, name: String) -> AppResult<u64>;
}

/// Concrete implementation of AuthorRepository
pub struct AuthorStore {
    db: DatabaseConnection,
}

impl AuthorStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthorRepository for AuthorStore {
    async fn list(&self) -> AppResult<Vec<Author>> {
        tracing::debug!("Querying all authors");
        let models = AuthorEntity::find()
            .from_raw_sql(Statement::from_string(
                DbBackend::Postgres,
                LIST_AUTHORS_SQL.to_string(),
            ))
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Author::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Author>> {
        let result = AuthorEntity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                FIND_AUTHOR_SQL,
                [id.into()],
            ))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Author::from))
    }

    async fn create(&self, name: String) -> AppResult<()> {
        self.db
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                INSERT_AUTHOR_SQL,
                [name.into()],
            ))
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn update(&self, id: i32, name: String) -> AppResult<u64> {
        let result = self
            .db
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                UPDATE_AUTHOR_SQL,
                [name.into(), id.into()],
            ))
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected())
    }
}
