//! Author domain entity.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Author domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Author {
    /// Unique author identifier
    #[schema(example = 1)]
    pub id: i32,
    /// Author display name
    #[schema(example = "test_author")]
    pub name: String,
}

impl Author {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Rename the author
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}
