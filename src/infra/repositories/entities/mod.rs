//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod author;

pub use author::Entity as AuthorEntity;
