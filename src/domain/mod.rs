//! Domain layer - Core business entities
//!
//! Domain types carry no infrastructure dependencies.

pub mod author;

pub use author::Author;
