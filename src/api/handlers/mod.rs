//! HTTP request handlers.

pub mod author_handler;

pub use author_handler::author_routes;
