pub mod config;
pub mod db;
pub mod enrich;
pub mod error;
pub mod events;
pub mod favicon;
pub mod fetch;
pub mod import_export;
pub mod models;
pub mod operations;
pub mod utils;
pub mod walker;

// Re-export error types for convenience
pub use error::{BkmError, Result};
