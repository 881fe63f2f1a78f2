//! Database layer for the Art Institute exhibitions loader.
//!
//! Provides a Postgres connection pool and the exhibition row model.

pub mod models;
pub mod pool;

pub use models::ExhibitionRecord;
pub use pool::{DbOptions, DbPool};
