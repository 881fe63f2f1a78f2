//! Core ingestion pipeline for the Art Institute exhibitions loader.

pub mod api_client;
pub mod error;
pub mod loader;
pub mod table_writer;
pub mod transformer;

pub use api_client::{ExhibitionsClient, ExhibitionsPage};
pub use error::ApiError;
pub use loader::{ExhibitionSink, ExhibitionSource, Loader};
pub use table_writer::TableWriter;
