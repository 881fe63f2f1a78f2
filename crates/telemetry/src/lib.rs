//! Observability for the Art Institute exhibitions loader.

pub mod audit;
pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::Metrics;
