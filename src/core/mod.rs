//! Core infrastructure: error handling, collaborator traits, and
//! configuration.

pub mod config;
pub mod errors;
pub mod traits;

pub use config::PipelineConfig;
pub use errors::{SegError, SegResult, Severity};
pub use traits::{MaskGenerator, ZeroShotClassifier};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
