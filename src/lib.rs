//! woodpost - postprocessor core for CNC woodworking jobs
//!
//! A [`job::Job`] describes clampings, the operations machined on each
//! clamping and the already computed trajectories of every operation.
//! A [`post::PostProcessor`] turns that tree into machine text: 2D G-code
//! for Mach3, tpaCAD Format-4 programs, Ardis optimizer XML and full
//! XML/JSON dumps of the job.

pub mod config;
pub mod emitter;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod job;
pub mod math;
pub mod post;
pub mod sequencer;

pub use config::PostConfig;
pub use error::{PostError, Result};
pub use job::Job;
pub use post::{PostOutput, PostProcessor, PostProcessorType};

/// Install the global tracing subscriber used by the command line tool.
///
/// `RUST_LOG` narrows or widens the filter; INFO is always enabled.
pub fn init_logging() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    // A second call (tests, embedding hosts) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
