pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod stage_log;
pub mod table;

// Stages
pub mod extract;
pub mod query;
pub mod rates;
pub mod sinks;
pub mod source;
pub mod transform;

pub use error::{EtlError, Result};
pub use pipeline::{Pipeline, PipelineReport, Stage};
