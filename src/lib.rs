pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliArgs;

pub use crate::adapters::LocalStorage;
pub use crate::config::AutomatorConfig;
pub use crate::core::transform::{Operation, TransformPipeline, TransformRule, TransformSpec};
pub use crate::core::{etl::EtlEngine, pipeline::AutomatorPipeline};
pub use crate::domain::model::{DestinationDescriptor, Record, SourceDescriptor};
pub use crate::utils::error::{EtlError, Result};
