#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod bundles;
pub mod cli;
pub mod config;
pub mod dependencies;
pub mod error;
pub mod filesystem;
pub mod flat;
pub mod models;
pub mod project;
pub mod records;
pub mod transform;

pub use bundles::{BundleTable, build_bundles};
pub use config::ProjectConfig;
pub use dependencies::DependencyRewriter;
pub use error::{RegistryError, Result};
pub use filesystem::{DiskFs, MemoryFs, RegistryFs};
pub use flat::build_flat;
pub use project::{RegistryBuildContext, RegistryLayout};
pub use transform::{TransformOptions, transform_output};
