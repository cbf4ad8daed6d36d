//! Next-version computation
//!
//! [ReleaseStrategy] turns repository facts into a version string; [VersionResolver]
//! runs the configured strategy and splits the result into the forms that get exported.

pub mod resolver;
pub mod strategy;

pub use resolver::{strip_snapshot, ResolvedVersion, ResolverConfig, VersionResolver};
pub use strategy::ReleaseStrategy;
