//! Domain logic - pure rules over version strings, branch names and commit text

pub mod branch;
pub mod issue;
pub mod version;

pub use branch::BranchName;
pub use version::{SemanticVersion, SNAPSHOT};
