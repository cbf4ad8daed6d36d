pub mod boundary;
pub mod cli;
pub mod config;
pub mod docker;
pub mod domain;
pub mod error;
pub mod exec;
pub mod export;
pub mod git;
pub mod gitlab;
pub mod issues;
pub mod jira;
pub mod release;
pub mod ui;

pub use error::{GoopsError, Result};
