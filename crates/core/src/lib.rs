//! hostpilot - drive a running development host from the command line
//!
//! This crate provides functionality to:
//! - Discover running automation-capable hosts and select the active one
//! - Resolve project and file selectors against the host's live project tree
//! - Dispatch build, rebuild, clean and deploy actions with fallbacks
//! - Keep automation calls alive while the host is busy
pub mod backend;
pub mod build;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod grammar;
pub mod interfaces;
pub mod locator;
pub mod outcome;
pub mod session;
pub mod tree;
pub mod utils;

// Re-export commonly used types
pub use error::{Error, Result};

pub use backend::Backend;
pub use build::{BuildAction, BuildReport, BuildTarget};
pub use config::Config;
pub use controller::Controller;
pub use grammar::{FileLookup, Request, TargetSelector};
pub use locator::{FileCandidate, FileSpec};
pub use outcome::CommandOutcome;
pub use session::Session;
