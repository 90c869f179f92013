//! Host automation surface
//!
//! Late-bound automation calls become a handful of methods per entity. Every
//! member returns [`HostResult`] so adapters never leak their native error
//! type, and callers can degrade a failed read to "unavailable".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind identifier of container nodes (solution folders)
pub const CONTAINER_KIND: &str = "{66A26720-8FB5-11D2-AA7E-00C04F688DDE}";

/// Failure reported by a host member access
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The host rejected the call while processing another one
    #[error("host is busy")]
    Busy,

    /// The object or member is gone or not exposed
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The host reported a failure, in its own wording
    #[error("{0}")]
    Failed(String),
}

pub type HostResult<T> = std::result::Result<T, HostError>;

/// State of the host's build subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    NotStarted,
    InProgress,
    Done,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BuildState::NotStarted => "not started",
            BuildState::InProgress => "in progress",
            BuildState::Done => "done",
        };
        f.write_str(text)
    }
}

/// A live host application
pub trait HostApp {
    /// Product name of the host
    fn name(&self) -> HostResult<String>;

    /// Product version of the host
    fn version(&self) -> HostResult<String>;

    /// The solution object (present even when no solution is open)
    fn solution(&self) -> HostResult<Box<dyn Solution>>;

    /// Invoke a top-level named command, e.g. `Build.BuildSolution`
    fn execute_command(&self, command: &str, args: &str) -> HostResult<()>;

    /// Open a file in the host and return its document
    fn open_document(&self, path: &Path) -> HostResult<Box<dyn Document>>;

    /// Documents currently open in the host
    fn documents(&self) -> HostResult<Vec<Box<dyn Document>>>;
}

pub trait Solution {
    fn is_open(&self) -> HostResult<bool>;

    /// Path of the solution file
    fn full_name(&self) -> HostResult<String>;

    fn open(&self, path: &Path) -> HostResult<()>;

    fn close(&self, save_first: bool) -> HostResult<()>;

    /// Top-level nodes of the project tree, containers included
    fn projects(&self) -> HostResult<Vec<Box<dyn ProjectHandle>>>;

    /// The build subsystem
    fn build(&self) -> HostResult<Box<dyn SolutionBuild>>;
}

/// The host's build subsystem
pub trait SolutionBuild {
    fn build(&self, wait: bool) -> HostResult<()>;

    fn rebuild(&self, wait: bool) -> HostResult<()>;

    fn clean(&self, wait: bool) -> HostResult<()>;

    fn build_project(&self, configuration: &str, unique_name: &str, wait: bool) -> HostResult<()>;

    fn clean_project(&self, configuration: &str, unique_name: &str, wait: bool) -> HostResult<()>;

    fn deploy_project(&self, configuration: &str, unique_name: &str, wait: bool)
    -> HostResult<()>;

    /// Active configuration as `Name|Platform`, `None` when the host has none
    fn active_configuration(&self) -> HostResult<Option<String>>;

    /// All configurations as `Name|Platform`
    fn configurations(&self) -> HostResult<Vec<String>>;

    fn activate_configuration(&self, name: &str) -> HostResult<()>;

    fn build_state(&self) -> HostResult<BuildState>;

    /// Number of projects that failed in the last build
    fn last_build_info(&self) -> HostResult<u32>;

    /// Unique names of the startup projects
    fn startup_projects(&self) -> HostResult<Vec<String>>;

    fn set_startup_projects(&self, unique_names: &[String]) -> HostResult<()>;
}

/// A node of the project tree
pub trait ProjectHandle {
    fn name(&self) -> HostResult<String>;

    fn unique_name(&self) -> HostResult<String>;

    /// Path of the project file; empty for containers
    fn full_name(&self) -> HostResult<String>;

    fn kind(&self) -> HostResult<String>;

    /// Nested nodes of a container; empty for regular projects
    fn children(&self) -> HostResult<Vec<Box<dyn ProjectHandle>>>;

    /// Top-level items of the project
    fn items(&self) -> HostResult<Vec<Box<dyn ProjectItemHandle>>>;
}

/// An item (file, folder, linked file) inside a project
pub trait ProjectItemHandle {
    fn name(&self) -> HostResult<String>;

    /// Physical files backing the item
    fn file_names(&self) -> HostResult<Vec<PathBuf>>;

    /// Nested items (folder contents, dependent files)
    fn children(&self) -> HostResult<Vec<Box<dyn ProjectItemHandle>>>;
}

pub trait Document {
    fn full_name(&self) -> HostResult<PathBuf>;

    fn text(&self) -> HostResult<String>;

    fn set_text(&self, text: &str) -> HostResult<()>;

    fn save(&self) -> HostResult<()>;
}
