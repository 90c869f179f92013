//! Core interfaces for the automation seams
//!
//! The host is never talked to directly: every live entity (registry entry,
//! host application, solution, project, item, document) is reached through
//! one of the narrow traits defined here. Platform adapters implement them,
//! and so does the in-memory fixture host used by tests.

pub mod filter;
pub mod host;
pub mod registry;

pub use filter::FilterRegistrar;
pub use host::{
    BuildState, Document, HostApp, HostError, HostResult, ProjectHandle, ProjectItemHandle,
    Solution, SolutionBuild, CONTAINER_KIND,
};
pub use registry::{LiveObject, ObjectRegistry, WindowFocus};
