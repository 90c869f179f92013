//! Live-object registry and window focus interfaces

use super::host::{HostApp, HostResult};

/// An entry of the system-wide live-object table
pub trait LiveObject {
    /// Name the object was registered under, e.g. `!VisualStudio.DTE.17.0:4242`
    fn display_name(&self) -> HostResult<String>;

    /// Bind the entry to its automation object
    fn bind(&self) -> HostResult<Box<dyn HostApp>>;
}

/// The table of currently live, externally addressable objects
pub trait ObjectRegistry {
    fn enumerate(&self) -> HostResult<Vec<Box<dyn LiveObject>>>;
}

/// OS window-focus introspection
pub trait WindowFocus {
    /// Process owning the foreground window, if any
    fn foreground_process_id(&self) -> Option<u32>;
}
