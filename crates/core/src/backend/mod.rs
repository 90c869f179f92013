//! Automation backends
//!
//! A [`Backend`] bundles the three process-level seams a command needs: the
//! live-object registry, window-focus introspection and message-filter
//! registration. [`Backend::platform`] returns the native one; the fixture
//! backend replays a recorded host.

#[cfg(windows)]
mod com;
pub mod fixture;

use crate::error::Result;
use crate::filter::RetryFilter;
use crate::interfaces::{
    FilterRegistrar, HostResult, LiveObject, ObjectRegistry, WindowFocus,
};
use std::sync::Arc;

pub struct Backend {
    registry: Box<dyn ObjectRegistry>,
    focus: Box<dyn WindowFocus>,
    filters: Arc<dyn FilterRegistrar>,
}

impl Backend {
    pub fn new(
        registry: Box<dyn ObjectRegistry>,
        focus: Box<dyn WindowFocus>,
        filters: Arc<dyn FilterRegistrar>,
    ) -> Self {
        Self {
            registry,
            focus,
            filters,
        }
    }

    /// Native backend for the current platform
    ///
    /// Platforms without a live-object registry get an empty one, so every
    /// command reports that no host is running.
    pub fn platform() -> Result<Self> {
        #[cfg(windows)]
        {
            com::backend()
        }
        #[cfg(not(windows))]
        {
            Ok(Self::unsupported())
        }
    }

    pub fn unsupported() -> Self {
        Self::new(
            Box::new(EmptyRegistry),
            Box::new(NoFocus),
            Arc::new(NoFilter),
        )
    }

    pub fn registry(&self) -> &dyn ObjectRegistry {
        self.registry.as_ref()
    }

    pub fn focus(&self) -> &dyn WindowFocus {
        self.focus.as_ref()
    }

    pub fn filters(&self) -> Arc<dyn FilterRegistrar> {
        Arc::clone(&self.filters)
    }
}

struct EmptyRegistry;

impl ObjectRegistry for EmptyRegistry {
    fn enumerate(&self) -> HostResult<Vec<Box<dyn LiveObject>>> {
        Ok(Vec::new())
    }
}

struct NoFocus;

impl WindowFocus for NoFocus {
    fn foreground_process_id(&self) -> Option<u32> {
        None
    }
}

struct NoFilter;

impl FilterRegistrar for NoFilter {
    fn install(&self, _filter: Arc<RetryFilter>) -> HostResult<()> {
        Ok(())
    }

    fn revoke(&self) -> HostResult<()> {
        Ok(())
    }
}
