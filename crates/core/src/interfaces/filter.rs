//! Message filter registration interface

use super::host::HostResult;
use crate::filter::RetryFilter;
use std::sync::Arc;

/// Installs a [`RetryFilter`] as the process message filter
///
/// There is a single active filter per process. Implementations are not
/// reentrant: callers pair every `install` with one `revoke`, normally
/// through [`crate::filter::FilterGuard`].
pub trait FilterRegistrar {
    fn install(&self, filter: Arc<RetryFilter>) -> HostResult<()>;

    fn revoke(&self) -> HostResult<()>;
}
