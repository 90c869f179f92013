//! One command's connection to a host
//!
//! A [`Session`] installs the retry filter, discovers the running hosts and
//! selects one. Everything it holds is released when it is dropped: the
//! instance handles first, then the filter.

use crate::backend::Backend;
use crate::config::Config;
use crate::discovery::{self, HostInstance};
use crate::error::{Error, Result};
use crate::filter::{FilterGuard, RetryFilter, RetryPolicy};
use crate::interfaces::{HostApp, Solution, SolutionBuild};
use crate::tree::ProjectTree;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Session {
    // released before the guard revokes the filter
    instances: Vec<HostInstance>,
    selected: usize,
    guard: FilterGuard,
}

impl Session {
    /// Attach to the instance owned by `process_id`, or the foreground one
    pub fn attach(backend: &Backend, config: &Config, process_id: Option<u32>) -> Result<Self> {
        let filter = Arc::new(RetryFilter::new(RetryPolicy::from_settings(&config.retry)));
        let guard = FilterGuard::install(backend.filters(), filter);

        let instances = discovery::scan(backend.registry(), &config.registry_prefix);
        if instances.is_empty() {
            return Err(Error::HostNotRunning);
        }

        let selected = match process_id.or(config.default_instance) {
            Some(pid) => instances
                .iter()
                .position(|i| i.process_id == Some(pid))
                .ok_or(Error::InstanceNotFound(pid))?,
            None => discovery::select_or_first(&instances, backend.focus())
                .ok_or(Error::HostNotRunning)?,
        };
        info!(
            "Attached to {} ({} instance(s) running)",
            instances[selected].registry_key,
            instances.len()
        );

        Ok(Self {
            instances,
            selected,
            guard,
        })
    }

    pub fn host(&self) -> &dyn HostApp {
        self.instances[self.selected].handle.as_ref()
    }

    pub fn filter(&self) -> &RetryFilter {
        self.guard.filter()
    }

    pub fn instances(&self) -> &[HostInstance] {
        &self.instances
    }

    pub fn selected(&self) -> &HostInstance {
        &self.instances[self.selected]
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Solution object, open or not
    pub fn solution(&self) -> Result<Box<dyn Solution>> {
        Ok(self.filter().call("DTE.Solution", || self.host().solution())?)
    }

    /// Solution object; [`Error::NoSolution`] when none is open
    pub fn open_solution(&self) -> Result<Box<dyn Solution>> {
        let solution = self.solution()?;
        if !self.filter().call("Solution.IsOpen", || solution.is_open())? {
            return Err(Error::NoSolution);
        }
        Ok(solution)
    }

    pub fn solution_build(&self, solution: &dyn Solution) -> Result<Box<dyn SolutionBuild>> {
        Ok(self.filter().call("Solution.SolutionBuild", || solution.build())?)
    }

    pub fn project_tree(&self) -> Result<ProjectTree<'_>> {
        let solution = self.solution()?;
        ProjectTree::from_solution(solution.as_ref(), self.filter())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("Releasing {} host instance(s)", self.instances.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fixture::FixtureHost;

    const TWO_HOSTS: &str = r#"{
        "foreground_pid": 200,
        "entries": [
            { "key": "!VisualStudio.DTE.17.0:100", "name": "First" },
            { "key": "!VisualStudio.DTE.17.0:200", "name": "Second" },
            { "key": "!Other.Application:300" }
        ]
    }"#;

    #[test]
    fn test_attach_selects_foreground_instance() {
        let host = FixtureHost::from_json(TWO_HOSTS).unwrap();
        let session = Session::attach(&host.backend(), &Config::default(), None).unwrap();
        assert_eq!(session.instances().len(), 2);
        assert_eq!(session.selected_index(), 1);
        assert_eq!(session.host().name().unwrap(), "Second");
    }

    #[test]
    fn test_attach_by_process_id() {
        let host = FixtureHost::from_json(TWO_HOSTS).unwrap();
        let session = Session::attach(&host.backend(), &Config::default(), Some(100)).unwrap();
        assert_eq!(session.selected().process_id, Some(100));
        assert_eq!(host.focus_queries(), 0);

        assert!(matches!(
            Session::attach(&host.backend(), &Config::default(), Some(300)),
            Err(Error::InstanceNotFound(300))
        ));
    }

    #[test]
    fn test_filter_spans_session() {
        let host = FixtureHost::from_json(TWO_HOSTS).unwrap();
        {
            let _session = Session::attach(&host.backend(), &Config::default(), None).unwrap();
            assert_eq!(host.filter_events(), vec!["install"]);
        }
        assert_eq!(host.filter_events(), vec!["install", "revoke"]);
    }

    #[test]
    fn test_no_host_revokes_filter() {
        let host = FixtureHost::default();
        assert!(matches!(
            Session::attach(&host.backend(), &Config::default(), None),
            Err(Error::HostNotRunning)
        ));
        assert_eq!(host.filter_events(), vec!["install", "revoke"]);
        assert_eq!(host.focus_queries(), 0);
    }
}
