//! Build/deploy dispatch
//!
//! Solution-scoped actions go to the build subsystem first and fall back once
//! to the equivalent top-level command. Project-scoped actions have no
//! fallback and always run against the active solution configuration.

use crate::error::{Error, Result};
use crate::filter::RetryFilter;
use crate::interfaces::{BuildState, HostApp, HostError, HostResult, SolutionBuild};
use crate::tree::ProjectNode;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildAction {
    Build,
    Rebuild,
    Clean,
    Deploy,
}

impl BuildAction {
    pub const ALL: [BuildAction; 4] = [
        BuildAction::Build,
        BuildAction::Rebuild,
        BuildAction::Clean,
        BuildAction::Deploy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuildAction::Build => "build",
            BuildAction::Rebuild => "rebuild",
            BuildAction::Clean => "clean",
            BuildAction::Deploy => "deploy",
        }
    }

    /// Top-level command equivalent of a solution-scoped action
    pub fn solution_command(self) -> Option<&'static str> {
        match self {
            BuildAction::Build => Some("Build.BuildSolution"),
            BuildAction::Rebuild => Some("Build.RebuildSolution"),
            BuildAction::Clean => Some("Build.CleanSolution"),
            BuildAction::Deploy => None,
        }
    }
}

impl fmt::Display for BuildAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        BuildAction::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Usage(format!("unknown build action '{s}'")))
    }
}

/// Scope of a build action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildTarget {
    Solution,
    Project {
        configuration: String,
        unique_name: String,
        display_name: String,
    },
}

impl BuildTarget {
    /// Target `node` under the host's currently active configuration
    pub fn project(build: &dyn SolutionBuild, node: &ProjectNode, filter: &RetryFilter) -> Result<Self> {
        let configuration = filter
            .call("SolutionBuild.ActiveConfiguration", || build.active_configuration())?
            .filter(|c| !c.trim().is_empty())
            .ok_or(Error::NoActiveConfiguration)?;

        Ok(BuildTarget::Project {
            configuration,
            unique_name: node.unique_name.clone(),
            display_name: node.display_name.clone(),
        })
    }

    pub fn label(&self) -> &str {
        match self {
            BuildTarget::Solution => "solution",
            BuildTarget::Project { display_name, .. } => display_name,
        }
    }
}

/// Activate the existing configuration named by a `Name|Platform` literal
///
/// A literal without a platform selects the first configuration with that
/// name. Returns the full name of the activated configuration.
pub fn select_configuration(
    build: &dyn SolutionBuild,
    literal: &str,
    filter: &RetryFilter,
) -> Result<String> {
    let literal = literal.trim();
    let configurations = filter.call("SolutionBuild.SolutionConfigurations", || {
        build.configurations()
    })?;

    let by_name = |c: &&String| {
        !literal.contains('|')
            && c.split_once('|')
                .is_some_and(|(name, _)| name.eq_ignore_ascii_case(literal))
    };
    let found = configurations
        .iter()
        .find(|c| c.eq_ignore_ascii_case(literal))
        .or_else(|| configurations.iter().find(by_name))
        .ok_or_else(|| Error::ConfigurationNotFound(literal.to_string()))?;

    filter.call("SolutionConfiguration.Activate", || {
        build.activate_configuration(found)
    })?;
    info!("Activated configuration {}", found);
    Ok(found.clone())
}

/// Outcome of a dispatched build action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub action: BuildAction,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
    /// Projects that failed in the last build, when the host reports it
    pub errors: Option<u32>,
    pub state: Option<BuildState>,
    /// The direct call failed and the top-level command succeeded
    pub used_fallback: bool,
}

impl BuildReport {
    pub fn succeeded(&self) -> bool {
        self.errors.is_none_or(|errors| errors == 0)
    }
}

pub struct Dispatcher<'a> {
    host: &'a dyn HostApp,
    build: &'a dyn SolutionBuild,
    filter: &'a RetryFilter,
    wait: bool,
}

impl<'a> Dispatcher<'a> {
    pub fn new(host: &'a dyn HostApp, build: &'a dyn SolutionBuild, filter: &'a RetryFilter) -> Self {
        Self {
            host,
            build,
            filter,
            wait: true,
        }
    }

    /// Whether build calls block until the host finishes
    pub fn wait_for_build(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    pub fn dispatch(&self, action: BuildAction, target: &BuildTarget) -> Result<BuildReport> {
        let (used_fallback, configuration) = match target {
            BuildTarget::Solution => (self.dispatch_solution(action)?, None),
            BuildTarget::Project {
                configuration,
                unique_name,
                ..
            } => {
                self.dispatch_project(action, configuration, unique_name)?;
                (false, Some(configuration.clone()))
            }
        };

        let errors = self
            .filter
            .call("SolutionBuild.LastBuildInfo", || self.build.last_build_info())
            .map_err(|e| debug!("Error count unavailable: {}", e))
            .ok();
        let state = self
            .filter
            .call("SolutionBuild.BuildState", || self.build.build_state())
            .map_err(|e| debug!("Build state unavailable: {}", e))
            .ok();

        Ok(BuildReport {
            action,
            target: target.label().to_string(),
            configuration,
            errors,
            state,
            used_fallback,
        })
    }

    /// Returns whether the command fallback was used
    fn dispatch_solution(&self, action: BuildAction) -> Result<bool> {
        type Direct = fn(&dyn SolutionBuild, bool) -> HostResult<()>;
        let (member, call): (&str, Direct) = match action {
            BuildAction::Build => ("SolutionBuild.Build", |b, wait| b.build(wait)),
            BuildAction::Rebuild => ("SolutionBuild.Rebuild", |b, wait| b.rebuild(wait)),
            BuildAction::Clean => ("SolutionBuild.Clean", |b, wait| b.clean(wait)),
            BuildAction::Deploy => {
                return Err(Error::Usage(format!("{action} requires a project target")));
            }
        };
        let Some(command) = action.solution_command() else {
            return Err(Error::Usage(format!("{action} has no solution command")));
        };

        match self.filter.call(member, || call(self.build, self.wait)) {
            Ok(()) => Ok(false),
            Err(e) => {
                warn!("Solution {} failed ({}), retrying through {}", action, e, command);
                self.filter
                    .call("ExecuteCommand", || self.host.execute_command(command, ""))?;
                Ok(true)
            }
        }
    }

    fn dispatch_project(&self, action: BuildAction, configuration: &str, unique_name: &str) -> Result<()> {
        debug!("{} {} ({})", action, unique_name, configuration);
        match action {
            BuildAction::Build => Ok(self.build_project(configuration, unique_name)?),
            BuildAction::Clean => Ok(self.clean_project(configuration, unique_name)?),
            BuildAction::Deploy => {
                let wait = self.wait;
                Ok(self.filter.call("SolutionBuild.DeployProject", || {
                    self.build.deploy_project(configuration, unique_name, wait)
                })?)
            }
            BuildAction::Rebuild => {
                self.clean_project(configuration, unique_name)
                    .map_err(|e| step_failed("clean", e))?;
                self.build_project(configuration, unique_name)
                    .map_err(|e| step_failed("build", e))
            }
        }
    }

    fn build_project(&self, configuration: &str, unique_name: &str) -> HostResult<()> {
        let wait = self.wait;
        self.filter.call("SolutionBuild.BuildProject", || {
            self.build.build_project(configuration, unique_name, wait)
        })
    }

    fn clean_project(&self, configuration: &str, unique_name: &str) -> HostResult<()> {
        let wait = self.wait;
        self.filter.call("SolutionBuild.CleanProject", || {
            self.build.clean_project(configuration, unique_name, wait)
        })
    }
}

fn step_failed(step: &'static str, err: HostError) -> Error {
    Error::BuildStep {
        step,
        message: Error::from(err).to_string(),
    }
}
