//! Command operations
//!
//! Each operation attaches a fresh [`Session`], runs to completion and
//! releases the session before returning. Selector and file-spec syntax is
//! checked before the host is touched.

use crate::backend::Backend;
use crate::build::{select_configuration, BuildAction, BuildReport, BuildTarget, Dispatcher};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::RetryFilter;
use crate::grammar::{FileLookup, Request, TargetSelector};
use crate::interfaces::{BuildState, Document};
use crate::locator::{FileCandidate, FileLocator, FileSpec, SearchScope};
use crate::session::Session;
use crate::tree::{self, ProjectSummary, ProjectTree};
use crate::utils::paths;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSummary {
    pub registry_key: String,
    pub process_id: Option<u32>,
    pub selected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InfoReport {
    pub running: bool,
    pub instances: Vec<InstanceSummary>,
    pub host: Option<String>,
    pub version: Option<String>,
    pub solution: Option<String>,
    pub active_configuration: Option<String>,
    pub startup_projects: Vec<String>,
    pub build_state: Option<BuildState>,
}

impl InfoReport {
    pub fn selected(&self) -> Option<&InstanceSummary> {
        self.instances.iter().find(|i| i.selected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationList {
    pub active: Option<String>,
    pub configurations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartupReport {
    pub projects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolutionReport {
    pub open: bool,
    pub full_name: Option<String>,
    pub projects: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Result of a raw selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Build(BuildReport),
    File(FileCandidate),
    Startup(StartupReport),
}

pub struct Controller {
    backend: Backend,
    config: Config,
    instance: Option<u32>,
}

impl Controller {
    pub fn new(backend: Backend, config: Config) -> Self {
        Self {
            backend,
            config,
            instance: None,
        }
    }

    /// Target the instance owned by `process_id` instead of the foreground one
    pub fn with_instance(mut self, process_id: Option<u32>) -> Self {
        self.instance = process_id;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn attach(&self) -> Result<Session> {
        Session::attach(&self.backend, &self.config, self.instance)
    }

    /// Overview of the selected host; `running: false` when there is none
    pub fn info(&self) -> Result<InfoReport> {
        let session = match self.attach() {
            Ok(session) => session,
            Err(Error::HostNotRunning) => return Ok(InfoReport::default()),
            Err(e) => return Err(e),
        };
        let filter = session.filter();
        let host = session.host();

        let mut report = InfoReport {
            running: true,
            instances: summarize(&session),
            host: filter.call("DTE.Name", || host.name()).ok(),
            version: filter.call("DTE.Version", || host.version()).ok(),
            ..Default::default()
        };

        let Ok(solution) = session.open_solution() else {
            return Ok(report);
        };
        report.solution = filter.call("Solution.FullName", || solution.full_name()).ok();
        if let Ok(build) = session.solution_build(solution.as_ref()) {
            report.active_configuration = filter
                .call("SolutionBuild.ActiveConfiguration", || build.active_configuration())
                .ok()
                .flatten();
            report.startup_projects = filter
                .call("SolutionBuild.StartupProjects", || build.startup_projects())
                .unwrap_or_default();
            report.build_state = filter.call("SolutionBuild.BuildState", || build.build_state()).ok();
        }
        Ok(report)
    }

    /// Running instances; empty when no host is running
    pub fn list_instances(&self) -> Result<Vec<InstanceSummary>> {
        match self.attach() {
            Ok(session) => Ok(summarize(&session)),
            Err(Error::HostNotRunning) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Leaf projects in traversal order, optionally filtered by a pattern
    pub fn list_projects(&self, pattern: Option<&str>) -> Result<Vec<ProjectSummary>> {
        let session = self.attach()?;
        let tree = session.project_tree()?;
        let nodes = match pattern.map(str::trim).filter(|p| !p.is_empty()) {
            Some(pattern) => tree.find_projects(pattern),
            None => tree.leaves(),
        };
        Ok(nodes.iter().map(|n| n.summary()).collect())
    }

    pub fn list_configurations(&self) -> Result<ConfigurationList> {
        let session = self.attach()?;
        let solution = session.open_solution()?;
        let build = session.solution_build(solution.as_ref())?;
        let filter = session.filter();

        Ok(ConfigurationList {
            active: filter.call("SolutionBuild.ActiveConfiguration", || build.active_configuration())?,
            configurations: filter
                .call("SolutionBuild.SolutionConfigurations", || build.configurations())?,
        })
    }

    /// Run a build action, after activating `configuration` when given
    pub fn build(
        &self,
        action: BuildAction,
        target: &TargetSelector,
        configuration: Option<&str>,
    ) -> Result<BuildReport> {
        if action == BuildAction::Deploy && *target == TargetSelector::Solution {
            return Err(Error::Usage("deploy requires a project target".into()));
        }

        let session = self.attach()?;
        let filter = session.filter();
        let solution = session.open_solution()?;
        let build = session.solution_build(solution.as_ref())?;

        if let Some(literal) = configuration {
            select_configuration(build.as_ref(), literal, filter)?;
        }

        let target = match target {
            TargetSelector::Solution => BuildTarget::Solution,
            TargetSelector::Project(selector) => {
                let tree = ProjectTree::from_solution(solution.as_ref(), filter)?;
                let node = tree
                    .find_project(selector)
                    .ok_or_else(|| Error::ProjectNotFound(selector.clone()))?;
                BuildTarget::project(build.as_ref(), &node, filter)?
            }
        };

        info!("{} {}", action, target.label());
        Dispatcher::new(session.host(), build.as_ref(), filter)
            .wait_for_build(self.config.wait_for_build)
            .dispatch(action, &target)
    }

    pub fn startup(&self) -> Result<StartupReport> {
        let session = self.attach()?;
        let solution = session.open_solution()?;
        let build = session.solution_build(solution.as_ref())?;
        let projects = session
            .filter()
            .call("SolutionBuild.StartupProjects", || build.startup_projects())?;
        Ok(StartupReport { projects })
    }

    /// Make the projects matching `patterns` the startup set, in order
    pub fn set_startup(&self, patterns: &[String]) -> Result<StartupReport> {
        if patterns.is_empty() {
            return Err(Error::Usage("empty startup project set".into()));
        }

        let session = self.attach()?;
        let filter = session.filter();
        let solution = session.open_solution()?;
        let leaves = ProjectTree::from_solution(solution.as_ref(), filter)?.leaves();

        let mut projects: Vec<String> = Vec::new();
        for pattern in patterns {
            let node = tree::resolve(&leaves, pattern)
                .ok_or_else(|| Error::ProjectNotFound(pattern.clone()))?;
            if !projects.contains(&node.unique_name) {
                projects.push(node.unique_name.clone());
            }
        }

        let build = session.solution_build(solution.as_ref())?;
        filter.call("SolutionBuild.StartupProjects", || build.set_startup_projects(&projects))?;
        info!("Startup projects: {}", projects.join(", "));
        Ok(StartupReport { projects })
    }

    pub fn find_file(&self, lookup: &FileLookup) -> Result<FileCandidate> {
        let spec = FileSpec::parse(&lookup.file)?;
        let session = self.attach()?;
        self.locate(&session, lookup, &spec)
    }

    /// Locate a file and open it in the host
    pub fn open_file(&self, lookup: &FileLookup) -> Result<FileCandidate> {
        let spec = FileSpec::parse(&lookup.file)?;
        let session = self.attach()?;
        let candidate = self.locate(&session, lookup, &spec)?;
        session
            .filter()
            .call("ItemOperations.OpenFile", || session.host().open_document(&candidate.path))?;
        info!("Opened {}", candidate.path.display());
        Ok(candidate)
    }

    fn locate(&self, session: &Session, lookup: &FileLookup, spec: &FileSpec) -> Result<FileCandidate> {
        let leaves = session.project_tree()?.leaves();
        let locator =
            FileLocator::new(session.filter()).with_extra_ignored(&self.config.extra_ignored_dirs);

        let found = match &lookup.project {
            Some(selector) => {
                let node = tree::resolve(&leaves, selector)
                    .ok_or_else(|| Error::ProjectNotFound(selector.clone()))?;
                locator.find_file(SearchScope::Project(node), spec)
            }
            None => locator.find_file(SearchScope::Tree(&leaves), spec),
        };
        found.ok_or_else(|| Error::FileNotFound(lookup.file.clone()))
    }

    pub fn solution_show(&self) -> Result<SolutionReport> {
        let session = self.attach()?;
        let solution = session.solution()?;
        let filter = session.filter();

        if !filter.call("Solution.IsOpen", || solution.is_open())? {
            return Ok(SolutionReport {
                open: false,
                full_name: None,
                projects: None,
            });
        }
        let projects = ProjectTree::from_solution(solution.as_ref(), filter)
            .map(|tree| tree.leaves().len())
            .ok();
        Ok(SolutionReport {
            open: true,
            full_name: filter.call("Solution.FullName", || solution.full_name()).ok(),
            projects,
        })
    }

    pub fn solution_open(&self, path: &Path) -> Result<SolutionReport> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        {
            let session = self.attach()?;
            let solution = session.solution()?;
            session.filter().call("Solution.Open", || solution.open(path))?;
            info!("Opened solution {}", path.display());
        }
        self.solution_show()
    }

    pub fn solution_close(&self, save_first: bool) -> Result<SolutionReport> {
        let session = self.attach()?;
        let solution = session.open_solution()?;
        session
            .filter()
            .call("Solution.Close", || solution.close(save_first))?;
        Ok(SolutionReport {
            open: false,
            full_name: None,
            projects: None,
        })
    }

    pub fn document_text(&self, lookup: &FileLookup) -> Result<DocumentReport> {
        self.with_document(lookup, |document, filter| {
            let text = filter.call("TextDocument.Text", || document.text())?;
            Ok(Some(text))
        })
    }

    pub fn document_set_text(&self, lookup: &FileLookup, text: &str) -> Result<DocumentReport> {
        self.with_document(lookup, |document, filter| {
            filter.call("TextDocument.SetText", || document.set_text(text))?;
            Ok(None)
        })
    }

    pub fn document_save(&self, lookup: &FileLookup) -> Result<DocumentReport> {
        self.with_document(lookup, |document, filter| {
            filter.call("Document.Save", || document.save())?;
            Ok(None)
        })
    }

    fn with_document(
        &self,
        lookup: &FileLookup,
        apply: impl FnOnce(&dyn Document, &RetryFilter) -> Result<Option<String>>,
    ) -> Result<DocumentReport> {
        let spec = FileSpec::parse(&lookup.file)?;
        let session = self.attach()?;
        let filter = session.filter();
        let document = self.find_document(&session, lookup, &spec)?;
        let path = filter
            .call("Document.FullName", || document.full_name())
            .unwrap_or_else(|_| PathBuf::from(&lookup.file));

        let text = apply(document.as_ref(), filter)?;
        Ok(DocumentReport { path, text })
    }

    /// An already open document, or the located file opened in the host
    ///
    /// A project-scoped lookup is located first, so only a document open at
    /// that project's file is reused.
    fn find_document(
        &self,
        session: &Session,
        lookup: &FileLookup,
        spec: &FileSpec,
    ) -> Result<Box<dyn Document>> {
        let filter = session.filter();
        let host = session.host();

        let located = match &lookup.project {
            Some(_) => Some(self.locate(session, lookup, spec)?.path),
            None => None,
        };
        let wanted = located.as_ref().map(|path| paths::normalize(&path.to_string_lossy()));

        let open = filter.call("DTE.Documents", || host.documents()).unwrap_or_default();
        for document in open {
            let Ok(path) = filter.call("Document.FullName", || document.full_name()) else {
                continue;
            };
            let text = path.to_string_lossy();
            let hit = match &wanted {
                Some(wanted) => paths::normalize(&text) == *wanted,
                None => spec.matches(&text),
            };
            if hit {
                debug!("{} is already open", path.display());
                return Ok(document);
            }
        }

        let path = match (located, spec) {
            (Some(path), _) => path,
            (None, FileSpec::Rooted(_)) => PathBuf::from(lookup.file.trim()),
            (None, _) => self.locate(session, lookup, spec)?.path,
        };
        Ok(filter.call("ItemOperations.OpenFile", || host.open_document(&path))?)
    }

    /// Execute a raw selector
    pub fn run(&self, request: &Request) -> Result<Response> {
        match request {
            Request::Build { action, target } => self.build(*action, target, None).map(Response::Build),
            Request::OpenFile(lookup) => self.open_file(lookup).map(Response::File),
            Request::SetStartup(patterns) => self.set_startup(patterns).map(Response::Startup),
        }
    }
}

fn summarize(session: &Session) -> Vec<InstanceSummary> {
    session
        .instances()
        .iter()
        .enumerate()
        .map(|(index, instance)| InstanceSummary {
            registry_key: instance.registry_key.clone(),
            process_id: instance.process_id,
            selected: index == session.selected_index(),
        })
        .collect()
}
