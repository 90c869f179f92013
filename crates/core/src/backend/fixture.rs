//! In-memory fixture host
//!
//! A [`FixtureHost`] replays a host described by a JSON snapshot: registry
//! entries, the foreground process, a solution with its configurations and
//! project tree, open documents, injected failures and busy rejections.
//! Every mutating or build call is recorded so tests can assert on the exact
//! sequence a command issued. Nothing is ever written to disk.

use super::Backend;
use crate::error::Result;
use crate::filter::RetryFilter;
use crate::interfaces::{
    BuildState, Document, FilterRegistrar, HostApp, HostError, HostResult, LiveObject,
    ObjectRegistry, ProjectHandle, ProjectItemHandle, Solution, SolutionBuild, WindowFocus,
};
use crate::utils::paths;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Kind of an ordinary (C#) project
pub const DEFAULT_PROJECT_KIND: &str = "{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostSnapshot {
    pub foreground_pid: Option<u32>,
    /// Makes registry enumeration fail
    pub registry_error: Option<String>,
    /// Makes message filter installation fail
    pub filter_error: Option<String>,
    pub entries: Vec<EntrySnapshot>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EntrySnapshot {
    pub key: String,
    /// Makes binding fail, as for an object withdrawn mid-enumeration
    pub bind_error: Option<String>,
    pub name: String,
    pub version: String,
    pub solution: SolutionSnapshot,
    pub documents: Vec<DocumentSnapshot>,
}

impl Default for EntrySnapshot {
    fn default() -> Self {
        Self {
            key: String::new(),
            bind_error: None,
            name: "Fixture Host".to_string(),
            version: "17.0".to_string(),
            solution: SolutionSnapshot::default(),
            documents: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolutionSnapshot {
    pub open: bool,
    pub full_name: String,
    pub active_configuration: Option<String>,
    pub configurations: Vec<String>,
    pub startup_projects: Vec<String>,
    pub build_state: Option<BuildState>,
    pub last_build_info: Option<u32>,
    pub projects: Vec<ProjectSnapshot>,
    /// Member name, or `Member:argument`, mapped to the host's failure text
    pub failures: HashMap<String, String>,
    /// Build-subsystem calls answered "busy" before the host accepts them
    pub busy: u32,
}

impl Default for SolutionSnapshot {
    fn default() -> Self {
        Self {
            open: true,
            full_name: String::new(),
            active_configuration: Some("Debug|Any CPU".to_string()),
            configurations: vec!["Debug|Any CPU".to_string(), "Release|Any CPU".to_string()],
            startup_projects: Vec::new(),
            build_state: Some(BuildState::Done),
            last_build_info: Some(0),
            projects: Vec::new(),
            failures: HashMap::new(),
            busy: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectSnapshot {
    pub name: String,
    pub unique_name: String,
    pub full_name: String,
    pub kind: String,
    pub items: Vec<ItemSnapshot>,
    /// Nested nodes, for containers
    pub children: Vec<ProjectSnapshot>,
    /// Every read fails, as for a node removed out-of-band
    pub vanished: bool,
}

impl Default for ProjectSnapshot {
    fn default() -> Self {
        Self {
            name: String::new(),
            unique_name: String::new(),
            full_name: String::new(),
            kind: DEFAULT_PROJECT_KIND.to_string(),
            items: Vec::new(),
            children: Vec::new(),
            vanished: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemSnapshot {
    pub name: String,
    pub files: Vec<String>,
    pub items: Vec<ItemSnapshot>,
    pub vanished: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocumentSnapshot {
    pub path: String,
    pub text: String,
    pub saved: bool,
}

#[derive(Debug, Default)]
struct FixtureState {
    snapshot: HostSnapshot,
    calls: Vec<String>,
    focus_queries: usize,
    filter_events: Vec<&'static str>,
}

impl FixtureState {
    fn solution(&mut self, entry: usize) -> &mut SolutionSnapshot {
        &mut self.snapshot.entries[entry].solution
    }

    fn project(&self, entry: usize, path: &[usize]) -> Option<&ProjectSnapshot> {
        let (first, rest) = path.split_first()?;
        let mut project = self.snapshot.entries[entry].solution.projects.get(*first)?;
        for index in rest {
            project = project.children.get(*index)?;
        }
        (!project.vanished).then_some(project)
    }

    fn item(&self, entry: usize, project: &[usize], path: &[usize]) -> Option<&ItemSnapshot> {
        let (first, rest) = path.split_first()?;
        let mut item = self.project(entry, project)?.items.get(*first)?;
        for index in rest {
            item = item.items.get(*index)?;
        }
        (!item.vanished).then_some(item)
    }

    /// Record a call and apply the injected busy/failure behaviour
    fn host_call(&mut self, entry: usize, member: &str, argument: Option<&str>) -> HostResult<()> {
        self.calls.push(match argument {
            Some(argument) => format!("{member}({argument})"),
            None => member.to_string(),
        });

        let solution = self.solution(entry);
        if solution.busy > 0 {
            solution.busy -= 1;
            return Err(HostError::Busy);
        }

        let qualified = argument.map(|a| format!("{member}:{a}"));
        let failure = qualified
            .and_then(|key| solution.failures.get(&key))
            .or_else(|| solution.failures.get(member));
        match failure {
            Some(message) => Err(HostError::Failed(message.clone())),
            None => Ok(()),
        }
    }
}

type Shared = Arc<Mutex<FixtureState>>;

fn vanished(what: &str) -> HostError {
    HostError::Unavailable(what.to_string())
}

/// Handle to an in-memory host; clones share state
#[derive(Clone, Default)]
pub struct FixtureHost {
    state: Shared,
}

impl FixtureHost {
    pub fn new(snapshot: HostSnapshot) -> Self {
        Self {
            state: Arc::new(Mutex::new(FixtureState {
                snapshot,
                ..Default::default()
            })),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn backend(&self) -> Backend {
        Backend::new(
            Box::new(FixtureRegistry {
                state: self.state.clone(),
            }),
            Box::new(FixtureFocus {
                state: self.state.clone(),
            }),
            Arc::new(FixtureFilters {
                state: self.state.clone(),
            }),
        )
    }

    /// Bound application of registry entry `entry`, bypassing discovery
    pub fn app(&self, entry: usize) -> Box<dyn HostApp> {
        Box::new(FixtureApp {
            state: self.state.clone(),
            entry,
        })
    }

    /// Recorded calls, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn focus_queries(&self) -> usize {
        self.state.lock().focus_queries
    }

    pub fn filter_events(&self) -> Vec<&'static str> {
        self.state.lock().filter_events.clone()
    }

    pub fn snapshot(&self) -> HostSnapshot {
        self.state.lock().snapshot.clone()
    }

    pub fn update(&self, change: impl FnOnce(&mut HostSnapshot)) {
        change(&mut self.state.lock().snapshot);
    }
}

struct FixtureRegistry {
    state: Shared,
}

impl ObjectRegistry for FixtureRegistry {
    fn enumerate(&self) -> HostResult<Vec<Box<dyn LiveObject>>> {
        let state = self.state.lock();
        if let Some(message) = &state.snapshot.registry_error {
            return Err(HostError::Unavailable(message.clone()));
        }
        Ok((0..state.snapshot.entries.len())
            .map(|entry| {
                Box::new(FixtureLiveObject {
                    state: self.state.clone(),
                    entry,
                }) as Box<dyn LiveObject>
            })
            .collect())
    }
}

struct FixtureLiveObject {
    state: Shared,
    entry: usize,
}

impl LiveObject for FixtureLiveObject {
    fn display_name(&self) -> HostResult<String> {
        Ok(self.state.lock().snapshot.entries[self.entry].key.clone())
    }

    fn bind(&self) -> HostResult<Box<dyn HostApp>> {
        if let Some(message) = &self.state.lock().snapshot.entries[self.entry].bind_error {
            return Err(HostError::Unavailable(message.clone()));
        }
        Ok(Box::new(FixtureApp {
            state: self.state.clone(),
            entry: self.entry,
        }))
    }
}

struct FixtureFocus {
    state: Shared,
}

impl WindowFocus for FixtureFocus {
    fn foreground_process_id(&self) -> Option<u32> {
        let mut state = self.state.lock();
        state.focus_queries += 1;
        state.snapshot.foreground_pid
    }
}

struct FixtureFilters {
    state: Shared,
}

impl FilterRegistrar for FixtureFilters {
    fn install(&self, _filter: Arc<RetryFilter>) -> HostResult<()> {
        let mut state = self.state.lock();
        state.filter_events.push("install");
        match &state.snapshot.filter_error {
            Some(message) => Err(HostError::Failed(message.clone())),
            None => Ok(()),
        }
    }

    fn revoke(&self) -> HostResult<()> {
        self.state.lock().filter_events.push("revoke");
        Ok(())
    }
}

struct FixtureApp {
    state: Shared,
    entry: usize,
}

impl HostApp for FixtureApp {
    fn name(&self) -> HostResult<String> {
        Ok(self.state.lock().snapshot.entries[self.entry].name.clone())
    }

    fn version(&self) -> HostResult<String> {
        Ok(self.state.lock().snapshot.entries[self.entry].version.clone())
    }

    fn solution(&self) -> HostResult<Box<dyn Solution>> {
        Ok(Box::new(FixtureSolution {
            state: self.state.clone(),
            entry: self.entry,
        }))
    }

    fn execute_command(&self, command: &str, _args: &str) -> HostResult<()> {
        let mut state = self.state.lock();
        state.host_call(self.entry, "ExecuteCommand", Some(command))?;
        if command.starts_with("Build.") {
            state.solution(self.entry).build_state = Some(BuildState::Done);
        }
        Ok(())
    }

    fn open_document(&self, path: &Path) -> HostResult<Box<dyn Document>> {
        let text_path = path.to_string_lossy().to_string();
        let mut state = self.state.lock();
        state.host_call(self.entry, "OpenFile", Some(&text_path))?;

        let wanted = paths::normalize(&text_path);
        let documents = &state.snapshot.entries[self.entry].documents;
        let index = match documents
            .iter()
            .position(|d| paths::normalize(&d.path) == wanted)
        {
            Some(index) => index,
            None => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| HostError::Failed(format!("Cannot open '{text_path}': {e}")))?;
                let documents = &mut state.snapshot.entries[self.entry].documents;
                documents.push(DocumentSnapshot {
                    path: text_path,
                    text,
                    saved: false,
                });
                documents.len() - 1
            }
        };

        Ok(Box::new(FixtureDocument {
            state: self.state.clone(),
            entry: self.entry,
            index,
        }))
    }

    fn documents(&self) -> HostResult<Vec<Box<dyn Document>>> {
        let count = self.state.lock().snapshot.entries[self.entry].documents.len();
        Ok((0..count)
            .map(|index| {
                Box::new(FixtureDocument {
                    state: self.state.clone(),
                    entry: self.entry,
                    index,
                }) as Box<dyn Document>
            })
            .collect())
    }
}

struct FixtureSolution {
    state: Shared,
    entry: usize,
}

impl Solution for FixtureSolution {
    fn is_open(&self) -> HostResult<bool> {
        Ok(self.state.lock().solution(self.entry).open)
    }

    fn full_name(&self) -> HostResult<String> {
        Ok(self.state.lock().solution(self.entry).full_name.clone())
    }

    fn open(&self, path: &Path) -> HostResult<()> {
        let path = path.to_string_lossy().to_string();
        let mut state = self.state.lock();
        state.host_call(self.entry, "Solution.Open", Some(&path))?;
        let solution = state.solution(self.entry);
        solution.open = true;
        solution.full_name = path;
        Ok(())
    }

    fn close(&self, save_first: bool) -> HostResult<()> {
        let mut state = self.state.lock();
        state.host_call(self.entry, "Solution.Close", Some(&save_first.to_string()))?;
        state.solution(self.entry).open = false;
        Ok(())
    }

    fn projects(&self) -> HostResult<Vec<Box<dyn ProjectHandle>>> {
        let mut state = self.state.lock();
        let solution = state.solution(self.entry);
        if !solution.open {
            return Ok(Vec::new());
        }
        Ok((0..solution.projects.len())
            .map(|index| {
                Box::new(FixtureProject {
                    state: self.state.clone(),
                    entry: self.entry,
                    path: vec![index],
                }) as Box<dyn ProjectHandle>
            })
            .collect())
    }

    fn build(&self) -> HostResult<Box<dyn SolutionBuild>> {
        Ok(Box::new(FixtureBuild {
            state: self.state.clone(),
            entry: self.entry,
        }))
    }
}

struct FixtureBuild {
    state: Shared,
    entry: usize,
}

impl FixtureBuild {
    fn run(&self, member: &str, argument: Option<&str>) -> HostResult<()> {
        let mut state = self.state.lock();
        state.host_call(self.entry, member, argument)?;
        state.solution(self.entry).build_state = Some(BuildState::Done);
        Ok(())
    }

    fn read<T>(&self, member: &str, read: impl FnOnce(&SolutionSnapshot) -> T) -> HostResult<T> {
        let mut state = self.state.lock();
        state.host_call(self.entry, member, None)?;
        Ok(read(state.solution(self.entry)))
    }
}

impl SolutionBuild for FixtureBuild {
    fn build(&self, _wait: bool) -> HostResult<()> {
        self.run("SolutionBuild.Build", None)
    }

    fn rebuild(&self, _wait: bool) -> HostResult<()> {
        self.run("SolutionBuild.Rebuild", None)
    }

    fn clean(&self, _wait: bool) -> HostResult<()> {
        self.run("SolutionBuild.Clean", None)
    }

    fn build_project(&self, configuration: &str, unique_name: &str, _wait: bool) -> HostResult<()> {
        self.run(
            "SolutionBuild.BuildProject",
            Some(&format!("{configuration}, {unique_name}")),
        )
    }

    fn clean_project(&self, configuration: &str, unique_name: &str, _wait: bool) -> HostResult<()> {
        self.run(
            "SolutionBuild.CleanProject",
            Some(&format!("{configuration}, {unique_name}")),
        )
    }

    fn deploy_project(
        &self,
        configuration: &str,
        unique_name: &str,
        _wait: bool,
    ) -> HostResult<()> {
        self.run(
            "SolutionBuild.DeployProject",
            Some(&format!("{configuration}, {unique_name}")),
        )
    }

    fn active_configuration(&self) -> HostResult<Option<String>> {
        self.read("SolutionBuild.ActiveConfiguration", |s| {
            s.active_configuration.clone()
        })
    }

    fn configurations(&self) -> HostResult<Vec<String>> {
        self.read("SolutionBuild.SolutionConfigurations", |s| {
            s.configurations.clone()
        })
    }

    fn activate_configuration(&self, name: &str) -> HostResult<()> {
        let mut state = self.state.lock();
        state.host_call(self.entry, "SolutionConfiguration.Activate", Some(name))?;
        let solution = state.solution(self.entry);
        if !solution.configurations.iter().any(|c| c == name) {
            return Err(HostError::Failed(format!("Unknown configuration '{name}'")));
        }
        solution.active_configuration = Some(name.to_string());
        Ok(())
    }

    fn build_state(&self) -> HostResult<BuildState> {
        self.read("SolutionBuild.BuildState", |s| s.build_state)?
            .ok_or_else(|| vanished("BuildState"))
    }

    fn last_build_info(&self) -> HostResult<u32> {
        self.read("SolutionBuild.LastBuildInfo", |s| s.last_build_info)?
            .ok_or_else(|| vanished("LastBuildInfo"))
    }

    fn startup_projects(&self) -> HostResult<Vec<String>> {
        self.read("SolutionBuild.StartupProjects", |s| {
            s.startup_projects.clone()
        })
    }

    fn set_startup_projects(&self, unique_names: &[String]) -> HostResult<()> {
        let mut state = self.state.lock();
        state.host_call(
            self.entry,
            "SolutionBuild.StartupProjects",
            Some(&unique_names.join("; ")),
        )?;
        state.solution(self.entry).startup_projects = unique_names.to_vec();
        Ok(())
    }
}

struct FixtureProject {
    state: Shared,
    entry: usize,
    path: Vec<usize>,
}

impl FixtureProject {
    fn read<T>(&self, member: &str, read: impl FnOnce(&ProjectSnapshot) -> T) -> HostResult<T> {
        let state = self.state.lock();
        state
            .project(self.entry, &self.path)
            .map(read)
            .ok_or_else(|| vanished(member))
    }
}

impl ProjectHandle for FixtureProject {
    fn name(&self) -> HostResult<String> {
        self.read("Project.Name", |p| p.name.clone())
    }

    fn unique_name(&self) -> HostResult<String> {
        self.read("Project.UniqueName", |p| p.unique_name.clone())
    }

    fn full_name(&self) -> HostResult<String> {
        self.read("Project.FullName", |p| p.full_name.clone())
    }

    fn kind(&self) -> HostResult<String> {
        self.read("Project.Kind", |p| p.kind.clone())
    }

    fn children(&self) -> HostResult<Vec<Box<dyn ProjectHandle>>> {
        let count = self.read("Project.Children", |p| p.children.len())?;
        Ok((0..count)
            .map(|index| {
                let mut path = self.path.clone();
                path.push(index);
                Box::new(FixtureProject {
                    state: self.state.clone(),
                    entry: self.entry,
                    path,
                }) as Box<dyn ProjectHandle>
            })
            .collect())
    }

    fn items(&self) -> HostResult<Vec<Box<dyn ProjectItemHandle>>> {
        let count = self.read("Project.ProjectItems", |p| p.items.len())?;
        Ok((0..count)
            .map(|index| {
                Box::new(FixtureItem {
                    state: self.state.clone(),
                    entry: self.entry,
                    project: self.path.clone(),
                    path: vec![index],
                }) as Box<dyn ProjectItemHandle>
            })
            .collect())
    }
}

struct FixtureItem {
    state: Shared,
    entry: usize,
    project: Vec<usize>,
    path: Vec<usize>,
}

impl FixtureItem {
    fn read<T>(&self, member: &str, read: impl FnOnce(&ItemSnapshot) -> T) -> HostResult<T> {
        let state = self.state.lock();
        state
            .item(self.entry, &self.project, &self.path)
            .map(read)
            .ok_or_else(|| vanished(member))
    }
}

impl ProjectItemHandle for FixtureItem {
    fn name(&self) -> HostResult<String> {
        self.read("ProjectItem.Name", |i| i.name.clone())
    }

    fn file_names(&self) -> HostResult<Vec<PathBuf>> {
        self.read("ProjectItem.FileNames", |i| {
            i.files.iter().map(PathBuf::from).collect()
        })
    }

    fn children(&self) -> HostResult<Vec<Box<dyn ProjectItemHandle>>> {
        let count = self.read("ProjectItem.ProjectItems", |i| i.items.len())?;
        Ok((0..count)
            .map(|index| {
                let mut path = self.path.clone();
                path.push(index);
                Box::new(FixtureItem {
                    state: self.state.clone(),
                    entry: self.entry,
                    project: self.project.clone(),
                    path,
                }) as Box<dyn ProjectItemHandle>
            })
            .collect())
    }
}

struct FixtureDocument {
    state: Shared,
    entry: usize,
    index: usize,
}

impl FixtureDocument {
    fn with<T>(&self, change: impl FnOnce(&mut DocumentSnapshot) -> T) -> HostResult<T> {
        let mut state = self.state.lock();
        state.snapshot.entries[self.entry]
            .documents
            .get_mut(self.index)
            .map(change)
            .ok_or_else(|| vanished("Document"))
    }
}

impl Document for FixtureDocument {
    fn full_name(&self) -> HostResult<PathBuf> {
        self.with(|d| PathBuf::from(&d.path))
    }

    fn text(&self) -> HostResult<String> {
        self.with(|d| d.text.clone())
    }

    fn set_text(&self, text: &str) -> HostResult<()> {
        let path = self.with(|d| d.path.clone())?;
        self.state
            .lock()
            .host_call(self.entry, "Document.SetText", Some(&path))?;
        self.with(|d| {
            d.text = text.to_string();
            d.saved = false;
        })
    }

    fn save(&self) -> HostResult<()> {
        let path = self.with(|d| d.path.clone())?;
        self.state
            .lock()
            .host_call(self.entry, "Document.Save", Some(&path))?;
        self.with(|d| d.saved = true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_and_failures_are_injected() {
        let host = FixtureHost::from_json(
            r#"{ "entries": [{ "key": "k", "solution": {
                "busy": 1,
                "failures": { "SolutionBuild.BuildProject:Debug|Any CPU, A.csproj": "error MSB3202" }
            } }] }"#,
        )
        .unwrap();
        let build = host.app(0).solution().unwrap().build().unwrap();

        assert_eq!(build.build(true), Err(HostError::Busy));
        assert_eq!(build.build(true), Ok(()));
        assert_eq!(
            build.build_project("Debug|Any CPU", "A.csproj", true),
            Err(HostError::Failed("error MSB3202".into()))
        );
        assert_eq!(build.build_project("Debug|Any CPU", "B.csproj", true), Ok(()));
        assert_eq!(
            host.calls(),
            vec![
                "SolutionBuild.Build",
                "SolutionBuild.Build",
                "SolutionBuild.BuildProject(Debug|Any CPU, A.csproj)",
                "SolutionBuild.BuildProject(Debug|Any CPU, B.csproj)",
            ]
        );
    }

    #[test]
    fn test_vanished_project_reads_fail() {
        let host = FixtureHost::from_json(
            r#"{ "entries": [{ "key": "k", "solution": {
                "projects": [{ "name": "A", "vanished": true }]
            } }] }"#,
        )
        .unwrap();
        let projects = host.app(0).solution().unwrap().projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert!(matches!(projects[0].name(), Err(HostError::Unavailable(_))));
    }

    #[test]
    fn test_documents_are_edited_in_memory() {
        let host = FixtureHost::from_json(
            r#"{ "entries": [{ "key": "k", "documents": [{ "path": "C:\\src\\a.cs", "text": "old" }] }] }"#,
        )
        .unwrap();
        let app = host.app(0);
        let document = app.open_document(Path::new(r"c:\SRC\a.cs")).unwrap();
        document.set_text("new").unwrap();
        document.save().unwrap();

        let snapshot = host.snapshot();
        assert_eq!(snapshot.entries[0].documents[0].text, "new");
        assert!(snapshot.entries[0].documents[0].saved);
    }
}
