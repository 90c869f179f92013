//! File lookup
//!
//! Finds a file by rooted path, path suffix or bare file name. The host's own
//! item tree is searched first; only when it has no match does the search
//! fall back to the project directories on disk, skipping build output,
//! version-control, dependency-cache and local-settings directories.
//!
//! When several files share a bare name the first one discovered wins. The
//! disk walk order is not specified, so callers that need a particular file
//! pass a path-qualified spec.

use crate::error::{Error, Result};
use crate::filter::RetryFilter;
use crate::interfaces::ProjectItemHandle;
use crate::tree::ProjectNode;
use crate::utils::paths;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into by the disk search
pub const IGNORED_DIRS: [&str; 9] = [
    "bin",
    "obj",
    ".git",
    ".svn",
    ".hg",
    ".vs",
    ".idea",
    "node_modules",
    "packages",
];

/// How a file spec is compared against candidate paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSpec {
    /// Absolute path, compared whole
    Rooted(String),
    /// Relative path, compared against the trailing components
    Suffix(String),
    /// File name only
    Bare(String),
}

impl FileSpec {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Usage("empty file name".into()));
        }

        if paths::is_rooted(text) {
            Ok(FileSpec::Rooted(paths::normalize(text)))
        } else if paths::has_separator(text) {
            let normalized = paths::normalize(text);
            if normalized.is_empty() {
                return Err(Error::Usage(format!("'{text}' does not name a file")));
            }
            Ok(FileSpec::Suffix(normalized))
        } else {
            Ok(FileSpec::Bare(text.to_lowercase()))
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            FileSpec::Rooted(path) => paths::normalize(candidate) == *path,
            FileSpec::Suffix(suffix) => {
                let candidate = paths::normalize(candidate);
                candidate == *suffix
                    || candidate
                        .strip_suffix(suffix.as_str())
                        .is_some_and(|head| head.ends_with('/'))
            }
            FileSpec::Bare(name) => paths::file_name(candidate).to_lowercase() == *name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOrigin {
    HostItem,
    Disk,
}

/// A located file and where it was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub origin: FileOrigin,
    /// Display name of the project it belongs to
    pub project: String,
}

#[derive(Debug, Clone, Copy)]
pub enum SearchScope<'a> {
    Project(&'a ProjectNode),
    /// Every leaf project, in traversal order
    Tree(&'a [ProjectNode]),
}

pub struct FileLocator<'f> {
    filter: &'f RetryFilter,
    ignored: Vec<String>,
}

impl<'f> FileLocator<'f> {
    pub fn new(filter: &'f RetryFilter) -> Self {
        Self {
            filter,
            ignored: IGNORED_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }

    pub fn with_extra_ignored(mut self, extra: &[String]) -> Self {
        self.ignored.extend(extra.iter().map(|d| d.to_lowercase()));
        self
    }

    pub fn find_file(&self, scope: SearchScope<'_>, spec: &FileSpec) -> Option<FileCandidate> {
        let projects = match scope {
            SearchScope::Project(project) => std::slice::from_ref(project),
            SearchScope::Tree(projects) => projects,
        };

        for project in projects {
            if let Some(path) = self.search_items(project, spec) {
                debug!("Found {} in the items of '{}'", path.display(), project.display_name);
                return Some(FileCandidate {
                    path,
                    origin: FileOrigin::HostItem,
                    project: project.display_name.clone(),
                });
            }
        }

        for project in projects {
            if let Some(path) = self.search_disk(project, spec) {
                debug!("Found {} on disk under '{}'", path.display(), project.display_name);
                return Some(FileCandidate {
                    path,
                    origin: FileOrigin::Disk,
                    project: project.display_name.clone(),
                });
            }
        }

        None
    }

    /// Depth-first over the project's items and their nested items
    fn search_items(&self, project: &ProjectNode, spec: &FileSpec) -> Option<PathBuf> {
        let items = self
            .filter
            .call("Project.ProjectItems", || project.handle().items())
            .ok()?;
        let mut stack: Vec<Box<dyn ProjectItemHandle>> = items.into_iter().rev().collect();

        while let Some(item) = stack.pop() {
            if let Ok(files) = self.filter.call("ProjectItem.FileNames", || item.file_names()) {
                if let Some(file) = files.into_iter().find(|f| spec.matches(&f.to_string_lossy())) {
                    return Some(file);
                }
            }
            if let Ok(children) = self.filter.call("ProjectItem.ProjectItems", || item.children()) {
                stack.extend(children.into_iter().rev());
            }
        }

        None
    }

    fn search_disk(&self, project: &ProjectNode, spec: &FileSpec) -> Option<PathBuf> {
        let directory = Path::new(project.directory()?);
        if !directory.is_dir() {
            debug!("Project directory {} is not on disk", directory.display());
            return None;
        }

        WalkDir::new(directory)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_ignored(entry))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .find(|entry| spec.matches(&entry.path().to_string_lossy()))
            .map(DirEntry::into_path)
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.ignored.contains(&name.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fixture::{
        EntrySnapshot, FixtureHost, HostSnapshot, ItemSnapshot, ProjectSnapshot, SolutionSnapshot,
    };
    use crate::tree::ProjectTree;
    use std::fs;
    use tempfile::TempDir;

    struct Workspace {
        _temp: TempDir,
        root: PathBuf,
    }

    impl Workspace {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = temp.path().to_path_buf();
            Self { _temp: temp, root }
        }

        fn file(&self, relative: &str) -> PathBuf {
            let path = self.root.join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "// test").unwrap();
            path
        }

        fn path(&self, relative: &str) -> String {
            self.root.join(relative).to_string_lossy().to_string()
        }
    }

    fn item(path: &str) -> ItemSnapshot {
        ItemSnapshot {
            name: paths::file_name(path).to_string(),
            files: vec![path.to_string()],
            ..Default::default()
        }
    }

    fn project(name: &str, full_name: String, items: Vec<ItemSnapshot>) -> ProjectSnapshot {
        ProjectSnapshot {
            name: name.to_string(),
            unique_name: format!("{name}\\{name}.csproj"),
            full_name,
            items,
            ..Default::default()
        }
    }

    fn host(projects: Vec<ProjectSnapshot>) -> FixtureHost {
        FixtureHost::new(HostSnapshot {
            entries: vec![EntrySnapshot {
                key: "!VisualStudio.DTE.17.0:1".into(),
                solution: SolutionSnapshot {
                    projects,
                    ..Default::default()
                },
                ..Default::default()
            }],
            ..Default::default()
        })
    }

    fn locate(host: &FixtureHost, project: Option<&str>, spec: &str) -> Option<FileCandidate> {
        let solution = host.app(0).solution().unwrap();
        let filter = RetryFilter::default();
        let tree = ProjectTree::from_solution(solution.as_ref(), &filter).unwrap();
        let leaves = tree.leaves();
        let locator = FileLocator::new(&filter);
        let spec = FileSpec::parse(spec).unwrap();
        match project {
            Some(name) => {
                let node = leaves.iter().find(|n| n.display_name == name).unwrap();
                locator.find_file(SearchScope::Project(node), &spec)
            }
            None => locator.find_file(SearchScope::Tree(&leaves), &spec),
        }
    }

    #[test]
    fn test_spec_classification() {
        assert!(matches!(FileSpec::parse(r"C:\src\a.cs").unwrap(), FileSpec::Rooted(_)));
        assert_eq!(
            FileSpec::parse(r"Models\User.cs").unwrap(),
            FileSpec::Suffix("models/user.cs".into())
        );
        assert_eq!(FileSpec::parse("User.cs").unwrap(), FileSpec::Bare("user.cs".into()));
        // drive-relative, not rooted
        assert!(!matches!(FileSpec::parse("C:foo.cs").unwrap(), FileSpec::Rooted(_)));
        assert!(FileSpec::parse("  ").unwrap_err().is_usage());
    }

    #[test]
    fn test_suffix_respects_component_boundaries() {
        let spec = FileSpec::parse("src/gram.cs").unwrap();
        assert!(!spec.matches("/work/src/program.cs"));
        assert!(spec.matches(r"C:\work\SRC\gram.cs"));
        assert!(FileSpec::parse("Gram.cs").unwrap().matches("/a/b/gram.CS"));
    }

    #[test]
    fn test_host_items_win_over_disk() {
        let ws = Workspace::new();
        ws.file("App/App.csproj");
        ws.file("App/Program.cs");
        let linked = ws.file("Shared/Program.cs");
        let host = host(vec![project(
            "App",
            ws.path("App/App.csproj"),
            vec![item(&linked.to_string_lossy())],
        )]);

        let found = locate(&host, Some("App"), "Program.cs").unwrap();
        assert_eq!(found.path, linked);
        assert_eq!(found.origin, FileOrigin::HostItem);
    }

    #[test]
    fn test_nested_items_are_searched() {
        let folder = ItemSnapshot {
            name: "Models".into(),
            items: vec![item(r"C:\src\App\Models\User.cs")],
            ..Default::default()
        };
        let host = host(vec![project(
            "App",
            r"C:\src\App\App.csproj".into(),
            vec![item(r"C:\src\App\Program.cs"), folder],
        )]);

        let found = locate(&host, Some("App"), r"models\user.cs").unwrap();
        assert_eq!(found.path, PathBuf::from(r"C:\src\App\Models\User.cs"));
    }

    #[test]
    fn test_vanished_items_are_skipped() {
        let mut gone = item(r"C:\src\App\Gone.cs");
        gone.vanished = true;
        let host = host(vec![project(
            "App",
            r"C:\src\App\App.csproj".into(),
            vec![gone, item(r"C:\src\App\Kept.cs")],
        )]);

        assert!(locate(&host, Some("App"), "Gone.cs").is_none());
        assert!(locate(&host, Some("App"), "Kept.cs").is_some());
    }

    #[test]
    fn test_disk_fallback_prunes_ignored_dirs() {
        let ws = Workspace::new();
        ws.file("App/App.csproj");
        ws.file("App/bin/Debug/Generated.cs");
        ws.file("App/obj/Generated.cs");
        ws.file("App/node_modules/pkg/Generated.cs");
        let util = ws.file("App/Helpers/Util.cs");
        let host = host(vec![project("App", ws.path("App/App.csproj"), vec![])]);

        let found = locate(&host, Some("App"), "Helpers/Util.cs").unwrap();
        assert_eq!(found.path, util);
        assert_eq!(found.origin, FileOrigin::Disk);
        assert!(locate(&host, Some("App"), "Generated.cs").is_none());
    }

    #[test]
    fn test_rooted_spec_requires_identical_path() {
        let ws = Workspace::new();
        ws.file("App/App.csproj");
        let real = ws.file("App/Program.cs");
        let host = host(vec![project("App", ws.path("App/App.csproj"), vec![])]);

        let missing = ws.path("App/Other/Program.cs");
        assert!(locate(&host, Some("App"), &missing).is_none());

        let found = locate(&host, Some("App"), &real.to_string_lossy()).unwrap();
        assert_eq!(found.path, real);
    }

    #[test]
    fn test_tree_scope_searches_all_items_before_disk() {
        let ws = Workspace::new();
        ws.file("A/A.csproj");
        ws.file("A/Startup.cs");
        ws.file("B/B.csproj");
        let host = host(vec![
            project("A", ws.path("A/A.csproj"), vec![]),
            project("B", ws.path("B/B.csproj"), vec![item(r"C:\elsewhere\Startup.cs")]),
        ]);

        let found = locate(&host, None, "Startup.cs").unwrap();
        assert_eq!(found.project, "B");
        assert_eq!(found.origin, FileOrigin::HostItem);
    }

    #[test]
    fn test_extra_ignored_dirs() {
        let ws = Workspace::new();
        ws.file("App/App.csproj");
        ws.file("App/out/Report.cs");
        let host = host(vec![project("App", ws.path("App/App.csproj"), vec![])]);
        let solution = host.app(0).solution().unwrap();
        let filter = RetryFilter::default();
        let leaves = ProjectTree::from_solution(solution.as_ref(), &filter)
            .unwrap()
            .leaves();
        let spec = FileSpec::parse("Report.cs").unwrap();

        assert!(FileLocator::new(&filter)
            .find_file(SearchScope::Project(&leaves[0]), &spec)
            .is_some());
        assert!(FileLocator::new(&filter)
            .with_extra_ignored(&["OUT".to_string()])
            .find_file(SearchScope::Project(&leaves[0]), &spec)
            .is_none());
    }
}
