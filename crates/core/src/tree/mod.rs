//! Project-tree resolution
//!
//! The host's project tree nests arbitrarily: solution folders hold projects
//! and further folders. The tree is read live, one node at a time, and
//! flattened with an explicit stack into the leaf projects that can be built
//! or file targets. Nodes that vanish while being read are skipped.

mod matcher;

pub use matcher::NamePattern;

use crate::error::{Error, Result};
use crate::filter::RetryFilter;
use crate::interfaces::{CONTAINER_KIND, ProjectHandle, Solution};
use crate::utils::paths;
use serde::Serialize;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// A leaf project read from the live tree
///
/// The fields are a snapshot taken when the node was visited; the handle
/// stays live and is only valid for the current command.
#[derive(Clone)]
pub struct ProjectNode {
    pub display_name: String,
    pub unique_name: String,
    pub full_path: String,
    pub kind: String,
    handle: Rc<dyn ProjectHandle>,
}

impl ProjectNode {
    pub fn handle(&self) -> &dyn ProjectHandle {
        self.handle.as_ref()
    }

    /// Directory holding the project file
    pub fn directory(&self) -> Option<&str> {
        paths::parent(&self.full_path)
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            name: self.display_name.clone(),
            unique_name: self.unique_name.clone(),
            full_path: self.full_path.clone(),
            kind: self.kind.clone(),
        }
    }

    fn field(&self, field: MatchField) -> &str {
        match field {
            MatchField::Name => &self.display_name,
            MatchField::UniqueName => &self.unique_name,
            MatchField::FullPath => &self.full_path,
            MatchField::FileStem => paths::file_stem(&self.full_path),
        }
    }
}

impl fmt::Debug for ProjectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectNode")
            .field("display_name", &self.display_name)
            .field("unique_name", &self.unique_name)
            .field("full_path", &self.full_path)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Serializable view of a [`ProjectNode`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub unique_name: String,
    pub full_path: String,
    pub kind: String,
}

/// One visited node: a container to expand, or a leaf project
pub enum TreeEntry {
    Group {
        name: String,
        children: Vec<Rc<dyn ProjectHandle>>,
    },
    Leaf(ProjectNode),
}

impl TreeEntry {
    /// Read a node, `None` if it vanished or cannot be read
    pub fn classify(handle: Rc<dyn ProjectHandle>, filter: &RetryFilter) -> Option<TreeEntry> {
        let kind = filter.call("Project.Kind", || handle.kind()).ok()?;
        let display_name = filter.call("Project.Name", || handle.name()).ok()?;

        if kind.eq_ignore_ascii_case(CONTAINER_KIND) {
            let children = filter
                .call("Project.Children", || handle.children())
                .unwrap_or_else(|e| {
                    debug!("Container '{}' children unavailable: {}", display_name, e);
                    Vec::new()
                });
            return Some(TreeEntry::Group {
                name: display_name,
                children: children.into_iter().map(Rc::from).collect(),
            });
        }

        let unique_name = filter.call("Project.UniqueName", || handle.unique_name()).ok()?;
        // Some project kinds (miscellaneous files, unloaded) have no file path
        let full_path = filter
            .call("Project.FullName", || handle.full_name())
            .unwrap_or_default();

        Some(TreeEntry::Leaf(ProjectNode {
            display_name,
            unique_name,
            full_path,
            kind,
            handle,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchField {
    Name,
    UniqueName,
    FullPath,
    FileStem,
}

const FIELD_ORDER: [MatchField; 4] = [
    MatchField::Name,
    MatchField::UniqueName,
    MatchField::FullPath,
    MatchField::FileStem,
];

/// The live project tree of one solution
pub struct ProjectTree<'f> {
    roots: Vec<Rc<dyn ProjectHandle>>,
    filter: &'f RetryFilter,
}

impl<'f> ProjectTree<'f> {
    pub fn new(roots: Vec<Box<dyn ProjectHandle>>, filter: &'f RetryFilter) -> Self {
        Self {
            roots: roots.into_iter().map(Rc::from).collect(),
            filter,
        }
    }

    /// Tree of an open solution; [`Error::NoSolution`] when none is open
    pub fn from_solution(solution: &dyn Solution, filter: &'f RetryFilter) -> Result<Self> {
        let open = filter.call("Solution.IsOpen", || solution.is_open())?;
        if !open {
            return Err(Error::NoSolution);
        }
        let roots = filter.call("Solution.Projects", || solution.projects())?;
        Ok(Self::new(roots, filter))
    }

    /// Depth-first leaf projects in traversal order
    pub fn leaves(&self) -> Vec<ProjectNode> {
        let mut stack: Vec<Rc<dyn ProjectHandle>> = self.roots.iter().rev().cloned().collect();
        let mut leaves = Vec::new();

        while let Some(handle) = stack.pop() {
            match TreeEntry::classify(handle, self.filter) {
                Some(TreeEntry::Group { name, children }) => {
                    debug!("Expanding container '{}' ({} children)", name, children.len());
                    stack.extend(children.into_iter().rev());
                }
                Some(TreeEntry::Leaf(node)) => leaves.push(node),
                None => debug!("Skipping a project node that could not be read"),
            }
        }

        leaves
    }

    pub fn find_project(&self, selector: &str) -> Option<ProjectNode> {
        let leaves = self.leaves();
        resolve(&leaves, selector).cloned()
    }

    /// Every leaf with at least one field matching `selector`
    pub fn find_projects(&self, selector: &str) -> Vec<ProjectNode> {
        let pattern = NamePattern::new(selector);
        self.leaves()
            .into_iter()
            .filter(|node| FIELD_ORDER.iter().any(|f| pattern.matches(node.field(*f))))
            .collect()
    }
}

/// Pick the node `selector` designates among `nodes` (in traversal order)
///
/// A unique name equal to the selector (ignoring case) wins outright. Otherwise
/// each field is tried in turn (name, unique name, full path, file stem),
/// first for case-insensitive equality, then, for wildcard selectors, as a
/// pattern; within a field the first node in traversal order wins.
pub fn resolve<'a>(nodes: &'a [ProjectNode], selector: &str) -> Option<&'a ProjectNode> {
    let selector = selector.trim();
    if selector.is_empty() {
        return None;
    }

    let pattern = NamePattern::new(selector);
    if let Some(node) = nodes.iter().find(|n| pattern.matches_exact(&n.unique_name)) {
        return Some(node);
    }

    for field in FIELD_ORDER {
        if let Some(node) = nodes.iter().find(|n| pattern.matches_exact(n.field(field))) {
            debug!("'{}' matched {:?} of '{}'", selector, field, node.display_name);
            return Some(node);
        }
    }

    if pattern.is_wildcard() {
        for field in FIELD_ORDER {
            if let Some(node) = nodes.iter().find(|n| pattern.matches_wildcard(n.field(field))) {
                debug!("'{}' matched {:?} of '{}' (wildcard)", selector, field, node.display_name);
                return Some(node);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fixture::FixtureHost;

    const TREE: &str = r#"{
        "entries": [{
            "key": "!VisualStudio.DTE.17.0:100",
            "solution": {
                "full_name": "C:\\src\\App.sln",
                "projects": [
                    { "name": "Libraries", "kind": "{66A26720-8FB5-11D2-AA7E-00C04F688DDE}",
                      "children": [
                        { "name": "FooTests", "unique_name": "Libraries\\FooTests\\FooTests.csproj",
                          "full_name": "C:\\src\\Libraries\\FooTests\\FooTests.csproj" },
                        { "name": "Nested", "kind": "{66A26720-8FB5-11D2-AA7E-00C04F688DDE}",
                          "children": [
                            { "name": "Deep", "unique_name": "Deep\\Deep.vcxproj",
                              "full_name": "C:\\src\\Deep\\Deep.vcxproj" }
                          ] }
                      ] },
                    { "name": "FooCore", "unique_name": "FooCore\\FooCore.csproj",
                      "full_name": "C:\\src\\FooCore\\FooCore.csproj" },
                    { "name": "Gone", "unique_name": "Gone\\Gone.csproj", "vanished": true },
                    { "name": "Shell", "unique_name": "FooCore",
                      "full_name": "C:\\src\\Shell\\AppShell.csproj" }
                ]
            }
        }]
    }"#;

    fn with_tree<T>(check: impl FnOnce(&ProjectTree) -> T) -> T {
        let host = FixtureHost::from_json(TREE).unwrap();
        let app = host.app(0);
        let solution = app.solution().unwrap();
        let filter = RetryFilter::default();
        let tree = ProjectTree::from_solution(solution.as_ref(), &filter).unwrap();
        check(&tree)
    }

    fn names(nodes: &[ProjectNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.display_name.as_str()).collect()
    }

    #[test]
    fn test_leaves_flatten_containers_depth_first() {
        with_tree(|tree| {
            let leaves = tree.leaves();
            assert_eq!(names(&leaves), vec!["FooTests", "Deep", "FooCore", "Shell"]);
        });
    }

    #[test]
    fn test_container_is_never_returned() {
        with_tree(|tree| {
            assert!(tree.find_project("Libraries").is_none());
            assert!(tree.find_project("Nested").is_none());
            assert!(tree.find_projects("Lib*").is_empty());
        });
    }

    #[test]
    fn test_wildcard_follows_traversal_order() {
        with_tree(|tree| {
            let found = tree.find_project("Foo*").unwrap();
            assert_eq!(found.display_name, "FooTests");
        });
    }

    #[test]
    fn test_unique_name_beats_display_name() {
        with_tree(|tree| {
            // "FooCore" is the display name of one node and the unique name of another
            let found = tree.find_project("FooCore").unwrap();
            assert_eq!(found.display_name, "Shell");
            assert_eq!(tree.find_project("foocore").unwrap().display_name, "Shell");
            assert_eq!(tree.find_project("FOOCORE").unwrap().display_name, "Shell");
        });
    }

    #[test]
    fn test_field_fallbacks() {
        with_tree(|tree| {
            assert_eq!(tree.find_project("deep").unwrap().display_name, "Deep");
            assert_eq!(
                tree.find_project(r"c:\src\libraries\footests\footests.csproj")
                    .unwrap()
                    .display_name,
                "FooTests"
            );
            assert_eq!(tree.find_project("AppShell").unwrap().display_name, "Shell");
            assert_eq!(tree.find_project("*.vcxproj").unwrap().display_name, "Deep");
        });
    }

    #[test]
    fn test_vanished_node_is_not_found() {
        with_tree(|tree| {
            assert!(tree.find_project("Gone").is_none());
            assert!(tree.find_project("Missing").is_none());
            assert!(tree.find_project("").is_none());
        });
    }

    #[test]
    fn test_find_projects_lists_all_matches() {
        with_tree(|tree| {
            assert_eq!(names(&tree.find_projects("foo*")), vec!["FooTests", "FooCore", "Shell"]);
        });
    }

    #[test]
    fn test_closed_solution() {
        let host = FixtureHost::from_json(
            r#"{ "entries": [{ "key": "!VisualStudio.DTE.17.0:1", "solution": { "open": false } }] }"#,
        )
        .unwrap();
        let app = host.app(0);
        let solution = app.solution().unwrap();
        let filter = RetryFilter::default();
        assert!(matches!(
            ProjectTree::from_solution(solution.as_ref(), &filter),
            Err(Error::NoSolution)
        ));
    }
}
