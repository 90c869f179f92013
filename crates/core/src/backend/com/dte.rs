//! Automation-model adapters
//!
//! Each adapter wraps one late-bound object of the host's automation model
//! and exposes it through the host traits. Collections are one-based.

use super::dispatch::{self, Dispatch, text};
use crate::interfaces::{
    BuildState, Document, HostApp, HostError, HostResult, ProjectHandle, ProjectItemHandle,
    Solution, SolutionBuild,
};
use std::path::{Path, PathBuf};
use windows::Win32::System::Com::CoTaskMemFree;
use windows::Win32::System::Variant::{
    InitVariantFromStringArray, VariantGetElementCount, VariantGetStringElem,
};
use windows::core::{HSTRING, PCWSTR, VARIANT};

pub(super) struct ComApp {
    dte: Dispatch,
}

impl ComApp {
    pub(super) fn new(dte: Dispatch) -> Self {
        Self { dte }
    }
}

impl HostApp for ComApp {
    fn name(&self) -> HostResult<String> {
        self.dte.get_string("Name")
    }

    fn version(&self) -> HostResult<String> {
        self.dte.get_string("Version")
    }

    fn solution(&self) -> HostResult<Box<dyn Solution>> {
        Ok(Box::new(ComSolution {
            solution: self.dte.get_object("Solution")?,
        }))
    }

    fn execute_command(&self, command: &str, args: &str) -> HostResult<()> {
        self.dte
            .call("ExecuteCommand", vec![text(command), text(args)])
            .map(|_| ())
    }

    fn open_document(&self, path: &Path) -> HostResult<Box<dyn Document>> {
        let operations = self.dte.get_object("ItemOperations")?;
        let window = operations.call("OpenFile", vec![text(&path.to_string_lossy())])?;
        let window = operations.object_from("OpenFile", &window)?;
        Ok(Box::new(ComDocument {
            document: window.get_object("Document")?,
        }))
    }

    fn documents(&self) -> HostResult<Vec<Box<dyn Document>>> {
        Ok(self
            .dte
            .collection("Documents")?
            .into_iter()
            .map(|document| Box::new(ComDocument { document }) as Box<dyn Document>)
            .collect())
    }
}

struct ComSolution {
    solution: Dispatch,
}

impl Solution for ComSolution {
    fn is_open(&self) -> HostResult<bool> {
        self.solution.get_bool("IsOpen")
    }

    fn full_name(&self) -> HostResult<String> {
        self.solution.get_string("FullName")
    }

    fn open(&self, path: &Path) -> HostResult<()> {
        self.solution
            .call("Open", vec![text(&path.to_string_lossy())])
            .map(|_| ())
    }

    fn close(&self, save_first: bool) -> HostResult<()> {
        self.solution
            .call("Close", vec![VARIANT::from(save_first)])
            .map(|_| ())
    }

    fn projects(&self) -> HostResult<Vec<Box<dyn ProjectHandle>>> {
        Ok(self
            .solution
            .collection("Projects")?
            .into_iter()
            .map(|project| Box::new(ComProject { project }) as Box<dyn ProjectHandle>)
            .collect())
    }

    fn build(&self) -> HostResult<Box<dyn SolutionBuild>> {
        Ok(Box::new(ComBuild {
            build: self.solution.get_object("SolutionBuild")?,
        }))
    }
}

struct ComBuild {
    build: Dispatch,
}

impl ComBuild {
    fn run(&self, member: &str, args: Vec<VARIANT>) -> HostResult<()> {
        self.build.call(member, args).map(|_| ())
    }

    fn project_call(
        &self,
        member: &str,
        configuration: &str,
        unique_name: &str,
        wait: bool,
    ) -> HostResult<()> {
        self.run(
            member,
            vec![text(configuration), text(unique_name), VARIANT::from(wait)],
        )
    }
}

/// `Name|Platform` of a solution configuration
fn configuration_name(configuration: &Dispatch) -> HostResult<String> {
    let name = configuration.get_string("Name")?;
    match configuration.get_string("PlatformName") {
        Ok(platform) if !platform.is_empty() => Ok(format!("{name}|{platform}")),
        _ => Ok(name),
    }
}

impl SolutionBuild for ComBuild {
    fn build(&self, wait: bool) -> HostResult<()> {
        self.run("Build", vec![VARIANT::from(wait)])
    }

    fn rebuild(&self, wait: bool) -> HostResult<()> {
        self.run("Rebuild", vec![VARIANT::from(wait)])
    }

    fn clean(&self, wait: bool) -> HostResult<()> {
        self.run("Clean", vec![VARIANT::from(wait)])
    }

    fn build_project(&self, configuration: &str, unique_name: &str, wait: bool) -> HostResult<()> {
        self.project_call("BuildProject", configuration, unique_name, wait)
    }

    fn clean_project(&self, configuration: &str, unique_name: &str, wait: bool) -> HostResult<()> {
        self.project_call("CleanProject", configuration, unique_name, wait)
    }

    fn deploy_project(&self, configuration: &str, unique_name: &str, wait: bool) -> HostResult<()> {
        self.project_call("DeployProject", configuration, unique_name, wait)
    }

    fn active_configuration(&self) -> HostResult<Option<String>> {
        match self.build.get_optional_object("ActiveConfiguration")? {
            Some(configuration) => configuration_name(&configuration).map(Some),
            None => Ok(None),
        }
    }

    fn configurations(&self) -> HostResult<Vec<String>> {
        self.build
            .collection("SolutionConfigurations")?
            .iter()
            .map(configuration_name)
            .collect()
    }

    fn activate_configuration(&self, name: &str) -> HostResult<()> {
        for configuration in self.build.collection("SolutionConfigurations")? {
            if configuration_name(&configuration)? == name {
                return configuration.call("Activate", Vec::new()).map(|_| ());
            }
        }
        Err(HostError::Failed(format!("Unknown configuration '{name}'")))
    }

    fn build_state(&self) -> HostResult<BuildState> {
        match self.build.get_i32("BuildState")? {
            1 => Ok(BuildState::NotStarted),
            2 => Ok(BuildState::InProgress),
            3 => Ok(BuildState::Done),
            other => Err(HostError::Unavailable(format!("BuildState {other}"))),
        }
    }

    fn last_build_info(&self) -> HostResult<u32> {
        let failed = self.build.get_i32("LastBuildInfo")?;
        Ok(u32::try_from(failed).unwrap_or(0))
    }

    fn startup_projects(&self) -> HostResult<Vec<String>> {
        let value = self.build.get("StartupProjects")?;
        if value.is_empty() {
            return Ok(Vec::new());
        }
        let count = unsafe { VariantGetElementCount(&value) };
        let mut names = Vec::with_capacity(count as usize);
        for index in 0..count {
            let element = unsafe { VariantGetStringElem(&value, index) }
                .map_err(|e| HostError::Failed(format!("StartupProjects: {}", e.message())))?;
            let name = unsafe { element.to_string() };
            unsafe { CoTaskMemFree(Some(element.0 as *const _)) };
            if let Ok(name) = name {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn set_startup_projects(&self, unique_names: &[String]) -> HostResult<()> {
        let value = match unique_names {
            [single] => text(single),
            names => {
                let wide: Vec<HSTRING> = names.iter().map(HSTRING::from).collect();
                let pointers: Vec<PCWSTR> = wide.iter().map(|w| PCWSTR(w.as_ptr())).collect();
                unsafe { InitVariantFromStringArray(&pointers) }
                    .map_err(|e| HostError::Failed(format!("StartupProjects: {}", e.message())))?
            }
        };
        self.build.put("StartupProjects", value)
    }
}

struct ComProject {
    project: Dispatch,
}

impl ProjectHandle for ComProject {
    fn name(&self) -> HostResult<String> {
        self.project.get_string("Name")
    }

    fn unique_name(&self) -> HostResult<String> {
        self.project.get_string("UniqueName")
    }

    fn full_name(&self) -> HostResult<String> {
        self.project.get_string("FullName")
    }

    fn kind(&self) -> HostResult<String> {
        self.project.get_string("Kind")
    }

    /// Projects nested in a solution folder hang off its items
    fn children(&self) -> HostResult<Vec<Box<dyn ProjectHandle>>> {
        let mut children: Vec<Box<dyn ProjectHandle>> = Vec::new();
        for item in self.project.collection("ProjectItems")? {
            if let Ok(Some(project)) = item.get_optional_object("SubProject") {
                children.push(Box::new(ComProject { project }));
            }
        }
        Ok(children)
    }

    fn items(&self) -> HostResult<Vec<Box<dyn ProjectItemHandle>>> {
        Ok(self
            .project
            .collection("ProjectItems")?
            .into_iter()
            .map(|item| Box::new(ComItem { item }) as Box<dyn ProjectItemHandle>)
            .collect())
    }
}

struct ComItem {
    item: Dispatch,
}

impl ProjectItemHandle for ComItem {
    fn name(&self) -> HostResult<String> {
        self.item.get_string("Name")
    }

    fn file_names(&self) -> HostResult<Vec<PathBuf>> {
        let count = self.item.get_i32("FileCount")?;
        let mut files = Vec::new();
        for index in 1..=count.clamp(0, i32::from(i16::MAX)) {
            // FileNames takes a 16-bit index
            let value = self
                .item
                .get_at("FileNames", vec![VARIANT::from(index as i16)])?;
            let path = dispatch::to_string("FileNames", &value)?;
            if !path.is_empty() {
                files.push(PathBuf::from(path));
            }
        }
        Ok(files)
    }

    fn children(&self) -> HostResult<Vec<Box<dyn ProjectItemHandle>>> {
        Ok(self
            .item
            .collection("ProjectItems")?
            .into_iter()
            .map(|item| Box::new(ComItem { item }) as Box<dyn ProjectItemHandle>)
            .collect())
    }
}

struct ComDocument {
    document: Dispatch,
}

impl ComDocument {
    /// Edit point at the start of the text and the end point of the buffer
    fn text_range(&self) -> HostResult<(Dispatch, VARIANT)> {
        let text_document = self.document.get_at("Object", vec![text("TextDocument")])?;
        let text_document = self.document.object_from("TextDocument", &text_document)?;
        let start = text_document.get_object("StartPoint")?;
        let edit = start.call("CreateEditPoint", Vec::new())?;
        let edit = start.object_from("EditPoint", &edit)?;
        let end = text_document.get("EndPoint")?;
        Ok((edit, end))
    }
}

impl Document for ComDocument {
    fn full_name(&self) -> HostResult<PathBuf> {
        self.document.get_string("FullName").map(PathBuf::from)
    }

    fn text(&self) -> HostResult<String> {
        let (edit, end) = self.text_range()?;
        let value = edit.call("GetText", vec![end])?;
        dispatch::to_string("GetText", &value)
    }

    fn set_text(&self, new_text: &str) -> HostResult<()> {
        let (edit, end) = self.text_range()?;
        edit.call("Delete", vec![end])?;
        edit.call("Insert", vec![text(new_text)]).map(|_| ())
    }

    fn save(&self) -> HostResult<()> {
        self.document.call("Save", Vec::new()).map(|_| ())
    }
}
