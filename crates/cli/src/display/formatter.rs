use hostpilot_core::controller::{
    ConfigurationList, DocumentReport, InfoReport, InstanceSummary, SolutionReport, StartupReport,
};
use hostpilot_core::locator::FileOrigin;
use hostpilot_core::tree::ProjectSummary;
use hostpilot_core::{BuildReport, Error, FileCandidate};

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

fn pid(instance: &InstanceSummary) -> String {
    instance
        .process_id
        .map(|p| p.to_string())
        .unwrap_or_else(|| "?".to_string())
}

pub fn print_info(report: &InfoReport) {
    if !report.running {
        println!("⭕ Host: not running");
        return;
    }

    match report.selected() {
        Some(selected) => println!(
            "🖥️  Host: {} {} (pid {})",
            or_dash(report.host.as_deref()),
            or_dash(report.version.as_deref()),
            pid(selected)
        ),
        None => println!("🖥️  Host: {}", or_dash(report.host.as_deref())),
    }
    if report.instances.len() > 1 {
        println!("   • {} instances running", report.instances.len());
    }

    let Some(solution) = report.solution.as_deref() else {
        println!("📂 Solution: none open");
        return;
    };
    println!("📂 Solution: {}", or_dash(Some(solution)));
    println!(
        "   • configuration: {}",
        or_dash(report.active_configuration.as_deref())
    );
    if report.startup_projects.is_empty() {
        println!("   • startup: -");
    } else {
        println!("   • startup: {}", report.startup_projects.join(", "));
    }
    match report.build_state {
        Some(state) => println!("   • build: {state}"),
        None => println!("   • build: -"),
    }
}

pub fn print_instances(instances: &[InstanceSummary]) {
    if instances.is_empty() {
        println!("⭕ No running host instance found");
        return;
    }
    for instance in instances {
        let marker = if instance.selected { "▶" } else { " " };
        println!("{marker} {:>8}  {}", pid(instance), instance.registry_key);
    }
}

pub fn print_projects(projects: &[ProjectSummary]) {
    if projects.is_empty() {
        println!("No projects");
        return;
    }
    for project in projects {
        println!("📦 {}", project.name);
        println!("   • unique name: {}", project.unique_name);
        if !project.full_path.is_empty() {
            println!("   • path: {}", project.full_path);
        }
    }
}

pub fn print_configurations(list: &ConfigurationList) {
    for configuration in &list.configurations {
        let active = list.active.as_deref() == Some(configuration.as_str());
        println!("{} {}", if active { "▶" } else { " " }, configuration);
    }
}

pub fn print_build_report(report: &BuildReport) {
    let icon = if report.succeeded() { "✅" } else { "❌" };
    print!("{icon} {} {}", report.action, report.target);
    if let Some(configuration) = &report.configuration {
        print!(" ({configuration})");
    }
    println!();

    if let Some(errors) = report.errors {
        println!("   • failed projects: {errors}");
    }
    if let Some(state) = report.state {
        println!("   • build state: {state}");
    }
    if report.used_fallback {
        println!("   • ran through the top-level build command");
    }
}

pub fn print_startup(report: &StartupReport) {
    if report.projects.is_empty() {
        println!("🚀 Startup: none");
        return;
    }
    println!("🚀 Startup:");
    for project in &report.projects {
        println!("   • {project}");
    }
}

pub fn print_file(candidate: &FileCandidate) {
    let origin = match candidate.origin {
        FileOrigin::HostItem => "project item",
        FileOrigin::Disk => "on disk",
    };
    println!("{}", candidate.path.display());
    println!("   • {} of {}", origin, candidate.project);
}

pub fn print_solution(report: &SolutionReport) {
    if !report.open {
        println!("📂 Solution: none open");
        return;
    }
    println!("📂 Solution: {}", or_dash(report.full_name.as_deref()));
    if let Some(projects) = report.projects {
        println!("   • {projects} project(s)");
    }
}

/// Prints the text verbatim when present, otherwise the document path
pub fn print_document(report: &DocumentReport) {
    match &report.text {
        Some(text) => print!("{text}"),
        None => println!("📝 {}", report.path.display()),
    }
}

pub fn print_error(error: &Error) {
    eprintln!("❌ {error}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("")), "-");
        assert_eq!(or_dash(Some("Debug|x64")), "Debug|x64");
    }
}
