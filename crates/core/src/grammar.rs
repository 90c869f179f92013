//! Selector grammar
//!
//! ```text
//! !Name:action          project-scoped build action
//! !Name:<file>          file lookup inside one project
//! !p1;!p2               startup project set
//! action [pattern]      solution build, or project build by pattern
//! ```
//!
//! Parsing never touches the host, so malformed selectors are reported
//! before any automation call.

use crate::build::BuildAction;
use crate::error::{Error, Result};

/// What a build action applies to, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    Solution,
    Project(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLookup {
    /// Project to search in; the whole tree when absent
    pub project: Option<String>,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Build {
        action: BuildAction,
        target: TargetSelector,
    },
    OpenFile(FileLookup),
    SetStartup(Vec<String>),
}

pub fn parse_request(text: &str) -> Result<Request> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Usage("empty selector".into()));
    }

    if let Some(body) = text.strip_prefix('!') {
        if text.contains(';') {
            return parse_startup_set(text).map(Request::SetStartup);
        }
        return match body.split_once(':') {
            Some((name, rest)) => {
                let name = project_name(name)?;
                match rest.parse::<BuildAction>() {
                    Ok(action) => Ok(Request::Build {
                        action,
                        target: TargetSelector::Project(name),
                    }),
                    Err(_) if rest.trim().is_empty() => {
                        Err(Error::Usage(format!("'{text}' names no action or file")))
                    }
                    Err(_) => Ok(Request::OpenFile(FileLookup {
                        project: Some(name),
                        file: rest.trim().to_string(),
                    })),
                }
            }
            None => Ok(Request::SetStartup(vec![project_name(body)?])),
        };
    }

    let (action, rest) = match text.split_once(char::is_whitespace) {
        Some((action, rest)) => (action, Some(rest)),
        None => (text, None),
    };
    Ok(Request::Build {
        action: action.parse()?,
        target: parse_target(rest)?,
    })
}

/// Target of a build command: absent for the solution, `!Name` or a bare pattern for a project
pub fn parse_target(text: Option<&str>) -> Result<TargetSelector> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(TargetSelector::Solution);
    };
    let name = match text.strip_prefix('!') {
        Some(name) => project_name(name)?,
        None => text.to_string(),
    };
    Ok(TargetSelector::Project(name))
}

/// `!Name:<file>` or a bare file spec searched across the tree
pub fn parse_file_lookup(text: &str) -> Result<FileLookup> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Usage("empty file name".into()));
    }

    let Some(body) = text.strip_prefix('!') else {
        return Ok(FileLookup {
            project: None,
            file: text.to_string(),
        });
    };
    let Some((name, file)) = body.split_once(':') else {
        return Err(Error::Usage(format!("expected !Name:<file>, got '{text}'")));
    };
    let file = file.trim();
    if file.is_empty() {
        return Err(Error::Usage(format!("'{text}' names no file")));
    }
    Ok(FileLookup {
        project: Some(project_name(name)?),
        file: file.to_string(),
    })
}

/// `!p1;!p2`; the leading `!` of each entry is optional
pub fn parse_startup_set(text: &str) -> Result<Vec<String>> {
    let patterns = text
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| project_name(p.strip_prefix('!').unwrap_or(p)))
        .collect::<Result<Vec<_>>>()?;

    if patterns.is_empty() {
        return Err(Error::Usage("empty startup project set".into()));
    }
    Ok(patterns)
}

fn project_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Usage("missing project name after '!'".into()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str) -> TargetSelector {
        TargetSelector::Project(name.to_string())
    }

    #[test]
    fn test_project_action() {
        assert_eq!(
            parse_request("!App:rebuild").unwrap(),
            Request::Build {
                action: BuildAction::Rebuild,
                target: project("App"),
            }
        );
    }

    #[test]
    fn test_project_file() {
        assert_eq!(
            parse_request(r"!App:C:\src\App\Program.cs").unwrap(),
            Request::OpenFile(FileLookup {
                project: Some("App".into()),
                file: r"C:\src\App\Program.cs".into(),
            })
        );
        assert_eq!(
            parse_request("!App:Models/User.cs").unwrap(),
            Request::OpenFile(FileLookup {
                project: Some("App".into()),
                file: "Models/User.cs".into(),
            })
        );
    }

    #[test]
    fn test_startup_set() {
        assert_eq!(
            parse_request("!Api; !Web*").unwrap(),
            Request::SetStartup(vec!["Api".into(), "Web*".into()])
        );
        assert_eq!(parse_request("!Api").unwrap(), Request::SetStartup(vec!["Api".into()]));
    }

    #[test]
    fn test_bare_action() {
        assert_eq!(
            parse_request("build").unwrap(),
            Request::Build {
                action: BuildAction::Build,
                target: TargetSelector::Solution,
            }
        );
        assert_eq!(
            parse_request("clean   Foo*").unwrap(),
            Request::Build {
                action: BuildAction::Clean,
                target: project("Foo*"),
            }
        );
    }

    #[test]
    fn test_malformed_selectors() {
        for text in ["", "!", "!:build", "!App:", "publish", "!;!", "build !"] {
            assert!(parse_request(text).unwrap_err().is_usage(), "{text:?}");
        }
    }

    #[test]
    fn test_file_lookup() {
        assert_eq!(
            parse_file_lookup("Program.cs").unwrap(),
            FileLookup {
                project: None,
                file: "Program.cs".into(),
            }
        );
        assert!(parse_file_lookup("!App").unwrap_err().is_usage());
        assert!(parse_file_lookup("!App: ").unwrap_err().is_usage());
    }
}
