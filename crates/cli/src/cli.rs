use anyhow::Result;
use clap::{Parser, Subcommand};
use hostpilot_core::BuildAction;
use std::path::PathBuf;

use crate::commands::{
    CommandContext, build_command, doc_get_command, doc_save_command, doc_set_command,
    find_command, info_command, init_command, list_configs_command, list_instances_command,
    list_projects_command, open_command, run_command, solution_close_command,
    solution_open_command, solution_show_command, startup_command,
};

/// Drive a running development host from the command line
#[derive(Parser, Debug)]
#[command(name = "hostpilot")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print a JSON result object instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (defaults to the nearest .hostpilot.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Process id of the host instance to drive
    #[arg(long, global = true, value_name = "PID")]
    pub instance: Option<u32>,

    /// Serve host calls from a JSON snapshot instead of a live host
    #[arg(long, global = true, value_name = "PATH", hide = true)]
    pub fixture: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the selected host, its solution and build state
    #[command(visible_alias = "i")]
    Info,
    /// List instances, projects or configurations
    #[command(visible_alias = "ls")]
    List {
        #[command(subcommand)]
        what: ListCommand,
    },
    /// Build the solution or a project (e.g. `build Foo*`)
    Build {
        /// Project pattern; the whole solution when omitted
        target: Option<String>,

        /// Solution configuration to activate first (e.g. Release or "Release|x64")
        #[arg(short, long)]
        configuration: Option<String>,
    },
    /// Rebuild the solution or a project
    Rebuild {
        target: Option<String>,

        #[arg(short, long)]
        configuration: Option<String>,
    },
    /// Clean the solution or a project
    Clean {
        target: Option<String>,

        #[arg(short, long)]
        configuration: Option<String>,
    },
    /// Deploy a project
    Deploy {
        /// Project pattern
        target: String,

        #[arg(short, long)]
        configuration: Option<String>,
    },
    /// Show the startup projects, or set them with `!p1;!p2`
    Startup {
        set: Option<String>,
    },
    /// Open a file in the host (`!Project:path` or a path searched across the solution)
    #[command(visible_alias = "o")]
    Open {
        file: String,
    },
    /// Print where a file resolves to without opening it
    Find {
        file: String,
    },
    /// Show, open or close the solution
    Solution {
        #[command(subcommand)]
        action: SolutionCommand,
    },
    /// Read, replace or save the text of a document
    Doc {
        #[command(subcommand)]
        action: DocCommand,
    },
    /// Run a raw selector (`!Name:build`, `!Name:file.cs`, `!a;!b`, `rebuild Foo*`)
    #[command(visible_alias = "r")]
    Run {
        #[arg(required = true, num_args = 1..)]
        selector: Vec<String>,
    },
    /// Write a default .hostpilot.json
    Init {
        /// Custom working directory (defaults to current directory)
        #[arg(long = "cwd")]
        cwd: Option<PathBuf>,

        /// Force overwrite existing configuration file
        #[arg(short = 'f', long = "force")]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    /// Running host instances
    Instances,
    /// Projects of the open solution, depth first
    Projects {
        /// Only projects matching this pattern
        pattern: Option<String>,
    },
    /// Solution configurations
    Configs,
}

#[derive(Subcommand, Debug)]
pub enum SolutionCommand {
    Show,
    Open {
        path: PathBuf,
    },
    Close {
        /// Save changes before closing
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DocCommand {
    /// Print the document text
    Get { file: String },
    /// Replace the document text with stdin, without saving
    Set { file: String },
    Save { file: String },
}

impl Cli {
    /// Execute the command and return the process exit code
    pub fn execute(self) -> Result<u8> {
        let Cli {
            command,
            json,
            config,
            instance,
            fixture,
            verbose: _,
        } = self;

        if let Commands::Init { cwd, force } = &command {
            return init_command(cwd.as_deref(), *force);
        }

        let ctx = CommandContext::new(config.as_deref(), fixture.as_deref(), instance, json)?;
        let code = match command {
            Commands::Info => info_command(&ctx),
            Commands::List { what } => match what {
                ListCommand::Instances => list_instances_command(&ctx),
                ListCommand::Projects { pattern } => list_projects_command(&ctx, pattern.as_deref()),
                ListCommand::Configs => list_configs_command(&ctx),
            },
            Commands::Build { target, configuration } => build_command(
                &ctx,
                BuildAction::Build,
                target.as_deref(),
                configuration.as_deref(),
            ),
            Commands::Rebuild { target, configuration } => build_command(
                &ctx,
                BuildAction::Rebuild,
                target.as_deref(),
                configuration.as_deref(),
            ),
            Commands::Clean { target, configuration } => build_command(
                &ctx,
                BuildAction::Clean,
                target.as_deref(),
                configuration.as_deref(),
            ),
            Commands::Deploy { target, configuration } => build_command(
                &ctx,
                BuildAction::Deploy,
                Some(target.as_str()),
                configuration.as_deref(),
            ),
            Commands::Startup { set } => startup_command(&ctx, set.as_deref()),
            Commands::Open { file } => open_command(&ctx, &file),
            Commands::Find { file } => find_command(&ctx, &file),
            Commands::Solution { action } => match action {
                SolutionCommand::Show => solution_show_command(&ctx),
                SolutionCommand::Open { path } => solution_open_command(&ctx, &path)?,
                SolutionCommand::Close { save } => solution_close_command(&ctx, save),
            },
            Commands::Doc { action } => match action {
                DocCommand::Get { file } => doc_get_command(&ctx, &file),
                DocCommand::Set { file } => doc_set_command(&ctx, &file)?,
                DocCommand::Save { file } => doc_save_command(&ctx, &file),
            },
            Commands::Run { selector } => run_command(&ctx, &selector.join(" ")),
            Commands::Init { .. } => 0,
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_with_configuration() {
        let cli = Cli::try_parse_from(["hostpilot", "build", "Foo*", "-c", "Release", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Build { target, configuration } => {
                assert_eq!(target.as_deref(), Some("Foo*"));
                assert_eq!(configuration.as_deref(), Some("Release"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_run_joins_selector_words() {
        let cli = Cli::try_parse_from(["hostpilot", "r", "rebuild", "Foo*"]).unwrap();
        match cli.command {
            Commands::Run { selector } => assert_eq!(selector.join(" "), "rebuild Foo*"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_deploy_requires_target() {
        assert!(Cli::try_parse_from(["hostpilot", "deploy"]).is_err());
    }
}
