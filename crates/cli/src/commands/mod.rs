pub mod build;
pub mod context;
pub mod document;
pub mod file;
pub mod info;
pub mod init;
pub mod list;
pub mod run;
pub mod solution;
pub mod startup;

pub use build::build_command;
pub use context::CommandContext;
pub use document::{doc_get_command, doc_save_command, doc_set_command};
pub use file::{find_command, open_command};
pub use info::info_command;
pub use init::init_command;
pub use list::{list_configs_command, list_instances_command, list_projects_command};
pub use run::run_command;
pub use solution::{solution_close_command, solution_open_command, solution_show_command};
pub use startup::startup_command;
