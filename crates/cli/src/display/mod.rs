pub mod formatter;

pub use formatter::{
    print_build_report, print_configurations, print_document, print_error, print_file,
    print_info, print_instances, print_projects, print_solution, print_startup,
};
