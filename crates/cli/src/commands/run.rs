use hostpilot_core::controller::Response;
use hostpilot_core::grammar::parse_request;
use tracing::debug;

use super::CommandContext;
use crate::display::{print_build_report, print_file, print_startup};

/// Execute a raw selector: `!Name:action`, `!Name:<file>`, `!p1;!p2` or `action [pattern]`
pub fn run_command(ctx: &CommandContext, selector: &str) -> u8 {
    let result = parse_request(selector).and_then(|request| {
        debug!("Selector {:?} parsed as {:?}", selector, request);
        ctx.controller.run(&request)
    });
    let failed = matches!(&result, Ok(Response::Build(report)) if !report.succeeded());

    let code = ctx.emit(&result, |response| match response {
        Response::Build(report) => print_build_report(report),
        Response::File(candidate) => print_file(candidate),
        Response::Startup(report) => print_startup(report),
    });
    if failed { 1 } else { code }
}
