use hostpilot_core::BuildAction;
use hostpilot_core::grammar::parse_target;
use tracing::debug;

use super::CommandContext;
use crate::display::print_build_report;

/// Exit code 1 when the host reports failed projects
pub fn build_command(
    ctx: &CommandContext,
    action: BuildAction,
    target: Option<&str>,
    configuration: Option<&str>,
) -> u8 {
    let target = match parse_target(target) {
        Ok(target) => target,
        Err(e) => return ctx.emit::<()>(&Err(e), |_| {}),
    };
    debug!("{} {:?} configuration={:?}", action, target, configuration);

    let result = ctx.controller.build(action, &target, configuration);
    let failed = matches!(&result, Ok(report) if !report.succeeded());
    let code = ctx.emit(&result, print_build_report);
    if failed {
        if !ctx.json {
            eprintln!("❌ Build finished with failed projects");
        }
        1
    } else {
        code
    }
}
