use super::CommandContext;
use crate::display::print_info;

/// Exit code 1 when no host is running
pub fn info_command(ctx: &CommandContext) -> u8 {
    let result = ctx.controller.info();
    let running = matches!(&result, Ok(report) if report.running);
    let code = ctx.emit(&result, print_info);
    if running { code } else { 1 }
}
