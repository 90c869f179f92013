use hostpilot_core::grammar::parse_startup_set;

use super::CommandContext;
use crate::display::print_startup;

/// Show the startup projects, or replace them with `set` (`!p1;!p2`)
pub fn startup_command(ctx: &CommandContext, set: Option<&str>) -> u8 {
    let result = match set {
        Some(set) => parse_startup_set(set).and_then(|patterns| ctx.controller.set_startup(&patterns)),
        None => ctx.controller.startup(),
    };
    ctx.emit(&result, print_startup)
}
