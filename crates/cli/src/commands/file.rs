use hostpilot_core::grammar::parse_file_lookup;

use super::CommandContext;
use crate::display::print_file;

/// Open `file` (`!Name:<file>` or a spec searched across the tree) in the host
pub fn open_command(ctx: &CommandContext, file: &str) -> u8 {
    let result = parse_file_lookup(file).and_then(|lookup| ctx.controller.open_file(&lookup));
    ctx.emit(&result, print_file)
}

/// Print where `file` resolves to without opening it
pub fn find_command(ctx: &CommandContext, file: &str) -> u8 {
    let result = parse_file_lookup(file).and_then(|lookup| ctx.controller.find_file(&lookup));
    ctx.emit(&result, print_file)
}
