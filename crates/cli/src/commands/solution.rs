use anyhow::{Context, Result};
use std::path::Path;

use super::CommandContext;
use crate::display::print_solution;

pub fn solution_show_command(ctx: &CommandContext) -> u8 {
    let result = ctx.controller.solution_show();
    ctx.emit(&result, print_solution)
}

pub fn solution_open_command(ctx: &CommandContext, path: &Path) -> Result<u8> {
    // the host resolves relative paths against its own working directory
    let path = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let result = ctx.controller.solution_open(&path);
    Ok(ctx.emit(&result, print_solution))
}

pub fn solution_close_command(ctx: &CommandContext, save: bool) -> u8 {
    let result = ctx.controller.solution_close(save);
    ctx.emit(&result, print_solution)
}
