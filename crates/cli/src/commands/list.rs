use super::CommandContext;
use crate::display::{print_configurations, print_instances, print_projects};

pub fn list_instances_command(ctx: &CommandContext) -> u8 {
    let result = ctx.controller.list_instances();
    ctx.emit(&result, |instances| print_instances(instances))
}

pub fn list_projects_command(ctx: &CommandContext, pattern: Option<&str>) -> u8 {
    let result = ctx.controller.list_projects(pattern);
    ctx.emit(&result, |projects| print_projects(projects))
}

pub fn list_configs_command(ctx: &CommandContext) -> u8 {
    let result = ctx.controller.list_configurations();
    ctx.emit(&result, print_configurations)
}
