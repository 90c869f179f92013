use anyhow::{Context, Result};
use hostpilot_core::grammar::parse_file_lookup;
use std::io;

use super::CommandContext;
use crate::display::print_document;

pub fn doc_get_command(ctx: &CommandContext, file: &str) -> u8 {
    let result = parse_file_lookup(file).and_then(|lookup| ctx.controller.document_text(&lookup));
    ctx.emit(&result, print_document)
}

/// Replace the document text with stdin; the host keeps the edit unsaved
pub fn doc_set_command(ctx: &CommandContext, file: &str) -> Result<u8> {
    let lookup = match parse_file_lookup(file) {
        Ok(lookup) => lookup,
        Err(e) => return Ok(ctx.emit::<()>(&Err(e), |_| {})),
    };
    let text = io::read_to_string(io::stdin()).context("Failed to read document text from stdin")?;
    let result = ctx.controller.document_set_text(&lookup, &text);
    Ok(ctx.emit(&result, print_document))
}

pub fn doc_save_command(ctx: &CommandContext, file: &str) -> u8 {
    let result = parse_file_lookup(file).and_then(|lookup| ctx.controller.document_save(&lookup));
    ctx.emit(&result, print_document)
}
