use anyhow::Result;
use hostpilot_core::{CommandOutcome, Controller};
use serde::Serialize;
use std::path::Path;

use crate::display::print_error;
use crate::utils::{load_backend, load_config};

/// Everything a command needs: the controller and the output mode
pub struct CommandContext {
    pub controller: Controller,
    pub json: bool,
}

impl CommandContext {
    pub fn new(
        config: Option<&Path>,
        fixture: Option<&Path>,
        instance: Option<u32>,
        json: bool,
    ) -> Result<Self> {
        let config = load_config(config)?;
        let backend = load_backend(fixture)?;
        Ok(Self {
            controller: Controller::new(backend, config).with_instance(instance),
            json,
        })
    }

    /// Print `result` to stdout (or the error to stderr) and return the exit code
    pub fn emit<T: Serialize>(
        &self,
        result: &hostpilot_core::Result<T>,
        render: impl FnOnce(&T),
    ) -> u8 {
        if self.json {
            let outcome = CommandOutcome::from_result(result);
            match serde_json::to_string_pretty(&outcome) {
                Ok(text) => println!("{text}"),
                Err(e) => eprintln!("❌ Failed to serialize result: {e}"),
            }
            return outcome.exit_code() as u8;
        }

        match result {
            Ok(value) => {
                render(value);
                0
            }
            Err(e) => {
                print_error(e);
                1
            }
        }
    }
}
