pub mod cli;
pub mod commands;
pub mod display;
pub mod utils;

pub use cli::{Cli, Commands};
