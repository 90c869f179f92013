//! Host instance discovery
//!
//! Enumerates the live-object registry for automation-capable hosts and
//! picks the one the operator is most likely working in.

mod active;
mod scanner;

pub use active::{select_active, select_or_first};
pub use scanner::{parse_process_id, scan, HostInstance};
