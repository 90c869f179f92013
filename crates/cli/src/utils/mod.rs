pub mod backend;
pub mod config;

pub use backend::load_backend;
pub use config::load_config;
