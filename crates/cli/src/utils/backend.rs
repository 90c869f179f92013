use anyhow::{Context, Result};
use hostpilot_core::Backend;
use hostpilot_core::backend::fixture::FixtureHost;
use std::path::Path;
use tracing::debug;

/// Backend replaying `fixture`, or the platform's own
pub fn load_backend(fixture: Option<&Path>) -> Result<Backend> {
    match fixture {
        Some(path) => {
            debug!("Replaying host snapshot {}", path.display());
            let host = FixtureHost::load(path)
                .with_context(|| format!("Failed to load host snapshot {}", path.display()))?;
            Ok(host.backend())
        }
        None => Backend::platform().context("Failed to initialize the automation backend"),
    }
}
