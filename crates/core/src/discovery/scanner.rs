use crate::interfaces::{HostApp, ObjectRegistry};
use std::fmt;
use tracing::{debug, warn};

/// A live host process found in the registry
///
/// Dropping the instance releases the automation handle.
pub struct HostInstance {
    pub registry_key: String,
    pub handle: Box<dyn HostApp>,
    pub process_id: Option<u32>,
}

impl fmt::Debug for HostInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostInstance")
            .field("registry_key", &self.registry_key)
            .field("process_id", &self.process_id)
            .finish_non_exhaustive()
    }
}

/// Enumerate registry entries whose name starts with `prefix` and bind them
///
/// Entries withdrawn while enumerating are skipped. An unavailable registry
/// or no running host both yield an empty list.
pub fn scan(registry: &dyn ObjectRegistry, prefix: &str) -> Vec<HostInstance> {
    let entries = match registry.enumerate() {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Could not enumerate the object registry: {}", e);
            return Vec::new();
        }
    };

    let mut instances = Vec::new();
    for entry in entries {
        let Ok(key) = entry.display_name() else {
            continue;
        };
        if !key.starts_with(prefix) {
            continue;
        }

        match entry.bind() {
            Ok(handle) => {
                let process_id = parse_process_id(&key);
                debug!("Bound {} (pid {:?})", key, process_id);
                instances.push(HostInstance {
                    registry_key: key,
                    handle,
                    process_id,
                });
            }
            Err(e) => debug!("Skipping {}: {}", key, e),
        }
    }

    instances
}

/// Process id from the `:<digits>` suffix of a registry key
pub fn parse_process_id(registry_key: &str) -> Option<u32> {
    let (_, suffix) = registry_key.rsplit_once(':')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fixture::FixtureHost;

    const TWO_HOSTS: &str = r#"{
        "entries": [
            { "key": "!VisualStudio.DTE.17.0:100" },
            { "key": "!SomethingElse:7" },
            { "key": "!VisualStudio.DTE.17.0:200", "bind_error": "object withdrawn" },
            { "key": "!VisualStudio.DTE.16.0" }
        ]
    }"#;

    #[test]
    fn test_parse_process_id() {
        assert_eq!(parse_process_id("!VisualStudio.DTE.17.0:4242"), Some(4242));
        assert_eq!(parse_process_id("!VisualStudio.DTE.17.0"), None);
        assert_eq!(parse_process_id("!VisualStudio.DTE.17.0:"), None);
        assert_eq!(parse_process_id("!VisualStudio.DTE.17.0:12ab"), None);
    }

    #[test]
    fn test_scan_filters_prefix_and_skips_withdrawn() {
        let host = FixtureHost::from_json(TWO_HOSTS).unwrap();
        let backend = host.backend();
        let instances = scan(backend.registry(), "!VisualStudio.DTE");

        let keys: Vec<_> = instances.iter().map(|i| i.registry_key.as_str()).collect();
        assert_eq!(keys, vec!["!VisualStudio.DTE.17.0:100", "!VisualStudio.DTE.16.0"]);
        assert_eq!(instances[0].process_id, Some(100));
        assert_eq!(instances[1].process_id, None);
    }

    #[test]
    fn test_scan_without_hosts_is_empty() {
        let host = FixtureHost::from_json("{}").unwrap();
        let backend = host.backend();
        assert!(scan(backend.registry(), "!VisualStudio.DTE").is_empty());
    }

    #[test]
    fn test_scan_with_unavailable_registry_is_empty() {
        let host = FixtureHost::from_json(r#"{ "registry_error": "access denied" }"#).unwrap();
        let backend = host.backend();
        assert!(scan(backend.registry(), "!VisualStudio.DTE").is_empty());
    }
}
