use super::HostInstance;
use crate::interfaces::WindowFocus;
use tracing::debug;

/// Index of the instance whose process owns the foreground window
///
/// `None` when no window information is available or no instance matches.
/// Instances sharing a process id resolve to the first discovered.
pub fn select_active(instances: &[HostInstance], focus: &dyn WindowFocus) -> Option<usize> {
    let foreground = focus.foreground_process_id()?;
    debug!("Foreground window owned by pid {}", foreground);
    instances
        .iter()
        .position(|instance| instance.process_id == Some(foreground))
}

/// Foreground instance, or the first discovered one
pub fn select_or_first(instances: &[HostInstance], focus: &dyn WindowFocus) -> Option<usize> {
    if instances.is_empty() {
        return None;
    }
    Some(select_active(instances, focus).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fixture::FixtureHost;
    use crate::discovery::scan;

    fn fixture(foreground: &str) -> FixtureHost {
        FixtureHost::from_json(&format!(
            r#"{{
                "foreground_pid": {foreground},
                "entries": [
                    {{ "key": "!VisualStudio.DTE.17.0:100" }},
                    {{ "key": "!VisualStudio.DTE.17.0:200" }}
                ]
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_foreground_second_process_selects_index_one() {
        let host = fixture("200");
        let backend = host.backend();
        let instances = scan(backend.registry(), "!VisualStudio.DTE");
        assert_eq!(select_active(&instances, backend.focus()), Some(1));
    }

    #[test]
    fn test_no_foreground_match() {
        let host = fixture("999");
        let backend = host.backend();
        let instances = scan(backend.registry(), "!VisualStudio.DTE");
        assert_eq!(select_active(&instances, backend.focus()), None);
        assert_eq!(select_or_first(&instances, backend.focus()), Some(0));
    }

    #[test]
    fn test_no_window_information() {
        let host = fixture("null");
        let backend = host.backend();
        let instances = scan(backend.registry(), "!VisualStudio.DTE");
        assert_eq!(select_active(&instances, backend.focus()), None);
        assert_eq!(select_or_first(&[], backend.focus()), None);
    }
}
