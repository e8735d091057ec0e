//! Detection of containers created before the current label scheme.
//!
//! Older releases labeled containers with `manager=apx` only; current ones
//! also carry `apx.managed=true`. The scanner reports the difference so a
//! separate operation can migrate them. Nothing is migrated here.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::runtime::{ContainerRuntime, LABEL_MANAGED, LABEL_MANAGER, MANAGER_ID};

/// Finds containers that predate the `apx.managed` label.
///
/// The result is memoized for the lifetime of the scanner value; construct
/// a fresh scanner to force re-evaluation. The cache is deliberately not
/// process-wide.
pub struct LegacyScanner<'a> {
    runtime: &'a ContainerRuntime,
    rootful: bool,
    cache: Option<BTreeSet<String>>,
}

impl<'a> LegacyScanner<'a> {
    pub fn new(runtime: &'a ContainerRuntime, rootful: bool) -> Self {
        Self {
            runtime,
            rootful,
            cache: None,
        }
    }

    /// IDs of containers carrying the old label but not the new marker.
    pub fn find_legacy_containers(&mut self) -> Result<BTreeSet<String>> {
        if let Some(cached) = &self.cache {
            return Ok(cached.clone());
        }

        let old: BTreeSet<String> = self
            .runtime
            .container_ids(&format!("label={LABEL_MANAGER}={MANAGER_ID}"), self.rootful)?
            .into_iter()
            .collect();
        let new: BTreeSet<String> = self
            .runtime
            .container_ids(&format!("label={LABEL_MANAGED}=true"), self.rootful)?
            .into_iter()
            .collect();

        let legacy: BTreeSet<String> = old.difference(&new).cloned().collect();
        self.cache = Some(legacy.clone());
        Ok(legacy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_runner::mock::MockCommandRunner;
    use crate::runtime::Engine;
    use std::sync::Arc;

    fn runtime_with(mock: Arc<MockCommandRunner>) -> ContainerRuntime {
        ContainerRuntime::with_engine(Engine::Podman, mock, None, false)
    }

    #[test]
    fn legacy_set_is_old_minus_new() {
        let mock = Arc::new(MockCommandRunner::new());
        // A: old label only. B: both labels. C: new label only.
        mock.respond("podman", "label=manager=apx", "A\nB\n");
        mock.respond("podman", "label=apx.managed=true", "B\nC\n");
        let runtime = runtime_with(mock);

        let mut scanner = LegacyScanner::new(&runtime, false);
        let legacy = scanner.find_legacy_containers().unwrap();
        assert_eq!(legacy, BTreeSet::from(["A".to_string()]));
    }

    #[test]
    fn no_legacy_containers_yields_empty_set() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.respond("podman", "label=manager=apx", "B\n");
        mock.respond("podman", "label=apx.managed=true", "B\n");
        let runtime = runtime_with(mock);

        let mut scanner = LegacyScanner::new(&runtime, false);
        assert!(scanner.find_legacy_containers().unwrap().is_empty());
    }

    #[test]
    fn result_is_memoized_per_scanner() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.respond("podman", "label=manager=apx", "A\n");
        let runtime = runtime_with(mock.clone());

        let mut scanner = LegacyScanner::new(&runtime, false);
        let first = scanner.find_legacy_containers().unwrap();
        let calls_after_first = mock.call_count();
        let second = scanner.find_legacy_containers().unwrap();

        assert_eq!(first, second);
        assert_eq!(mock.call_count(), calls_after_first, "no re-query");
    }

    #[test]
    fn fresh_scanner_re_evaluates() {
        let mock = Arc::new(MockCommandRunner::new());
        mock.respond("podman", "label=manager=apx", "A\n");
        let runtime = runtime_with(mock.clone());

        let mut first = LegacyScanner::new(&runtime, false);
        first.find_legacy_containers().unwrap();
        let calls = mock.call_count();

        let mut second = LegacyScanner::new(&runtime, false);
        second.find_legacy_containers().unwrap();
        assert_eq!(mock.call_count(), calls * 2);
    }
}
