//! Package-set resolution: group expansion with exclusions, and install
//! diffs.
//!
//! Group membership is sourced fresh from the package manager at execute
//! time; the resolver itself is pure and owns no persistent state.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ResolveError;

/// Expands requested package-or-group names into concrete package names.
#[derive(Debug)]
pub struct PackageResolver {
    /// Group name → member names, as reported by the package manager.
    groups: BTreeMap<String, BTreeSet<String>>,
    /// Group name → member names excluded before recursion.
    excluded: BTreeMap<String, BTreeSet<String>>,
}

impl PackageResolver {
    /// Create a resolver over a freshly-queried group map and the configured
    /// per-group exclusions.
    pub fn new(
        groups: BTreeMap<String, BTreeSet<String>>,
        excluded: BTreeMap<String, BTreeSet<String>>,
    ) -> Self {
        Self { groups, excluded }
    }

    /// Resolve a set of requested names into concrete package names.
    ///
    /// A requested name that is a known group expands to its members minus
    /// that group's exclusions, recursively; exclusions are applied before
    /// recursion, so excluding a nested group removes its whole subtree. Any
    /// other name is taken as a concrete package. Cyclic group definitions
    /// fail with [`ResolveError::GroupCycle`].
    pub fn resolve(&self, requested: &BTreeSet<String>) -> Result<BTreeSet<String>, ResolveError> {
        let mut resolved = BTreeSet::new();
        let mut visiting = BTreeSet::new();
        for name in requested {
            self.resolve_name(name, &mut visiting, &mut resolved)?;
        }
        Ok(resolved)
    }

    fn resolve_name(
        &self,
        name: &str,
        visiting: &mut BTreeSet<String>,
        resolved: &mut BTreeSet<String>,
    ) -> Result<(), ResolveError> {
        let Some(members) = self.groups.get(name) else {
            resolved.insert(name.to_string());
            return Ok(());
        };
        if !visiting.insert(name.to_string()) {
            return Err(ResolveError::GroupCycle {
                group: name.to_string(),
            });
        }
        let excluded = self.excluded.get(name);
        for member in members {
            if excluded.is_some_and(|e| e.contains(member)) {
                continue;
            }
            self.resolve_name(member, visiting, resolved)?;
        }
        visiting.remove(name);
        Ok(())
    }
}

/// Install/uninstall actions needed to converge the installed set.
///
/// Both lists are lexicographically sorted for deterministic apply order and
/// readable diffs. Installs are applied before uninstalls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDiff {
    /// Packages in the target set but not currently explicitly installed.
    pub to_install: Vec<String>,
    /// Explicitly installed packages absent from the target set.
    pub to_uninstall: Vec<String>,
}

impl PackageDiff {
    /// Compute the diff between the resolved target set and the set of
    /// currently explicitly-installed packages.
    pub fn between(target: &BTreeSet<String>, installed: &BTreeSet<String>) -> Self {
        Self {
            to_install: target.difference(installed).cloned().collect(),
            to_uninstall: installed.difference(target).cloned().collect(),
        }
    }

    /// Whether there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.to_install.is_empty() && self.to_uninstall.is_empty()
    }
}
