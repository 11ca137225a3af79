//! File-set reconciliation: decide, confirm, write, remove.
//!
//! Given a desired set of (path → bytes), the [`Reconciler`] converges the
//! filesystem toward it with ledger-verified safety. The per-path decision
//! is a pure function ([`decide_write`]) separated from the side-effecting
//! confirmation and write steps, so the logic is testable without a
//! terminal.
//!
//! Ordering invariants:
//!
//! - Writes record the new hash in the ledger *before* the atomic write. A
//!   crash in between leaves a mismatch that re-prompts on the next run,
//!   instead of a write the tool has forgotten it made.
//! - Removals forget the ledger entry *after* the delete, so a crash
//!   mid-removal leaves the ledger still claiming the file and a future run
//!   re-attempts the cleanup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::fsutil;
use crate::state::{StateLedger, Verification};
use crate::ui::Ui;

/// Outcome decided for a single desired path, before any side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteDecision {
    /// On-disk content already matches the target.
    Converged,
    /// Fresh file, or ledger-verified content: write without asking.
    Write,
    /// On-disk content diverged from the ledger's expectation: ask first.
    ConfirmThenWrite {
        /// Why the write needs confirmation.
        reason: &'static str,
    },
}

/// Decide what to do for one desired path.
///
/// `current` is the hash of the file currently on disk (`None` when there is
/// no file) and `verification` is the ledger's verdict for that observed
/// hash.
pub fn decide_write(
    target: &str,
    current: Option<&str>,
    verification: &Verification,
) -> WriteDecision {
    if current == Some(target) {
        return WriteDecision::Converged;
    }
    match verification.drift_reason() {
        Some(reason) => WriteDecision::ConfirmThenWrite { reason },
        None => WriteDecision::Write,
    }
}

/// Counts of the actions one [`Reconciler::apply`] run performed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyStats {
    /// Files written (created or replaced).
    pub written: usize,
    /// Files removed.
    pub removed: usize,
    /// Paths skipped after drift was declined or could not be confirmed.
    pub skipped: usize,
}

/// Applies a desired file set against the filesystem and the ledger.
pub struct Reconciler<'a> {
    ledger: &'a StateLedger,
    ui: &'a dyn Ui,
    /// Change lines are displayed relative to this directory (usually home).
    root: &'a Path,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler over the given ledger and output sink.
    pub fn new(ledger: &'a StateLedger, ui: &'a dyn Ui, root: &'a Path) -> Self {
        Self { ledger, ui, root }
    }

    /// Converge the filesystem toward `desired`.
    ///
    /// Desired paths are processed in ascending order, then every
    /// ledger-tracked path absent from `desired` is removed (also
    /// ascending). Running twice with the same desired set and no external
    /// interference performs zero writes the second time.
    pub fn apply(&self, desired: &BTreeMap<PathBuf, Vec<u8>>) -> Result<ApplyStats> {
        let mut stats = ApplyStats::default();

        for (path, content) in desired {
            self.converge_file(path, content, &mut stats)
                .with_context(|| format!("converging {}", path.display()))?;
        }

        for known in self.ledger.known_paths()? {
            let path = PathBuf::from(&known);
            if !desired.contains_key(&path) {
                self.remove_file(&path, &mut stats)
                    .with_context(|| format!("removing {known}"))?;
            }
        }

        Ok(stats)
    }

    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn converge_file(
        &self,
        path: &Path,
        content: &[u8],
        stats: &mut ApplyStats,
    ) -> Result<()> {
        let target_hash = fsutil::hash_bytes(content);
        let current_hash = fsutil::hash_file(path)?;
        let verification = self.ledger.verify(path, current_hash.as_deref())?;
        let decision = decide_write(&target_hash, current_hash.as_deref(), &verification);

        match decision {
            WriteDecision::Converged => return Ok(()),
            WriteDecision::Write => {
                if current_hash.is_none() {
                    self.ui.created(&self.display_path(path));
                } else {
                    self.ui.changed(&self.display_path(path));
                }
            }
            WriteDecision::ConfirmThenWrite { reason } => {
                self.ui.changed(&self.display_path(path));
                self.ui.drift(&self.display_path(path), reason);
                if !self.confirm_overwrite(path, content) {
                    stats.skipped += 1;
                    return Ok(());
                }
            }
        }

        // Better to remember a file with a stale hash than to forget a file
        // we wrote: the ledger entry goes in before the write.
        self.ledger.record(path, &target_hash)?;
        fsutil::atomic_write(path, content)?;
        stats.written += 1;
        Ok(())
    }

    /// Show a diff and ask before overwriting drifted content. Content that
    /// cannot be decoded as UTF-8 cannot be confirmed and is declined.
    fn confirm_overwrite(&self, path: &Path, content: &[u8]) -> bool {
        let Ok(new_text) = std::str::from_utf8(content) else {
            return false;
        };
        let Ok(old_text) = std::fs::read_to_string(path) else {
            return false;
        };
        self.ui.diff(&old_text, new_text);
        self.ui.confirm("Replace file contents?", false)
    }

    fn remove_file(&self, path: &Path, stats: &mut ApplyStats) -> Result<()> {
        self.ui.removed(&self.display_path(path));

        let current_hash = fsutil::hash_file(path)?;
        let verification = self.ledger.verify(path, current_hash.as_deref())?;
        if let Some(reason) = verification.drift_reason() {
            self.ui.drift(&self.display_path(path), reason);
            if !self.ui.confirm("Remove file anyway?", false) {
                stats.skipped += 1;
                return Ok(());
            }
        }

        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fsutil::prune_empty_dirs(path);

        // Forget only after the delete: a crash in between leaves the ledger
        // still claiming the file, and a future run re-attempts the cleanup.
        self.ledger.forget(path)?;
        stats.removed += 1;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ui::test_helpers::ScriptedUi;

    struct Fixture {
        dir: tempfile::TempDir,
        ledger: StateLedger,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let ledger = StateLedger::new(dir.path().join("state/files.json"));
            Self { dir, ledger }
        }

        fn home(&self) -> PathBuf {
            self.dir.path().join("home")
        }

        fn desired(&self, entries: &[(&str, &str)]) -> BTreeMap<PathBuf, Vec<u8>> {
            entries
                .iter()
                .map(|(p, c)| (self.home().join(p), c.as_bytes().to_vec()))
                .collect()
        }

        fn apply(&self, ui: &ScriptedUi, desired: &BTreeMap<PathBuf, Vec<u8>>) -> ApplyStats {
            let home = self.home();
            Reconciler::new(&self.ledger, ui, &home)
                .apply(desired)
                .unwrap()
        }
    }

    // -----------------------------------------------------------------------
    // decide_write
    // -----------------------------------------------------------------------

    #[test]
    fn decide_converged_when_hashes_match() {
        let d = decide_write("sha256-a", Some("sha256-a"), &Verification::Ok);
        assert_eq!(d, WriteDecision::Converged);
    }

    #[test]
    fn decide_write_for_fresh_file() {
        let d = decide_write("sha256-a", None, &Verification::NoFile);
        assert_eq!(d, WriteDecision::Write);
    }

    #[test]
    fn decide_write_when_ledger_confirms() {
        let d = decide_write("sha256-a", Some("sha256-b"), &Verification::Ok);
        assert_eq!(d, WriteDecision::Write);
    }

    #[test]
    fn decide_confirm_for_unknown_file() {
        let d = decide_write("sha256-a", Some("sha256-b"), &Verification::Unknown);
        assert!(matches!(d, WriteDecision::ConfirmThenWrite { .. }));
    }

    #[test]
    fn decide_confirm_for_mismatched_file() {
        let d = decide_write("sha256-a", Some("sha256-b"), &Verification::Mismatch);
        assert!(matches!(d, WriteDecision::ConfirmThenWrite { .. }));
    }

    // -----------------------------------------------------------------------
    // apply: writes
    // -----------------------------------------------------------------------

    #[test]
    fn writes_fresh_files_and_reports_created() {
        let f = Fixture::new();
        let ui = ScriptedUi::new();
        let desired = f.desired(&[(".vimrc", "set nocompatible\n")]);

        let stats = f.apply(&ui, &desired);

        assert_eq!(stats.written, 1);
        assert_eq!(
            std::fs::read_to_string(f.home().join(".vimrc")).unwrap(),
            "set nocompatible\n"
        );
        assert_eq!(ui.events_of("created"), vec![".vimrc"]);
    }

    #[test]
    fn second_apply_performs_zero_writes() {
        let f = Fixture::new();
        let desired = f.desired(&[(".vimrc", "a\n"), (".config/app/conf", "b\n")]);

        let first = f.apply(&ScriptedUi::new(), &desired);
        assert_eq!(first.written, 2);

        let second = f.apply(&ScriptedUi::new(), &desired);
        assert_eq!(second, ApplyStats::default());
    }

    #[test]
    fn rewrites_tracked_file_when_target_changes() {
        let f = Fixture::new();
        let desired = f.desired(&[(".vimrc", "old\n")]);
        f.apply(&ScriptedUi::new(), &desired);

        let ui = ScriptedUi::new();
        let desired = f.desired(&[(".vimrc", "new\n")]);
        let stats = f.apply(&ui, &desired);

        assert_eq!(stats.written, 1);
        assert_eq!(ui.events_of("changed"), vec![".vimrc"]);
        assert_eq!(
            std::fs::read_to_string(f.home().join(".vimrc")).unwrap(),
            "new\n"
        );
    }

    #[test]
    fn externally_matching_file_is_left_alone() {
        let f = Fixture::new();
        std::fs::create_dir_all(f.home()).unwrap();
        std::fs::write(f.home().join(".vimrc"), "same\n").unwrap();

        let ui = ScriptedUi::new();
        let stats = f.apply(&ui, &f.desired(&[(".vimrc", "same\n")]));

        assert_eq!(stats, ApplyStats::default());
        assert!(ui.events().is_empty(), "converged paths emit nothing");
    }

    // -----------------------------------------------------------------------
    // apply: drift
    // -----------------------------------------------------------------------

    #[test]
    fn drifted_file_skipped_on_decline() {
        let f = Fixture::new();
        f.apply(&ScriptedUi::new(), &f.desired(&[(".vimrc", "mine\n")]));
        // An external actor edits the managed file between runs.
        std::fs::write(f.home().join(".vimrc"), "theirs\n").unwrap();

        let ui = ScriptedUi::new(); // no scripted answers: confirm declines
        let stats = f.apply(&ui, &f.desired(&[(".vimrc", "mine\n")]));

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.written, 0);
        assert_eq!(
            std::fs::read_to_string(f.home().join(".vimrc")).unwrap(),
            "theirs\n",
            "declined drift leaves the file untouched"
        );
        assert_eq!(ui.events_of("drift").len(), 1);
    }

    #[test]
    fn drifted_file_overwritten_on_confirm() {
        let f = Fixture::new();
        f.apply(&ScriptedUi::new(), &f.desired(&[(".vimrc", "mine\n")]));
        std::fs::write(f.home().join(".vimrc"), "theirs\n").unwrap();

        let ui = ScriptedUi::with_answers(vec![true]);
        let stats = f.apply(&ui, &f.desired(&[(".vimrc", "mine\n")]));

        assert_eq!(stats.written, 1);
        assert_eq!(
            std::fs::read_to_string(f.home().join(".vimrc")).unwrap(),
            "mine\n"
        );
        assert!(ui.events().contains(&"diff".to_string()), "diff shown before prompt");
    }

    #[test]
    fn untracked_existing_file_requires_confirmation() {
        let f = Fixture::new();
        std::fs::create_dir_all(f.home()).unwrap();
        std::fs::write(f.home().join(".vimrc"), "preexisting\n").unwrap();

        let ui = ScriptedUi::new();
        let stats = f.apply(&ui, &f.desired(&[(".vimrc", "mine\n")]));

        assert_eq!(stats.skipped, 1);
        assert_eq!(
            std::fs::read_to_string(f.home().join(".vimrc")).unwrap(),
            "preexisting\n"
        );
    }

    #[test]
    fn binary_drift_cannot_be_confirmed() {
        let f = Fixture::new();
        std::fs::create_dir_all(f.home()).unwrap();
        std::fs::write(f.home().join("blob"), b"\xff\xfe\x00old").unwrap();

        // Answer would be yes, but non-UTF-8 content cannot be diffed, so the
        // prompt is never offered and the path is skipped.
        let ui = ScriptedUi::with_answers(vec![true]);
        let desired: BTreeMap<PathBuf, Vec<u8>> =
            [(f.home().join("blob"), b"\xff\xfe\x00new".to_vec())]
                .into_iter()
                .collect();
        let home = f.home();
        let stats = Reconciler::new(&f.ledger, &ui, &home).apply(&desired).unwrap();

        assert_eq!(stats.skipped, 1);
        assert!(!ui.events().iter().any(|e| e.starts_with("confirm")));
    }

    #[test]
    fn crash_between_record_and_write_reprompts() {
        let f = Fixture::new();
        f.apply(&ScriptedUi::new(), &f.desired(&[(".vimrc", "v1\n")]));

        // Simulate a crash after the ledger update but before the rename:
        // the ledger already holds the v2 hash while the file still has v1.
        let target = f.home().join(".vimrc");
        f.ledger
            .record(&target, &fsutil::hash_bytes(b"v2\n"))
            .unwrap();

        let ui = ScriptedUi::new();
        let stats = f.apply(&ui, &f.desired(&[(".vimrc", "v2\n")]));

        assert_eq!(stats.skipped, 1, "mismatch must re-prompt, not silently write");
        assert_eq!(ui.events_of("drift").len(), 1);
    }

    // -----------------------------------------------------------------------
    // apply: removals
    // -----------------------------------------------------------------------

    #[test]
    fn removes_files_dropped_from_desired_set() {
        let f = Fixture::new();
        f.apply(
            &ScriptedUi::new(),
            &f.desired(&[(".vimrc", "a\n"), (".bashrc", "b\n")]),
        );

        let ui = ScriptedUi::new();
        let stats = f.apply(&ui, &f.desired(&[(".vimrc", "a\n")]));

        assert_eq!(stats.removed, 1);
        assert!(!f.home().join(".bashrc").exists());
        assert!(f.home().join(".vimrc").exists());
        assert!(f.ledger.known_paths().unwrap().iter().all(|p| !p.ends_with(".bashrc")));
    }

    #[test]
    fn removal_prunes_empty_directory_chain() {
        let f = Fixture::new();
        f.apply(
            &ScriptedUi::new(),
            &f.desired(&[(".config/deep/nested/conf", "x\n"), (".vimrc", "a\n")]),
        );

        let stats = f.apply(&ScriptedUi::new(), &f.desired(&[(".vimrc", "a\n")]));

        assert_eq!(stats.removed, 1);
        assert!(
            !f.home().join(".config").exists(),
            "now-empty ancestors are pruned"
        );
        assert!(f.home().exists(), "non-empty root survives");
    }

    #[test]
    fn removal_stops_pruning_at_nonempty_directory() {
        let f = Fixture::new();
        f.apply(
            &ScriptedUi::new(),
            &f.desired(&[(".config/app/conf", "x\n"), (".config/other", "y\n")]),
        );

        f.apply(&ScriptedUi::new(), &f.desired(&[(".config/other", "y\n")]));

        assert!(!f.home().join(".config/app").exists());
        assert!(f.home().join(".config/other").exists());
    }

    #[test]
    fn drifted_removal_skipped_on_decline() {
        let f = Fixture::new();
        f.apply(&ScriptedUi::new(), &f.desired(&[(".bashrc", "b\n")]));
        std::fs::write(f.home().join(".bashrc"), "edited\n").unwrap();

        let ui = ScriptedUi::new();
        let stats = f.apply(&ui, &BTreeMap::new());

        assert_eq!(stats.skipped, 1);
        assert!(f.home().join(".bashrc").exists(), "drifted file is kept");
        assert!(
            !f.ledger.known_paths().unwrap().is_empty(),
            "ledger keeps claiming the file so a future run retries"
        );
    }

    #[test]
    fn drifted_removal_proceeds_on_confirm() {
        let f = Fixture::new();
        f.apply(&ScriptedUi::new(), &f.desired(&[(".bashrc", "b\n")]));
        std::fs::write(f.home().join(".bashrc"), "edited\n").unwrap();

        let ui = ScriptedUi::with_answers(vec![true]);
        let stats = f.apply(&ui, &BTreeMap::new());

        assert_eq!(stats.removed, 1);
        assert!(!f.home().join(".bashrc").exists());
    }

    #[test]
    fn missing_tracked_file_is_forgotten_without_fuss() {
        let f = Fixture::new();
        f.apply(&ScriptedUi::new(), &f.desired(&[(".bashrc", "b\n")]));
        std::fs::remove_file(f.home().join(".bashrc")).unwrap();

        let stats = f.apply(&ScriptedUi::new(), &BTreeMap::new());

        assert_eq!(stats.removed, 1);
        assert!(f.ledger.known_paths().unwrap().is_empty());
    }

    #[test]
    fn paths_processed_in_ascending_order() {
        let f = Fixture::new();
        let ui = ScriptedUi::new();
        f.apply(&ui, &f.desired(&[("b", "2\n"), ("a", "1\n"), ("c", "3\n")]));
        assert_eq!(ui.events_of("created"), vec!["a", "b", "c"]);
    }
}
