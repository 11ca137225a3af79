//! Managed-file module: stages desired files, applies them through the
//! reconciler.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::content::Content;
use crate::context::RunContext;
use crate::orchestrator::Module;
use crate::reconcile::Reconciler;
use crate::state::StateLedger;

/// Name of the ledger file under the state directory.
const LEDGER_FILE: &str = "files.json";

/// Collects the desired file set during configure and converges the
/// filesystem toward it during execute.
///
/// Other modules stage files into this one via [`FilesModule::add`]; the
/// last writer for a path wins.
pub struct FilesModule {
    root: PathBuf,
    ledger: StateLedger,
    desired: BTreeMap<PathBuf, Vec<u8>>,
}

impl std::fmt::Debug for FilesModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesModule")
            .field("root", &self.root)
            .field("desired", &self.desired.len())
            .finish()
    }
}

impl FilesModule {
    /// Create a files module rooted at the context's home directory, with
    /// its ledger in the context's state directory.
    pub fn new(ctx: &RunContext) -> Self {
        Self {
            root: ctx.home.clone(),
            ledger: StateLedger::new(ctx.state_dir.join(LEDGER_FILE)),
            desired: BTreeMap::new(),
        }
    }

    /// Stage a desired file. Relative paths resolve against the home root;
    /// staging the same path twice overwrites (no merge).
    pub fn add(&mut self, path: impl AsRef<Path>, content: &dyn Content) {
        let path = self.root.join(path);
        self.desired.insert(path, content.to_bytes());
    }

    /// Number of currently staged files.
    pub fn staged(&self) -> usize {
        self.desired.len()
    }
}

impl Module for FilesModule {
    fn name(&self) -> &'static str {
        "files"
    }

    fn execute(&mut self, ctx: &RunContext) -> Result<()> {
        let reconciler = Reconciler::new(&self.ledger, ctx.ui.as_ref(), &self.root);
        let stats = reconciler.apply(&self.desired)?;
        tracing::debug!(
            "files: {} written, {} removed, {} skipped",
            stats.written,
            stats.removed,
            stats.skipped
        );
        Ok(())
    }
}
