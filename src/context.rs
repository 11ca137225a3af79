//! Shared, immutable context threaded through every module phase.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context as _, Result};

use crate::exec::Executor;
use crate::ui::Ui;

/// Immutable facts about the run, shared with every module.
///
/// Modules read this during both phases but never mutate orchestrator
/// lifecycle state through it. The executor and ui are trait objects so
/// tests can inject mocks.
pub struct RunContext {
    /// Operating user name.
    pub user: String,
    /// Host name of this machine.
    pub host: String,
    /// The user's home directory; relative desired-file paths resolve
    /// against it.
    pub home: PathBuf,
    /// Per-tool state directory holding the file ledger.
    pub state_dir: PathBuf,
    /// Suppress mutating package-manager and editor invocations.
    pub dry_run: bool,
    /// Command executor (real system calls, or a mock in tests).
    pub executor: Rc<dyn Executor>,
    /// Output sink and confirmation surface.
    pub ui: Rc<dyn Ui>,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("user", &self.user)
            .field("host", &self.host)
            .field("home", &self.home)
            .field("state_dir", &self.state_dir)
            .field("dry_run", &self.dry_run)
            .field("executor", &"<dyn Executor>")
            .field("ui", &"<dyn Ui>")
            .finish()
    }
}

impl RunContext {
    /// Build a context from explicit values.
    pub fn new(
        user: String,
        host: String,
        home: PathBuf,
        state_dir: PathBuf,
        dry_run: bool,
        executor: Rc<dyn Executor>,
        ui: Rc<dyn Ui>,
    ) -> Self {
        Self {
            user,
            host,
            home,
            state_dir,
            dry_run,
            executor,
            ui,
        }
    }

    /// Detect the context for the current user and machine.
    ///
    /// The state directory (`$XDG_STATE_HOME/converge`, falling back to
    /// `~/.local/state/converge`) is created if missing.
    pub fn detect(dry_run: bool, executor: Rc<dyn Executor>, ui: Rc<dyn Ui>) -> Result<Self> {
        let user =
            std::env::var("USER").context("USER environment variable is not set")?;
        let home = dirs::home_dir().context("cannot determine home directory")?;
        let host = executor
            .run_unchecked("uname", &["-n"])
            .map(|r| r.stdout.trim().to_string())
            .unwrap_or_default();
        let state_dir = dirs::state_dir()
            .unwrap_or_else(|| home.join(".local/state"))
            .join("converge");
        std::fs::create_dir_all(&state_dir)
            .with_context(|| format!("creating state directory {}", state_dir.display()))?;
        Ok(Self::new(user, host, home, state_dir, dry_run, executor, ui))
    }
}
