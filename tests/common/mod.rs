// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed run context and a recording Ui so
// each integration test can set up an isolated environment without
// repeating boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use converge::context::RunContext;
use converge::exec::SystemExecutor;
use converge::ui::Ui;

/// A recording [`Ui`] with scripted confirmation answers.
///
/// When the answer queue is empty, `confirm` declines, matching the
/// non-interactive behaviour of the console Ui.
#[derive(Debug, Default)]
pub struct RecordingUi {
    events: RefCell<Vec<String>>,
    answers: RefCell<VecDeque<bool>>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answers(answers: Vec<bool>) -> Self {
        Self {
            events: RefCell::new(Vec::new()),
            answers: RefCell::new(answers.into()),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub fn events_of(&self, kind: &str) -> Vec<String> {
        let prefix = format!("{kind} ");
        self.events
            .borrow()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(String::from))
            .collect()
    }

    fn push(&self, event: String) {
        self.events.borrow_mut().push(event);
    }
}

impl Ui for RecordingUi {
    fn stage(&self, phase: &str, module: &str) {
        self.push(format!("stage {phase} {module}"));
    }

    fn command(&self, rendered: &str) {
        self.push(format!("command {rendered}"));
    }

    fn created(&self, item: &str) {
        self.push(format!("created {item}"));
    }

    fn changed(&self, item: &str) {
        self.push(format!("changed {item}"));
    }

    fn removed(&self, item: &str) {
        self.push(format!("removed {item}"));
    }

    fn drift(&self, item: &str, reason: &str) {
        self.push(format!("drift {item}: {reason}"));
    }

    fn error(&self, msg: &str) {
        self.push(format!("error {msg}"));
    }

    fn diff(&self, _old: &str, _new: &str) {
        self.push("diff".to_string());
    }

    fn confirm(&self, question: &str, _default: bool) -> bool {
        self.push(format!("confirm {question}"));
        self.answers.borrow_mut().pop_front().unwrap_or(false)
    }
}

/// An isolated environment backed by a [`tempfile::TempDir`].
///
/// The home and state directories live inside the temporary directory and
/// are deleted when dropped.
pub struct TestEnv {
    pub dir: tempfile::TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    /// Build a [`RunContext`] over this environment with the given Ui.
    pub fn context(&self, ui: Rc<dyn Ui>) -> RunContext {
        RunContext::new(
            "tester".to_string(),
            "testhost".to_string(),
            self.home(),
            self.state_dir(),
            false,
            Rc::new(SystemExecutor),
            ui,
        )
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.home().join(rel)).expect("read file under home")
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.home().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(path, content).expect("write file under home");
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.home().join(rel).exists()
    }
}

/// Path of the file ledger inside the state directory.
pub fn ledger_path(env: &TestEnv) -> PathBuf {
    env.state_dir().join("files.json")
}

/// Modification time helper for idempotence assertions.
pub fn mtime(path: &Path) -> std::time::SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .expect("stat file")
}
