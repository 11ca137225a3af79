//! Editor module: VS Code settings, package selection, and extensions.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use anyhow::Result;
use serde_json::json;

use crate::content::JsonContent;
use crate::context::RunContext;
use crate::exec::render;
use crate::modules::{FilesModule, PacmanModule};
use crate::orchestrator::Module;

/// Declarative VS Code configuration.
///
/// Settings and the editor package are staged into the files and pacman
/// modules during configure; extensions are converged against
/// `code --list-extensions` during execute.
pub struct VscodeModule {
    files: Rc<RefCell<FilesModule>>,
    pacman: Rc<RefCell<PacmanModule>>,
    /// Install the Microsoft marketplace build instead of Code - OSS.
    pub microsoft: bool,
    /// Force all telemetry settings off.
    pub disable_telemetry: bool,
    extensions: BTreeSet<String>,
    settings: JsonContent,
}

impl std::fmt::Debug for VscodeModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VscodeModule")
            .field("microsoft", &self.microsoft)
            .field("disable_telemetry", &self.disable_telemetry)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

impl VscodeModule {
    /// Create a VS Code module wired to the files and pacman modules it
    /// declares state into.
    pub fn new(files: Rc<RefCell<FilesModule>>, pacman: Rc<RefCell<PacmanModule>>) -> Self {
        Self {
            files,
            pacman,
            microsoft: false,
            disable_telemetry: true,
            extensions: BTreeSet::new(),
            settings: JsonContent::new(),
        }
    }

    /// Request extensions by marketplace id.
    pub fn install<I, S>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions.extend(extensions.into_iter().map(Into::into));
    }

    /// Mutable access to the settings document.
    pub fn settings_mut(&mut self) -> &mut JsonContent {
        &mut self.settings
    }

    fn settings_path(&self) -> &'static str {
        if self.microsoft {
            ".config/Code/User/settings.json"
        } else {
            ".config/Code - OSS/User/settings.json"
        }
    }

    fn package(&self) -> &'static str {
        if self.microsoft {
            "visual-studio-code-bin"
        } else {
            "code"
        }
    }
}

impl Module for VscodeModule {
    fn name(&self) -> &'static str {
        "vscode"
    }

    fn configure(&mut self, _ctx: &RunContext) -> Result<()> {
        self.settings.tag();

        if self.disable_telemetry {
            self.settings.set(&["telemetry.editStats.enabled"], json!(false));
            self.settings.set(&["telemetry.feedback.enabled"], json!(false));
            self.settings.set(&["telemetry.telemetryLevel"], json!("off"));
            self.settings.set(&["update.mode"], json!("none"));
        }

        self.pacman.borrow_mut().install([self.package()]);
        self.files
            .borrow_mut()
            .add(self.settings_path(), &self.settings);
        Ok(())
    }

    fn execute(&mut self, ctx: &RunContext) -> Result<()> {
        ctx.ui.command(&render("code", &["--list-extensions"]));
        let result = ctx.executor.run("code", &["--list-extensions"])?;
        let installed: BTreeSet<String> =
            result.stdout.lines().map(ToString::to_string).collect();

        let to_install: Vec<&String> = self.extensions.difference(&installed).collect();
        let to_uninstall: Vec<&String> = installed.difference(&self.extensions).collect();

        for extension in &to_install {
            ctx.ui.created(extension.as_str());
        }
        for extension in &to_uninstall {
            ctx.ui.removed(extension.as_str());
        }

        if ctx.dry_run {
            return Ok(());
        }

        for extension in &to_install {
            let args = &["--install-extension", extension.as_str()];
            ctx.ui.command(&render("code", args));
            ctx.executor.run("code", args)?;
        }
        for extension in &to_uninstall {
            let args = &["--uninstall-extension", extension.as_str()];
            ctx.ui.command(&render("code", args));
            ctx.executor.run("code", args)?;
        }
        Ok(())
    }
}
