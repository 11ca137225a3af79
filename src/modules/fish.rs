//! Shell module: renders a fish configuration and offers to adopt fish as
//! the login shell.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::Result;

use crate::content::TextContent;
use crate::context::RunContext;
use crate::exec::render;
use crate::modules::{FilesModule, PacmanModule};
use crate::orchestrator::Module;

/// A value destined for fish script: either a literal that gets
/// single-quoted with escaping, or raw script text spliced in verbatim
/// (for `$HOME`-style expansions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FishStr {
    /// Quoted and escaped as a fish single-quoted string.
    Literal(String),
    /// Inserted into the script verbatim.
    Raw(String),
}

impl FishStr {
    /// Raw script text, spliced without quoting.
    pub fn raw(s: impl Into<String>) -> Self {
        Self::Raw(s.into())
    }

    fn render(&self) -> String {
        match self {
            Self::Literal(s) => escape(s),
            Self::Raw(s) => s.clone(),
        }
    }
}

impl From<&str> for FishStr {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_string())
    }
}

impl From<String> for FishStr {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

/// Single-quote a string for fish. The only meaningful escape sequences in
/// single quotes are `\'` and `\\`.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

/// Login shell path fish is expected at.
const FISH_SHELL: &str = "/usr/bin/fish";

/// Declarative fish shell configuration.
pub struct FishModule {
    files: Rc<RefCell<FilesModule>>,
    pacman: Rc<RefCell<PacmanModule>>,
    path: Vec<FishStr>,
    abbrs: BTreeMap<String, FishStr>,
    env_vars: BTreeMap<String, FishStr>,
    commands: Vec<String>,
    interactive: Vec<String>,
}

impl std::fmt::Debug for FishModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FishModule")
            .field("path", &self.path.len())
            .field("abbrs", &self.abbrs.len())
            .field("env_vars", &self.env_vars.len())
            .finish()
    }
}

impl FishModule {
    /// Create a fish module wired to the files and pacman modules it
    /// declares state into.
    pub fn new(files: Rc<RefCell<FilesModule>>, pacman: Rc<RefCell<PacmanModule>>) -> Self {
        Self {
            files,
            pacman,
            path: Vec::new(),
            abbrs: BTreeMap::new(),
            env_vars: BTreeMap::new(),
            commands: Vec::new(),
            interactive: Vec::new(),
        }
    }

    /// Append a segment to the login PATH.
    pub fn add_to_path(&mut self, value: impl Into<FishStr>) {
        self.path.push(value.into());
    }

    /// Define an interactive abbreviation.
    pub fn add_abbr(&mut self, name: &str, replacement: impl Into<FishStr>) {
        self.abbrs.insert(name.to_string(), replacement.into());
    }

    /// Export an environment variable.
    pub fn add_env_var(&mut self, name: &str, value: impl Into<FishStr>) {
        self.env_vars.insert(name.to_string(), value.into());
    }

    /// Append a raw command to the configuration.
    pub fn add_command(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    /// Append a raw command to the interactive-only block.
    pub fn add_interactive(&mut self, command: impl Into<String>) {
        self.interactive.push(command.into());
    }

    fn render_config(&self) -> TextContent {
        let mut file = TextContent::new();
        file.tag("#");

        // Commands set by the user always appear after generated commands.
        let mut commands = Vec::new();
        let mut interactive = Vec::new();
        for segment in &self.path {
            commands.push(format!(
                "fish_add_path --path --append {}",
                segment.render()
            ));
        }
        for (name, value) in &self.env_vars {
            commands.push(format!("set -gx {} {}", escape(name), value.render()));
        }
        for (name, replacement) in &self.abbrs {
            interactive.push(format!("abbr {} {}", escape(name), replacement.render()));
        }
        commands.extend(self.commands.iter().cloned());
        interactive.extend(self.interactive.iter().cloned());

        if !commands.is_empty() {
            file.append("");
            for command in &commands {
                file.append(command);
            }
        }
        if !interactive.is_empty() {
            file.append("");
            file.append("if status is-interactive");
            for command in &interactive {
                file.append(&format!("  {command}"));
            }
            file.append("end");
        }
        file
    }
}

impl Module for FishModule {
    fn name(&self) -> &'static str {
        "fish"
    }

    fn configure(&mut self, _ctx: &RunContext) -> Result<()> {
        let file = self.render_config();
        self.files
            .borrow_mut()
            .add(".config/fish/config.fish", &file);
        self.pacman.borrow_mut().install(["fish"]);
        Ok(())
    }

    fn execute(&mut self, ctx: &RunContext) -> Result<()> {
        if std::env::var("SHELL").as_deref() == Ok(FISH_SHELL) {
            return Ok(());
        }
        if !ctx
            .ui
            .confirm("Your shell is not fish. Set it to fish?", false)
        {
            return Ok(());
        }
        if ctx.dry_run {
            return Ok(());
        }
        let args = &["usermod", "--shell", FISH_SHELL, ctx.user.as_str()];
        ctx.ui.command(&render("sudo", args));
        ctx.executor.run("sudo", args)?;
        Ok(())
    }
}
