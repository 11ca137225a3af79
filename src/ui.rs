//! User-facing output and confirmation prompts.
//!
//! The engine never prints directly: everything the operator sees goes
//! through the [`Ui`] trait carried in the run context, so tests can swap in
//! a scripted implementation and drive confirmation flows without a
//! terminal.

use std::io::IsTerminal;

use colored::Colorize as _;
use dialoguer::Confirm;
use similar::{ChangeTag, TextDiff};

/// Output sink and confirmation surface for a run.
pub trait Ui {
    /// Announce a lifecycle phase step for a module.
    fn stage(&self, phase: &str, module: &str);

    /// Echo an external command about to run.
    fn command(&self, rendered: &str);

    /// A new item (file, package, extension) is being created or installed.
    fn created(&self, item: &str);

    /// An existing item is being changed.
    fn changed(&self, item: &str);

    /// An item is being removed or uninstalled.
    fn removed(&self, item: &str);

    /// A managed file's on-disk content diverged from the ledger.
    fn drift(&self, item: &str, reason: &str);

    /// Report a module failure.
    fn error(&self, msg: &str);

    /// Show a line diff between current and desired content.
    fn diff(&self, old: &str, new: &str);

    /// Ask a yes/no question; `default` is used on plain Enter.
    ///
    /// Implementations must answer `false` when no interactive terminal is
    /// available, so unattended runs never overwrite drifted files.
    fn confirm(&self, question: &str, default: bool) -> bool;
}

/// [`Ui`] for an interactive terminal.
#[derive(Debug, Default)]
pub struct ConsoleUi;

impl Ui for ConsoleUi {
    fn stage(&self, phase: &str, module: &str) {
        println!("{} {phase} {}", "==>".blue().bold(), module.bold());
    }

    fn command(&self, rendered: &str) {
        println!("{}", format!("$ {rendered}").bright_black());
    }

    fn created(&self, item: &str) {
        println!("{} {item}", "+".green().bold());
    }

    fn changed(&self, item: &str) {
        println!("{} {item}", "~".yellow().bold());
    }

    fn removed(&self, item: &str) {
        println!("{} {item}", "-".red().bold());
    }

    fn drift(&self, item: &str, reason: &str) {
        println!("{} {item}: {reason}", "drift:".red().bold());
    }

    fn error(&self, msg: &str) {
        eprintln!("{} {msg}", "error:".red().bold());
    }

    fn diff(&self, old: &str, new: &str) {
        let diff = TextDiff::from_lines(old, new);
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Delete => print!("{}", format!("- {change}").red()),
                ChangeTag::Insert => print!("{}", format!("+ {change}").green()),
                ChangeTag::Equal => {}
            }
        }
    }

    fn confirm(&self, question: &str, default: bool) -> bool {
        if !std::io::stdin().is_terminal() {
            return false;
        }
        Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()
            .unwrap_or(false)
    }
}
