//! Package module for Arch Linux systems (pacman or an AUR helper).
//!
//! Desired packages and per-group exclusions accumulate during configure;
//! execute queries the live system, resolves groups, diffs against the
//! explicitly-installed set, and converges. Group membership is never
//! cached across runs.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

use crate::context::RunContext;
use crate::error::CommandError;
use crate::exec::{render, ExecResult};
use crate::orchestrator::Module;
use crate::resolver::{PackageDiff, PackageResolver};

/// Which package-manager binary performs the work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PacmanBinary {
    /// Official repositories only; mutations run under `sudo`.
    #[default]
    Pacman,
    /// AUR helper; calls sudo itself.
    Paru,
}

impl PacmanBinary {
    fn program(self) -> &'static str {
        match self {
            Self::Pacman => "pacman",
            Self::Paru => "paru",
        }
    }
}

/// Declarative package set for the system package manager.
#[derive(Debug, Default)]
pub struct PacmanModule {
    binary: PacmanBinary,
    requested: BTreeSet<String>,
    excluded: BTreeMap<String, BTreeSet<String>>,
}

impl PacmanModule {
    /// Module using plain `pacman`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Module using the given binary.
    pub fn with_binary(binary: PacmanBinary) -> Self {
        Self {
            binary,
            ..Self::default()
        }
    }

    /// Request packages or groups. Callable any number of times before the
    /// configure phase ends.
    pub fn install<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested.extend(names.into_iter().map(Into::into));
    }

    /// Exclude members from a group before it is expanded. Excluding a
    /// nested group removes its whole subtree.
    pub fn exclude<I, S>(&mut self, group: &str, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded
            .entry(group.to_string())
            .or_default()
            .extend(names.into_iter().map(Into::into));
    }

    fn capture(&self, ctx: &RunContext, args: &[&str]) -> Result<ExecResult, CommandError> {
        let program = self.binary.program();
        ctx.ui.command(&render(program, args));
        ctx.executor.run(program, args)
    }

    /// Run a mutating package-manager command. Pacman needs a sudo prefix;
    /// paru invokes sudo itself.
    fn mutate(&self, ctx: &RunContext, args: &[&str]) -> Result<(), CommandError> {
        match self.binary {
            PacmanBinary::Pacman => {
                let mut full = vec!["pacman"];
                full.extend_from_slice(args);
                ctx.ui.command(&render("sudo", &full));
                ctx.executor.run("sudo", &full)?;
            }
            PacmanBinary::Paru => {
                ctx.ui.command(&render("paru", args));
                ctx.executor.run("paru", args)?;
            }
        }
        Ok(())
    }

    /// Explicitly-installed package names (`-Qqe`), one per line.
    fn query_installed(&self, ctx: &RunContext) -> Result<BTreeSet<String>, CommandError> {
        let result = self.capture(ctx, &["-Qqe"])?;
        Ok(result.stdout.lines().map(ToString::to_string).collect())
    }

    /// Group membership map (`-Sgg`), `group member` per line.
    fn query_groups(
        &self,
        ctx: &RunContext,
    ) -> Result<BTreeMap<String, BTreeSet<String>>, CommandError> {
        let result = self.capture(ctx, &["-Sgg"])?;
        let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for line in result.stdout.lines() {
            if let Some((group, member)) = line.split_once(' ') {
                groups
                    .entry(group.to_string())
                    .or_default()
                    .insert(member.to_string());
            }
        }
        Ok(groups)
    }

    /// Orphaned packages (`-Qqdt`). The query exits non-zero when the result
    /// is empty; that is "nothing to do", not a failure.
    fn query_orphans(&self, ctx: &RunContext) -> Result<Vec<String>, CommandError> {
        let program = self.binary.program();
        let args = &["-Qqdt"];
        ctx.ui.command(&render(program, args));
        let result = ctx.executor.run_unchecked(program, args)?;
        if result.success {
            Ok(result.stdout.lines().map(ToString::to_string).collect())
        } else if result.stdout.trim().is_empty() {
            Ok(Vec::new())
        } else {
            Err(CommandError::Failed {
                command: render(program, args),
                code: result.code.unwrap_or(-1),
                stderr: result.stderr.trim().to_string(),
            })
        }
    }

    fn install_packages(&self, ctx: &RunContext, packages: &[String]) -> Result<(), CommandError> {
        if packages.is_empty() {
            return Ok(());
        }
        let names: Vec<&str> = packages.iter().map(String::as_str).collect();
        let mut args = vec!["-S", "--needed"];
        args.extend_from_slice(&names);
        self.mutate(ctx, &args)?;
        // Requested packages may already be present as dependencies; make
        // sure every one of them is marked explicit.
        let mut args = vec!["-D", "--asexplicit"];
        args.extend_from_slice(&names);
        self.mutate(ctx, &args)
    }

    fn uninstall_packages(&self, ctx: &RunContext, packages: &[String]) -> Result<(), CommandError> {
        if !packages.is_empty() {
            let names: Vec<&str> = packages.iter().map(String::as_str).collect();
            let mut args = vec!["-D", "--asdeps"];
            args.extend_from_slice(&names);
            self.mutate(ctx, &args)?;
        }

        let orphans = self.query_orphans(ctx)?;
        if !orphans.is_empty() {
            let names: Vec<&str> = orphans.iter().map(String::as_str).collect();
            let mut args = vec!["-Rsn"];
            args.extend_from_slice(&names);
            self.mutate(ctx, &args)?;
        }
        Ok(())
    }
}

impl Module for PacmanModule {
    fn name(&self) -> &'static str {
        "pacman"
    }

    fn execute(&mut self, ctx: &RunContext) -> Result<()> {
        let groups = self.query_groups(ctx)?;
        let installed = self.query_installed(ctx)?;

        let resolver = PackageResolver::new(groups, self.excluded.clone());
        let target = resolver.resolve(&self.requested)?;
        let diff = PackageDiff::between(&target, &installed);

        for package in &diff.to_install {
            ctx.ui.created(package);
        }
        for package in &diff.to_uninstall {
            ctx.ui.removed(package);
        }

        if ctx.dry_run {
            tracing::debug!("pacman: dry run, skipping mutations");
            return Ok(());
        }

        self.install_packages(ctx, &diff.to_install)?;
        self.uninstall_packages(ctx, &diff.to_uninstall)?;
        Ok(())
    }
}
