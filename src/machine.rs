//! The machine description: what this machine should look like.
//!
//! Edit this file to declare your own state. Registration order fixes
//! lifecycle order: foundational modules (files, pacman) come first so that
//! higher-level modules can declare state into them during configure and
//! rely on them during execute.

use anyhow::Result;
use converge::content::GitConfigContent;
use converge::modules::{CommandModule, FilesModule, FishModule, PacmanModule, VscodeModule};
use converge::orchestrator::Orchestrator;

/// Register every module and declare the desired state for this machine.
pub fn describe(orchestrator: &mut Orchestrator) -> Result<()> {
    let files = orchestrator.register(FilesModule::new(orchestrator.context()))?;
    let pacman = orchestrator.register(PacmanModule::new())?;
    let fish = orchestrator.register(FishModule::new(files.clone(), pacman.clone()))?;
    let vscode = orchestrator.register(VscodeModule::new(files.clone(), pacman.clone()))?;
    orchestrator.register(
        CommandModule::new("kernel").on_execute(|ctx| {
            let result = ctx.executor.run("uname", &["-r"])?;
            tracing::info!("running kernel {}", result.stdout.trim());
            Ok(())
        }),
    )?;

    {
        let mut pacman = pacman.borrow_mut();
        pacman.install(["base-devel", "git", "openssh", "ripgrep"]);
        pacman.exclude("base-devel", ["fakeroot"]);
    }

    {
        let mut fish = fish.borrow_mut();
        fish.add_to_path(converge::modules::FishStr::raw("$HOME/.local/bin"));
        fish.add_env_var("EDITOR", "nvim");
        fish.add_abbr("g", "git");
        fish.add_abbr("gs", "git status");
    }

    vscode
        .borrow_mut()
        .install(["rust-lang.rust-analyzer", "tamasfe.even-better-toml"]);

    let mut git = GitConfigContent::new();
    git.set("init", "defaultBranch", "main");
    git.set("pull", "rebase", true);
    git.set("alias", "st", "status --short");
    files.borrow_mut().add(".gitconfig", &git);

    Ok(())
}
