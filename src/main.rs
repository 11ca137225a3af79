use std::rc::Rc;

use anyhow::Result;
use clap::Parser;
use converge::cli::{Cli, Command};
use converge::context::RunContext;
use converge::exec::SystemExecutor;
use converge::orchestrator::Orchestrator;
use converge::ui::ConsoleUi;

mod machine;

fn main() -> Result<()> {
    let args = Cli::parse();
    converge::logging::init(args.verbose);

    match args.command {
        Command::Apply => apply(args.dry_run),
        Command::Version => {
            let version = option_env!("CONVERGE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            println!("converge {version}");
            Ok(())
        }
    }
}

fn apply(dry_run: bool) -> Result<()> {
    let ctx = RunContext::detect(dry_run, Rc::new(SystemExecutor), Rc::new(ConsoleUi))?;
    let mut orchestrator = Orchestrator::new(ctx);
    machine::describe(&mut orchestrator)?;
    orchestrator.configure()?;
    orchestrator.execute()
}
