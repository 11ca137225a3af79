//! Adapter module wrapping plain functions in the module lifecycle.

use anyhow::Result;

use crate::context::RunContext;
use crate::orchestrator::Module;

type PhaseFn = Box<dyn FnMut(&RunContext) -> Result<()>>;

/// A module whose phase bodies are stored closures.
///
/// Useful for one-off steps that do not warrant a dedicated module type:
///
/// ```no_run
/// # use converge::modules::CommandModule;
/// let motd = CommandModule::new("motd")
///     .on_execute(|ctx| ctx.executor.run("uname", &["-a"]).map(drop).map_err(Into::into));
/// ```
pub struct CommandModule {
    name: &'static str,
    configure: Option<PhaseFn>,
    execute: Option<PhaseFn>,
}

impl std::fmt::Debug for CommandModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandModule")
            .field("name", &self.name)
            .field("configure", &self.configure.is_some())
            .field("execute", &self.execute.is_some())
            .finish()
    }
}

impl CommandModule {
    /// Adapter with no phase bodies; attach them with the builder methods.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            configure: None,
            execute: None,
        }
    }

    /// Attach a configure-phase body.
    pub fn on_configure(mut self, f: impl FnMut(&RunContext) -> Result<()> + 'static) -> Self {
        self.configure = Some(Box::new(f));
        self
    }

    /// Attach an execute-phase body.
    pub fn on_execute(mut self, f: impl FnMut(&RunContext) -> Result<()> + 'static) -> Self {
        self.execute = Some(Box::new(f));
        self
    }
}

impl Module for CommandModule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn configure(&mut self, ctx: &RunContext) -> Result<()> {
        match &mut self.configure {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }

    fn execute(&mut self, ctx: &RunContext) -> Result<()> {
        match &mut self.execute {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }
}
