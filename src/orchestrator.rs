//! Two-phase module lifecycle: declare desired state, then apply it.
//!
//! Modules register with the [`Orchestrator`] at wiring time; registration
//! order fixes lifecycle order. `configure` runs every module's declare step
//! in **reverse** registration order: later-registered, more specific
//! modules typically declare state *into* earlier-registered foundational
//! ones (a shell module staging files and packages), so dependents must
//! declare before their dependencies finalize shared state. `execute` then
//! applies in **forward** order, so a dependency's side effects (installing
//! a package) happen before any dependent assumes them.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use crate::context::RunContext;
use crate::error::{LifecycleError, StateError};

/// The unit of desired-state description.
///
/// Both phases default to no-ops so a module may participate in only one.
/// Modules read the shared [`RunContext`] but must not mutate orchestrator
/// lifecycle state.
pub trait Module {
    /// Short module name, emitted as the progress notification for each
    /// phase step.
    fn name(&self) -> &'static str;

    /// Declare desired state. Runs during the configure phase.
    fn configure(&mut self, ctx: &RunContext) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Apply desired state to the real world. Runs during the execute phase.
    fn execute(&mut self, ctx: &RunContext) -> Result<()> {
        let _ = ctx;
        Ok(())
    }
}

/// One-way lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unfrozen,
    Configured,
    Executed,
}

/// Owns the module registry and drives the two-phase lifecycle.
pub struct Orchestrator {
    ctx: RunContext,
    modules: Vec<Rc<RefCell<dyn Module>>>,
    phase: Phase,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("ctx", &self.ctx)
            .field("modules", &self.modules.len())
            .field("phase", &self.phase)
            .finish()
    }
}

impl Orchestrator {
    /// Create an orchestrator with an empty registry.
    pub fn new(ctx: RunContext) -> Self {
        Self {
            ctx,
            modules: Vec::new(),
            phase: Phase::Unfrozen,
        }
    }

    /// The shared run context.
    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Append a module to the registry, returning a typed handle for wiring
    /// it into dependent modules.
    ///
    /// Fails once the configure phase has begun: registering after the
    /// freeze is a programming error in the machine description.
    pub fn register<M: Module + 'static>(
        &mut self,
        module: M,
    ) -> Result<Rc<RefCell<M>>, LifecycleError> {
        if self.phase != Phase::Unfrozen {
            return Err(LifecycleError::Frozen {
                module: module.name().to_string(),
            });
        }
        let handle = Rc::new(RefCell::new(module));
        let entry: Rc<RefCell<dyn Module>> = handle.clone();
        self.modules.push(entry);
        Ok(handle)
    }

    /// Run the configure phase: freeze registration, then declare desired
    /// state in reverse registration order. One-shot.
    pub fn configure(&mut self) -> Result<()> {
        if self.phase != Phase::Unfrozen {
            return Err(LifecycleError::AlreadyConfigured.into());
        }
        // Freeze before the first module runs, so registration attempts from
        // inside the phase are rejected.
        self.phase = Phase::Configured;
        let modules: Vec<_> = self.modules.iter().rev().cloned().collect();
        self.run_phase("configure", &modules, |m, ctx| m.configure(ctx))
    }

    /// Run the execute phase: apply desired state in forward registration
    /// order. Requires configure to have run. One-shot.
    pub fn execute(&mut self) -> Result<()> {
        match self.phase {
            Phase::Unfrozen => return Err(LifecycleError::NotConfigured.into()),
            Phase::Executed => return Err(LifecycleError::AlreadyExecuted.into()),
            Phase::Configured => {}
        }
        self.phase = Phase::Executed;
        let modules = self.modules.clone();
        self.run_phase("execute", &modules, |m, ctx| m.execute(ctx))
    }

    fn run_phase(
        &self,
        phase: &str,
        modules: &[Rc<RefCell<dyn Module>>],
        step: impl Fn(&mut dyn Module, &RunContext) -> Result<()>,
    ) -> Result<()> {
        let mut failures = 0usize;
        for handle in modules {
            let mut module = handle.borrow_mut();
            self.ctx.ui.stage(phase, module.name());
            tracing::debug!("{phase} {}", module.name());
            if let Err(err) = step(&mut *module, &self.ctx) {
                // A corrupt ledger is unrecoverable: no partial convergence.
                if err.downcast_ref::<StateError>().is_some() {
                    return Err(err);
                }
                self.ctx.ui.error(&format!("{}: {err:#}", module.name()));
                failures += 1;
            }
        }
        if failures > 0 {
            anyhow::bail!("{failures} module(s) failed during {phase}");
        }
        Ok(())
    }
}
