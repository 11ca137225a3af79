//! Domain-specific error types for the convergence engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! The core modules return typed errors while module implementations and the
//! CLI boundary convert them to [`anyhow::Error`] via the standard `?`
//! operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ConvergeError
//! ├── Lifecycle(LifecycleError) — orchestrator phase misuse
//! ├── State(StateError)         — ledger persistence and corruption
//! ├── Resolve(ResolveError)     — package group expansion
//! └── Command(CommandError)     — external process invocation
//! ```
//!
//! Lifecycle misuse and a corrupt ledger are unrecoverable and abort the run
//! immediately. Drift on a managed file is deliberately *not* an error: it is
//! resolved interactively and a declined confirmation is a normal per-file
//! skip, never a raised error.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the convergence engine.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum ConvergeError {
    /// Orchestrator lifecycle misuse (programming error, fatal).
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// State ledger persistence failure or corruption (fatal).
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Package group resolution failure.
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// External command invocation failure.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}

/// Errors that arise from orchestrator lifecycle misuse.
///
/// These are programming errors in the machine description, not recoverable
/// runtime conditions: the run must abort without attempting convergence.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// A module was registered after the configure phase began.
    #[error("cannot register module '{module}': registration is frozen once configure begins")]
    Frozen {
        /// Name of the module whose registration was rejected.
        module: String,
    },

    /// The configure phase was requested a second time.
    #[error("configure phase has already run")]
    AlreadyConfigured,

    /// The execute phase was requested before configure.
    #[error("execute phase requires configure to have run first")]
    NotConfigured,

    /// The execute phase was requested a second time.
    #[error("execute phase has already run")]
    AlreadyExecuted,
}

/// Errors that arise from the persisted file-state ledger.
#[derive(Error, Debug)]
pub enum StateError {
    /// The ledger file exists but is not a well-formed path→hash object.
    ///
    /// Treated as fatal by callers: entries are never silently dropped.
    #[error("state ledger {path} is corrupt: {reason}")]
    Corrupt {
        /// Path of the ledger file on disk.
        path: PathBuf,
        /// Human-readable description of the malformation.
        reason: String,
    },

    /// An I/O error occurred while reading or rewriting the ledger.
    #[error("state ledger {path}: {source}")]
    Io {
        /// Path of the ledger file on disk.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise from package group resolution.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A group's membership reaches back to itself.
    #[error("package group '{group}' is part of a membership cycle")]
    GroupCycle {
        /// The group at which the cycle was detected.
        group: String,
    },
}

/// Errors that arise from invoking external commands.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The program could not be spawned at all.
    #[error("failed to execute '{program}': {source}")]
    Spawn {
        /// Program name that could not be started.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The program ran but exited with a failure status.
    #[error("'{command}' failed (exit {code}): {stderr}")]
    Failed {
        /// Full rendered command line.
        command: String,
        /// Exit code, `-1` when terminated by a signal.
        code: i32,
        /// Trimmed standard error output.
        stderr: String,
    },
}
