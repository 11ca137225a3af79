//! Declarative personal-machine configuration engine.
//!
//! Composable modules describe desired system state — files, installed
//! packages, shell configuration — and an orchestrator converges the
//! machine toward that description, idempotently, on repeated runs.
//!
//! The public API is organised into four layers:
//!
//! - **[`orchestrator`]** — the two-phase module lifecycle (declare, then apply)
//! - **[`state`] / [`reconcile`] / [`resolver`]** — the reconciliation core:
//!   the content-addressed file ledger, drift-safe file application, and
//!   package group resolution
//! - **[`modules`]** — concrete modules (files, pacman, fish, vscode, adapters)
//! - **[`content`]** — desired-file content builders (text, JSON, TOML, git-config)
//!
//! Machine descriptions are code: construct an [`orchestrator::Orchestrator`],
//! register modules, declare state through their handles, then run
//! `configure()` and `execute()`.

pub mod cli;
pub mod content;
pub mod context;
pub mod error;
pub mod exec;
pub mod fsutil;
pub mod logging;
pub mod modules;
pub mod orchestrator;
pub mod reconcile;
pub mod resolver;
pub mod state;
pub mod ui;
