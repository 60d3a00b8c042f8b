//! Generation pipeline.
//!
//! This module provides a [`Pipeline`] orchestrator that drives one
//! generation pass from a finished declaration graph to a code-creator tree.
//! The pipeline provides:
//!
//! - Explicit phase boundaries (prepare → order → create → diagnose)
//! - Plugin hooks for extensibility (before/after each phase)
//! - Unified diagnostics collection
//! - Shared state via [`CompilationContext`]
//!
//! # Example
//!
//! ```ignore
//! use cxxbind_codegen::pipeline::Pipeline;
//!
//! let ctx = Pipeline::new().run(graph, options)?;
//!
//! for diag in ctx.warnings() {
//!     eprintln!("warning: {}", diag.message);
//! }
//! std::fs::write(ctx.options.output_file(), ctx.render()?)?;
//! ```

mod context;
mod diagnostic;
mod phase;
pub mod phases;
mod plugin;
mod runner;

pub use context::CompilationContext;
pub use diagnostic::{Diagnostic, Severity};
pub use phase::Phase;
pub use plugin::{PhaseLog, Plugin};
pub use runner::Pipeline;
