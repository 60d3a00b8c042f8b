//! The unit of work the pipeline runs.

use eyre::Result;

use super::CompilationContext;

/// One step of a generation pass.
///
/// The built-in steps are `prepare`, `order`, `create` and `diagnose`; extra
/// phases registered with [`Pipeline::phase`](super::Pipeline::phase) run
/// after them on the same context. A phase fails only on broken invariants.
/// Declarations it cannot bind become diagnostics on the context.
pub trait Phase: Send + Sync {
    /// Key used in diagnostics and passed to plugin hooks.
    fn name(&self) -> &'static str;

    /// One-line purpose, logged when the phase starts.
    fn description(&self) -> &'static str;

    fn run(&self, ctx: &mut CompilationContext) -> Result<()>;
}
