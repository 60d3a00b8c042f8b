//! Create phase - builds the code-creator tree.

use std::sync::Arc;

use eyre::{Result, WrapErr, eyre};

use crate::{
    call_policies::CallPolicyResolver,
    factory::CreatorFactory,
    naming::NameMangler,
    pipeline::{CompilationContext, Phase},
};

/// Phase that runs the creator factory over the ordered candidates.
pub struct CreatePhase {
    resolver: Arc<CallPolicyResolver>,
}

impl CreatePhase {
    pub fn new(resolver: Arc<CallPolicyResolver>) -> Self {
        Self { resolver }
    }
}

impl Phase for CreatePhase {
    fn name(&self) -> &'static str {
        "create"
    }

    fn description(&self) -> &'static str {
        "Build the code-creator tree for the module"
    }

    fn run(&self, ctx: &mut CompilationContext) -> Result<()> {
        let order = ctx
            .order
            .as_ref()
            .ok_or_else(|| eyre!("emission order not set - did OrderPhase run?"))?;
        let creation = CreatorFactory::new(
            &ctx.graph,
            &ctx.options,
            &ctx.exportability,
            &self.resolver,
            NameMangler::new(),
        )
        .create(&order.declarations)
        .wrap_err("failed to build the code-creator tree")?;

        ctx.diagnostics.extend(creation.diagnostics);
        ctx.exported = creation.exported;
        ctx.collisions = creation.collisions;
        ctx.tree = Some(creation.tree);
        Ok(())
    }
}
