//! Built-in pipeline phases.
//!
//! This module provides the standard phases that run in every pipeline:
//!
//! - [`PreparePhase`] - selects candidate declarations and computes exportability
//! - [`OrderPhase`] - sorts the candidates into emission order
//! - [`CreatePhase`] - builds the code-creator tree
//! - [`DiagnosePhase`] - reports unexposed dependencies and naming problems

mod create;
mod diagnose;
mod order;
mod prepare;

pub use create::CreatePhase;
pub use diagnose::{
    Check, DiagnosePhase, DuplicateAliasCheck, NameCollisionCheck, UnexposedDependencyCheck,
};
pub use order::OrderPhase;
pub use prepare::PreparePhase;
