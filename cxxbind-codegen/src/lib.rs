//! Boost.Python binding generation for cxxbind.
//!
//! This crate turns a finished [`cxxbind_decl::DeclGraph`] into the C++
//! source of a Boost.Python extension module. It decides what can be bound,
//! orders the declarations, builds a tree of code creators and renders it.
//!
//! # Module Organization
//!
//! - [`pipeline`] - Phase orchestration, diagnostics and the compilation context
//! - [`exportability`] - Structural checks deciding what can be bound
//! - [`ordering`] - Emission order (bases and default argument types first)
//! - [`factory`] - Creator factory turning declarations into tree nodes
//! - [`creators`] - The code-creator tree and its renderers
//! - [`template`] - Text substitution shared by every renderer
//! - [`transformers`] - Function transformers (output arguments, arrays, ...)
//! - [`call_policies`] - Call-policy rule chain
//! - [`dependencies`] - Exported declarations depending on unexported ones
//! - [`naming`] - Identifier mangling
//! - [`code_repository`] - Support headers emitted next to the module
//! - [`options`] - Module-wide options
//! - [`testing`] - Test utilities (feature-gated)

pub mod call_policies;
pub mod code_repository;
pub mod creators;
pub mod dependencies;
pub mod exportability;
pub mod factory;
pub mod naming;
pub mod options;
pub mod ordering;
pub mod pipeline;
pub mod template;
pub mod transformers;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
