//! Declaration model for the cxxbind binding generator.
//!
//! The C++ front end (out of scope for this workspace) resolves a translation
//! unit into a [`DeclGraph`]: an arena of [`Declaration`]s addressed by
//! [`DeclId`], each carrying its kind, access, virtuality and the mutable
//! [`ExportConfig`] overlay users edit before generation.
//!
//! ```text
//! front end (JSON) → cxxbind-decl (DeclGraph) → cxxbind-codegen → module source
//! ```

mod config;
mod decl;
mod dependency;
mod graph;
mod types;

pub use config::{CallPolicy, ExportConfig, Exportability, TransformerSpec};
pub use decl::{
    Access, Argument, BaseSpec, CallableDecl, CallableKind, ClassDecl, ClassType, DeclId,
    DeclKind, Declaration, EnumDecl, Location, VariableDecl, Virtuality,
};
pub use dependency::{Dependency, DependencyReason};
pub use graph::{DeclGraph, GraphError};
pub use types::{CppType, Fundamental};
