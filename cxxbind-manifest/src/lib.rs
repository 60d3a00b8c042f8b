//! Configuration layer for cxxbind.
//!
//! A `cxxbind.toml` names the extension module, points at the declaration
//! graph produced by the C++ front end and carries per-declaration overrides:
//!
//! ```toml
//! [module]
//! name = "geometry"
//! declarations = "geometry.json"
//!
//! [decls."::geo::Shape::area"]
//! call_policy = "return_by_value"
//!
//! [decls."::geo::getValue"]
//! transformers = [{ kind = "output", arg = 1 }]
//! ```
//!
//! Errors carry the manifest source so they render with `miette`.

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

mod error;
mod manifest;

pub use error::{Error, Result, SourceContext};
pub use manifest::{CxxbindToml, DeclOverride, Manifest, ParseContext, parse_manifest};
