//! Manifest types and parsing for cxxbind.toml files.

mod file;
mod overrides;
mod parse;
mod validate;

use std::collections::BTreeMap;

use cxxbind_codegen::options::ModuleOptions;
pub use file::CxxbindToml;
pub use overrides::DeclOverride;
pub use parse::parse_manifest;
use serde::Deserialize;
pub use validate::ParseContext;

/// Root manifest for cxxbind.toml
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Module-wide generation options
    pub module: ModuleOptions,

    /// Per-declaration overrides keyed by fully qualified name
    #[serde(default)]
    pub decls: BTreeMap<String, DeclOverride>,
}

impl Manifest {
    /// Check if an override table exists for `name` (with or without the
    /// leading `::`).
    pub fn has_override(&self, name: &str) -> bool {
        self.decls.contains_key(name)
            || match name.strip_prefix("::") {
                Some(bare) => self.decls.contains_key(bare),
                None => self.decls.contains_key(&format!("::{}", name)),
            }
    }
}
