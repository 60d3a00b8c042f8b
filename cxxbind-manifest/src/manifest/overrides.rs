//! Per-declaration overrides from `[decls."..."]` tables.

use std::collections::BTreeMap;

use cxxbind_decl::{CallPolicy, DeclGraph, ExportConfig, TransformerSpec};
use serde::Deserialize;

use super::{Manifest, validate::find_key_span};
use crate::{Result, error::SourceContext};

/// Settings layered over a declaration's [`ExportConfig`].
///
/// Every field is optional; absent fields leave the graph's value alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclOverride {
    pub ignore: Option<bool>,
    pub alias: Option<String>,
    pub call_policy: Option<CallPolicy>,
    pub create_with_signature: Option<bool>,
    pub always_expose_using_scope: Option<bool>,
    pub use_keywords: Option<bool>,
    pub use_default_arguments: Option<bool>,
    pub documentation: Option<String>,
    pub transformers: Option<Vec<TransformerSpec>>,
    pub export_values: Option<Vec<String>>,
    pub value_aliases: Option<BTreeMap<String, String>>,
    pub noncopyable: Option<bool>,
    pub code: Option<Vec<String>>,
    pub wrapper_code: Option<Vec<String>>,
}

impl DeclOverride {
    /// Write the present fields into `config`.
    pub fn apply_to(&self, config: &mut ExportConfig) {
        if let Some(ignore) = self.ignore {
            config.ignore = ignore;
        }
        if let Some(alias) = &self.alias {
            config.alias = Some(alias.clone());
        }
        if let Some(policy) = self.call_policy {
            config.call_policy = Some(policy);
        }
        if let Some(value) = self.create_with_signature {
            config.create_with_signature = value;
        }
        if let Some(value) = self.always_expose_using_scope {
            config.always_expose_using_scope = value;
        }
        if let Some(value) = self.use_keywords {
            config.use_keywords = value;
        }
        if let Some(value) = self.use_default_arguments {
            config.use_default_arguments = value;
        }
        if let Some(documentation) = &self.documentation {
            config.documentation = Some(documentation.clone());
        }
        if let Some(transformers) = &self.transformers {
            config.transformers = transformers.clone();
        }
        if let Some(values) = &self.export_values {
            config.export_values = values.clone();
        }
        if let Some(aliases) = &self.value_aliases {
            config.value_aliases.extend(aliases.clone());
        }
        if let Some(noncopyable) = self.noncopyable {
            config.noncopyable = Some(noncopyable);
        }
        if let Some(code) = &self.code {
            config.code.extend(code.iter().cloned());
        }
        if let Some(code) = &self.wrapper_code {
            config.wrapper_code.extend(code.iter().cloned());
        }
    }
}

impl Manifest {
    /// Apply every override table to `graph`.
    ///
    /// A key matches all declarations with that fully qualified name, so one
    /// table covers a whole overload set. Returns the number of declarations
    /// touched.
    pub fn apply_overrides(&self, graph: &mut DeclGraph, src: &SourceContext) -> Result<usize> {
        let mut touched = 0;
        for (name, decl_override) in &self.decls {
            let ids = graph.find_all(name);
            if ids.is_empty() {
                return Err(
                    src.unknown_declaration_error(name.clone(), find_key_span(src.src(), name))
                );
            }
            for id in ids {
                decl_override.apply_to(&mut graph[id].config);
                touched += 1;
            }
        }
        Ok(touched)
    }
}
