//! Module-wide generation options.

use serde::{Deserialize, Serialize};

/// Options read from the `[module]` table of `cxxbind.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleOptions {
    /// Name of the extension module (`BOOST_PYTHON_MODULE(name)`).
    pub name: String,
    /// Path of the declaration graph, relative to the manifest.
    pub declarations: Option<String>,
    /// Output file, `<name>.cpp` when absent.
    pub output: Option<String>,
    /// Alias for `::boost::python`; empty disables the alias.
    pub boost_python_ns: String,
    /// Maximum number of arguments the binding layer accepts.
    pub max_arity: usize,
    pub indexing_suite_version: u8,
    pub always_expose_using_scope: bool,
    /// Register `implicitly_convertible` for single-argument constructors.
    pub create_casting_constructor: bool,
    pub license: Option<String>,
    /// Extra headers. Derived from declaration locations when empty.
    pub includes: Vec<String>,
}

impl ModuleOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Output file name, defaulting to `<name>.cpp`.
    pub fn output_file(&self) -> String {
        self.output
            .clone()
            .unwrap_or_else(|| format!("{}.cpp", self.name))
    }
}

impl Default for ModuleOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            declarations: None,
            output: None,
            boost_python_ns: "bp".to_string(),
            max_arity: 10,
            indexing_suite_version: 1,
            always_expose_using_scope: false,
            create_casting_constructor: false,
            license: None,
            includes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ModuleOptions::new("shapes");
        assert_eq!(options.output_file(), "shapes.cpp");
        assert_eq!(options.max_arity, 10);
        assert_eq!(options.boost_python_ns, "bp");
    }

    #[test]
    fn test_from_json_partial() {
        let options: ModuleOptions =
            serde_json::from_str(r#"{ "name": "m", "boost_python_ns": "" }"#).expect("valid");
        assert!(options.boost_python_ns.is_empty());
        assert_eq!(options.indexing_suite_version, 1);
    }
}
