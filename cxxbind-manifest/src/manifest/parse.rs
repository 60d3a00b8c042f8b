//! Manifest parsing from files and strings.

use std::{path::Path, str::FromStr};

use miette::SourceSpan;

use super::{Manifest, validate::ParseContext};
use crate::{Error, Result, error::SourceContext};

impl FromStr for Manifest {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        parse_manifest(s, "cxxbind.toml")
    }
}

impl Manifest {
    /// Parse a cxxbind.toml file from the given path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        parse_manifest(&content, &path.display().to_string())
    }

    /// Parse a cxxbind.toml from a string with a custom filename for error reporting.
    pub fn from_str_with_filename(content: &str, filename: &str) -> Result<Self> {
        parse_manifest(content, filename)
    }
}

/// Parse a manifest from content with the given filename for error reporting.
pub fn parse_manifest(content: &str, filename: &str) -> Result<Manifest> {
    let source_ctx = SourceContext::new(content, filename);
    let manifest: Manifest = toml::from_str(content).map_err(|e| source_ctx.parse_error(e))?;
    validate_manifest(&manifest, content, filename)?;
    Ok(manifest)
}

/// Span of `key = ...` inside the source, used for option errors.
fn find_option_span(src: &str, key: &str) -> Option<SourceSpan> {
    src.lines()
        .scan(0, |offset, line| {
            let start = *offset;
            *offset += line.len() + 1;
            Some((start, line))
        })
        .find(|(_, line)| {
            line.trim_start()
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='))
        })
        .map(|(start, line)| {
            let indent = line.len() - line.trim_start().len();
            SourceSpan::from((start + indent, key.len()))
        })
}

/// Validate the manifest after parsing.
fn validate_manifest(manifest: &Manifest, src: &str, filename: &str) -> Result<()> {
    let ctx = ParseContext::new(src, filename);
    let module = &manifest.module;

    if module.name.is_empty() {
        return Err(ctx.validation_error(
            "[module] requires a non-empty `name`",
            find_option_span(src, "name"),
        ));
    }
    ctx.validate_name(&module.name, "module name")?;

    if !matches!(module.indexing_suite_version, 1 | 2) {
        return Err(Box::new(Error::UnsupportedIndexingSuite {
            src: SourceContext::new(src, filename).named_source(),
            span: find_option_span(src, "indexing_suite_version"),
            version: module.indexing_suite_version,
        }));
    }
    if module.max_arity == 0 {
        return Err(ctx.validation_error(
            "max_arity must be at least 1",
            find_option_span(src, "max_arity"),
        ));
    }
    if !module.boost_python_ns.is_empty() {
        ctx.validate_name(&module.boost_python_ns, "namespace alias")?;
    }

    for (name, decl_override) in &manifest.decls {
        let decl_ctx = ctx.push("decls").push(name);
        if name.trim_start_matches("::").is_empty() {
            return Err(decl_ctx.validation_error(
                "override tables must name a declaration",
                decl_ctx.find_key_span(name),
            ));
        }
        if let Some(alias) = &decl_override.alias {
            decl_ctx.validate_name(alias, "alias")?;
        }
        if let Some(aliases) = &decl_override.value_aliases {
            for alias in aliases.values() {
                decl_ctx.validate_name(alias, "enum value alias")?;
            }
        }
        if let Some(transformers) = &decl_override.transformers {
            for transformer in transformers {
                if transformer.arg() == 0 {
                    return Err(decl_ctx.validation_error(
                        format!(
                            "{} in '{}': argument indices start at 1",
                            transformer, name
                        ),
                        decl_ctx.find_key_span(name),
                    ));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use cxxbind_decl::{CallPolicy, TransformerSpec};

    use super::*;

    #[test]
    fn test_parse_minimal() {
        let manifest: Manifest = "[module]\nname = \"geo\"".parse().expect("valid");
        assert_eq!(manifest.module.name, "geo");
        assert_eq!(manifest.module.output_file(), "geo.cpp");
        assert_eq!(manifest.module.boost_python_ns, "bp");
        assert!(manifest.decls.is_empty());
    }

    #[test]
    fn test_parse_overrides() {
        let manifest: Manifest = r#"
[module]
name = "geo"
declarations = "geo.json"
indexing_suite_version = 2

[decls."::geo::Shape::area"]
call_policy = "return_by_value"

[decls."::getValue"]
transformers = [{ kind = "output", arg = 1 }, { kind = "input_array", arg = 2, size = 3 }]

[decls."::geo::Color"]
export_values = ["red"]
value_aliases = { green = "GREEN" }
"#
        .parse()
        .expect("valid");

        assert_eq!(manifest.module.declarations.as_deref(), Some("geo.json"));
        assert_eq!(manifest.module.indexing_suite_version, 2);
        assert_eq!(
            manifest.decls["::geo::Shape::area"].call_policy,
            Some(CallPolicy::ReturnByValue)
        );
        assert_eq!(
            manifest.decls["::getValue"].transformers,
            Some(vec![
                TransformerSpec::Output { arg: 1 },
                TransformerSpec::InputArray { arg: 2, size: 3 },
            ])
        );
        assert!(manifest.has_override("geo::Color"));
        assert!(!manifest.has_override("::geo::Point"));
    }

    #[test]
    fn test_missing_module_name() {
        let err = "[module]\ndeclarations = \"geo.json\""
            .parse::<Manifest>()
            .expect_err("name required");
        assert!(err.to_string().contains("non-empty `name`"));
    }

    #[test]
    fn test_unknown_field_is_a_parse_error() {
        let err = "[module]\nname = \"geo\"\n\n[decls.\"::f\"]\nalais = \"g\""
            .parse::<Manifest>()
            .expect_err("typo rejected");
        assert!(matches!(*err, Error::Parse { .. }));
    }

    #[test]
    fn test_unsupported_indexing_suite() {
        let src = "[module]\nname = \"geo\"\nindexing_suite_version = 3";
        let err = src.parse::<Manifest>().expect_err("version 3");
        match *err {
            Error::UnsupportedIndexingSuite { span, version, .. } => {
                assert_eq!(version, 3);
                assert_eq!(span, Some(SourceSpan::from((22, 22))));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_alias() {
        let err = "[module]\nname = \"geo\"\n\n[decls.\"::geo::Shape\"]\nalias = \"not valid\""
            .parse::<Manifest>()
            .expect_err("alias rejected");
        assert_eq!(err.to_string(), "invalid alias in 'decls.::geo::Shape' 'not valid'");
    }

    #[test]
    fn test_transformer_index_zero() {
        let err = "[module]\nname = \"m\"\n\n[decls.\"::f\"]\ntransformers = [{ kind = \"output\", arg = 0 }]"
            .parse::<Manifest>()
            .expect_err("index 0 rejected");
        assert!(err.to_string().contains("argument indices start at 1"));
    }

    #[test]
    fn test_find_option_span() {
        let src = "[module]\n  max_arity = 0\nname = \"x\"";
        assert_eq!(find_option_span(src, "max_arity"), Some(SourceSpan::from((11, 9))));
        assert_eq!(find_option_span(src, "missing"), None);
    }
}
