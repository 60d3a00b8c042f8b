use std::path::PathBuf;

use cxxbind_decl::GraphError;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result type for manifest operations (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// Source context for error reporting.
///
/// Carries the manifest content and filename so error constructors don't
/// need them threaded through every call.
///
/// # Example
///
/// ```ignore
/// let ctx = SourceContext::new(content, "cxxbind.toml");
/// ctx.validation_error("module name is required");
/// ```
#[derive(Debug, Clone)]
pub struct SourceContext {
    src: String,
    filename: String,
}

impl SourceContext {
    /// Create a new source context.
    pub fn new(src: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            filename: filename.into(),
        }
    }

    /// Get the source content.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Get the filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Create a NamedSource for miette error reporting.
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.filename, self.src.clone())
    }

    /// Create a parse error from a toml error.
    pub fn parse_error(&self, source: toml::de::Error) -> Box<Error> {
        let span = source.span().map(SourceSpan::from);
        Box::new(Error::Parse {
            src: self.named_source(),
            span,
            source,
        })
    }

    /// Create a validation error without a span.
    pub fn validation_error(&self, message: impl Into<String>) -> Box<Error> {
        Box::new(Error::Validation {
            src: self.named_source(),
            span: None,
            message: message.into(),
        })
    }

    /// Create a validation error with a span.
    pub fn validation_error_at(
        &self,
        message: impl Into<String>,
        span: impl Into<SourceSpan>,
    ) -> Box<Error> {
        Box::new(Error::Validation {
            src: self.named_source(),
            span: Some(span.into()),
            message: message.into(),
        })
    }

    /// Create an error for an override table naming no known declaration.
    pub fn unknown_declaration_error(
        &self,
        name: impl Into<String>,
        span: Option<SourceSpan>,
    ) -> Box<Error> {
        Box::new(Error::UnknownDeclaration {
            src: self.named_source(),
            span,
            name: name.into(),
        })
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to read '{path}'")]
    #[diagnostic(help("run from the directory holding cxxbind.toml or pass --config"))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse cxxbind.toml")]
    #[diagnostic(code(cxxbind::parse_error))]
    Parse {
        #[source_code]
        src: NamedSource<String>,
        #[label("parse error here")]
        span: Option<SourceSpan>,
        #[source]
        source: toml::de::Error,
    },

    #[error("{message}")]
    #[diagnostic(code(cxxbind::validation_error))]
    Validation {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: Option<SourceSpan>,
        message: String,
    },

    #[error("invalid {context} '{name}'")]
    #[diagnostic(
        code(cxxbind::invalid_identifier),
        help("Python names use only letters, numbers, and underscores, starting with a letter or underscore.")
    )]
    InvalidIdentifier {
        #[source_code]
        src: NamedSource<String>,
        #[label("not a valid identifier")]
        span: Option<SourceSpan>,
        name: String,
        context: String,
    },

    #[error("unsupported indexing suite version {version}")]
    #[diagnostic(code(cxxbind::indexing_suite), help("valid versions are 1 and 2"))]
    UnsupportedIndexingSuite {
        #[source_code]
        src: NamedSource<String>,
        #[label("unsupported version")]
        span: Option<SourceSpan>,
        version: u8,
    },

    #[error("no declaration named '{name}'")]
    #[diagnostic(
        code(cxxbind::unknown_declaration),
        help("override tables are keyed by fully qualified names, e.g. \"::ns::Class::method\"")
    )]
    UnknownDeclaration {
        #[source_code]
        src: NamedSource<String>,
        #[label("not found in the declaration graph")]
        span: Option<SourceSpan>,
        name: String,
    },

    #[error("[module] has no `declarations` file")]
    #[diagnostic(
        code(cxxbind::missing_declarations),
        help("add `declarations = \"<file>.json\"` pointing at the front end's output")
    )]
    MissingDeclarations,

    #[error("failed to load declarations from '{path}'")]
    #[diagnostic(code(cxxbind::graph_error))]
    Graph {
        path: PathBuf,
        #[source]
        source: GraphError,
    },
}

impl Error {
    /// Create an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Box<Self> {
        Box::new(Error::Io {
            path: path.into(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_carries_span() {
        let ctx = SourceContext::new("[module]\nname = \"\"", "cxxbind.toml");
        let err = ctx.validation_error_at("module name cannot be empty", (9, 4));
        match *err {
            Error::Validation { span, message, .. } => {
                assert_eq!(span, Some(SourceSpan::from((9, 4))));
                assert_eq!(message, "module name cannot be empty");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_declaration_message() {
        let ctx = SourceContext::new("", "cxxbind.toml");
        let err = ctx.unknown_declaration_error("::Missing", None);
        assert_eq!(err.to_string(), "no declaration named '::Missing'");
    }
}
