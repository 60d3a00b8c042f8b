//! Validation of names that end up in the generated module.

use cxxbind_codegen::naming::is_valid_identifier;
use miette::SourceSpan;

use crate::{Error, Result};

/// Python keywords; an alias spelled like one cannot be used as an attribute.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Parsing and validation context that carries source information.
///
/// Holds the manifest source, its filename and the path of the table being
/// validated, so errors point at the right place.
///
/// # Example
///
/// ```ignore
/// let ctx = ParseContext::new(src, "cxxbind.toml");
/// ctx.validate_name("geometry", "module name")?;
///
/// let nested = ctx.push("decls").push("::geo::Shape");
/// nested.validate_name("Shape2D", "alias")?;
/// ```
#[derive(Debug, Clone)]
pub struct ParseContext<'a> {
    src: &'a str,
    filename: &'a str,
    /// Path segments for nested validation (e.g., ["decls", "::geo::Shape"])
    path: Vec<&'a str>,
}

impl<'a> ParseContext<'a> {
    /// Create a new parse context with the given source and filename.
    pub fn new(src: &'a str, filename: &'a str) -> Self {
        Self {
            src,
            filename,
            path: Vec::new(),
        }
    }

    pub fn src(&self) -> &'a str {
        self.src
    }

    pub fn filename(&self) -> &'a str {
        self.filename
    }

    /// Push a path segment and return a new context.
    pub fn push(&self, segment: &'a str) -> Self {
        let mut path = self.path.clone();
        path.push(segment);
        Self {
            src: self.src,
            filename: self.filename,
            path,
        }
    }

    /// Get the current path as a dot-separated string.
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }

    /// Get a context description for error messages.
    ///
    /// For example: "alias in 'decls.::geo::Shape'" or just "module name".
    pub fn context_for(&self, kind: &str) -> String {
        if self.path.is_empty() {
            kind.to_string()
        } else {
            format!("{} in '{}'", kind, self.path_string())
        }
    }

    /// Find the span of a value in the source.
    pub fn find_span(&self, value: &str) -> Option<SourceSpan> {
        find_value_span(self.src, value)
    }

    /// Find the span of a `[decls."<name>"]` key in the source.
    pub fn find_key_span(&self, name: &str) -> Option<SourceSpan> {
        find_key_span(self.src, name)
    }

    pub fn validation_error(
        &self,
        message: impl Into<String>,
        span: Option<SourceSpan>,
    ) -> Box<Error> {
        Box::new(Error::Validation {
            src: miette::NamedSource::new(self.filename, self.src.to_string()),
            span,
            message: message.into(),
        })
    }

    /// Create an invalid identifier error.
    pub fn invalid_identifier_error(&self, name: &str, kind: &str) -> Box<Error> {
        Box::new(Error::InvalidIdentifier {
            src: miette::NamedSource::new(self.filename, self.src.to_string()),
            span: self.find_span(name),
            name: name.to_string(),
            context: self.context_for(kind),
        })
    }

    /// Validate that a name can be spelled as a Python attribute.
    pub fn validate_name(&self, name: &str, kind: &str) -> Result<()> {
        if !is_valid_identifier(name) || is_python_keyword(name) {
            return Err(self.invalid_identifier_error(name, kind));
        }
        Ok(())
    }
}

pub(crate) fn is_python_keyword(name: &str) -> bool {
    PYTHON_KEYWORDS.contains(&name)
}

/// Find the span of a quoted string value in the TOML source
/// Searches for `"value"` and falls back to the bare text.
pub(crate) fn find_value_span(src: &str, value: &str) -> Option<SourceSpan> {
    let quoted = format!("\"{}\"", value);
    if let Some(pos) = src.find(&quoted) {
        // +1 to skip the opening quote
        return Some(SourceSpan::from((pos + 1, value.len())));
    }
    if value.is_empty() {
        return None;
    }
    src.find(value).map(|pos| SourceSpan::from((pos, value.len())))
}

/// Find the span of a declaration key in the TOML source
/// Searches for patterns like `decls."name"]`, `decls."name".` or `"name" =`
pub(crate) fn find_key_span(src: &str, name: &str) -> Option<SourceSpan> {
    let patterns = [
        format!("decls.\"{}\"", name),
        format!("decls.'{}'", name),
        format!("\"{}\" =", name),
        format!("\"{}\"=", name),
    ];
    for pattern in &patterns {
        if let Some(pos) = src.find(pattern.as_str()) {
            // skip everything up to and including the opening quote
            let start = pos + pattern.find(name).unwrap_or(0);
            return Some(SourceSpan::from((start, name.len())));
        }
    }
    find_value_span(src, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spanned<'a>(src: &'a str, span: SourceSpan) -> &'a str {
        &src[span.offset()..span.offset() + span.len()]
    }

    #[test]
    fn test_find_key_span_table_header() {
        let src = "[decls.\"::geo::Shape\"]\nalias = \"Shape2D\"";
        let span = find_key_span(src, "::geo::Shape").expect("found");
        assert_eq!(span.offset(), 8);
        assert_eq!(spanned(src, span), "::geo::Shape");
    }

    #[test]
    fn test_find_key_span_inline_table() {
        let src = "[decls]\n\"::area\" = { ignore = true }";
        let span = find_key_span(src, "::area").expect("found");
        assert_eq!(spanned(src, span), "::area");
    }

    #[test]
    fn test_find_value_span_prefers_quoted() {
        let src = "[module]\nname = \"geo\"\n[decls.\"::geo::x\"]\nalias = \"geo\"";
        let span = find_value_span(src, "geo").expect("found");
        assert_eq!(span.offset(), 17);
    }

    #[test]
    fn test_python_keywords() {
        assert!(is_python_keyword("lambda"));
        assert!(is_python_keyword("None"));
        assert!(!is_python_keyword("area"));
    }

    #[test]
    fn test_parse_context_push() {
        let ctx = ParseContext::new("", "cxxbind.toml");
        let nested = ctx.push("decls").push("::geo::Shape");
        assert_eq!(nested.path_string(), "decls.::geo::Shape");
        assert_eq!(nested.context_for("alias"), "alias in 'decls.::geo::Shape'");
        assert_eq!(ctx.context_for("module name"), "module name");
    }

    #[test]
    fn test_parse_context_validate_name() {
        let src = "[decls.\"::geo::Shape\"]\nalias = \"class\"";
        let ctx = ParseContext::new(src, "cxxbind.toml");
        assert!(ctx.validate_name("Shape2D", "alias").is_ok());

        let err = ctx.validate_name("class", "alias").expect_err("keyword");
        assert_eq!(err.to_string(), "invalid alias 'class'");
        assert!(ctx.validate_name("2d", "alias").is_err());
        assert!(ctx.validate_name("geo::Shape", "alias").is_err());
    }
}
