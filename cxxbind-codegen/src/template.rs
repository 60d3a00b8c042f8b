//! Text substitution with scalar and block variables.
//!
//! Every piece of generated source goes through [`substitute`], so the
//! whitespace rules below apply uniformly:
//!
//! - `$NAME` (or `${NAME}`) is replaced by the value of `NAME`; unknown
//!   names become the empty string.
//! - A block variable standing alone on a line is replaced by its value with
//!   every line indented like the variable. An empty or unknown block drops
//!   the line.
//! - Trailing whitespace is stripped, leading blank lines are dropped and runs
//!   of blank lines collapse to one.
//! - A blank line directly after a line ending in `{` or directly before a
//!   line starting with `}` is removed.

use std::collections::HashMap;

/// One indentation level of generated C++.
pub const INDENT: &str = "    ";

/// A substitution value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Inserted in place, anywhere on a line.
    Scalar(String),
    /// Multi-line text, indented to the depth of the variable.
    Block(String),
}

/// Variables available to a template.
#[derive(Debug, Clone, Default)]
pub struct Vars {
    values: HashMap<String, Value>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_scalar(name, value);
        self
    }

    pub fn block(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_block(name, value);
        self
    }

    pub fn set_scalar(&mut self, name: &str, value: impl Into<String>) {
        self.values
            .insert(name.to_string(), Value::Scalar(value.into()));
    }

    pub fn set_block(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), Value::Block(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Substitute these variables into `template`.
    pub fn substitute(&self, template: &str) -> String {
        substitute(template, self)
    }

    fn text(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(Value::Scalar(s)) | Some(Value::Block(s)) => s,
            None => "",
        }
    }
}

/// Substitute `vars` into `template`.
pub fn substitute(template: &str, vars: &Vars) -> String {
    let mut expanded: Vec<String> = Vec::new();

    for line in template.split('\n') {
        let content = line.trim_start();
        let depth = &line[..line.len() - content.len()];
        if let Some(name) = block_reference(content.trim_end()) {
            match vars.get(name) {
                Some(Value::Block(value)) => {
                    for block_line in value.split('\n').filter(|_| !value.is_empty()) {
                        expanded.push(format!("{}{}", depth, block_line));
                    }
                    continue;
                }
                None => continue,
                Some(Value::Scalar(_)) => {}
            }
        }
        expanded.push(expand_scalars(line, vars));
    }

    tidy(&expanded.join("\n"))
}

/// The variable name when `content` is exactly `$NAME` or `${NAME}`.
fn block_reference(content: &str) -> Option<&str> {
    let rest = content.strip_prefix('$')?;
    let name = match rest.strip_prefix('{') {
        Some(braced) => braced.strip_suffix('}')?,
        None => rest,
    };
    let mut chars = name.chars();
    let first = chars.next()?;
    if (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Some(name)
    } else {
        None
    }
}

fn expand_scalars(line: &str, vars: &Vars) -> String {
    let mut out = String::with_capacity(line.len());
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            if let Some((name, consumed)) = scan_name(&line[i + 1..]) {
                out.push_str(vars.text(name));
                i += 1 + consumed;
                continue;
            }
        }
        let ch = line[i..].chars().next().unwrap_or_default();
        out.push(ch);
        i += ch.len_utf8().max(1);
    }
    out
}

/// Longest identifier at the start of `text`, plain or brace-delimited.
fn scan_name(text: &str) -> Option<(&str, usize)> {
    if let Some(braced) = text.strip_prefix('{') {
        let end = braced.find('}')?;
        let name = &braced[..end];
        return block_reference(&format!("${}", name)).map(|_| (name, end + 2));
    }
    let bytes = text.as_bytes();
    let first = *bytes.first()?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let len = bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
        .count();
    Some((&text[..len], len))
}

fn tidy(code: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in code.split('\n') {
        let line = line.trim_end();
        if line.is_empty() {
            match lines.last() {
                None => continue,
                Some(prev) if prev.is_empty() || prev.ends_with('{') => continue,
                _ => {}
            }
        }
        if line.trim_start().starts_with('}') && lines.last().is_some_and(|prev| prev.is_empty())
        {
            lines.pop();
        }
        lines.push(line);
    }
    lines.join("\n")
}

/// Indent every non-empty line of `text` by `level` steps.
pub fn indent(text: &str, level: usize) -> String {
    let prefix = INDENT.repeat(level);
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
