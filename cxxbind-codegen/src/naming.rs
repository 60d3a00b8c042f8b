//! Identifier mangling for names the binding layer cannot spell.

use std::collections::HashMap;

/// Character substitutions applied to names that are not identifiers.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("::", "_scope_"),
    ("<", "_less_"),
    (">", "_grate_"),
    (",", "_comma_"),
    (" ", "_"),
    ("\t", "_"),
    ("*", "_ptr_"),
    ("&", "_ref_"),
    ("(", "_obrace_"),
    (")", "_cbrace_"),
    ("[", "_o_sq_brace_"),
    ("]", "_c_sq_brace_"),
    ("=", "_equal_"),
    (".", "_dot_"),
    ("$", "_dollar_"),
];

/// Returns true if `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Turn a C++ name (typically a template instantiation) into a valid identifier.
///
/// ```
/// use cxxbind_codegen::naming::create_valid_name;
///
/// assert_eq!(create_valid_name("vector<int>"), "vector_less_int_grate_");
/// ```
pub fn create_valid_name(name: &str) -> String {
    if is_valid_identifier(name) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() * 2);
    let mut rest = name;
    'scan: while !rest.is_empty() {
        for (from, to) in REPLACEMENTS {
            if let Some(tail) = rest.strip_prefix(from) {
                out.push_str(to);
                rest = tail;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                out.push(ch);
            } else {
                out.push_str(&format!("_{:x}_", ch as u32));
            }
        }
        rest = chars.as_str();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Two distinct names that mangle to the same identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollision {
    pub mangled: String,
    pub first: String,
    pub second: String,
}

/// Caching front end to [`create_valid_name`] for one generation pass.
///
/// Every distinct input is mangled once; inputs that land on an identifier
/// already claimed by a different input are recorded as collisions.
#[derive(Debug, Default)]
pub struct NameMangler {
    cache: HashMap<String, String>,
    owners: HashMap<String, String>,
    collisions: Vec<NameCollision>,
}

impl NameMangler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mangle(&mut self, name: &str) -> String {
        if let Some(cached) = self.cache.get(name) {
            return cached.clone();
        }
        let mangled = create_valid_name(name);
        match self.owners.get(&mangled) {
            Some(owner) if owner != name => {
                tracing::debug!(%mangled, first = %owner, second = %name, "alias collision");
                self.collisions.push(NameCollision {
                    mangled: mangled.clone(),
                    first: owner.clone(),
                    second: name.to_string(),
                });
            }
            Some(_) => {}
            None => {
                self.owners.insert(mangled.clone(), name.to_string());
            }
        }
        self.cache.insert(name.to_string(), mangled.clone());
        mangled
    }

    pub fn collisions(&self) -> &[NameCollision] {
        &self.collisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names_are_unchanged() {
        assert_eq!(create_valid_name("Shape"), "Shape");
        assert_eq!(create_valid_name("_private2"), "_private2");
    }

    #[test]
    fn test_template_instantiation() {
        let name = "vector<int,std::allocator<int> >";
        let mangled = create_valid_name(name);
        assert_eq!(
            mangled,
            "vector_less_int_comma_std_scope_allocator_less_int_grate___grate_"
        );
        assert!(is_valid_identifier(&mangled));
        assert_eq!(create_valid_name(name), mangled);
    }

    #[test]
    fn test_mangler_reports_collisions() {
        let mut mangler = NameMangler::new();
        let a = mangler.mangle("vector<int>");
        let b = mangler.mangle("vector_less_int_grate_");
        assert_eq!(a, b);
        assert_eq!(mangler.collisions().len(), 1);

        mangler.mangle("vector<int>");
        assert_eq!(mangler.collisions().len(), 1);
    }

    #[test]
    fn test_unlisted_characters() {
        let mangled = create_valid_name("operator-");
        assert!(is_valid_identifier(&mangled));
        assert!(is_valid_identifier(&create_valid_name("1st")));
    }
}
