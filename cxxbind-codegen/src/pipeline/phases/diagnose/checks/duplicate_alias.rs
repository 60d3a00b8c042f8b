//! Check for two declarations exposed under one name.

use std::collections::{BTreeMap, BTreeSet};

use cxxbind_decl::{DeclId, DeclKind};

use super::super::Check;
use crate::pipeline::{CompilationContext, Diagnostic};

/// Check that warns when classes, enumerations or variables of one scope
/// share a Python name. Functions are exempt: a shared name is an overload.
pub struct DuplicateAliasCheck;

impl Check for DuplicateAliasCheck {
    fn name(&self) -> &'static str {
        "duplicate-alias"
    }

    fn description(&self) -> &'static str {
        "Detect declarations of one scope exposed under the same name"
    }

    fn check(&self, ctx: &CompilationContext, diagnostics: &mut Vec<Diagnostic>) {
        let graph = &ctx.graph;
        let mut seen: BTreeMap<(Option<DeclId>, &str), DeclId> = BTreeMap::new();
        let mut reported = BTreeSet::new();

        for id in &ctx.exported {
            let decl = &graph[*id];
            if !matches!(
                decl.kind,
                DeclKind::Class(_) | DeclKind::Enum(_) | DeclKind::Variable(_)
            ) || decl.name.is_empty()
                || graph.is_std_decl(*id)
            {
                continue;
            }
            let alias = graph.alias(*id);
            match seen.get(&(decl.parent, alias)) {
                Some(first) if first != id => {
                    if reported.insert(*id) {
                        diagnostics.push(
                            Diagnostic::warning(
                                "diagnose",
                                format!(
                                    "alias '{}' is used by both {} and {}",
                                    alias,
                                    graph.full_name(*first),
                                    graph.full_name(*id)
                                ),
                            )
                            .at(graph.full_name(*id)),
                        );
                    }
                }
                Some(_) => {}
                None => {
                    seen.insert((decl.parent, alias), *id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use cxxbind_decl::{CppType, DeclGraph, Fundamental};

    use super::*;
    use crate::options::ModuleOptions;

    #[test]
    fn test_renamed_into_each_other() {
        let mut graph = DeclGraph::new();
        let point = graph.add_class(DeclGraph::ROOT, "Point");
        let vector = graph.add_class(DeclGraph::ROOT, "Vector");
        graph[vector].config.alias = Some("Point".to_string());
        let x = graph.add_variable(point, "x", CppType::fundamental(Fundamental::Int));
        let y = graph.add_variable(vector, "x", CppType::fundamental(Fundamental::Int));

        let mut ctx = CompilationContext::new(graph, ModuleOptions::new("m"));
        ctx.exported = vec![point, x, vector, y, vector];

        let mut diagnostics = Vec::new();
        DuplicateAliasCheck.check(&ctx, &mut diagnostics);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].location.as_deref(), Some("::Vector"));
        assert_eq!(
            diagnostics[0].message,
            "alias 'Point' is used by both ::Point and ::Vector"
        );
    }
}
