use std::collections::BTreeMap;

use cxxbind_decl::DeclId;
use indexmap::IndexSet;

use super::{CreateError, CreatorFactory};
use crate::creators::{
    ClassNode, CodeTree, ContainerKind, EnumNode, EnumValue, ExportedValues, GlobalVariableNode,
    IndexingSuiteNode, NodeId, NodeKind, UnnamedEnumNode,
};

/// Container templates that get an indexing suite.
const CONTAINERS: &[(&str, ContainerKind)] =
    &[("vector<", ContainerKind::Vector), ("map<", ContainerKind::Map)];

impl CreatorFactory<'_> {
    pub(super) fn create_enum(
        &mut self,
        tree: &mut CodeTree,
        parent: NodeId,
        id: DeclId,
    ) -> Result<(), CreateError> {
        let graph = self.graph;
        let decl = &graph[id];
        let Some(enumeration) = graph.as_enum(id) else {
            return Ok(());
        };
        let values: Vec<EnumValue> = enumeration
            .value_names()
            .map(|name| EnumValue {
                alias: decl
                    .config
                    .value_aliases
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| name.to_string()),
                full_name: graph.enum_value_full_name(id, name),
            })
            .collect();

        let kind = if decl.name.is_empty() {
            NodeKind::UnnamedEnum(UnnamedEnumNode { values })
        } else {
            let requested = &decl.config.export_values;
            let exported = if requested.is_empty()
                || enumeration.value_names().all(|v| requested.iter().any(|r| r == v))
            {
                ExportedValues::All
            } else {
                ExportedValues::Only(
                    values
                        .iter()
                        .zip(enumeration.value_names())
                        .filter(|(_, name)| requested.iter().any(|r| r == name))
                        .map(|(value, _)| value.alias.clone())
                        .collect(),
                )
            };
            NodeKind::Enum(EnumNode {
                full_name: graph.full_name(id),
                alias: self.alias(id),
                values,
                exported,
            })
        };
        let node = tree.create_for(kind, id);
        tree.adopt(parent, node)?;
        self.exported.push(id);
        Ok(())
    }

    pub(super) fn create_global_variable(
        &mut self,
        tree: &mut CodeTree,
        body: NodeId,
        id: DeclId,
    ) -> Result<(), CreateError> {
        let variable = GlobalVariableNode {
            alias: self.alias(id),
            full_name: self.graph.full_name(id),
        };
        let node = tree.create_for(NodeKind::GlobalVariable(variable), id);
        tree.adopt(body, node)?;
        self.exported.push(id);
        Ok(())
    }

    /// Standard containers used by exported declarations, registered with
    /// an indexing suite ahead of every other registration.
    pub(super) fn create_indexing_suites(
        &mut self,
        tree: &mut CodeTree,
        body: NodeId,
    ) -> Result<(), CreateError> {
        let graph = self.graph;
        let mut containers: BTreeMap<String, (DeclId, ContainerKind)> = BTreeMap::new();
        for id in &self.exported {
            for dependency in graph.i_depend_on_them(*id) {
                let target = dependency.depend_on;
                if !graph.is_class(target) || !graph.is_std_decl(target) {
                    continue;
                }
                let name = &graph[target].name;
                if let Some((_, kind)) = CONTAINERS.iter().find(|(p, _)| name.starts_with(p)) {
                    containers.insert(graph.full_name(target), (target, *kind));
                }
            }
        }

        for (position, (full_name, (id, kind))) in containers.into_iter().enumerate() {
            let class = ClassNode {
                full_name: full_name.clone(),
                alias: self.alias(id),
                exposer: self.exposer(id),
                wrapper: None,
                bases: Vec::new(),
                noncopyable: false,
                no_init: false,
                documentation: None,
                always_expose_using_scope: false,
            };
            let suite = IndexingSuiteNode {
                container: full_name.clone(),
                kind,
                version: self.options.indexing_suite_version,
            };
            let header = suite.header();
            let class = tree.create_for(NodeKind::Class(class), id);
            let suite = tree.create_for(NodeKind::IndexingSuite(suite), id);
            tree.adopt(class, suite)?;
            tree.add_header(class, header)?;
            tree.adopt_at(body, class, position)?;
            tracing::debug!(container = %full_name, "indexing suite registered");
            self.exported.push(id);
        }
        Ok(())
    }

    /// Headers of the bound declarations (or the configured ones), then the
    /// headers generated code asked for.
    pub(super) fn create_includes(&mut self, tree: &mut CodeTree) -> Result<(), CreateError> {
        let mut headers: IndexSet<String> = IndexSet::new();
        if self.options.includes.is_empty() {
            for id in &self.exported {
                let file = &self.graph[*id].location.file;
                if !file.is_empty() && !self.graph.is_std_decl(*id) {
                    headers.insert(file.clone());
                }
            }
        } else {
            headers.extend(self.options.includes.iter().cloned());
        }
        headers.extend(tree.required_headers(tree.root()));
        for header in &headers {
            tree.add_include(header)?;
        }
        Ok(())
    }
}
