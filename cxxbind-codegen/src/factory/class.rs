use cxxbind_decl::{Access, CallableKind, CallPolicy, DeclId, DeclKind, Virtuality};

use super::{CreateError, CreatorFactory, calldef::defaults_start};
use crate::{
    creators::{
        AccessorNode, ClassNode, ClassWrapperNode, CodeTree, ConstructorNode,
        ConstructorWrapperNode, ConversionNode, CustomTextNode, MemberVariableNode, NodeId,
        NodeKind, PropertyNode, SpecialConstructorNode,
    },
    exportability::{self, CALL_OPERATORS},
    ordering,
};

impl CreatorFactory<'_> {
    /// Register `class` under `parent` (the module body or an enclosing
    /// class) and create everything it contains.
    pub(super) fn create_class(
        &mut self,
        tree: &mut CodeTree,
        parent: NodeId,
        class: DeclId,
    ) -> Result<(), CreateError> {
        let graph = self.graph;
        let decl = &graph[class];
        let Some(class_decl) = graph.as_class(class) else {
            return Ok(());
        };

        let bases = class_decl
            .bases
            .iter()
            .filter(|base| {
                base.access == Access::Public
                    && !graph.is_std_decl(base.class)
                    && self.is_exportable(base.class)
            })
            .map(|base| graph.full_name(base.class))
            .collect();
        let node = ClassNode {
            full_name: graph.full_name(class),
            alias: self.alias(class),
            exposer: self.exposer(class),
            wrapper: None,
            bases,
            noncopyable: graph.is_noncopyable(class),
            no_init: false,
            documentation: decl.config.documentation.clone(),
            always_expose_using_scope: self.options.always_expose_using_scope
                || decl.config.always_expose_using_scope,
        };
        let node = tree.create_for(NodeKind::Class(node), class);
        tree.adopt(parent, node)?;
        self.class_nodes.insert(class, node);
        self.exported.push(class);

        let members: Vec<DeclId> = exportability::candidate_members(graph, class)
            .into_iter()
            .filter(|m| self.is_exportable(*m))
            .collect();
        for member in ordering::order(graph, &members).declarations {
            self.create_member(tree, class, node, member)?;
        }
        self.create_inherited_members(tree, class, node)?;

        if !decl.config.wrapper_code.is_empty() {
            let wrapper = self.ensure_wrapper(tree, class)?;
            for code in &decl.config.wrapper_code {
                let text = tree.create(NodeKind::CustomText(CustomTextNode {
                    text: code.clone(),
                    works_on_instance: false,
                }));
                tree.adopt(wrapper, text)?;
            }
        }
        self.create_constructors(tree, class, node)?;
        self.create_static_methods(tree, node)?;
        for code in &decl.config.code {
            let text = tree.create(NodeKind::CustomText(CustomTextNode {
                text: code.clone(),
                works_on_instance: true,
            }));
            tree.adopt(node, text)?;
        }

        let no_init = !self.is_default_constructible(class)
            || (graph.is_abstract(class) && !self.wrappers.contains_key(&class));
        if let NodeKind::Class(payload) = tree.kind_mut(node)? {
            payload.no_init = no_init;
        }
        Ok(())
    }

    fn create_member(
        &mut self,
        tree: &mut CodeTree,
        class: DeclId,
        node: NodeId,
        member: DeclId,
    ) -> Result<(), CreateError> {
        let graph = self.graph;
        match &graph[member].kind {
            DeclKind::Class(_) => self.create_class(tree, node, member),
            DeclKind::Enum(_) => self.create_enum(tree, node, member),
            DeclKind::Variable(_) => self.create_member_variable(tree, class, node, member),
            DeclKind::Callable(c) => match &c.kind {
                CallableKind::Constructor { .. } | CallableKind::Destructor => Ok(()),
                CallableKind::CastingOperator => self.create_casting_operator(tree, node, member),
                CallableKind::MemberOperator { symbol }
                    if !CALL_OPERATORS.iter().any(|(s, _)| *s == symbol.as_str()) =>
                {
                    self.create_member_operator(tree, class, node, member)
                }
                _ => self.create_method(tree, class, node, member),
            },
            DeclKind::Namespace { .. } | DeclKind::Typedef { .. } => Ok(()),
        }
    }

    /// Virtual and protected functions of base classes that `class` does not
    /// redeclare. The wrapper must override them so that the dispatch
    /// reaches Python subclasses, and abstract bases stay implementable.
    fn create_inherited_members(
        &mut self,
        tree: &mut CodeTree,
        class: DeclId,
        node: NodeId,
    ) -> Result<(), CreateError> {
        let graph = self.graph;
        let mut seen: Vec<DeclId> = graph
            .members(class)
            .iter()
            .copied()
            .filter(|m| graph.as_callable(*m).is_some())
            .collect();

        for base in graph.recursive_bases(class) {
            for member in graph.members(base) {
                let Some(callable) = graph.as_callable(*member) else {
                    continue;
                };
                if callable.kind != CallableKind::MemberFunction {
                    continue;
                }
                let access = graph[*member].access;
                let keep = match (access, callable.virtuality) {
                    (Access::Public, Virtuality::NotVirtual) => false,
                    (Access::Private, virtuality) => virtuality == Virtuality::PureVirtual,
                    _ => true,
                };
                if !keep
                    || !self.is_exportable(*member)
                    || seen.iter().any(|s| graph.same_signature(*s, *member))
                {
                    continue;
                }
                seen.push(*member);
                tracing::trace!(
                    class = %graph.full_name(class),
                    member = %graph.full_name(*member),
                    "inherited member redefined"
                );
                self.create_method(tree, class, node, *member)?;
            }
        }
        Ok(())
    }

    /// The wrapper class of `class`, created on first use.
    pub(super) fn ensure_wrapper(
        &mut self,
        tree: &mut CodeTree,
        class: DeclId,
    ) -> Result<NodeId, CreateError> {
        if let Some(wrapper) = self.wrappers.get(&class) {
            return Ok(*wrapper);
        }
        let alias = format!("{}_wrapper", self.exposer(class));
        let class_full_name = self.graph.full_name(class);
        tracing::debug!(class = %class_full_name, wrapper = %alias, "wrapper class needed");

        let wrapper = tree.create_for(
            NodeKind::ClassWrapper(ClassWrapperNode {
                alias: alias.clone(),
                full_name: alias.clone(),
                class_full_name,
            }),
            class,
        );
        tree.adopt_before_body(wrapper)?;
        if let Some(node) = self.class_nodes.get(&class)
            && let NodeKind::Class(payload) = tree.kind_mut(*node)?
        {
            payload.wrapper = Some(alias);
        }
        self.wrappers.insert(class, wrapper);
        Ok(wrapper)
    }

    /// Full name of the wrapper of `class`, creating it if needed.
    pub(super) fn wrapper_name(
        &mut self,
        tree: &mut CodeTree,
        class: DeclId,
    ) -> Result<String, CreateError> {
        let wrapper = self.ensure_wrapper(tree, class)?;
        match tree.kind(wrapper) {
            Some(NodeKind::ClassWrapper(payload)) => Ok(payload.full_name.clone()),
            _ => Err(CreateError::Tree(crate::creators::TreeError::UnknownNode(wrapper))),
        }
    }

    /// A class is default constructible from Python when it has a public
    /// destructor and either no constructors or a public one without
    /// arguments.
    fn is_default_constructible(&self, class: DeclId) -> bool {
        let graph = self.graph;
        if !graph.has_public_destructor(class) {
            return false;
        }
        let constructors: Vec<DeclId> = graph
            .constructors(class)
            .into_iter()
            .filter(|c| graph.as_callable(*c).is_some_and(|c| !c.is_copy_constructor()))
            .collect();
        constructors.is_empty()
            || constructors.iter().any(|c| {
                graph[*c].access == Access::Public
                    && graph.as_callable(*c).is_some_and(|c| c.arguments.is_empty())
            })
    }

    /// `init< ... >` registrations, constructor forwarders in the wrapper,
    /// and optional implicit conversions. Registrations go first among the
    /// class children.
    fn create_constructors(
        &mut self,
        tree: &mut CodeTree,
        class: DeclId,
        node: NodeId,
    ) -> Result<(), CreateError> {
        let graph = self.graph;
        let class_full_name = graph.full_name(class);
        let wrapper = self.wrappers.get(&class).copied();
        let abstract_without_wrapper = graph.is_abstract(class) && wrapper.is_none();
        let wrapper_alias = match wrapper.and_then(|w| tree.kind(w)) {
            Some(NodeKind::ClassWrapper(payload)) => Some(payload.alias.clone()),
            _ => None,
        };

        let mut position = 0;
        let mut forwarders = Vec::new();
        let mut explicit_trivial = false;
        for ctor in graph.constructors(class) {
            let decl = &graph[ctor];
            let Some(callable) = graph.as_callable(ctor) else {
                continue;
            };
            if decl.access != Access::Public
                || callable.is_copy_constructor()
                || decl.is_artificial
                || !self.is_exportable(ctor)
            {
                continue;
            }
            if let Some(alias) = &wrapper_alias {
                forwarders.push(NodeKind::ConstructorWrapper(ConstructorWrapperNode {
                    wrapper_alias: alias.clone(),
                    class_full_name: class_full_name.clone(),
                    args: self.shim_args(callable),
                }));
            }
            if callable.arguments.is_empty() {
                explicit_trivial = true;
                continue;
            }
            if abstract_without_wrapper {
                continue;
            }
            let Some(policy) = self.resolver.resolve(graph, ctor) else {
                self.warn(ctor, "missing call policy, the constructor is not exposed");
                continue;
            };

            let optional_from = if decl.config.use_default_arguments {
                defaults_start(&callable.arguments)
            } else {
                None
            };
            let ctor_node = ConstructorNode {
                arg_types: callable
                    .arguments
                    .iter()
                    .map(|a| a.ty.decl_string(graph))
                    .collect(),
                optional_from,
                keywords: self.keywords(ctor, callable),
                call_policy: policy,
                documentation: decl.config.documentation.clone(),
            };
            let ctor_node = tree.create_for(NodeKind::Constructor(ctor_node), ctor);
            tree.adopt_at(node, ctor_node, position)?;
            position += 1;
            self.exported.push(ctor);

            if self.options.create_casting_constructor
                && callable.arguments.len() == 1
                && !matches!(
                    callable.kind,
                    CallableKind::Constructor {
                        is_explicit: true,
                        ..
                    }
                )
            {
                let from = callable.arguments[0]
                    .ty
                    .remove_reference()
                    .remove_cv()
                    .decl_string(graph);
                let conversion = tree.create_for(
                    NodeKind::ImplicitConversion(ConversionNode {
                        from,
                        to: class_full_name.clone(),
                    }),
                    ctor,
                );
                tree.adopt(node, conversion)?;
            }
        }

        let (Some(wrapper), Some(alias)) = (wrapper, wrapper_alias) else {
            return Ok(());
        };
        let special = SpecialConstructorNode {
            wrapper_alias: alias,
            class_full_name,
        };
        if !explicit_trivial && self.is_default_constructible(class) {
            forwarders.insert(0, NodeKind::NullConstructorWrapper(special.clone()));
        }
        if graph.has_trivial_copy(class) && !graph.is_noncopyable(class) {
            forwarders.push(NodeKind::CopyConstructorWrapper(special));
        }
        for (index, kind) in forwarders.into_iter().enumerate() {
            let forwarder = tree.create_for(kind, class);
            tree.adopt_at(wrapper, forwarder, index)?;
        }
        Ok(())
    }

    /// `staticmethod( "name" )` statements, once per name, after every other
    /// class member.
    fn create_static_methods(&mut self, tree: &mut CodeTree, node: NodeId) -> Result<(), CreateError> {
        for alias in self.static_methods.remove(&node).unwrap_or_default() {
            let statement = tree.create(NodeKind::StaticMethod(alias));
            tree.adopt(node, statement)?;
        }
        Ok(())
    }

    pub(super) fn request_static_method(&mut self, node: NodeId, alias: &str) {
        let names = self.static_methods.entry(node).or_default();
        if !names.iter().any(|n| n == alias) {
            names.push(alias.to_string());
        }
    }

    fn create_member_variable(
        &mut self,
        tree: &mut CodeTree,
        class: DeclId,
        node: NodeId,
        id: DeclId,
    ) -> Result<(), CreateError> {
        let graph = self.graph;
        let decl = &graph[id];
        let Some(var) = graph.as_variable(id) else {
            return Ok(());
        };
        let alias = self.alias(id);
        let points_to_class = var.ty.is_pointer() && var.ty.pointee().is_some_and(|p| graph.is_class_type(p));

        if var.bits.is_none() && !points_to_class {
            let member = tree.create_for(
                NodeKind::MemberVariable(MemberVariableNode {
                    alias,
                    full_name: graph.full_name(id),
                    readonly: var.ty.is_const(),
                    documentation: decl.config.documentation.clone(),
                }),
                id,
            );
            tree.adopt(node, member)?;
            self.exported.push(id);
            return Ok(());
        }

        let wrapper_name = self.wrapper_name(tree, class)?;
        let wrapper = self.ensure_wrapper(tree, class)?;
        let readonly = var.ty.is_const();
        let accessor = AccessorNode {
            member: decl.name.clone(),
            class_full_name: graph.full_name(class),
            ty: var.ty.remove_cv().decl_string(graph),
            readonly,
            is_static: var.is_static,
        };
        let property = PropertyNode {
            alias,
            getter: format!("{}::{}", wrapper_name, accessor.getter_name()),
            setter: (!readonly).then(|| format!("{}::{}", wrapper_name, accessor.setter_name())),
            getter_policy: if points_to_class {
                CallPolicy::ReturnInternalReference
            } else {
                CallPolicy::Default
            },
            is_static: var.is_static,
        };
        let accessor = tree.create_for(NodeKind::Accessor(accessor), id);
        tree.adopt(wrapper, accessor)?;
        let property = tree.create_for(NodeKind::Property(property), id);
        tree.adopt(node, property)?;
        self.exported.push(id);
        Ok(())
    }
}
