use cxxbind_decl::{
    Access, Argument, CallableDecl, CppType, DeclGraph, DeclId, Fundamental, Virtuality,
};

use super::{CreateError, CreatorFactory};
use crate::{
    creators::{
        ArgPassing, CastingMemberOperatorNode, CodeTree, ConversionNode, Keyword, KeywordDefault,
        MakerNode, MakerStyle, NodeId, NodeKind, Operand, OperatorNode, ShimArg, ShimKind,
        ShimNode, TransformedKind, TransformedNode,
    },
    exportability::CALL_OPERATORS,
    transformers::Transformation,
};

/// How a member function reaches Python.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exposure {
    /// Registered by address, no wrapper involved.
    Direct,
    Shim(ShimKind),
    /// Private and not pure virtual.
    Hidden,
}

fn exposure(access: Access, callable: &CallableDecl) -> Exposure {
    use Virtuality::*;
    match (access, callable.virtuality, callable.is_static) {
        (Access::Private, PureVirtual, _) => Exposure::Shim(ShimKind::PrivatePureVirtual),
        (Access::Private, ..) => Exposure::Hidden,
        (Access::Public, NotVirtual, _) => Exposure::Direct,
        (Access::Public, Virtual, _) => Exposure::Shim(ShimKind::Virtual),
        (Access::Public, PureVirtual, _) => Exposure::Shim(ShimKind::PureVirtual),
        (Access::Protected, _, true) => Exposure::Shim(ShimKind::ProtectedStatic),
        (Access::Protected, NotVirtual, false) => Exposure::Shim(ShimKind::Protected),
        (Access::Protected, Virtual, false) => Exposure::Shim(ShimKind::ProtectedVirtual),
        (Access::Protected, PureVirtual, false) => Exposure::Shim(ShimKind::ProtectedPureVirtual),
    }
}

/// Index of the first argument of the trailing run of defaulted arguments.
pub(super) fn defaults_start(args: &[Argument]) -> Option<usize> {
    let count = args
        .iter()
        .rev()
        .take_while(|a| a.default_value.is_some())
        .count();
    (count > 0).then(|| args.len() - count)
}

fn argument_name(index: usize, arg: &Argument) -> String {
    if arg.name.is_empty() {
        format!("p{}", index)
    } else {
        arg.name.clone()
    }
}

/// `R (*)( A,B )`, or `R ( C::* )( A,B ) const` when `owner` is set.
fn signature(graph: &DeclGraph, callable: &CallableDecl, owner: Option<&str>) -> String {
    let ret = callable.return_type_or_void().decl_string(graph);
    let args: Vec<String> = callable
        .arguments
        .iter()
        .map(|a| a.ty.decl_string(graph))
        .collect();
    match owner {
        Some(owner) => format!(
            "{} ( {}::* )( {} ){}",
            ret,
            owner,
            args.join(","),
            if callable.is_const { " const" } else { "" }
        ),
        None => format!("{} (*)( {} )", ret, args.join(",")),
    }
}

impl CreatorFactory<'_> {
    /// Python name of a member function. Call operators get their special
    /// method names unless the user chose one.
    fn method_alias(&mut self, id: DeclId) -> String {
        let decl = &self.graph[id];
        if decl.config.alias.is_none()
            && let Some(symbol) = self.graph.as_callable(id).and_then(|c| c.kind.symbol())
            && let Some((_, name)) = CALL_OPERATORS.iter().find(|(s, _)| *s == symbol)
        {
            return name.to_string();
        }
        self.alias(id)
    }

    pub(super) fn shim_args(&self, callable: &CallableDecl) -> Vec<ShimArg> {
        let graph = self.graph;
        callable
            .arguments
            .iter()
            .enumerate()
            .map(|(i, arg)| {
                let ty = &arg.ty;
                let passing = if ty.is_reference()
                    && !ty.is_const_reference()
                    && ty.remove_reference().declared().is_some_and(|d| graph.is_class(d))
                {
                    ArgPassing::Ref
                } else if ty.is_pointer() && ty.pointee().is_some_and(|p| graph.is_class_type(p)) {
                    ArgPassing::Ptr
                } else {
                    ArgPassing::Value
                };
                ShimArg {
                    name: argument_name(i, arg),
                    ty: ty.decl_string(graph),
                    default_value: arg.default_value.clone(),
                    passing,
                }
            })
            .collect()
    }

    fn keyword_default(&self, arg: &Argument, value: &str) -> KeywordDefault {
        if arg.has_null_pointer_default() {
            return KeywordDefault::NoneObject;
        }
        match arg.ty.as_fundamental() {
            Some(f) if f.is_integral() => {
                KeywordDefault::Literal(format!("({})({})", f.as_str(), value))
            }
            _ => KeywordDefault::Literal(value.to_string()),
        }
    }

    fn keywords_for(&self, id: DeclId, args: &[Argument], leading_self: bool) -> Vec<Keyword> {
        let config = &self.graph[id].config;
        if !config.use_keywords || args.is_empty() {
            return Vec::new();
        }
        let start = if config.use_default_arguments {
            defaults_start(args)
        } else {
            None
        };
        let mut keywords: Vec<Keyword> = Vec::new();
        if leading_self {
            keywords.push(Keyword {
                name: "self".to_string(),
                default_value: None,
            });
        }
        for (i, arg) in args.iter().enumerate() {
            let default_value = match (start, &arg.default_value) {
                (Some(start), Some(value)) if i >= start => Some(self.keyword_default(arg, value)),
                _ => None,
            };
            keywords.push(Keyword {
                name: argument_name(i, arg),
                default_value,
            });
        }
        keywords
    }

    /// `bp::arg(...)` list of a callable.
    pub(super) fn keywords(&self, id: DeclId, callable: &CallableDecl) -> Vec<Keyword> {
        self.keywords_for(id, &callable.arguments, false)
    }

    fn needs_signature(&self, id: DeclId) -> bool {
        self.graph[id].config.create_with_signature || !self.graph.overloads(id).is_empty()
    }

    /// Register a member function of `class`. `id` may be declared in a base
    /// class when it is redefined by the wrapper.
    pub(super) fn create_method(
        &mut self,
        tree: &mut CodeTree,
        class: DeclId,
        node: NodeId,
        id: DeclId,
    ) -> Result<(), CreateError> {
        let graph = self.graph;
        let decl = &graph[id];
        let Some(callable) = graph.as_callable(id) else {
            return Ok(());
        };
        let exposure = exposure(decl.access, callable);
        if exposure == Exposure::Hidden {
            return Ok(());
        }
        if !decl.config.transformers.is_empty() {
            return self.create_transformed_method(tree, class, node, id, exposure);
        }

        let alias = self.method_alias(id);
        let full_name = graph.full_name(id);
        let declaring = graph.parent(id).unwrap_or(class);
        let declaring_name = graph.full_name(declaring);

        let mut wrapper = None;
        if let Exposure::Shim(kind) = exposure {
            let wrapper_name = self.wrapper_name(tree, class)?;
            let wrapper_node = self.ensure_wrapper(tree, class)?;
            let ret = callable.return_type_or_void();
            let shim = ShimNode {
                kind,
                name: decl.name.clone(),
                alias: alias.clone(),
                class_full_name: declaring_name.clone(),
                return_type: ret.decl_string(graph),
                returns_void: ret.is_void(),
                returns_reference: ret.is_reference(),
                args: self.shim_args(callable),
                is_const: callable.is_const,
            };
            tracing::trace!(function = %full_name, shim = kind.describe(), "shim created");
            let shim = tree.create_for(NodeKind::Shim(shim), id);
            tree.adopt(wrapper_node, shim)?;
            if kind == ShimKind::PrivatePureVirtual {
                return Ok(());
            }
            wrapper = Some(wrapper_name);
        }

        let Some(call_policy) = self.resolver.resolve(graph, id) else {
            self.warn(id, "missing call policy, the function is not exposed");
            return Ok(());
        };

        let with_signature = self.needs_signature(id);
        let own_signature = |owner: &str| {
            with_signature.then(|| {
                signature(graph, callable, (!callable.is_static).then_some(owner))
            })
        };
        let wrapper_name = wrapper.unwrap_or_default();
        let (style, function, signature) = match exposure {
            Exposure::Shim(ShimKind::Virtual) => (
                MakerStyle::Virtual {
                    default_function: format!("{}::default_{}", wrapper_name, alias),
                    default_signature: own_signature(&wrapper_name),
                },
                full_name.clone(),
                own_signature(&declaring_name),
            ),
            Exposure::Shim(ShimKind::PureVirtual) => (
                MakerStyle::PureVirtual,
                full_name.clone(),
                own_signature(&declaring_name),
            ),
            Exposure::Shim(ShimKind::Protected | ShimKind::ProtectedStatic) => (
                MakerStyle::Member,
                format!("{}::{}", wrapper_name, decl.name),
                own_signature(&wrapper_name),
            ),
            Exposure::Shim(ShimKind::ProtectedVirtual) => (
                MakerStyle::Member,
                format!("{}::default_{}", wrapper_name, alias),
                own_signature(&wrapper_name),
            ),
            Exposure::Shim(ShimKind::ProtectedPureVirtual) => (
                MakerStyle::PureVirtual,
                format!("{}::{}", wrapper_name, decl.name),
                own_signature(&wrapper_name),
            ),
            Exposure::Direct | Exposure::Hidden | Exposure::Shim(ShimKind::PrivatePureVirtual) => {
                (MakerStyle::Member, full_name.clone(), own_signature(&declaring_name))
            }
        };

        let maker = MakerNode {
            style,
            alias: alias.clone(),
            full_name,
            function,
            signature,
            keywords: self.keywords(id, callable),
            call_policy,
            documentation: decl.config.documentation.clone(),
        };
        let maker = tree.create_for(NodeKind::Maker(maker), id);
        tree.adopt(node, maker)?;
        if callable.is_static {
            self.request_static_method(node, &alias);
        }
        self.exported.push(id);
        Ok(())
    }

    /// Member function with argument transformers: the wrapper gets a static
    /// function with the transformed signature, and virtual functions also
    /// get an override that converts the Python results back.
    fn create_transformed_method(
        &mut self,
        tree: &mut CodeTree,
        class: DeclId,
        node: NodeId,
        id: DeclId,
        exposure: Exposure,
    ) -> Result<(), CreateError> {
        let graph = self.graph;
        let decl = &graph[id];
        let Some(callable) = graph.as_callable(id) else {
            return Ok(());
        };
        let full_name = graph.full_name(id);
        let alias = self.method_alias(id);
        let declaring_name = graph.full_name(graph.parent(id).unwrap_or(class));
        let wrapper_name = self.wrapper_name(tree, class)?;
        let wrapper = self.ensure_wrapper(tree, class)?;

        let transformation =
            Transformation::new(graph, &full_name, callable, &decl.config.transformers)?;
        for header in transformation.required_headers() {
            tree.add_header(wrapper, header)?;
        }

        let plain_shim = |kind: ShimKind| {
            let ret = callable.return_type_or_void();
            ShimNode {
                kind,
                name: decl.name.clone(),
                alias: alias.clone(),
                class_full_name: declaring_name.clone(),
                return_type: ret.decl_string(graph),
                returns_void: ret.is_void(),
                returns_reference: ret.is_reference(),
                args: self.shim_args(callable),
                is_const: callable.is_const,
            }
        };

        let (base_name, self_type, call_target) = match exposure {
            Exposure::Hidden => return Ok(()),
            Exposure::Shim(ShimKind::PrivatePureVirtual) => {
                let shim = tree.create_for(NodeKind::Shim(plain_shim(ShimKind::PrivatePureVirtual)), id);
                tree.adopt(wrapper, shim)?;
                return Ok(());
            }
            Exposure::Shim(kind @ (ShimKind::PureVirtual | ShimKind::ProtectedPureVirtual)) => {
                let shim = tree.create_for(NodeKind::Shim(plain_shim(kind)), id);
                tree.adopt(wrapper, shim)?;
                let self_type = if kind == ShimKind::PureVirtual {
                    declaring_name.clone()
                } else {
                    wrapper_name.clone()
                };
                (
                    format!("_py_{}", alias),
                    Some(self_type),
                    format!("self.{}", decl.name),
                )
            }
            Exposure::Shim(ShimKind::Virtual | ShimKind::ProtectedVirtual) => {
                let base_args: Vec<String> = callable
                    .arguments
                    .iter()
                    .enumerate()
                    .map(|(i, arg)| argument_name(i, arg))
                    .collect();
                let ret = callable.return_type_or_void();
                let dispatch = TransformedNode {
                    kind: TransformedKind::Virtual {
                        class_full_name: declaring_name.clone(),
                        base_args: base_args.join(", "),
                        is_const: callable.is_const,
                        returns_void: ret.is_void(),
                    },
                    name: decl.name.clone(),
                    alias: alias.clone(),
                    code: transformation.virtual_code(),
                };
                let dispatch = tree.create_for(NodeKind::Transformed(dispatch), id);
                tree.adopt(wrapper, dispatch)?;
                (
                    format!("default_{}", alias),
                    Some(wrapper_name.clone()),
                    format!("self.{}::{}", declaring_name, decl.name),
                )
            }
            Exposure::Direct | Exposure::Shim(ShimKind::Protected | ShimKind::ProtectedStatic) => {
                let self_type = match exposure {
                    _ if callable.is_static => None,
                    Exposure::Direct => Some(declaring_name.clone()),
                    _ => Some(wrapper_name.clone()),
                };
                let call_target = if callable.is_static {
                    full_name.clone()
                } else {
                    format!("self.{}", decl.name)
                };
                (format!("_py_{}", alias), self_type, call_target)
            }
        };

        let native_result = transformation.state().native_result();
        let Some(call_policy) = self.resolver.resolve_exposed(graph, id, native_result) else {
            self.warn(id, "missing call policy, the function is not exposed");
            return Ok(());
        };

        let name = self.unique_name(&wrapper_name, &base_name);
        let function = TransformedNode {
            kind: TransformedKind::Function { call_target },
            name: name.clone(),
            alias: alias.clone(),
            code: transformation.wrapper_code(self_type.as_deref()),
        };
        let function = tree.create_for(NodeKind::Transformed(function), id);
        tree.adopt(wrapper, function)?;

        let params: Vec<Argument> = transformation
            .state()
            .exposed_params()
            .map(|p| Argument {
                name: p.name.clone(),
                ty: p.ty.clone(),
                default_value: p.default_value.clone(),
            })
            .collect();
        let maker = MakerNode {
            style: MakerStyle::Member,
            alias: alias.clone(),
            full_name,
            function: format!("{}::{}", wrapper_name, name),
            signature: None,
            keywords: self.keywords_for(id, &params, self_type.is_some()),
            call_policy,
            documentation: decl.config.documentation.clone(),
        };
        let maker = tree.create_for(NodeKind::Maker(maker), id);
        tree.adopt(node, maker)?;
        if callable.is_static {
            self.request_static_method(node, &alias);
        }
        self.exported.push(id);
        Ok(())
    }

    /// `def( bp::self + bp::other< T >() )` and friends.
    pub(super) fn create_member_operator(
        &mut self,
        tree: &mut CodeTree,
        class: DeclId,
        node: NodeId,
        id: DeclId,
    ) -> Result<(), CreateError> {
        let graph = self.graph;
        let Some(callable) = graph.as_callable(id) else {
            return Ok(());
        };
        let Some(symbol) = callable.kind.symbol() else {
            return Ok(());
        };
        if graph[id].access != Access::Public {
            return Ok(());
        }
        let operator = OperatorNode {
            symbol: symbol.to_string(),
            left: Operand::SelfRef,
            right: callable
                .arguments
                .first()
                .map(|arg| self.operand(class, &arg.ty)),
        };
        let operator = tree.create_for(NodeKind::Operator(operator), id);
        tree.adopt(node, operator)?;
        self.exported.push(id);
        Ok(())
    }

    /// `bp::self` when `ty` is the class itself, `bp::other< T >()` otherwise.
    fn operand(&self, class: DeclId, ty: &CppType) -> Operand {
        let value = ty.remove_reference().remove_cv();
        match value {
            CppType::Declared(id) if *id == class => Operand::SelfRef,
            other => Operand::Other(other.decl_string(self.graph)),
        }
    }

    /// Free operators are registered on the class of their first class
    /// operand that is part of the module.
    pub(super) fn create_free_operator(
        &mut self,
        tree: &mut CodeTree,
        id: DeclId,
    ) -> Result<(), CreateError> {
        let graph = self.graph;
        let Some(callable) = graph.as_callable(id) else {
            return Ok(());
        };
        let Some(symbol) = callable.kind.symbol() else {
            return Ok(());
        };
        let owner = callable.arguments.iter().find_map(|arg| match arg.ty.remove_reference().remove_cv() {
            CppType::Declared(class) => self.class_nodes.get(class).map(|node| (*class, *node)),
            _ => None,
        });
        let Some((class, node)) = owner else {
            self.warn(id, "free operator has no exported class operand");
            return Ok(());
        };

        let mut operands = callable.arguments.iter().map(|arg| self.operand(class, &arg.ty));
        let Some(left) = operands.next() else {
            return Ok(());
        };
        let operator = OperatorNode {
            symbol: symbol.to_string(),
            left,
            right: operands.next(),
        };
        let operator = tree.create_for(NodeKind::Operator(operator), id);
        tree.adopt(node, operator)?;
        self.exported.push(id);
        Ok(())
    }

    /// Conversion operators: `__int__`, `__float__` and `__str__` for the
    /// targets Python knows, an implicit conversion for anything else.
    pub(super) fn create_casting_operator(
        &mut self,
        tree: &mut CodeTree,
        node: NodeId,
        id: DeclId,
    ) -> Result<(), CreateError> {
        let graph = self.graph;
        let Some(callable) = graph.as_callable(id) else {
            return Ok(());
        };
        if graph[id].access != Access::Public {
            return Ok(());
        }
        let target = callable.return_type_or_void();
        let spelled = target.remove_reference().remove_cv().decl_string(graph);
        let alias = match target.remove_reference().as_fundamental() {
            Some(f) if f.is_integral() => Some("__int__"),
            Some(Fundamental::Float | Fundamental::Double | Fundamental::LongDouble) => {
                Some("__float__")
            }
            _ if target.is_pointer_to_const(Fundamental::Char)
                || spelled == "::std::string"
                || spelled == "std::string" =>
            {
                Some("__str__")
            }
            _ => None,
        };

        let created = match alias {
            Some(alias) => {
                let Some(call_policy) = self.resolver.resolve(graph, id) else {
                    self.warn(id, "missing call policy, the function is not exposed");
                    return Ok(());
                };
                NodeKind::CastingMemberOperator(CastingMemberOperatorNode {
                    alias: alias.to_string(),
                    function: graph.full_name(id),
                    call_policy,
                })
            }
            None => {
                let Some(class) = graph.parent(id) else {
                    return Ok(());
                };
                NodeKind::ImplicitConversion(ConversionNode {
                    from: graph.full_name(class),
                    to: spelled,
                })
            }
        };
        let created = tree.create_for(created, id);
        tree.adopt(node, created)?;
        self.exported.push(id);
        Ok(())
    }

    /// Namespace-level function, registered with `bp::def`.
    pub(super) fn create_free_function(
        &mut self,
        tree: &mut CodeTree,
        body: NodeId,
        id: DeclId,
    ) -> Result<(), CreateError> {
        let graph = self.graph;
        let decl = &graph[id];
        let Some(callable) = graph.as_callable(id) else {
            return Ok(());
        };
        if !decl.config.transformers.is_empty() {
            return self.create_transformed_free_function(tree, body, id);
        }
        let Some(call_policy) = self.resolver.resolve(graph, id) else {
            self.warn(id, "missing call policy, the function is not exposed");
            return Ok(());
        };
        let full_name = graph.full_name(id);
        let maker = MakerNode {
            style: MakerStyle::Free,
            alias: self.alias(id),
            function: full_name.clone(),
            full_name,
            signature: self
                .needs_signature(id)
                .then(|| signature(graph, callable, None)),
            keywords: self.keywords(id, callable),
            call_policy,
            documentation: decl.config.documentation.clone(),
        };
        let maker = tree.create_for(NodeKind::Maker(maker), id);
        tree.adopt(body, maker)?;
        self.exported.push(id);
        Ok(())
    }

    fn create_transformed_free_function(
        &mut self,
        tree: &mut CodeTree,
        body: NodeId,
        id: DeclId,
    ) -> Result<(), CreateError> {
        let graph = self.graph;
        let decl = &graph[id];
        let Some(callable) = graph.as_callable(id) else {
            return Ok(());
        };
        let full_name = graph.full_name(id);
        let alias = self.alias(id);
        let transformation =
            Transformation::new(graph, &full_name, callable, &decl.config.transformers)?;
        let native_result = transformation.state().native_result();
        let Some(call_policy) = self.resolver.resolve_exposed(graph, id, native_result) else {
            self.warn(id, "missing call policy, the function is not exposed");
            return Ok(());
        };

        let name = self.unique_name("", &format!("_py_{}", alias));
        let function = TransformedNode {
            kind: TransformedKind::Function {
                call_target: full_name.clone(),
            },
            name: name.clone(),
            alias: alias.clone(),
            code: transformation.wrapper_code(None),
        };
        let function = tree.create_for(NodeKind::Transformed(function), id);
        tree.adopt_before_body(function)?;
        for header in transformation.required_headers() {
            tree.add_header(function, header)?;
        }
        tracing::debug!(function = %full_name, wrapper = %name, "transformed function created");

        let params: Vec<Argument> = transformation
            .state()
            .exposed_params()
            .map(|p| Argument {
                name: p.name.clone(),
                ty: p.ty.clone(),
                default_value: p.default_value.clone(),
            })
            .collect();
        let maker = MakerNode {
            style: MakerStyle::Free,
            alias,
            full_name,
            function: name,
            signature: None,
            keywords: self.keywords_for(id, &params, false),
            call_policy,
            documentation: decl.config.documentation.clone(),
        };
        let maker = tree.create_for(NodeKind::Maker(maker), id);
        tree.adopt(body, maker)?;
        self.exported.push(id);
        Ok(())
    }
}
