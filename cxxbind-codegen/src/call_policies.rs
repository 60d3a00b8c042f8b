//! Call-policy inference.
//!
//! The policy of a binding statement is decided by a chain of rules; the
//! first rule returning a policy wins. A user-configured policy always
//! takes precedence over the chain.

use cxxbind_decl::{CallPolicy, CallableDecl, CallableKind, CppType, DeclGraph, DeclId, Fundamental};

/// One rule of the chain.
pub trait PolicyRule: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, graph: &DeclGraph, callable: &CallableDecl) -> Option<CallPolicy>;
}

/// Fundamental, enum and class values, and `char const *`, need no policy.
/// Constructor arguments may also be references, or pointers to
/// fundamentals or enums.
#[derive(Debug, Default)]
pub struct ValueRule;

impl ValueRule {
    fn by_type(ty: &CppType) -> bool {
        matches!(ty.remove_cv(), CppType::Fundamental(_) | CppType::Declared(_))
            || ty.is_pointer_to_const(Fundamental::Char)
    }

    fn by_argument(graph: &DeclGraph, ty: &CppType) -> bool {
        Self::by_type(ty.remove_reference())
            || ty.pointee().is_some_and(|p| {
                ty.is_pointer() && (p.is_fundamental() || graph.is_enum_type(p))
            })
    }
}

impl PolicyRule for ValueRule {
    fn name(&self) -> &'static str {
        "value"
    }

    fn resolve(&self, graph: &DeclGraph, callable: &CallableDecl) -> Option<CallPolicy> {
        if callable.is_constructor() {
            return callable
                .arguments
                .iter()
                .all(|arg| Self::by_argument(graph, &arg.ty))
                .then_some(CallPolicy::Default);
        }
        Self::by_type(&callable.return_type_or_void()).then_some(CallPolicy::Default)
    }
}

/// `T const &` is copied; `wchar_t const *` is converted by value.
#[derive(Debug, Default)]
pub struct ReturnValueRule;

impl PolicyRule for ReturnValueRule {
    fn name(&self) -> &'static str {
        "return value"
    }

    fn resolve(&self, _graph: &DeclGraph, callable: &CallableDecl) -> Option<CallPolicy> {
        if callable.is_constructor() {
            return None;
        }
        let ret = callable.return_type_or_void();
        if ret.is_const_reference() {
            Some(CallPolicy::CopyConstReference)
        } else if ret.is_pointer_to_const(Fundamental::WChar) {
            Some(CallPolicy::ReturnByValue)
        } else {
            None
        }
    }
}

/// `void *` is passed through as an opaque handle.
#[derive(Debug, Default)]
pub struct VoidPointerRule;

impl PolicyRule for VoidPointerRule {
    fn name(&self) -> &'static str {
        "void pointer"
    }

    fn resolve(&self, _graph: &DeclGraph, callable: &CallableDecl) -> Option<CallPolicy> {
        if callable.is_constructor() {
            return None;
        }
        callable
            .return_type_or_void()
            .is_void_pointer()
            .then_some(CallPolicy::ReturnOpaquePointer)
    }
}

/// `operator[]` returning a reference.
#[derive(Debug, Default)]
pub struct IndexOperatorRule;

impl PolicyRule for IndexOperatorRule {
    fn name(&self) -> &'static str {
        "index operator"
    }

    fn resolve(&self, graph: &DeclGraph, callable: &CallableDecl) -> Option<CallPolicy> {
        match &callable.kind {
            CallableKind::MemberOperator { symbol } if symbol == "[]" => {}
            _ => return None,
        }
        let ret = callable.return_type_or_void();
        let referent = ret.remove_reference();
        if referent.is_fundamental() || graph.is_enum_type(referent) {
            if referent.is_const() {
                Some(CallPolicy::CopyConstReference)
            } else {
                Some(CallPolicy::CopyNonConstReference)
            }
        } else {
            Some(CallPolicy::ReturnInternalReference)
        }
    }
}

/// The ordered rule chain, passed to the creator factory.
#[derive(Debug)]
pub struct CallPolicyResolver {
    rules: Vec<Box<dyn PolicyRule>>,
}

impl CallPolicyResolver {
    /// An empty chain. Every function without a configured policy is
    /// unresolved.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule after the existing ones.
    pub fn rule(mut self, rule: impl PolicyRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// The policy for `id`: its configured policy, else the first matching
    /// rule. `None` means unresolved.
    pub fn resolve(&self, graph: &DeclGraph, id: DeclId) -> Option<CallPolicy> {
        if let Some(policy) = graph.get(id).and_then(|d| d.config.call_policy) {
            return Some(policy);
        }
        let callable = graph.as_callable(id)?;
        self.run(graph, callable)
    }

    /// The policy for `id` when Python sees `ret` instead of the declared
    /// return type, as for transformed functions. `None` for `ret` means
    /// nothing needs a policy.
    pub fn resolve_exposed(
        &self,
        graph: &DeclGraph,
        id: DeclId,
        ret: Option<&CppType>,
    ) -> Option<CallPolicy> {
        if let Some(policy) = graph.get(id).and_then(|d| d.config.call_policy) {
            return Some(policy);
        }
        let Some(ret) = ret else {
            return Some(CallPolicy::Default);
        };
        let callable = graph.as_callable(id)?.clone().returns(ret.clone());
        self.run(graph, &callable)
    }

    fn run(&self, graph: &DeclGraph, callable: &CallableDecl) -> Option<CallPolicy> {
        self.rules.iter().find_map(|rule| {
            rule.resolve(graph, callable).inspect(|policy| {
                tracing::trace!(rule = rule.name(), %policy, "call policy resolved");
            })
        })
    }
}

impl Default for CallPolicyResolver {
    fn default() -> Self {
        Self::empty()
            .rule(ValueRule)
            .rule(ReturnValueRule)
            .rule(VoidPointerRule)
            .rule(IndexOperatorRule)
    }
}

#[cfg(test)]
mod tests {
    use cxxbind_decl::Argument;

    use super::*;

    fn function(graph: &mut DeclGraph, ret: CppType) -> DeclId {
        graph.add_callable(
            DeclGraph::ROOT,
            "f",
            CallableDecl::new(CallableKind::FreeFunction).returns(ret),
        )
    }

    fn int() -> CppType {
        CppType::fundamental(Fundamental::Int)
    }

    #[test]
    fn test_values_need_no_policy() {
        let mut graph = DeclGraph::new();
        let class = graph.add_class(DeclGraph::ROOT, "A");
        let resolver = CallPolicyResolver::default();
        for ty in [
            int(),
            CppType::Declared(class),
            CppType::fundamental(Fundamental::Char).constant().pointer(),
        ] {
            let f = function(&mut graph, ty);
            assert_eq!(resolver.resolve(&graph, f), Some(CallPolicy::Default));
        }
    }

    #[test]
    fn test_reference_returns() {
        let mut graph = DeclGraph::new();
        let resolver = CallPolicyResolver::default();
        let copy = function(&mut graph, int().constant().reference());
        assert_eq!(
            resolver.resolve(&graph, copy),
            Some(CallPolicy::CopyConstReference)
        );
        let opaque = function(&mut graph, CppType::void().pointer());
        assert_eq!(
            resolver.resolve(&graph, opaque),
            Some(CallPolicy::ReturnOpaquePointer)
        );
        let wide = function(
            &mut graph,
            CppType::fundamental(Fundamental::WChar).constant().pointer(),
        );
        assert_eq!(resolver.resolve(&graph, wide), Some(CallPolicy::ReturnByValue));
        let unresolved = function(&mut graph, int().reference());
        assert_eq!(resolver.resolve(&graph, unresolved), None);
    }

    #[test]
    fn test_index_operator() {
        let mut graph = DeclGraph::new();
        let item = graph.add_class(DeclGraph::ROOT, "Item");
        let list = graph.add_class(DeclGraph::ROOT, "List");
        let op = |ret: CppType| {
            CallableDecl::new(CallableKind::MemberOperator {
                symbol: "[]".to_string(),
            })
            .returns(ret)
            .arg(Argument::new("i", int()))
        };
        let by_int = graph.add_callable(list, "operator[]", op(int().reference()));
        let by_item = graph.add_callable(list, "operator[]", op(CppType::Declared(item).reference()));

        let resolver = CallPolicyResolver::default();
        assert_eq!(
            resolver.resolve(&graph, by_int),
            Some(CallPolicy::CopyNonConstReference)
        );
        assert_eq!(
            resolver.resolve(&graph, by_item),
            Some(CallPolicy::ReturnInternalReference)
        );
    }

    #[test]
    fn test_constructor_arguments() {
        let mut graph = DeclGraph::new();
        let class = graph.add_class(DeclGraph::ROOT, "A");
        let ctor = |ty: CppType| {
            CallableDecl::new(CallableKind::Constructor {
                is_copy: false,
                is_explicit: false,
            })
            .arg(Argument::new("a", ty))
        };
        let by_ref = graph.add_callable(
            class,
            "A",
            ctor(CppType::Declared(class).constant().reference()),
        );
        let by_int_ptr = graph.add_callable(class, "A", ctor(int().pointer()));
        let by_class_ptr = graph.add_callable(class, "A", ctor(CppType::Declared(class).pointer()));

        let resolver = CallPolicyResolver::default();
        assert_eq!(resolver.resolve(&graph, by_ref), Some(CallPolicy::Default));
        assert_eq!(resolver.resolve(&graph, by_int_ptr), Some(CallPolicy::Default));
        assert_eq!(resolver.resolve(&graph, by_class_ptr), None);
    }

    #[test]
    fn test_configured_policy_wins() {
        let mut graph = DeclGraph::new();
        let f = function(&mut graph, int().pointer());
        let resolver = CallPolicyResolver::default();
        assert_eq!(resolver.resolve(&graph, f), None);
        graph[f].config.call_policy = Some(CallPolicy::ManageNewObject);
        assert_eq!(resolver.resolve(&graph, f), Some(CallPolicy::ManageNewObject));
    }

    #[test]
    fn test_empty_chain_resolves_nothing() {
        let mut graph = DeclGraph::new();
        let f = function(&mut graph, int());
        assert_eq!(CallPolicyResolver::empty().resolve(&graph, f), None);
        assert_eq!(
            CallPolicyResolver::default().rule_names(),
            vec!["value", "return value", "void pointer", "index operator"]
        );
    }

    #[test]
    fn test_exposed_return_replaces_declared_one() {
        let mut graph = DeclGraph::new();
        let f = function(&mut graph, int().reference());
        let resolver = CallPolicyResolver::default();
        assert_eq!(
            resolver.resolve_exposed(&graph, f, Some(&int())),
            Some(CallPolicy::Default)
        );
        assert_eq!(resolver.resolve_exposed(&graph, f, Some(&int().pointer())), None);
        assert_eq!(
            resolver.resolve_exposed(&graph, f, None),
            Some(CallPolicy::Default)
        );
        graph[f].config.call_policy = Some(CallPolicy::ReturnOpaquePointer);
        assert_eq!(
            resolver.resolve_exposed(&graph, f, Some(&int().pointer())),
            Some(CallPolicy::ReturnOpaquePointer)
        );
    }
}
