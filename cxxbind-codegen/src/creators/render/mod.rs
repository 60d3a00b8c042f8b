//! Text production for every node kind.
//!
//! All output goes through [`crate::template::substitute`].

mod calldef;
mod class;
mod module;
mod other;

use cxxbind_decl::CallPolicy;

use super::{CodeTree, Keyword, KeywordDefault, NodeId, NodeKind};

/// Render one node. Children are rendered through [`CodeTree::render`] so
/// their cached text is reused.
pub(super) fn render(tree: &CodeTree, id: NodeId) -> String {
    let ctx = Ctx { tree, id };
    let Some(kind) = tree.kind(id) else {
        return String::new();
    };
    match kind {
        NodeKind::Module(_) => module::module(&ctx),
        NodeKind::License(text) => module::license(text),
        NodeKind::Include(header) => module::include(header),
        NodeKind::NamespaceAlias(alias) => module::namespace_alias(alias),
        NodeKind::ModuleBody(body) => module::module_body(&ctx, body),
        NodeKind::CustomText(text) => text.text.clone(),
        NodeKind::Class(class) => class::class(&ctx, class),
        NodeKind::ClassWrapper(wrapper) => class::class_wrapper(&ctx, wrapper),
        NodeKind::Enum(node) => other::enumeration(&ctx, node),
        NodeKind::UnnamedEnum(node) => other::unnamed_enum(&ctx, node),
        NodeKind::Maker(maker) => calldef::maker(&ctx, maker),
        NodeKind::Shim(shim) => calldef::shim(&ctx, shim),
        NodeKind::Transformed(node) => calldef::transformed(&ctx, node),
        NodeKind::Constructor(ctor) => calldef::constructor(&ctx, ctor),
        NodeKind::ConstructorWrapper(ctor) => calldef::constructor_wrapper(&ctx, ctor),
        NodeKind::NullConstructorWrapper(ctor) => calldef::null_constructor_wrapper(&ctx, ctor),
        NodeKind::CopyConstructorWrapper(ctor) => calldef::copy_constructor_wrapper(&ctx, ctor),
        NodeKind::StaticMethod(alias) => other::static_method(alias),
        NodeKind::Operator(op) => other::operator(&ctx, op),
        NodeKind::ImplicitConversion(conv) => other::implicit_conversion(&ctx, conv),
        NodeKind::CastingMemberOperator(op) => other::casting_member_operator(&ctx, op),
        NodeKind::GlobalVariable(var) => other::global_variable(&ctx, var),
        NodeKind::MemberVariable(var) => other::member_variable(var),
        NodeKind::Property(prop) => other::property(&ctx, prop),
        NodeKind::Accessor(accessor) => other::accessor(accessor),
        NodeKind::IndexingSuite(suite) => other::indexing_suite(&ctx, suite),
    }
}

/// The node being rendered and the tree it lives in.
pub(crate) struct Ctx<'a> {
    tree: &'a CodeTree,
    id: NodeId,
}

impl Ctx<'_> {
    /// A `::boost::python` identifier, shortened through namespace aliases.
    fn bp(&self, name: &str) -> String {
        self.tree
            .create_identifier(self.id, &format!("::boost::python::{}", name))
    }

    /// Rendered children with their kinds, skipping empty output.
    fn children(&self) -> Vec<(&NodeKind, String)> {
        self.tree
            .children(self.id)
            .iter()
            .filter_map(|child| {
                let kind = self.tree.kind(*child)?;
                let text = self.tree.render(*child);
                (!text.is_empty()).then_some((kind, text))
            })
            .collect()
    }
}

/// A C++ string literal.
fn quote(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("\"{}\"", escaped)
}

/// `( bp::arg("a"), bp::arg("b")=0 )`, or `None` without keywords.
fn keywords(ctx: &Ctx<'_>, keywords: &[Keyword]) -> Option<String> {
    if keywords.is_empty() {
        return None;
    }
    let arg = ctx.bp("arg");
    let items: Vec<String> = keywords
        .iter()
        .map(|kw| {
            let default = match &kw.default_value {
                None => String::new(),
                Some(KeywordDefault::Literal(value)) => format!("={}", value),
                Some(KeywordDefault::NoneObject) => format!("={}()", ctx.bp("object")),
            };
            format!("{}(\"{}\"){}", arg, kw.name, default)
        })
        .collect();
    Some(format!("( {} )", items.join(", ")))
}

/// The call-policy expression, `None` for the default policies.
fn call_policy(ctx: &Ctx<'_>, policy: CallPolicy) -> Option<String> {
    match policy {
        CallPolicy::Default => None,
        CallPolicy::ReturnInternalReference => {
            Some(format!("{}< >()", ctx.bp("return_internal_reference")))
        }
        other => Some(format!(
            "{}< {} >()",
            ctx.bp("return_value_policy"),
            ctx.bp(other.name())
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a \"b\"\n"), r#""a \"b\"\n""#);
    }
}
