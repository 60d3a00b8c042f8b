use super::Ctx;
use crate::{
    creators::{ModuleNode, NamespaceAliasNode, NodeKind},
    template::Vars,
};

const MODULE_BODY: &str = "BOOST_PYTHON_MODULE($NAME){\n    $BODY\n}";

/// Includes are kept on consecutive lines, everything else is separated by
/// a blank line.
pub(super) fn module(ctx: &Ctx<'_>) -> String {
    let mut code = String::new();
    let mut previous_include = false;
    for (kind, text) in ctx.children() {
        let is_include = matches!(kind, NodeKind::Include(_));
        if !code.is_empty() {
            code.push_str(if is_include && previous_include {
                "\n"
            } else {
                "\n\n"
            });
        }
        code.push_str(&text);
        previous_include = is_include;
    }
    Vars::new().block("CODE", code).substitute("$CODE")
}

pub(super) fn license(text: &str) -> String {
    text.trim_end().to_string()
}

pub(super) fn include(header: &str) -> String {
    format!("#include \"{}\"", header)
}

pub(super) fn namespace_alias(alias: &NamespaceAliasNode) -> String {
    let namespace = alias.namespace.trim_start_matches("::");
    Vars::new()
        .scalar("ALIAS", &alias.alias)
        .scalar("NAMESPACE", namespace)
        .substitute("namespace $ALIAS = $NAMESPACE;")
}

pub(super) fn module_body(ctx: &Ctx<'_>, body: &ModuleNode) -> String {
    let children: Vec<String> = ctx.children().into_iter().map(|(_, text)| text).collect();
    Vars::new()
        .scalar("NAME", &body.name)
        .block("BODY", children.join("\n\n"))
        .substitute(MODULE_BODY)
}
