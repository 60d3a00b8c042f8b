use super::{Ctx, quote};
use crate::{
    creators::{ClassNode, ClassWrapperNode, NodeKind},
    template::Vars,
};

const CHAINED: &str = "$CLASS_TYPE( $CTOR_ARGS )\n    $MEMBERS";

const SCOPED: &str = "{ //$FULL_NAME
    typedef $CLASS_TYPE ${EXPOSER}_t;
    ${EXPOSER}_t $EXPOSER = ${EXPOSER}_t( $CTOR_ARGS );
    $SCOPE
    $MEMBERS
}";

const WRAPPER: &str = "struct $ALIAS : $CLASS, $WRAPPER< $CLASS > {

    $MEMBERS

};";

/// `bp::class_< held, bp::bases< ... >, boost::noncopyable >`
fn class_type(ctx: &Ctx<'_>, class: &ClassNode) -> String {
    let mut args = vec![
        class
            .wrapper
            .clone()
            .unwrap_or_else(|| class.full_name.clone()),
    ];
    if !class.bases.is_empty() {
        args.push(format!("{}< {} >", ctx.bp("bases"), class.bases.join(", ")));
    }
    if class.noncopyable {
        args.push("boost::noncopyable".to_string());
    }
    format!("{}< {} >", ctx.bp("class_"), args.join(", "))
}

fn ctor_args(ctx: &Ctx<'_>, class: &ClassNode) -> String {
    let mut args = vec![quote(&class.alias)];
    if let Some(doc) = &class.documentation {
        args.push(quote(doc));
    }
    if class.no_init {
        args.push(ctx.bp("no_init"));
    }
    args.join(", ")
}

/// Whether the registration must be spelled as a scoped block.
fn needs_scope(class: &ClassNode, children: &[(&NodeKind, String)]) -> bool {
    class.always_expose_using_scope
        || children.iter().any(|(kind, _)| {
            !kind.works_on_instance() || matches!(kind, NodeKind::StaticMethod(_))
        })
}

pub(super) fn class(ctx: &Ctx<'_>, class: &ClassNode) -> String {
    let children = ctx.children();
    let vars = Vars::new()
        .scalar("CLASS_TYPE", class_type(ctx, class))
        .scalar("CTOR_ARGS", ctor_args(ctx, class));

    if !needs_scope(class, &children) {
        if children.is_empty() {
            return vars.substitute("$CLASS_TYPE( $CTOR_ARGS );");
        }
        let members: Vec<String> = children.iter().map(|(_, text)| format!(".{}", text)).collect();
        return vars
            .block("MEMBERS", format!("{};", members.join("\n")))
            .substitute(CHAINED);
    }

    let exposer = format!("{}_exposer", class.exposer);
    let has_nested = children.iter().any(|(kind, _)| !kind.works_on_instance());
    let scope = if has_nested {
        format!("{} {}_scope( {} );", ctx.bp("scope"), class.exposer, exposer)
    } else {
        String::new()
    };
    let members: Vec<String> = children
        .iter()
        .map(|(kind, text)| {
            if kind.works_on_instance() {
                format!("{}.{};", exposer, text)
            } else {
                text.clone()
            }
        })
        .collect();
    vars.scalar("FULL_NAME", &class.full_name)
        .scalar("EXPOSER", exposer)
        .block("SCOPE", scope)
        .block("MEMBERS", members.join("\n"))
        .substitute(SCOPED)
}

pub(super) fn class_wrapper(ctx: &Ctx<'_>, wrapper: &ClassWrapperNode) -> String {
    let members: Vec<String> = ctx.children().into_iter().map(|(_, text)| text).collect();
    Vars::new()
        .scalar("ALIAS", &wrapper.alias)
        .scalar("CLASS", &wrapper.class_full_name)
        .scalar("WRAPPER", ctx.bp("wrapper"))
        .block("MEMBERS", members.join("\n\n"))
        .substitute(WRAPPER)
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use cxxbind_decl::CallPolicy;

    use super::*;
    use crate::creators::{
        CodeTree, CustomTextNode, EnumValue, MakerNode, MakerStyle, ModuleNode,
        NamespaceAliasNode, NodeId, UnnamedEnumNode,
    };

    fn class_node(scope: bool) -> ClassNode {
        ClassNode {
            full_name: "::geo::Point".to_string(),
            alias: "Point".to_string(),
            exposer: "Point".to_string(),
            wrapper: None,
            bases: vec!["::geo::Base".to_string()],
            noncopyable: false,
            no_init: false,
            documentation: None,
            always_expose_using_scope: scope,
        }
    }

    fn maker(alias: &str) -> NodeKind {
        NodeKind::Maker(MakerNode {
            style: MakerStyle::Member,
            alias: alias.to_string(),
            full_name: format!("::geo::Point::{}", alias),
            function: format!("::geo::Point::{}", alias),
            signature: None,
            keywords: Vec::new(),
            call_policy: CallPolicy::Default,
            documentation: None,
        })
    }

    fn tree_with(class: ClassNode, children: Vec<NodeKind>) -> (CodeTree, NodeId) {
        let mut tree = CodeTree::new(NodeKind::Module(ModuleNode {
            name: "m".to_string(),
        }));
        let root = tree.root();
        let alias = tree.create(NodeKind::NamespaceAlias(NamespaceAliasNode {
            alias: "bp".to_string(),
            namespace: "::boost::python".to_string(),
        }));
        tree.adopt(root, alias).expect("adopt alias");
        let class = tree.create(NodeKind::Class(class));
        tree.adopt(root, class).expect("adopt class");
        for kind in children {
            let child = tree.create(kind);
            tree.adopt(class, child).expect("adopt child");
        }
        (tree, class)
    }

    #[test]
    fn test_chained_registration() {
        let (tree, class) = tree_with(class_node(false), vec![maker("x"), maker("y")]);
        assert_snapshot!(tree.render(class), @r#"
        bp::class_< ::geo::Point, bp::bases< ::geo::Base > >( "Point" )
            .def(
                "x"
                , &::geo::Point::x )
            .def(
                "y"
                , &::geo::Point::y );
        "#);
    }

    #[test]
    fn test_scoped_registration_for_nested_code() {
        let nested = NodeKind::UnnamedEnum(UnnamedEnumNode {
            values: vec![EnumValue {
                alias: "ORIGIN".to_string(),
                full_name: "::geo::Point::ORIGIN".to_string(),
            }],
        });
        let user = NodeKind::CustomText(CustomTextNode {
            text: "def( \"z\", &z )".to_string(),
            works_on_instance: true,
        });
        let (tree, class) = tree_with(class_node(false), vec![nested, user]);
        assert_snapshot!(tree.render(class), @r#"
        { //::geo::Point
            typedef bp::class_< ::geo::Point, bp::bases< ::geo::Base > > Point_exposer_t;
            Point_exposer_t Point_exposer = Point_exposer_t( "Point" );
            bp::scope Point_scope( Point_exposer );
            bp::scope().attr( "ORIGIN" ) = (int)::geo::Point::ORIGIN;
            Point_exposer.def( "z", &z );
        }
        "#);
    }

    #[test]
    fn test_empty_class_is_one_statement() {
        let (tree, class) = tree_with(class_node(false), Vec::new());
        assert_eq!(
            tree.render(class),
            "bp::class_< ::geo::Point, bp::bases< ::geo::Base > >( \"Point\" );"
        );
    }
}
