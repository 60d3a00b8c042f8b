use super::{Ctx, call_policy, quote};
use crate::{
    creators::{
        AccessorNode, CastingMemberOperatorNode, ContainerKind, ConversionNode, EnumNode,
        ExportedValues, GlobalVariableNode, IndexingSuiteNode, MemberVariableNode, Operand,
        OperatorNode, PropertyNode, UnnamedEnumNode,
    },
    template::Vars,
};

const ENUM: &str = "$ENUM< $FULL_NAME >( \"$ALIAS\" )\n    $VALUES\n    ;\n$EXPORTS";

const GETTER: &str = "static $TYPE get_$MEMBER( $CLASS const & inst ){
    return inst.$MEMBER;
}";

const STATIC_GETTER: &str = "static $TYPE get_$MEMBER(){
    return $CLASS::$MEMBER;
}";

const SETTER: &str = "static void set_$MEMBER( $CLASS & inst, $TYPE new_value ){
    inst.$MEMBER = new_value;
}";

const STATIC_SETTER: &str = "static void set_$MEMBER( $TYPE new_value ){
    $CLASS::$MEMBER = new_value;
}";

pub(super) fn enumeration(ctx: &Ctx<'_>, node: &EnumNode) -> String {
    let mut values: Vec<String> = node
        .values
        .iter()
        .map(|v| format!(".value(\"{}\", {})", v.alias, v.full_name))
        .collect();
    let mut exports = Vec::new();
    match &node.exported {
        ExportedValues::All => values.push(".export_values()".to_string()),
        ExportedValues::Only(names) => {
            let scope = ctx.bp("scope");
            for name in names {
                exports.push(format!(
                    "{}().attr( \"{}\" ) = {}().attr( \"{}\" ).attr( \"{}\" );",
                    scope, name, scope, node.alias, name
                ));
            }
        }
    }
    Vars::new()
        .scalar("ENUM", ctx.bp("enum_"))
        .scalar("FULL_NAME", &node.full_name)
        .scalar("ALIAS", &node.alias)
        .block("VALUES", values.join("\n"))
        .block("EXPORTS", exports.join("\n"))
        .substitute(ENUM)
}

pub(super) fn unnamed_enum(ctx: &Ctx<'_>, node: &UnnamedEnumNode) -> String {
    let scope = ctx.bp("scope");
    node.values
        .iter()
        .map(|v| {
            Vars::new()
                .scalar("SCOPE", &scope)
                .scalar("ALIAS", &v.alias)
                .scalar("VALUE", &v.full_name)
                .substitute("$SCOPE().attr( \"$ALIAS\" ) = (int)$VALUE;")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) fn static_method(alias: &str) -> String {
    Vars::new()
        .scalar("ALIAS", alias)
        .substitute("staticmethod( \"$ALIAS\" )")
}

fn operand(ctx: &Ctx<'_>, operand: &Operand) -> String {
    match operand {
        Operand::SelfRef => ctx.bp("self"),
        Operand::Other(ty) => format!("{}< {} >()", ctx.bp("other"), ty),
    }
}

pub(super) fn operator(ctx: &Ctx<'_>, op: &OperatorNode) -> String {
    let expression = match &op.right {
        Some(right) => format!(
            "{} {} {}",
            operand(ctx, &op.left),
            op.symbol,
            operand(ctx, right)
        ),
        None => format!("{}{}", op.symbol, operand(ctx, &op.left)),
    };
    Vars::new()
        .scalar("EXPRESSION", expression)
        .substitute("def( $EXPRESSION )")
}

pub(super) fn implicit_conversion(ctx: &Ctx<'_>, conv: &ConversionNode) -> String {
    Vars::new()
        .scalar("IMPLICITLY_CONVERTIBLE", ctx.bp("implicitly_convertible"))
        .scalar("FROM", &conv.from)
        .scalar("TO", &conv.to)
        .substitute("$IMPLICITLY_CONVERTIBLE< $FROM, $TO >();")
}

pub(super) fn casting_member_operator(ctx: &Ctx<'_>, op: &CastingMemberOperatorNode) -> String {
    let mut params = vec![quote(&op.alias), format!("&{}", op.function)];
    params.extend(call_policy(ctx, op.call_policy));
    Vars::new()
        .scalar("PARAMS", params.join(", "))
        .substitute("def( $PARAMS )")
}

pub(super) fn global_variable(ctx: &Ctx<'_>, var: &GlobalVariableNode) -> String {
    Vars::new()
        .scalar("SCOPE", ctx.bp("scope"))
        .scalar("ALIAS", &var.alias)
        .scalar("FULL_NAME", &var.full_name)
        .substitute("$SCOPE().attr( \"$ALIAS\" ) = $FULL_NAME;")
}

pub(super) fn member_variable(var: &MemberVariableNode) -> String {
    let def = if var.readonly {
        "def_readonly"
    } else {
        "def_readwrite"
    };
    let mut params = vec![quote(&var.alias), format!("&{}", var.full_name)];
    if let Some(doc) = &var.documentation {
        params.push(quote(doc));
    }
    Vars::new()
        .scalar("DEF", def)
        .scalar("PARAMS", params.join(", "))
        .substitute("$DEF( $PARAMS )")
}

pub(super) fn property(ctx: &Ctx<'_>, prop: &PropertyNode) -> String {
    let getter = match call_policy(ctx, prop.getter_policy) {
        Some(policy) => format!(
            "{}( &{}, {} )",
            ctx.bp("make_function"),
            prop.getter,
            policy
        ),
        None => format!("&{}", prop.getter),
    };
    let mut params = vec![quote(&prop.alias), getter];
    if let Some(setter) = &prop.setter {
        params.push(format!("&{}", setter));
    }
    let add = if prop.is_static {
        "add_static_property"
    } else {
        "add_property"
    };
    Vars::new()
        .scalar("ADD", add)
        .scalar("PARAMS", params.join(", "))
        .substitute("$ADD( $PARAMS )")
}

pub(super) fn accessor(accessor: &AccessorNode) -> String {
    let vars = Vars::new()
        .scalar("TYPE", &accessor.ty)
        .scalar("MEMBER", &accessor.member)
        .scalar("CLASS", &accessor.class_full_name);
    let (getter, setter) = if accessor.is_static {
        (STATIC_GETTER, STATIC_SETTER)
    } else {
        (GETTER, SETTER)
    };
    let mut code = vars.substitute(getter);
    if !accessor.readonly {
        code.push_str("\n\n");
        code.push_str(&vars.substitute(setter));
    }
    code
}

pub(super) fn indexing_suite(ctx: &Ctx<'_>, suite: &IndexingSuiteNode) -> String {
    let template = match (suite.version, suite.kind) {
        (1, ContainerKind::Vector) => ctx.bp("vector_indexing_suite"),
        (1, ContainerKind::Map) => ctx.bp("map_indexing_suite"),
        (_, ContainerKind::Vector) => ctx.bp("indexing::vector_suite"),
        (_, ContainerKind::Map) => ctx.bp("indexing::map_suite"),
    };
    Vars::new()
        .scalar("SUITE", template)
        .scalar("CONTAINER", &suite.container)
        .substitute("def( $SUITE< $CONTAINER >() )")
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::creators::{CodeTree, EnumValue, ModuleNode, NamespaceAliasNode, NodeKind};

    fn render(kind: NodeKind) -> String {
        let mut tree = CodeTree::new(NodeKind::Module(ModuleNode {
            name: "m".to_string(),
        }));
        let root = tree.root();
        let alias = tree.create(NodeKind::NamespaceAlias(NamespaceAliasNode {
            alias: "bp".to_string(),
            namespace: "::boost::python".to_string(),
        }));
        tree.adopt(root, alias).expect("adopt alias");
        let node = tree.create(kind);
        tree.adopt(root, node).expect("adopt node");
        tree.render(node)
    }

    fn values() -> Vec<EnumValue> {
        ["red", "green"]
            .iter()
            .map(|v| EnumValue {
                alias: v.to_string(),
                full_name: format!("::paint::{}", v),
            })
            .collect()
    }

    #[test]
    fn test_enum_exports_all_values() {
        let code = render(NodeKind::Enum(EnumNode {
            full_name: "::paint::Color".to_string(),
            alias: "Color".to_string(),
            values: values(),
            exported: ExportedValues::All,
        }));
        assert_snapshot!(code, @r#"
        bp::enum_< ::paint::Color >( "Color" )
            .value("red", ::paint::red)
            .value("green", ::paint::green)
            .export_values()
            ;
        "#);
    }

    #[test]
    fn test_enum_exports_selected_values() {
        let code = render(NodeKind::Enum(EnumNode {
            full_name: "::paint::Color".to_string(),
            alias: "Color".to_string(),
            values: values(),
            exported: ExportedValues::Only(vec!["red".to_string()]),
        }));
        assert!(!code.contains("export_values"));
        assert!(code.ends_with(
            "bp::scope().attr( \"red\" ) = bp::scope().attr( \"Color\" ).attr( \"red\" );"
        ));
    }

    #[test]
    fn test_operators() {
        let binary = render(NodeKind::Operator(OperatorNode {
            symbol: "<".to_string(),
            left: Operand::SelfRef,
            right: Some(Operand::Other("int".to_string())),
        }));
        assert_eq!(binary, "def( bp::self < bp::other< int >() )");

        let unary = render(NodeKind::Operator(OperatorNode {
            symbol: "-".to_string(),
            left: Operand::SelfRef,
            right: None,
        }));
        assert_eq!(unary, "def( -bp::self )");
    }

    #[test]
    fn test_bit_field_accessor() {
        let code = render(NodeKind::Accessor(AccessorNode {
            member: "flags".to_string(),
            class_full_name: "::Packet".to_string(),
            ty: "unsigned int".to_string(),
            readonly: false,
            is_static: false,
        }));
        assert_snapshot!(code, @r"
        static unsigned int get_flags( ::Packet const & inst ){
            return inst.flags;
        }

        static void set_flags( ::Packet & inst, unsigned int new_value ){
            inst.flags = new_value;
        }
        ");
    }

    #[test]
    fn test_indexing_suite_versions() {
        let v1 = render(NodeKind::IndexingSuite(IndexingSuiteNode {
            container: "::std::vector< int >".to_string(),
            kind: ContainerKind::Vector,
            version: 1,
        }));
        assert_eq!(v1, "def( bp::vector_indexing_suite< ::std::vector< int > >() )");

        let v2 = render(NodeKind::IndexingSuite(IndexingSuiteNode {
            container: "::std::map< int, double >".to_string(),
            kind: ContainerKind::Map,
            version: 2,
        }));
        assert_eq!(v2, "def( bp::indexing::map_suite< ::std::map< int, double > >() )");
    }

    #[test]
    fn test_pointer_property() {
        let code = render(NodeKind::Property(PropertyNode {
            alias: "next".to_string(),
            getter: "Node_wrapper::get_next".to_string(),
            setter: None,
            getter_policy: cxxbind_decl::CallPolicy::ReferenceExistingObject,
            is_static: false,
        }));
        assert_eq!(
            code,
            "add_property( \"next\", bp::make_function( &Node_wrapper::get_next, bp::return_value_policy< bp::reference_existing_object >() ) )"
        );
    }
}
