use super::{Ctx, call_policy, keywords, quote};
use crate::{
    creators::{
        ArgPassing, ConstructorNode, ConstructorWrapperNode, MakerNode, MakerStyle, ShimArg,
        ShimKind, ShimNode, SpecialConstructorNode, TransformedKind, TransformedNode,
    },
    template::Vars,
};

const MAKER: &str = "$DEF(\n    $PARAMS )";

const FREE_FUNCTION: &str = "{ //$FULL_NAME\n\n    $STATEMENT\n}";

const DISPATCH: &str = "virtual $RETURN_TYPE $NAME( $ARGS )$CONST {
    if( $OVERRIDE func_$ALIAS = this->get_override( \"$ALIAS\" ) )
        $OVERRIDE_BOUND
    else{
        $NO_OVERRIDE
    }
}

$RETURN_TYPE $DEFAULT_NAME( $ARGS )$CONST {
    $NO_OVERRIDE
}";

const DISPATCH_BASE_ONLY: &str = "virtual $RETURN_TYPE $NAME( $ARGS )$CONST {
    $NO_OVERRIDE
}

$RETURN_TYPE $DEFAULT_NAME( $ARGS )$CONST {
    $NO_OVERRIDE
}";

const PURE_VIRTUAL: &str = "virtual $RETURN_TYPE $NAME( $ARGS )$CONST{
    $OVERRIDE func_$ALIAS = this->get_override( \"$ALIAS\" );
    $OVERRIDE_BOUND
}";

const UNOVERRIDABLE: &str = "virtual $RETURN_TYPE $NAME( $ARGS )$CONST{
    throw std::logic_error( \"$FULL_NAME returns a reference and cannot be overridden from Python\" );
}";

const ACCESSOR: &str = "$STATIC$RETURN_TYPE $NAME( $ARGS )$CONST{
    $NO_OVERRIDE
}";

const TRANSFORMED_FUNCTION: &str = "static $RETURN_TYPE $NAME( $ARG_LIST ){
    $DECLARATIONS
    $PRE_CALL
    ${RESULT_ASSIGNMENT}$CALL_TARGET( $INPUT_PARAMS );
    $POST_CALL
    $RETURN_STMT
}";

const TRANSFORMED_VIRTUAL: &str = "virtual $RETURN_TYPE $NAME( $ARG_LIST )$CONST{
    $OVERRIDE func_$ALIAS = this->get_override( \"$ALIAS\" );
    if( func_$ALIAS ){
        $DECLARATIONS
        $PRE_CALL
        ${RESULT_ASSIGNMENT}$CALL< $RESULT_TYPE >( $INPUT_PARAMS );
        $POST_CALL
        $RETURN_STMT
    }
    else{
        ${RETURN}$CLASS::$NAME( $BASE_ARGS );
    }
}";

const CONSTRUCTOR_WRAPPER: &str = "$WRAPPER_ALIAS( $ARGS )
: $CLASS( $PARAMS )
  , $WRAPPER< $CLASS >(){
    // Normal constructor
}";

const NULL_CONSTRUCTOR_WRAPPER: &str = "$WRAPPER_ALIAS()
: $CLASS()
  , $WRAPPER< $CLASS >(){
    // null constructor
}";

const COPY_CONSTRUCTOR_WRAPPER: &str = "$WRAPPER_ALIAS( $CLASS const & arg )
: $CLASS( arg )
  , $WRAPPER< $CLASS >(){
    // copy constructor
}";

/// `&f`, or `(signature)( &f )` when a cast is requested.
fn function_reference(function: &str, signature: Option<&str>) -> String {
    match signature {
        Some(signature) => format!("({})( &{} )", signature, function),
        None => format!("&{}", function),
    }
}

pub(super) fn maker(ctx: &Ctx<'_>, maker: &MakerNode) -> String {
    let reference = function_reference(&maker.function, maker.signature.as_deref());
    let mut params = vec![quote(&maker.alias)];
    match &maker.style {
        MakerStyle::PureVirtual => {
            params.push(format!("{}( {} )", ctx.bp("pure_virtual"), reference));
        }
        MakerStyle::Virtual {
            default_function,
            default_signature,
        } => {
            params.push(reference);
            params.push(function_reference(
                default_function,
                default_signature.as_deref(),
            ));
        }
        MakerStyle::Free | MakerStyle::Member => params.push(reference),
    }
    params.extend(keywords(ctx, &maker.keywords));
    params.extend(call_policy(ctx, maker.call_policy));
    if let Some(doc) = &maker.documentation {
        params.push(quote(doc));
    }

    let is_free = maker.style == MakerStyle::Free;
    let def = if is_free {
        ctx.bp("def")
    } else {
        "def".to_string()
    };
    let statement = Vars::new()
        .scalar("DEF", def)
        .scalar("PARAMS", params.join("\n    , "))
        .substitute(MAKER);
    if !is_free {
        return statement;
    }
    Vars::new()
        .scalar("FULL_NAME", &maker.full_name)
        .block("STATEMENT", format!("{};", statement))
        .substitute(FREE_FUNCTION)
}

fn args_declaration(args: &[ShimArg]) -> String {
    args.iter()
        .map(|arg| match &arg.default_value {
            Some(default) => format!("{} {}={}", arg.ty, arg.name, default),
            None => format!("{} {}", arg.ty, arg.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn plain_args(args: &[ShimArg]) -> String {
    args.iter()
        .map(|arg| arg.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Arguments forwarded to a Python override. Class references travel by
/// reference and class pointers as pointers, never as copies.
fn override_args(ctx: &Ctx<'_>, args: &[ShimArg]) -> String {
    args.iter()
        .map(|arg| match arg.passing {
            ArgPassing::Value => arg.name.clone(),
            ArgPassing::Ref => format!("boost::ref({})", arg.name),
            ArgPassing::Ptr => format!("{}({})", ctx.bp("ptr"), arg.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// The two branches of a virtual dispatch shim.
///
/// Which arm runs is decided on every call by probing the instance's
/// override table: an override bound from Python gets the marshalled
/// arguments, otherwise the C++ implementation of the base class runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchArm {
    OverrideBound,
    NoOverride,
}

impl DispatchArm {
    fn statement(self, ctx: &Ctx<'_>, shim: &ShimNode) -> String {
        let ret = if shim.returns_void { "" } else { "return " };
        match self {
            Self::OverrideBound => format!(
                "{}func_{}( {} );",
                ret,
                shim.alias,
                override_args(ctx, &shim.args)
            ),
            Self::NoOverride => {
                let this = if shim.kind == ShimKind::ProtectedStatic {
                    ""
                } else {
                    "this->"
                };
                format!(
                    "{}{}{}::{}( {} );",
                    ret,
                    this,
                    shim.class_full_name,
                    shim.name,
                    plain_args(&shim.args)
                )
            }
        }
    }
}

pub(super) fn shim(ctx: &Ctx<'_>, shim: &ShimNode) -> String {
    let is_static = shim.kind == ShimKind::ProtectedStatic;
    let constness = if shim.is_const && !is_static {
        " const"
    } else {
        ""
    };
    let vars = Vars::new()
        .scalar("RETURN_TYPE", &shim.return_type)
        .scalar("NAME", &shim.name)
        .scalar("ALIAS", &shim.alias)
        .scalar("ARGS", args_declaration(&shim.args))
        .scalar("CONST", constness)
        .scalar("OVERRIDE", ctx.bp("override"))
        .scalar("DEFAULT_NAME", shim.default_name())
        .scalar("FULL_NAME", format!("{}::{}", shim.class_full_name, shim.name))
        .scalar("STATIC", if is_static { "static " } else { "" })
        .block(
            "OVERRIDE_BOUND",
            DispatchArm::OverrideBound.statement(ctx, shim),
        )
        .block("NO_OVERRIDE", DispatchArm::NoOverride.statement(ctx, shim));

    match shim.kind {
        ShimKind::Virtual | ShimKind::ProtectedVirtual if shim.returns_reference => {
            vars.substitute(DISPATCH_BASE_ONLY)
        }
        ShimKind::Virtual | ShimKind::ProtectedVirtual => vars.substitute(DISPATCH),
        _ if shim.kind.is_pure_virtual() && shim.returns_reference => {
            vars.substitute(UNOVERRIDABLE)
        }
        ShimKind::PureVirtual | ShimKind::ProtectedPureVirtual | ShimKind::PrivatePureVirtual => {
            vars.substitute(PURE_VIRTUAL)
        }
        ShimKind::Protected | ShimKind::ProtectedStatic => vars.substitute(ACCESSOR),
    }
}

pub(super) fn transformed(ctx: &Ctx<'_>, node: &TransformedNode) -> String {
    let code = &node.code;
    let vars = Vars::new()
        .scalar("RETURN_TYPE", &code.return_type)
        .scalar("NAME", &node.name)
        .scalar("ALIAS", &node.alias)
        .scalar("ARG_LIST", &code.arg_list)
        .block("DECLARATIONS", &code.declarations)
        .block("PRE_CALL", &code.pre_call)
        .block("POST_CALL", &code.post_call)
        .scalar("RESULT_ASSIGNMENT", &code.result_assignment)
        .block("RETURN_STMT", &code.return_stmt);

    match &node.kind {
        TransformedKind::Function { call_target } => vars
            .scalar("CALL_TARGET", call_target)
            .scalar("INPUT_PARAMS", &code.input_params)
            .substitute(TRANSFORMED_FUNCTION),
        TransformedKind::Virtual {
            class_full_name,
            base_args,
            is_const,
            returns_void,
        } => {
            let mut input = format!("func_{}.ptr()", node.alias);
            if !code.input_params.is_empty() {
                input.push_str(", ");
                input.push_str(&code.input_params);
            }
            vars.scalar("INPUT_PARAMS", input)
                .scalar("CONST", if *is_const { " const" } else { "" })
                .scalar("OVERRIDE", ctx.bp("override"))
                .scalar("CALL", ctx.bp("call"))
                .scalar("RESULT_TYPE", &code.result_type)
                .scalar("RETURN", if *returns_void { "" } else { "return " })
                .scalar("CLASS", class_full_name)
                .scalar("BASE_ARGS", base_args)
                .substitute(TRANSFORMED_VIRTUAL)
        }
    }
}

pub(super) fn constructor(ctx: &Ctx<'_>, ctor: &ConstructorNode) -> String {
    let (required, optional) = match ctor.optional_from {
        Some(split) if split < ctor.arg_types.len() => ctor.arg_types.split_at(split),
        _ => (ctor.arg_types.as_slice(), &[][..]),
    };
    let mut types: Vec<String> = required.to_vec();
    if !optional.is_empty() {
        types.push(format!(
            "{}< {} >",
            ctx.bp("optional"),
            optional.join(", ")
        ));
    }
    let init = if types.is_empty() {
        format!("{}< >", ctx.bp("init"))
    } else {
        format!("{}< {} >", ctx.bp("init"), types.join(", "))
    };

    let mut init_args: Vec<String> = keywords(ctx, &ctor.keywords).into_iter().collect();
    if let Some(doc) = &ctor.documentation {
        init_args.push(quote(doc));
    }
    let policy = call_policy(ctx, ctor.call_policy)
        .map(|p| format!("[{}]", p))
        .unwrap_or_default();

    Vars::new()
        .scalar("INIT", init)
        .scalar("INIT_ARGS", init_args.join(", "))
        .scalar("POLICY", policy)
        .substitute("def( $INIT($INIT_ARGS)$POLICY )")
}

pub(super) fn constructor_wrapper(ctx: &Ctx<'_>, ctor: &ConstructorWrapperNode) -> String {
    Vars::new()
        .scalar("WRAPPER_ALIAS", &ctor.wrapper_alias)
        .scalar("CLASS", &ctor.class_full_name)
        .scalar("WRAPPER", ctx.bp("wrapper"))
        .scalar("ARGS", args_declaration(&ctor.args))
        .scalar("PARAMS", plain_args(&ctor.args))
        .substitute(CONSTRUCTOR_WRAPPER)
}

fn special_constructor(ctx: &Ctx<'_>, ctor: &SpecialConstructorNode, template: &str) -> String {
    Vars::new()
        .scalar("WRAPPER_ALIAS", &ctor.wrapper_alias)
        .scalar("CLASS", &ctor.class_full_name)
        .scalar("WRAPPER", ctx.bp("wrapper"))
        .substitute(template)
}

pub(super) fn null_constructor_wrapper(ctx: &Ctx<'_>, ctor: &SpecialConstructorNode) -> String {
    special_constructor(ctx, ctor, NULL_CONSTRUCTOR_WRAPPER)
}

pub(super) fn copy_constructor_wrapper(ctx: &Ctx<'_>, ctor: &SpecialConstructorNode) -> String {
    special_constructor(ctx, ctor, COPY_CONSTRUCTOR_WRAPPER)
}
