//! Node payloads.
//!
//! Every payload carries pre-resolved strings (type spellings, qualified
//! names) so rendering never has to consult the declaration graph. Binding
//! library identifiers are stored fully qualified and shortened through the
//! tree's namespace aliases at render time.

use cxxbind_decl::CallPolicy;

/// What a code-creator node renders.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Root of the generated translation unit.
    Module(ModuleNode),
    License(String),
    Include(String),
    NamespaceAlias(NamespaceAliasNode),
    /// `BOOST_PYTHON_MODULE(name){ ... }`.
    ModuleBody(ModuleNode),
    CustomText(CustomTextNode),
    /// Class registration statement.
    Class(ClassNode),
    /// Synthetic subclass holding dispatch shims.
    ClassWrapper(ClassWrapperNode),
    Enum(EnumNode),
    UnnamedEnum(UnnamedEnumNode),
    /// `def(...)` binding of a callable.
    Maker(MakerNode),
    /// Member function of a wrapper class.
    Shim(ShimNode),
    /// Wrapper function produced by function transformers.
    Transformed(TransformedNode),
    Constructor(ConstructorNode),
    ConstructorWrapper(ConstructorWrapperNode),
    NullConstructorWrapper(SpecialConstructorNode),
    CopyConstructorWrapper(SpecialConstructorNode),
    StaticMethod(String),
    Operator(OperatorNode),
    /// `implicitly_convertible< from, to >();`
    ImplicitConversion(ConversionNode),
    /// `def( "__int__", &::A::operator int )`
    CastingMemberOperator(CastingMemberOperatorNode),
    GlobalVariable(GlobalVariableNode),
    MemberVariable(MemberVariableNode),
    Property(PropertyNode),
    /// Getter/setter pair in a wrapper class.
    Accessor(AccessorNode),
    IndexingSuite(IndexingSuiteNode),
}

impl NodeKind {
    /// Compound nodes own an ordered child list.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Self::Module(_) | Self::ModuleBody(_) | Self::Class(_) | Self::ClassWrapper(_)
        )
    }

    /// Nodes whose text is a method call on the enclosing `class_` object.
    pub fn works_on_instance(&self) -> bool {
        match self {
            Self::Maker(maker) => maker.style != MakerStyle::Free,
            Self::CustomText(text) => text.works_on_instance,
            Self::Constructor(_)
            | Self::StaticMethod(_)
            | Self::Operator(_)
            | Self::CastingMemberOperator(_)
            | Self::MemberVariable(_)
            | Self::Property(_)
            | Self::IndexingSuite(_) => true,
            _ => false,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Module(_) => "module",
            Self::License(_) => "license",
            Self::Include(_) => "include",
            Self::NamespaceAlias(_) => "namespace alias",
            Self::ModuleBody(_) => "module body",
            Self::CustomText(_) => "custom text",
            Self::Class(_) => "class",
            Self::ClassWrapper(_) => "wrapper class",
            Self::Enum(_) => "enumeration",
            Self::UnnamedEnum(_) => "unnamed enumeration",
            Self::Maker(_) => "maker",
            Self::Shim(shim) => shim.kind.describe(),
            Self::Transformed(_) => "transformed function",
            Self::Constructor(_) => "constructor",
            Self::ConstructorWrapper(_) => "constructor wrapper",
            Self::NullConstructorWrapper(_) => "null constructor wrapper",
            Self::CopyConstructorWrapper(_) => "copy constructor wrapper",
            Self::StaticMethod(_) => "staticmethod",
            Self::Operator(_) => "operator",
            Self::ImplicitConversion(_) => "implicit conversion",
            Self::CastingMemberOperator(_) => "casting member operator",
            Self::GlobalVariable(_) => "global variable",
            Self::MemberVariable(_) => "member variable",
            Self::Property(_) => "property",
            Self::Accessor(_) => "accessor",
            Self::IndexingSuite(_) => "indexing suite",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNode {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceAliasNode {
    pub alias: String,
    /// Fully qualified namespace, e.g. `::boost::python`.
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomTextNode {
    pub text: String,
    pub works_on_instance: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNode {
    pub full_name: String,
    pub alias: String,
    /// Identifier used for the scoped registration variables.
    pub exposer: String,
    /// Held type when a wrapper class exists.
    pub wrapper: Option<String>,
    pub bases: Vec<String>,
    pub noncopyable: bool,
    pub no_init: bool,
    pub documentation: Option<String>,
    pub always_expose_using_scope: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassWrapperNode {
    /// Unqualified wrapper name, e.g. `Shape_wrapper`.
    pub alias: String,
    /// Name used to refer to the wrapper from the module body.
    pub full_name: String,
    pub class_full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub alias: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumNode {
    pub full_name: String,
    pub alias: String,
    pub values: Vec<EnumValue>,
    /// Values exported into the enclosing scope.
    pub exported: ExportedValues,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportedValues {
    All,
    Only(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnnamedEnumNode {
    pub values: Vec<EnumValue>,
}

/// How a maker refers to the bound function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MakerStyle {
    /// Free function registered with `def` at module scope.
    Free,
    /// Member registered directly on the class.
    Member,
    /// Wrapped in `pure_virtual( ... )`.
    PureVirtual,
    /// Direct binding followed by the wrapper's default implementation.
    Virtual {
        default_function: String,
        default_signature: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordDefault {
    Literal(String),
    /// `bp::object()`, used for null pointer defaults.
    NoneObject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub name: String,
    pub default_value: Option<KeywordDefault>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakerNode {
    pub style: MakerStyle,
    pub alias: String,
    /// Qualified name of the declaration, used in comments.
    pub full_name: String,
    /// Function whose address is taken.
    pub function: String,
    /// Function type for an explicit cast, e.g. `void ( ::A::* )( int )`.
    pub signature: Option<String>,
    pub keywords: Vec<Keyword>,
    pub call_policy: CallPolicy,
    pub documentation: Option<String>,
}

/// Which wrapper member a shim renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShimKind {
    /// Override dispatch plus `default_` implementation.
    Virtual,
    PureVirtual,
    Protected,
    ProtectedStatic,
    ProtectedVirtual,
    ProtectedPureVirtual,
    PrivatePureVirtual,
}

impl ShimKind {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Virtual => "virtual dispatch shim",
            Self::PureVirtual => "pure virtual adapter",
            Self::Protected => "protected accessor",
            Self::ProtectedStatic => "protected static accessor",
            Self::ProtectedVirtual => "protected virtual dispatch shim",
            Self::ProtectedPureVirtual => "protected pure virtual adapter",
            Self::PrivatePureVirtual => "private pure virtual adapter",
        }
    }

    pub fn is_pure_virtual(&self) -> bool {
        matches!(
            self,
            Self::PureVirtual | Self::ProtectedPureVirtual | Self::PrivatePureVirtual
        )
    }

    pub fn dispatches(&self) -> bool {
        matches!(self, Self::Virtual | Self::ProtectedVirtual)
    }
}

/// How an argument is handed to a Python override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgPassing {
    #[default]
    Value,
    /// `boost::ref( x )`, for non-const references to classes.
    Ref,
    /// `bp::ptr( x )`, for pointers to classes.
    Ptr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimArg {
    pub name: String,
    pub ty: String,
    pub default_value: Option<String>,
    pub passing: ArgPassing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimNode {
    pub kind: ShimKind,
    pub name: String,
    pub alias: String,
    pub class_full_name: String,
    pub return_type: String,
    pub returns_void: bool,
    pub returns_reference: bool,
    pub args: Vec<ShimArg>,
    pub is_const: bool,
}

impl ShimNode {
    /// Name of the generated `default_` member.
    pub fn default_name(&self) -> String {
        format!("default_{}", self.alias)
    }
}

/// Code pieces computed by the function-transformer subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallCode {
    pub return_type: String,
    pub arg_list: String,
    pub declarations: String,
    pub pre_call: String,
    pub post_call: String,
    pub result_assignment: String,
    pub input_params: String,
    pub return_stmt: String,
    /// Type requested from `call<...>` on the override side.
    pub result_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformedKind {
    /// Static function exposed in place of the original.
    Function { call_target: String },
    /// Override of a virtual function inside a wrapper class.
    Virtual {
        class_full_name: String,
        base_args: String,
        is_const: bool,
        returns_void: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedNode {
    pub kind: TransformedKind,
    /// Name of the generated C++ function.
    pub name: String,
    pub alias: String,
    pub code: CallCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorNode {
    pub arg_types: Vec<String>,
    /// Index of the first defaulted argument.
    pub optional_from: Option<usize>,
    pub keywords: Vec<Keyword>,
    pub call_policy: CallPolicy,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorWrapperNode {
    pub wrapper_alias: String,
    pub class_full_name: String,
    pub args: Vec<ShimArg>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialConstructorNode {
    pub wrapper_alias: String,
    pub class_full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// The exposed class instance.
    SelfRef,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorNode {
    pub symbol: String,
    pub left: Operand,
    /// `None` for unary operators.
    pub right: Option<Operand>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionNode {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastingMemberOperatorNode {
    pub alias: String,
    pub function: String,
    pub call_policy: CallPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalVariableNode {
    pub alias: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberVariableNode {
    pub alias: String,
    pub full_name: String,
    pub readonly: bool,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNode {
    pub alias: String,
    pub getter: String,
    pub setter: Option<String>,
    pub getter_policy: CallPolicy,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorNode {
    pub member: String,
    pub class_full_name: String,
    pub ty: String,
    pub readonly: bool,
    pub is_static: bool,
}

impl AccessorNode {
    pub fn getter_name(&self) -> String {
        format!("get_{}", self.member)
    }

    pub fn setter_name(&self) -> String {
        format!("set_{}", self.member)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Vector,
    Map,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingSuiteNode {
    pub container: String,
    pub kind: ContainerKind,
    pub version: u8,
}

impl IndexingSuiteNode {
    /// Header declaring the suite template.
    pub fn header(&self) -> &'static str {
        match (self.version, self.kind) {
            (1, ContainerKind::Vector) => "boost/python/suite/indexing/vector_indexing_suite.hpp",
            (1, ContainerKind::Map) => "boost/python/suite/indexing/map_indexing_suite.hpp",
            (_, ContainerKind::Vector) => "indexing_suite/vector.hpp",
            (_, ContainerKind::Map) => "indexing_suite/map.hpp",
        }
    }
}
