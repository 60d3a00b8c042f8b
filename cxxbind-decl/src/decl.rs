//! Declaration kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CppType, ExportConfig};

/// Index of a declaration inside a [`DeclGraph`](crate::DeclGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclId(pub u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Virtuality {
    #[default]
    NotVirtual,
    Virtual,
    PureVirtual,
}

impl Virtuality {
    pub fn is_virtual(&self) -> bool {
        !matches!(self, Self::NotVirtual)
    }
}

/// Source location, used for deterministic tie-breaking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

/// A single declaration of the C++ program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    #[serde(default)]
    pub access: Access,
    /// Non-owning back reference to the enclosing scope.
    #[serde(default)]
    pub parent: Option<DeclId>,
    #[serde(default)]
    pub location: Location,
    /// Compiler-generated declaration.
    #[serde(default)]
    pub is_artificial: bool,
    #[serde(default)]
    pub config: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeclKind {
    Namespace {
        #[serde(default)]
        members: Vec<DeclId>,
    },
    Class(ClassDecl),
    Callable(CallableDecl),
    Variable(VariableDecl),
    Enum(EnumDecl),
    Typedef {
        ty: CppType,
    },
}

impl DeclKind {
    /// Short human readable kind name.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Namespace { .. } => "namespace",
            Self::Class(_) => "class",
            Self::Callable(callable) => callable.kind.describe(),
            Self::Variable(_) => "variable",
            Self::Enum(_) => "enumeration",
            Self::Typedef { .. } => "typedef",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassType {
    #[default]
    Class,
    Struct,
    Union,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseSpec {
    pub class: DeclId,
    #[serde(default)]
    pub access: Access,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassDecl {
    #[serde(default)]
    pub class_type: ClassType,
    #[serde(default)]
    pub bases: Vec<BaseSpec>,
    #[serde(default)]
    pub members: Vec<DeclId>,
    /// Declared but never defined in the parsed translation unit.
    #[serde(default)]
    pub opaque: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "callable", rename_all = "snake_case")]
pub enum CallableKind {
    FreeFunction,
    MemberFunction,
    Constructor {
        #[serde(default)]
        is_copy: bool,
        #[serde(default)]
        is_explicit: bool,
    },
    Destructor,
    MemberOperator {
        symbol: String,
    },
    FreeOperator {
        symbol: String,
    },
    CastingOperator,
}

impl CallableKind {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::FreeFunction => "free function",
            Self::MemberFunction => "member function",
            Self::Constructor { .. } => "constructor",
            Self::Destructor => "destructor",
            Self::MemberOperator { .. } => "member operator",
            Self::FreeOperator { .. } => "free operator",
            Self::CastingOperator => "casting operator",
        }
    }

    pub fn is_member(&self) -> bool {
        !matches!(self, Self::FreeFunction | Self::FreeOperator { .. })
    }

    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::MemberOperator { symbol } | Self::FreeOperator { symbol } => Some(symbol),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    #[serde(default)]
    pub name: String,
    pub ty: CppType,
    #[serde(default)]
    pub default_value: Option<String>,
}

impl Argument {
    pub fn new(name: impl Into<String>, ty: CppType) -> Self {
        Self {
            name: name.into(),
            ty,
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Returns true for a default value that is a literal null pointer.
    pub fn has_null_pointer_default(&self) -> bool {
        self.ty.is_pointer()
            && matches!(
                self.default_value.as_deref().map(str::trim),
                Some("0") | Some("NULL") | Some("nullptr")
            )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallableDecl {
    #[serde(flatten)]
    pub kind: CallableKind,
    /// `None` for constructors and destructors.
    #[serde(default)]
    pub return_type: Option<CppType>,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    #[serde(default)]
    pub virtuality: Virtuality,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_const: bool,
}

impl CallableDecl {
    pub fn new(kind: CallableKind) -> Self {
        Self {
            kind,
            return_type: None,
            arguments: Vec::new(),
            virtuality: Virtuality::NotVirtual,
            is_static: false,
            is_const: false,
        }
    }

    pub fn returns(mut self, ty: CppType) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn arg(mut self, arg: Argument) -> Self {
        self.arguments.push(arg);
        self
    }

    pub fn virtuality(mut self, virtuality: Virtuality) -> Self {
        self.virtuality = virtuality;
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Return type, `void` when absent.
    pub fn return_type_or_void(&self) -> CppType {
        self.return_type.clone().unwrap_or_else(CppType::void)
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, CallableKind::Constructor { .. })
    }

    pub fn is_copy_constructor(&self) -> bool {
        matches!(self.kind, CallableKind::Constructor { is_copy: true, .. })
    }

    /// Signature key used to match overrides: name-independent types only.
    pub fn argument_types(&self) -> Vec<&CppType> {
        self.arguments.iter().map(|a| &a.ty).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub ty: CppType,
    #[serde(default)]
    pub is_static: bool,
    /// Width of a bit-field member.
    #[serde(default)]
    pub bits: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnumDecl {
    #[serde(default)]
    pub values: Vec<(String, i64)>,
}

impl EnumDecl {
    pub fn value_names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fundamental;

    #[test]
    fn test_null_pointer_default() {
        let arg = Argument::new("p", CppType::fundamental(Fundamental::Int).pointer())
            .with_default("0");
        assert!(arg.has_null_pointer_default());

        let arg = Argument::new("n", CppType::fundamental(Fundamental::Int)).with_default("0");
        assert!(!arg.has_null_pointer_default());
    }

    #[test]
    fn test_callable_from_json() {
        let json = r#"{
            "callable": "member_operator",
            "symbol": "[]",
            "return_type": { "reference": { "fundamental": "int" } },
            "arguments": [ { "name": "i", "ty": { "fundamental": "unsigned_int" } } ]
        }"#;
        let callable: CallableDecl = serde_json::from_str(json).expect("valid callable");
        assert_eq!(callable.kind.symbol(), Some("[]"));
        assert_eq!(callable.arguments.len(), 1);
        assert!(!callable.is_static);
    }
}
