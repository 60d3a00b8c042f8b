//! C++ type model and type-trait helpers.

use serde::{Deserialize, Serialize};

use crate::{DeclGraph, DeclId};

/// Built-in C++ types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fundamental {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    WChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    LongDouble,
}

impl Fundamental {
    /// The C++ spelling of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::SignedChar => "signed char",
            Self::UnsignedChar => "unsigned char",
            Self::WChar => "wchar_t",
            Self::Short => "short int",
            Self::UnsignedShort => "short unsigned int",
            Self::Int => "int",
            Self::UnsignedInt => "unsigned int",
            Self::Long => "long int",
            Self::UnsignedLong => "long unsigned int",
            Self::LongLong => "long long int",
            Self::UnsignedLongLong => "long long unsigned int",
            Self::Float => "float",
            Self::Double => "double",
            Self::LongDouble => "long double",
        }
    }

    /// Returns true for integral types (`bool` and the character types included).
    pub fn is_integral(&self) -> bool {
        !matches!(
            self,
            Self::Void | Self::Float | Self::Double | Self::LongDouble
        )
    }
}

/// A C++ type as resolved by the front end.
///
/// Types referring to classes and enumerations point back into the
/// [`DeclGraph`] through [`CppType::Declared`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CppType {
    Fundamental(Fundamental),
    /// A class, struct, union or enumeration declared in the graph.
    Declared(DeclId),
    /// A type known only by its spelling (e.g. `boost::python::object`).
    Named(String),
    Pointer(Box<CppType>),
    Reference(Box<CppType>),
    Const(Box<CppType>),
    Volatile(Box<CppType>),
    Array {
        base: Box<CppType>,
        size: Option<usize>,
    },
    FunctionPointer {
        return_type: Box<CppType>,
        arguments: Vec<CppType>,
    },
}

impl CppType {
    pub fn fundamental(f: Fundamental) -> Self {
        Self::Fundamental(f)
    }

    pub fn void() -> Self {
        Self::Fundamental(Fundamental::Void)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn pointer(self) -> Self {
        Self::Pointer(Box::new(self))
    }

    pub fn reference(self) -> Self {
        Self::Reference(Box::new(self))
    }

    pub fn constant(self) -> Self {
        Self::Const(Box::new(self))
    }

    pub fn array(self, size: Option<usize>) -> Self {
        Self::Array {
            base: Box::new(self),
            size,
        }
    }

    /// Render the C++ spelling of this type, e.g. `::ns::A const &`.
    pub fn decl_string(&self, graph: &DeclGraph) -> String {
        match self {
            Self::Fundamental(f) => f.as_str().to_string(),
            Self::Declared(id) => graph.full_name(*id),
            Self::Named(name) => name.clone(),
            Self::Pointer(base) => format!("{} *", base.decl_string(graph)),
            Self::Reference(base) => format!("{} &", base.decl_string(graph)),
            Self::Const(base) => format!("{} const", base.decl_string(graph)),
            Self::Volatile(base) => format!("{} volatile", base.decl_string(graph)),
            Self::Array { base, size } => match size {
                Some(size) => format!("{}[{}]", base.decl_string(graph), size),
                None => format!("{}[]", base.decl_string(graph)),
            },
            Self::FunctionPointer {
                return_type,
                arguments,
            } => {
                let args: Vec<String> = arguments.iter().map(|a| a.decl_string(graph)).collect();
                format!("{} (*)( {} )", return_type.decl_string(graph), args.join(", "))
            }
        }
    }

    /// Strip top-level `const`/`volatile` qualifiers.
    pub fn remove_cv(&self) -> &CppType {
        match self {
            Self::Const(base) | Self::Volatile(base) => base.remove_cv(),
            other => other,
        }
    }

    /// Strip a top-level reference (after cv removal).
    pub fn remove_reference(&self) -> &CppType {
        match self.remove_cv() {
            Self::Reference(base) => base,
            other => other,
        }
    }

    /// Strip a top-level `const` (not `volatile`), looking through nothing else.
    pub fn remove_const(&self) -> &CppType {
        match self {
            Self::Const(base) => base.remove_const(),
            other => other,
        }
    }

    /// The type a pointer or reference refers to.
    pub fn pointee(&self) -> Option<&CppType> {
        match self.remove_cv() {
            Self::Pointer(base) | Self::Reference(base) => Some(base),
            Self::Array { base, .. } => Some(base),
            _ => None,
        }
    }

    /// Strip every pointer, reference, array and cv layer.
    pub fn base_type(&self) -> &CppType {
        match self {
            Self::Pointer(base)
            | Self::Reference(base)
            | Self::Const(base)
            | Self::Volatile(base)
            | Self::Array { base, .. } => base.base_type(),
            other => other,
        }
    }

    /// Every layer of the type, outermost first.
    pub fn decompose(&self) -> Vec<&CppType> {
        let mut units = vec![self];
        let mut current = self;
        loop {
            match current {
                Self::Pointer(base)
                | Self::Reference(base)
                | Self::Const(base)
                | Self::Volatile(base)
                | Self::Array { base, .. } => {
                    units.push(base);
                    current = base;
                }
                _ => return units,
            }
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.remove_cv(), Self::Pointer(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.remove_cv(), Self::Reference(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.remove_cv(), Self::Array { .. })
    }

    pub fn is_const(&self) -> bool {
        matches!(self, Self::Const(_))
    }

    /// `T const &`
    pub fn is_const_reference(&self) -> bool {
        matches!(self.remove_cv(), Self::Reference(base) if base.is_const())
    }

    pub fn is_void(&self) -> bool {
        matches!(self.remove_cv(), Self::Fundamental(Fundamental::Void))
    }

    pub fn is_fundamental(&self) -> bool {
        matches!(self.remove_cv(), Self::Fundamental(_))
    }

    pub fn as_fundamental(&self) -> Option<Fundamental> {
        match self.remove_cv() {
            Self::Fundamental(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns true if any layer of the type is a pointer to function.
    pub fn has_function_pointer(&self) -> bool {
        self.decompose()
            .into_iter()
            .any(|unit| matches!(unit, Self::FunctionPointer { .. }))
    }

    /// The declaration the innermost layer refers to, if any.
    pub fn declared(&self) -> Option<DeclId> {
        match self.base_type() {
            Self::Declared(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns true if this is a pointer to `void` (cv-qualified or not).
    pub fn is_void_pointer(&self) -> bool {
        match self.remove_cv() {
            Self::Pointer(base) => base.is_void(),
            _ => false,
        }
    }

    /// Returns true if this is `const F *` for the given fundamental type.
    pub fn is_pointer_to_const(&self, fundamental: Fundamental) -> bool {
        match self.remove_cv() {
            Self::Pointer(base) => {
                base.is_const() && base.as_fundamental() == Some(fundamental)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fundamental_spelling() {
        let graph = DeclGraph::new();
        let ty = CppType::fundamental(Fundamental::Char)
            .constant()
            .pointer();
        assert_eq!(ty.decl_string(&graph), "char const *");
        assert!(ty.is_pointer_to_const(Fundamental::Char));
    }

    #[test]
    fn test_remove_cv_and_reference() {
        let ty = CppType::fundamental(Fundamental::Int).constant().reference();
        assert!(ty.is_reference());
        assert!(ty.is_const_reference());
        assert_eq!(ty.remove_reference().remove_cv(), &CppType::fundamental(Fundamental::Int));
    }

    #[test]
    fn test_base_type_strips_all_layers() {
        let ty = CppType::fundamental(Fundamental::Double)
            .array(Some(3))
            .pointer()
            .constant();
        assert_eq!(ty.base_type(), &CppType::fundamental(Fundamental::Double));
        assert_eq!(ty.decompose().len(), 4);
    }

    #[test]
    fn test_function_pointer_detection() {
        let fptr = CppType::FunctionPointer {
            return_type: Box::new(CppType::void()),
            arguments: vec![CppType::fundamental(Fundamental::Int)],
        };
        assert!(fptr.has_function_pointer());
        assert!(fptr.clone().reference().has_function_pointer());
        assert!(!CppType::void().pointer().has_function_pointer());
    }

    #[test]
    fn test_void_pointer() {
        assert!(CppType::void().pointer().is_void_pointer());
        assert!(CppType::void().constant().pointer().is_void_pointer());
        assert!(!CppType::fundamental(Fundamental::Int).pointer().is_void_pointer());
    }
}
