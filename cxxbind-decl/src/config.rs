//! Per-declaration export configuration.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Ownership/lifetime rule attached to a function binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPolicy {
    /// `default_call_policies`, no special handling.
    Default,
    ReturnOpaquePointer,
    CopyConstReference,
    CopyNonConstReference,
    ReturnByValue,
    ManageNewObject,
    ReferenceExistingObject,
    /// Lifetime of the result is tied to the first argument (`self`).
    ReturnInternalReference,
}

impl CallPolicy {
    /// The policy name as spelled by the binding library.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "default_call_policies",
            Self::ReturnOpaquePointer => "return_opaque_pointer",
            Self::CopyConstReference => "copy_const_reference",
            Self::CopyNonConstReference => "copy_non_const_reference",
            Self::ReturnByValue => "return_by_value",
            Self::ManageNewObject => "manage_new_object",
            Self::ReferenceExistingObject => "reference_existing_object",
            Self::ReturnInternalReference => "return_internal_reference",
        }
    }

    /// Returns true for policies expressed as `return_value_policy< X >`.
    pub fn is_return_value_policy(&self) -> bool {
        !matches!(self, Self::Default | Self::ReturnInternalReference)
    }

    /// Returns true when the binding statement can omit the policy entirely.
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl fmt::Display for CallPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A function transformation requested by the user.
///
/// Argument indices are 1-based; index 0 addresses the return slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformerSpec {
    Output { arg: usize },
    Input { arg: usize },
    Inout { arg: usize },
    InputArray { arg: usize, size: usize },
    OutputArray { arg: usize, size: usize },
}

impl TransformerSpec {
    pub fn arg(&self) -> usize {
        match self {
            Self::Output { arg }
            | Self::Input { arg }
            | Self::Inout { arg }
            | Self::InputArray { arg, .. }
            | Self::OutputArray { arg, .. } => *arg,
        }
    }
}

impl fmt::Display for TransformerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output { arg } => write!(f, "output({})", arg),
            Self::Input { arg } => write!(f, "input({})", arg),
            Self::Inout { arg } => write!(f, "inout({})", arg),
            Self::InputArray { arg, size } => write!(f, "input_array({}, {})", arg, size),
            Self::OutputArray { arg, size } => write!(f, "output_array({}, {})", arg, size),
        }
    }
}

/// Whether a declaration can be bound at all.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exportability {
    #[default]
    Unknown,
    Yes,
    No(String),
}

impl Exportability {
    pub fn is_exportable(&self) -> bool {
        matches!(self, Self::Yes)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::No(reason) => Some(reason),
            _ => None,
        }
    }
}

/// The user-controlled overlay attached to every declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Exclude the declaration from the generated module.
    pub ignore: bool,
    /// Name the binding layer will see.
    pub alias: Option<String>,
    /// Overrides the resolver's choice.
    pub call_policy: Option<CallPolicy>,
    /// Force an explicit function-pointer cast in the binding statement.
    pub create_with_signature: bool,
    /// Force the scoped class registration style.
    pub always_expose_using_scope: bool,
    pub use_keywords: bool,
    pub use_default_arguments: bool,
    pub documentation: Option<String>,
    pub transformers: Vec<TransformerSpec>,
    /// Enum values exported into the enclosing scope.
    pub export_values: Vec<String>,
    pub value_aliases: BTreeMap<String, String>,
    /// Overrides the computed copyability of a class.
    pub noncopyable: Option<bool>,
    /// User text appended to the class registration.
    pub code: Vec<String>,
    /// User text appended to the wrapper class body.
    pub wrapper_code: Vec<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            ignore: false,
            alias: None,
            call_policy: None,
            create_with_signature: false,
            always_expose_using_scope: false,
            use_keywords: true,
            use_default_arguments: true,
            documentation: None,
            transformers: Vec::new(),
            export_values: Vec::new(),
            value_aliases: BTreeMap::new(),
            noncopyable: None,
            code: Vec::new(),
            wrapper_code: Vec::new(),
        }
    }
}
