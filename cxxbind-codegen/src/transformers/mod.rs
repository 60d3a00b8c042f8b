//! Function transformers.
//!
//! A transformer rewrites how one argument crosses the language boundary:
//! an output reference becomes part of the returned tuple, an input
//! pointer becomes a by-value argument, a C array becomes a sequence.
//! Transformers edit a shared [`TransformState`] during initialization and
//! then contribute code fragments around the native call (wrapper side) and
//! around the Python call (virtual override side).
//!
//! ```ignore
//! let mut transformation = Transformation::new(&graph, "::getValue", callable, &specs)?;
//! let code = transformation.wrapper_code(None);
//! ```

mod builtin;
mod state;

use cxxbind_decl::{CallableDecl, DeclGraph, TransformerSpec};

pub use builtin::{Inout, Input, InputArray, Output, OutputArray};
pub use state::{LocalVar, Param, ResultExpr, Side, TransformState};

use crate::creators::CallCode;

/// Errors raised while applying transformers.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("argument index {index} is out of range for {function} ({count} arguments)")]
    OutOfRange {
        function: String,
        index: usize,
        count: usize,
    },

    #[error("argument {index} of {function} was already removed by another transformer")]
    AlreadyRemoved { function: String, index: usize },

    #[error("{transformer} on {function}: argument '{arg}' must be {expected}, found '{found}'")]
    WrongType {
        function: String,
        transformer: String,
        arg: String,
        expected: &'static str,
        found: String,
    },

    #[error("the signature of {function} is already frozen")]
    Initialized { function: String },
}

/// One argument rewrite.
pub trait Transformer: std::fmt::Debug {
    /// The request this transformer was built from.
    fn spec(&self) -> TransformerSpec;

    /// Edit the signature. Called once, in declaration order.
    fn init(&mut self, state: &mut TransformState<'_>) -> Result<(), TransformError>;

    #[allow(unused_variables)]
    fn wrapper_pre_call(&self, state: &TransformState<'_>) -> Option<String> {
        None
    }

    #[allow(unused_variables)]
    fn wrapper_post_call(&self, state: &TransformState<'_>) -> Option<String> {
        None
    }

    #[allow(unused_variables)]
    fn virtual_pre_call(&self, state: &TransformState<'_>) -> Option<String> {
        None
    }

    #[allow(unused_variables)]
    fn virtual_post_call(&self, state: &TransformState<'_>) -> Option<String> {
        None
    }

    /// Support headers the generated fragments rely on.
    fn required_headers(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Build the transformer for a user request.
pub fn create(spec: TransformerSpec) -> Box<dyn Transformer> {
    match spec {
        TransformerSpec::Output { arg } => Box::new(Output::new(arg)),
        TransformerSpec::Input { arg } => Box::new(Input::new(arg)),
        TransformerSpec::Inout { arg } => Box::new(Inout::new(arg)),
        TransformerSpec::InputArray { arg, size } => Box::new(InputArray::new(arg, size)),
        TransformerSpec::OutputArray { arg, size } => Box::new(OutputArray::new(arg, size)),
    }
}

/// A function together with the transformers applied to it.
#[derive(Debug)]
pub struct Transformation<'g> {
    state: TransformState<'g>,
    transformers: Vec<Box<dyn Transformer>>,
}

impl<'g> Transformation<'g> {
    /// Initialize every transformer against `callable`, in order.
    pub fn new(
        graph: &'g DeclGraph,
        function: &str,
        callable: &CallableDecl,
        specs: &[TransformerSpec],
    ) -> Result<Self, TransformError> {
        let mut state = TransformState::new(graph, function, callable);
        let mut transformers: Vec<Box<dyn Transformer>> = specs.iter().copied().map(create).collect();
        for transformer in &mut transformers {
            transformer.init(&mut state)?;
        }
        state.finish();
        Ok(Self {
            state,
            transformers,
        })
    }

    pub fn state(&self) -> &TransformState<'g> {
        &self.state
    }

    /// Body pieces of the exposed function. Pre-call fragments run in
    /// transformer order, post-call fragments in reverse.
    pub fn wrapper_code(&self, self_type: Option<&str>) -> CallCode {
        let pre: Vec<String> = self
            .transformers
            .iter()
            .filter_map(|t| t.wrapper_pre_call(&self.state))
            .collect();
        let post: Vec<String> = self
            .transformers
            .iter()
            .rev()
            .filter_map(|t| t.wrapper_post_call(&self.state))
            .collect();
        self.state.wrapper_code(self_type, &pre, &post)
    }

    /// Body pieces of the virtual override calling into Python.
    pub fn virtual_code(&self) -> CallCode {
        let pre: Vec<String> = self
            .transformers
            .iter()
            .filter_map(|t| t.virtual_pre_call(&self.state))
            .collect();
        let post: Vec<String> = self
            .transformers
            .iter()
            .rev()
            .filter_map(|t| t.virtual_post_call(&self.state))
            .collect();
        self.state.virtual_code(&pre, &post)
    }

    /// Union of the support headers of all transformers.
    pub fn required_headers(&self) -> Vec<&'static str> {
        let mut headers = Vec::new();
        for header in self.transformers.iter().flat_map(|t| t.required_headers()) {
            if !headers.contains(&header) {
                headers.push(header);
            }
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use cxxbind_decl::{Argument, CallableKind, CppType, Fundamental};

    use super::*;

    fn get_value() -> CallableDecl {
        CallableDecl::new(CallableKind::FreeFunction)
            .returns(CppType::void())
            .arg(Argument::new(
                "v",
                CppType::fundamental(Fundamental::Int).reference(),
            ))
    }

    #[test]
    fn test_output_becomes_return_value() {
        let graph = DeclGraph::new();
        let specs = [TransformerSpec::Output { arg: 1 }];
        let transformation =
            Transformation::new(&graph, "::getValue", &get_value(), &specs).expect("transform");
        let code = transformation.wrapper_code(None);
        assert_eq!(code.return_type, "int");
        assert_eq!(code.arg_list, "");
        assert_eq!(code.declarations, "int v;");
        assert_eq!(code.input_params, "v");
        assert_eq!(code.return_stmt, "return v;");
    }

    #[test]
    fn test_two_results_become_tuple() {
        let graph = DeclGraph::new();
        let int = CppType::fundamental(Fundamental::Int);
        let callable = CallableDecl::new(CallableKind::FreeFunction)
            .returns(CppType::fundamental(Fundamental::Bool))
            .arg(Argument::new("x", int.clone().pointer()))
            .arg(Argument::new("y", int.reference()));
        let specs = [
            TransformerSpec::Output { arg: 1 },
            TransformerSpec::Output { arg: 2 },
        ];
        let transformation =
            Transformation::new(&graph, "::pos", &callable, &specs).expect("transform");
        let code = transformation.wrapper_code(None);
        assert_eq!(code.return_type, "boost::python::tuple");
        assert_eq!(code.input_params, "&x, y");
        assert_eq!(
            code.return_stmt,
            "return boost::python::make_tuple( result, x, y );"
        );

        let code = transformation.virtual_code();
        assert_eq!(code.input_params, "");
        assert_eq!(code.result_type, "boost::python::object");
        assert!(code.post_call.contains("*x = boost::python::extract< int >( pyresult[1] );"));
        assert!(code.post_call.contains("y = boost::python::extract< int >( pyresult[2] );"));
        assert_eq!(
            code.return_stmt,
            "return boost::python::extract< bool >( pyresult[0] );"
        );
    }

    #[test]
    fn test_conflicting_transformers_fail() {
        let graph = DeclGraph::new();
        let specs = [
            TransformerSpec::Output { arg: 1 },
            TransformerSpec::Input { arg: 1 },
        ];
        let err = Transformation::new(&graph, "::getValue", &get_value(), &specs).unwrap_err();
        assert!(matches!(err, TransformError::AlreadyRemoved { index: 1, .. }));
    }

    #[test]
    fn test_input_array_checks_length() {
        let graph = DeclGraph::new();
        let callable = CallableDecl::new(CallableKind::FreeFunction)
            .returns(CppType::void())
            .arg(Argument::new(
                "vec",
                CppType::fundamental(Fundamental::Double).constant().pointer(),
            ));
        let specs = [TransformerSpec::InputArray { arg: 1, size: 3 }];
        let transformation =
            Transformation::new(&graph, "::setVec", &callable, &specs).expect("transform");
        let code = transformation.wrapper_code(None);
        assert_eq!(code.arg_list, "boost::python::object vec");
        assert_eq!(code.declarations, "double c_vec[3];");
        assert!(
            code.pre_call
                .contains("pyplusplus::convenience::ensure_uniform_sequence< double >( vec, 3 );")
        );
        assert_eq!(
            transformation.required_headers(),
            vec!["__convenience.pypp.hpp"]
        );
    }
}
