use cxxbind_decl::{CppType, TransformerSpec};

use super::{Param, Side, TransformError, TransformState, Transformer};
use crate::code_repository::CONVENIENCE;

const OBJECT: &str = "boost::python::object";
const LIST: &str = "boost::python::list";

fn wrong_type(
    state: &TransformState<'_>,
    spec: TransformerSpec,
    arg: &Param,
    expected: &'static str,
) -> TransformError {
    TransformError::WrongType {
        function: state.function().to_string(),
        transformer: spec.to_string(),
        arg: arg.name.clone(),
        expected,
        found: state.spell(&arg.ty),
    }
}

/// The argument, required to be a pointer or a reference.
fn indirect_arg(
    state: &TransformState<'_>,
    spec: TransformerSpec,
) -> Result<Param, TransformError> {
    let arg = state.arg(spec.arg())?.clone();
    if arg.ty.is_pointer() || arg.ty.is_reference() {
        Ok(arg)
    } else {
        Err(wrong_type(state, spec, &arg, "a pointer or a reference"))
    }
}

/// The argument, required to be a pointer or a C array.
fn array_arg(state: &TransformState<'_>, spec: TransformerSpec) -> Result<Param, TransformError> {
    let arg = state.arg(spec.arg())?.clone();
    if arg.ty.is_pointer() || arg.ty.is_array() {
        Ok(arg)
    } else {
        Err(wrong_type(state, spec, &arg, "a pointer or an array"))
    }
}

/// The value type behind a pointer, reference or array, without cv.
fn value_type(ty: &CppType) -> CppType {
    ty.pointee().unwrap_or(ty).remove_cv().clone()
}

fn extract_statement(
    state: &TransformState<'_>,
    what: &str,
    arg: usize,
    name: &str,
    ty: &CppType,
) -> Option<String> {
    let deref = if ty.is_pointer() { "*" } else { "" };
    let source = state.py_result_expr(arg).ok()?;
    Some(format!(
        "// Extract the C++ value for {} '{}' (index: {})\n{}{} = boost::python::extract< {} >( {} );",
        what,
        name,
        arg,
        deref,
        name,
        state.spell(&value_type(ty)),
        source
    ))
}

/// Moves an output argument into the returned values.
#[derive(Debug)]
pub struct Output {
    arg: usize,
    name: String,
    ty: Option<CppType>,
}

impl Output {
    pub fn new(arg: usize) -> Self {
        Self {
            arg,
            name: String::new(),
            ty: None,
        }
    }
}

impl Transformer for Output {
    fn spec(&self) -> TransformerSpec {
        TransformerSpec::Output { arg: self.arg }
    }

    fn init(&mut self, state: &mut TransformState<'_>) -> Result<(), TransformError> {
        let arg = indirect_arg(state, self.spec())?;
        state.remove_arg(self.arg)?;
        let value = value_type(&arg.ty);
        let local = state.declare_local(Side::Wrapper, &arg.name, value.clone(), None, None);
        let expr = if arg.ty.is_pointer() {
            format!("&{}", local)
        } else {
            local.clone()
        };
        state.set_call_param(self.arg, expr)?;
        state.add_result(local, value)?;
        state.add_virtual_result(self.arg)?;
        self.name = arg.name;
        self.ty = Some(arg.ty);
        Ok(())
    }

    fn virtual_post_call(&self, state: &TransformState<'_>) -> Option<String> {
        let ty = self.ty.as_ref()?;
        extract_statement(state, "output argument", self.arg, &self.name, ty)
    }
}

/// Passes a pointer or reference argument by value.
#[derive(Debug)]
pub struct Input {
    arg: usize,
}

impl Input {
    pub fn new(arg: usize) -> Self {
        Self { arg }
    }
}

/// Replace a pointer/reference argument with a by-value parameter of the
/// same name, passing its address (or itself) to the native call.
fn pass_by_value(state: &mut TransformState<'_>, index: usize, arg: &Param) -> Result<CppType, TransformError> {
    state.remove_arg(index)?;
    let value = value_type(&arg.ty);
    let (native_expr, virtual_expr) = if arg.ty.is_pointer() {
        (format!("&{}", arg.name), format!("*{}", arg.name))
    } else {
        (arg.name.clone(), arg.name.clone())
    };
    state.insert_arg(index, Param::new(&arg.name, value.clone()), virtual_expr)?;
    state.set_call_param(index, native_expr)?;
    Ok(value)
}

impl Transformer for Input {
    fn spec(&self) -> TransformerSpec {
        TransformerSpec::Input { arg: self.arg }
    }

    fn init(&mut self, state: &mut TransformState<'_>) -> Result<(), TransformError> {
        let arg = indirect_arg(state, self.spec())?;
        pass_by_value(state, self.arg, &arg)?;
        Ok(())
    }
}

/// Takes an argument by value and returns its modified value.
#[derive(Debug)]
pub struct Inout {
    arg: usize,
    name: String,
    ty: Option<CppType>,
}

impl Inout {
    pub fn new(arg: usize) -> Self {
        Self {
            arg,
            name: String::new(),
            ty: None,
        }
    }
}

impl Transformer for Inout {
    fn spec(&self) -> TransformerSpec {
        TransformerSpec::Inout { arg: self.arg }
    }

    fn init(&mut self, state: &mut TransformState<'_>) -> Result<(), TransformError> {
        let arg = indirect_arg(state, self.spec())?;
        let value = pass_by_value(state, self.arg, &arg)?;
        state.add_result(&arg.name, value)?;
        state.add_virtual_result(self.arg)?;
        self.name = arg.name;
        self.ty = Some(arg.ty);
        Ok(())
    }

    fn virtual_post_call(&self, state: &TransformState<'_>) -> Option<String> {
        let ty = self.ty.as_ref()?;
        extract_statement(state, "in/out argument", self.arg, &self.name, ty)
    }
}

/// Accepts a Python sequence of fixed length for a C array argument.
#[derive(Debug)]
pub struct InputArray {
    arg: usize,
    size: usize,
    name: String,
    element: Option<CppType>,
    carray: String,
    pylist: String,
}

impl InputArray {
    pub fn new(arg: usize, size: usize) -> Self {
        Self {
            arg,
            size,
            name: String::new(),
            element: None,
            carray: String::new(),
            pylist: String::new(),
        }
    }
}

impl Transformer for InputArray {
    fn spec(&self) -> TransformerSpec {
        TransformerSpec::InputArray {
            arg: self.arg,
            size: self.size,
        }
    }

    fn init(&mut self, state: &mut TransformState<'_>) -> Result<(), TransformError> {
        let arg = array_arg(state, self.spec())?;
        let element = value_type(&arg.ty);
        state.remove_arg(self.arg)?;
        self.pylist = state.declare_local(
            Side::Virtual,
            &format!("py_{}", arg.name),
            CppType::named(LIST),
            None,
            None,
        );
        state.insert_arg(
            self.arg,
            Param::new(&arg.name, CppType::named(OBJECT)),
            self.pylist.clone(),
        )?;
        self.carray = state.declare_local(
            Side::Wrapper,
            &format!("c_{}", arg.name),
            element.clone(),
            Some(self.size),
            None,
        );
        state.set_call_param(self.arg, self.carray.clone())?;
        self.name = arg.name;
        self.element = Some(element);
        Ok(())
    }

    fn wrapper_pre_call(&self, state: &TransformState<'_>) -> Option<String> {
        let element = state.spell(self.element.as_ref()?);
        Some(format!(
            "{ns}::ensure_uniform_sequence< {element} >( {name}, {size} );\n\
             {ns}::copy_sequence( {name}, {ns}::array_inserter( {carray}, {size} ) );",
            ns = CONVENIENCE.namespace,
            element = element,
            name = self.name,
            size = self.size,
            carray = self.carray,
        ))
    }

    fn virtual_pre_call(&self, _state: &TransformState<'_>) -> Option<String> {
        Some(format!(
            "{ns}::copy_container( {name}, {name} + {size}, {ns}::list_inserter( {pylist} ) );",
            ns = CONVENIENCE.namespace,
            name = self.name,
            size = self.size,
            pylist = self.pylist,
        ))
    }

    fn required_headers(&self) -> Vec<&'static str> {
        vec![CONVENIENCE.file_name]
    }
}

/// Returns a C array filled by the callee as a Python list.
#[derive(Debug)]
pub struct OutputArray {
    arg: usize,
    size: usize,
    name: String,
    element: Option<CppType>,
    carray: String,
    pylist: String,
    pyobject: String,
}

impl OutputArray {
    pub fn new(arg: usize, size: usize) -> Self {
        Self {
            arg,
            size,
            name: String::new(),
            element: None,
            carray: String::new(),
            pylist: String::new(),
            pyobject: String::new(),
        }
    }
}

impl Transformer for OutputArray {
    fn spec(&self) -> TransformerSpec {
        TransformerSpec::OutputArray {
            arg: self.arg,
            size: self.size,
        }
    }

    fn init(&mut self, state: &mut TransformState<'_>) -> Result<(), TransformError> {
        let arg = array_arg(state, self.spec())?;
        let element = value_type(&arg.ty);
        state.remove_arg(self.arg)?;
        self.carray = state.declare_local(
            Side::Wrapper,
            &format!("c_{}", arg.name),
            element.clone(),
            Some(self.size),
            None,
        );
        self.pylist =
            state.declare_local(Side::Wrapper, &arg.name, CppType::named(LIST), None, None);
        state.set_call_param(self.arg, self.carray.clone())?;
        state.add_result(self.pylist.clone(), CppType::named(LIST))?;

        self.pyobject = state.declare_local(
            Side::Virtual,
            &format!("py_{}", arg.name),
            CppType::named(OBJECT),
            None,
            None,
        );
        state.add_virtual_result(self.arg)?;
        self.name = arg.name;
        self.element = Some(element);
        Ok(())
    }

    fn wrapper_post_call(&self, _state: &TransformState<'_>) -> Option<String> {
        Some(format!(
            "{ns}::copy_container( {carray}, {carray} + {size}, {ns}::list_inserter( {pylist} ) );",
            ns = CONVENIENCE.namespace,
            carray = self.carray,
            size = self.size,
            pylist = self.pylist,
        ))
    }

    fn virtual_post_call(&self, state: &TransformState<'_>) -> Option<String> {
        let element = state.spell(self.element.as_ref()?);
        let source = state.py_result_expr(self.arg).ok()?;
        Some(format!(
            "{py} = {source};\n\
             {ns}::ensure_uniform_sequence< {element} >( {py}, {size} );\n\
             {ns}::copy_sequence( {py}, {ns}::array_inserter( {name}, {size} ) );",
            py = self.pyobject,
            source = source,
            ns = CONVENIENCE.namespace,
            element = element,
            size = self.size,
            name = self.name,
        ))
    }

    fn required_headers(&self) -> Vec<&'static str> {
        vec![CONVENIENCE.file_name]
    }
}

#[cfg(test)]
mod tests {
    use cxxbind_decl::{Argument, CallableDecl, CallableKind, DeclGraph, Fundamental};

    use super::*;
    use crate::transformers::Transformation;

    fn int() -> CppType {
        CppType::fundamental(Fundamental::Int)
    }

    #[test]
    fn test_output_rejects_value_argument() {
        let graph = DeclGraph::new();
        let callable = CallableDecl::new(CallableKind::FreeFunction)
            .returns(CppType::void())
            .arg(Argument::new("v", int()));
        let err = Transformation::new(&graph, "::f", &callable, &[TransformerSpec::Output {
            arg: 1,
        }])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "output(1) on ::f: argument 'v' must be a pointer or a reference, found 'int'"
        );
    }

    #[test]
    fn test_input_pointer_passes_address() {
        let graph = DeclGraph::new();
        let callable = CallableDecl::new(CallableKind::FreeFunction)
            .returns(CppType::void())
            .arg(Argument::new("a", int()))
            .arg(Argument::new("p", int().constant().pointer()));
        let transformation =
            Transformation::new(&graph, "::f", &callable, &[TransformerSpec::Input { arg: 2 }])
                .expect("transform");
        let code = transformation.wrapper_code(None);
        assert_eq!(code.arg_list, "int a, int p");
        assert_eq!(code.input_params, "a, &p");
        assert_eq!(transformation.virtual_code().input_params, "a, *p");
    }

    #[test]
    fn test_inout_returns_modified_value() {
        let graph = DeclGraph::new();
        let callable = CallableDecl::new(CallableKind::MemberFunction)
            .returns(CppType::void())
            .arg(Argument::new("n", int().reference()));
        let transformation =
            Transformation::new(&graph, "::A::bump", &callable, &[TransformerSpec::Inout {
                arg: 1,
            }])
            .expect("transform");
        let code = transformation.wrapper_code(Some("::A"));
        assert_eq!(code.arg_list, "::A & self, int n");
        assert_eq!(code.return_stmt, "return n;");
        let code = transformation.virtual_code();
        assert_eq!(code.input_params, "n");
        assert!(code.post_call.starts_with("// Extract the C++ value for in/out argument 'n'"));
        assert!(code.post_call.ends_with("n = boost::python::extract< int >( pyresult );"));
    }

    #[test]
    fn test_output_array_returns_list() {
        let graph = DeclGraph::new();
        let callable = CallableDecl::new(CallableKind::FreeFunction)
            .returns(CppType::void())
            .arg(Argument::new("out", int().array(Some(4))));
        let transformation = Transformation::new(&graph, "::fill", &callable, &[
            TransformerSpec::OutputArray { arg: 1, size: 4 },
        ])
        .expect("transform");
        let code = transformation.wrapper_code(None);
        assert_eq!(code.return_type, "boost::python::list");
        assert_eq!(code.declarations, "int c_out[4];\nboost::python::list out;");
        assert_eq!(code.input_params, "c_out");
        assert_eq!(
            code.post_call,
            "pyplusplus::convenience::copy_container( c_out, c_out + 4, pyplusplus::convenience::list_inserter( out ) );"
        );
        let code = transformation.virtual_code();
        assert_eq!(code.declarations, "boost::python::object py_out;\nboost::python::object pyresult;");
        assert!(code.post_call.starts_with("py_out = pyresult;"));
    }
}
