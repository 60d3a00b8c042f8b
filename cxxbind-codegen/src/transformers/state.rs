//! Per-function transformation state.

use cxxbind_decl::{Argument, CallableDecl, CppType, DeclGraph};

use super::TransformError;
use crate::creators::CallCode;

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: CppType,
    pub default_value: Option<String>,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: CppType) -> Self {
        Self {
            name: name.into(),
            ty,
            default_value: None,
        }
    }

    fn from_argument(index: usize, arg: &Argument) -> Self {
        let name = if arg.name.is_empty() {
            format!("p{}", index)
        } else {
            arg.name.clone()
        };
        Self {
            name,
            ty: arg.ty.clone(),
            default_value: arg.default_value.clone(),
        }
    }
}

/// A value bundled into the exposed return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultExpr {
    pub expr: String,
    pub ty: CppType,
}

/// A temporary declared in the generated body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVar {
    pub name: String,
    pub ty: CppType,
    pub size: Option<usize>,
    pub initializer: Option<String>,
}

/// Which generated function a change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The function exposed to Python, calling the native function.
    Wrapper,
    /// The virtual override, calling into a Python implementation.
    Virtual,
}

/// A value the Python override returns, in return order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum VirtualResult {
    NativeReturn,
    Arg(String),
}

/// Parallel exposed/native signature bookkeeping for one function.
///
/// The wrapper side owns the exposed parameter list and the expressions
/// passed to the native call (one per native argument). The virtual side
/// keeps the native signature and owns the expressions passed to the
/// Python override; `arg_index_map` maps each native argument to its
/// position in that list.
#[derive(Debug)]
pub struct TransformState<'g> {
    graph: &'g DeclGraph,
    function: String,
    native_args: Vec<Param>,
    native_return: CppType,

    exposed: Vec<(Option<usize>, Param)>,
    call_params: Vec<String>,
    wrapper_results: Vec<ResultExpr>,
    wrapper_locals: Vec<LocalVar>,
    result_var: Option<String>,

    override_params: Vec<String>,
    arg_index_map: Vec<Option<usize>>,
    virtual_results: Vec<VirtualResult>,
    virtual_locals: Vec<LocalVar>,

    initialized: bool,
}

impl<'g> TransformState<'g> {
    pub fn new(graph: &'g DeclGraph, function: impl Into<String>, callable: &CallableDecl) -> Self {
        let native_args: Vec<Param> = callable
            .arguments
            .iter()
            .enumerate()
            .map(|(i, arg)| Param::from_argument(i, arg))
            .collect();
        let native_return = callable.return_type_or_void();
        let names: Vec<String> = native_args.iter().map(|p| p.name.clone()).collect();

        let mut state = Self {
            graph,
            function: function.into(),
            exposed: native_args
                .iter()
                .enumerate()
                .map(|(i, p)| (Some(i), p.clone()))
                .collect(),
            call_params: names.clone(),
            wrapper_results: Vec::new(),
            wrapper_locals: Vec::new(),
            result_var: None,
            override_params: names,
            arg_index_map: (0..native_args.len()).map(Some).collect(),
            virtual_results: Vec::new(),
            virtual_locals: Vec::new(),
            initialized: false,
            native_args,
            native_return,
        };
        if !state.native_return.is_void() {
            let ty = state.native_return.remove_reference().remove_cv().clone();
            let result = state.declare_local(Side::Wrapper, "result", ty.clone(), None, None);
            state.wrapper_results.push(ResultExpr {
                expr: result.clone(),
                ty,
            });
            state.result_var = Some(result);
            state.virtual_results.push(VirtualResult::NativeReturn);
        }
        state
    }

    pub fn graph(&self) -> &'g DeclGraph {
        self.graph
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    /// Spell a type.
    pub fn spell(&self, ty: &CppType) -> String {
        ty.decl_string(self.graph)
    }

    pub fn native_return(&self) -> &CppType {
        &self.native_return
    }

    /// The native argument at 1-based `index`.
    pub fn arg(&self, index: usize) -> Result<&Param, TransformError> {
        if index == 0 || index > self.native_args.len() {
            return Err(TransformError::OutOfRange {
                function: self.function.clone(),
                index,
                count: self.native_args.len(),
            });
        }
        Ok(&self.native_args[index - 1])
    }

    /// Native argument to Python override position.
    pub fn arg_index_map(&self) -> &[Option<usize>] {
        &self.arg_index_map
    }

    pub fn exposed_params(&self) -> impl Iterator<Item = &Param> {
        self.exposed.iter().map(|(_, p)| p)
    }

    pub fn call_params(&self) -> &[String] {
        &self.call_params
    }

    pub fn override_params(&self) -> &[String] {
        &self.override_params
    }

    pub fn wrapper_results(&self) -> &[ResultExpr] {
        &self.wrapper_results
    }

    fn check_mutable(&self) -> Result<(), TransformError> {
        if self.initialized {
            Err(TransformError::Initialized {
                function: self.function.clone(),
            })
        } else {
            Ok(())
        }
    }

    /// Remove native argument `index` from the exposed signature and from
    /// the values passed to the Python override. Index 0 drops the native
    /// return value from the exposed results.
    pub fn remove_arg(&mut self, index: usize) -> Result<(), TransformError> {
        self.check_mutable()?;
        if index == 0 {
            if let Some(result) = self.result_var.take() {
                self.wrapper_results.retain(|r| r.expr != result);
            }
            return Ok(());
        }
        self.arg(index)?;
        let native = index - 1;
        let position = self.arg_index_map[native].ok_or_else(|| TransformError::AlreadyRemoved {
            function: self.function.clone(),
            index,
        })?;
        self.exposed.retain(|(origin, _)| *origin != Some(native));
        self.override_params.remove(position);
        self.arg_index_map[native] = None;
        for entry in self.arg_index_map.iter_mut().flatten() {
            if *entry > position {
                *entry -= 1;
            }
        }
        Ok(())
    }

    /// Insert `param` into the exposed signature where native argument
    /// `index` was, and `virtual_expr` into the override arguments.
    pub fn insert_arg(
        &mut self,
        index: usize,
        param: Param,
        virtual_expr: impl Into<String>,
    ) -> Result<(), TransformError> {
        self.check_mutable()?;
        self.arg(index)?;
        let native = index - 1;

        let exposed_at = self
            .exposed
            .iter()
            .position(|(origin, _)| origin.is_some_and(|o| o > native))
            .unwrap_or(self.exposed.len());
        self.exposed.insert(exposed_at, (Some(native), param));

        let override_at = self.arg_index_map[native + 1..]
            .iter()
            .flatten()
            .min()
            .copied()
            .unwrap_or(self.override_params.len());
        self.override_params.insert(override_at, virtual_expr.into());
        for entry in self.arg_index_map.iter_mut().flatten() {
            if *entry >= override_at {
                *entry += 1;
            }
        }
        Ok(())
    }

    /// Replace the expression passed as native argument `index`.
    pub fn set_call_param(
        &mut self,
        index: usize,
        expr: impl Into<String>,
    ) -> Result<(), TransformError> {
        self.check_mutable()?;
        self.arg(index)?;
        self.call_params[index - 1] = expr.into();
        Ok(())
    }

    /// Declare a temporary, returning its name made unique on that side.
    pub fn declare_local(
        &mut self,
        side: Side,
        name: &str,
        ty: CppType,
        size: Option<usize>,
        initializer: Option<String>,
    ) -> String {
        let taken = |candidate: &str| -> bool {
            let locals = match side {
                Side::Wrapper => &self.wrapper_locals,
                Side::Virtual => &self.virtual_locals,
            };
            candidate == "self"
                || locals.iter().any(|l| l.name == candidate)
                || match side {
                    Side::Wrapper => self.exposed.iter().any(|(_, p)| p.name == candidate),
                    Side::Virtual => self.native_args.iter().any(|p| p.name == candidate),
                }
        };
        let mut unique = name.to_string();
        let mut counter = 2;
        while taken(&unique) {
            unique = format!("{}_{}", name, counter);
            counter += 1;
        }
        let local = LocalVar {
            name: unique.clone(),
            ty,
            size,
            initializer,
        };
        match side {
            Side::Wrapper => self.wrapper_locals.push(local),
            Side::Virtual => self.virtual_locals.push(local),
        }
        unique
    }

    /// Bundle `expr` into the exposed return value.
    pub fn add_result(&mut self, expr: impl Into<String>, ty: CppType) -> Result<(), TransformError> {
        self.check_mutable()?;
        self.wrapper_results.push(ResultExpr {
            expr: expr.into(),
            ty,
        });
        Ok(())
    }

    /// Record that the Python override returns a value for native argument
    /// `index`, after the values already recorded.
    pub fn add_virtual_result(&mut self, index: usize) -> Result<(), TransformError> {
        self.check_mutable()?;
        let name = self.arg(index)?.name.clone();
        self.virtual_results.push(VirtualResult::Arg(name));
        Ok(())
    }

    /// Expression reading the value returned for native argument `index`
    /// out of the override's result.
    pub fn py_result_expr(&self, index: usize) -> Result<String, TransformError> {
        let name = &self.arg(index)?.name;
        let position = self
            .virtual_results
            .iter()
            .position(|r| matches!(r, VirtualResult::Arg(n) if n == name));
        Ok(self.py_result_at(position.unwrap_or(0)))
    }

    fn py_result_at(&self, position: usize) -> String {
        if self.virtual_results.len() > 1 {
            format!("pyresult[{}]", position)
        } else {
            "pyresult".to_string()
        }
    }

    /// Freeze the signature. Declares the override result holder when the
    /// override returns anything.
    pub(super) fn finish(&mut self) {
        if !self.initialized && !self.virtual_results.is_empty() {
            self.declare_local(
                Side::Virtual,
                "pyresult",
                CppType::named("boost::python::object"),
                None,
                None,
            );
        }
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Type of the exposed return: nothing, the single result's own type,
    /// or a tuple.
    pub fn exposed_return_type(&self) -> String {
        match self.wrapper_results.as_slice() {
            [] => "void".to_string(),
            [single] => self.spell(single.ty.remove_cv()),
            _ => "boost::python::tuple".to_string(),
        }
    }

    /// The single result returned as a C++ value, whose ownership a call
    /// policy must settle. Tuples and Python objects are returned as is.
    pub fn native_result(&self) -> Option<&CppType> {
        match self.wrapper_results.as_slice() {
            [single] => match single.ty.remove_cv() {
                CppType::Named(name) if name.starts_with("boost::python::") => None,
                _ => Some(&single.ty),
            },
            _ => None,
        }
    }

    fn declarations(&self, locals: &[LocalVar]) -> String {
        locals
            .iter()
            .map(|local| {
                let size = local.size.map(|s| format!("[{}]", s)).unwrap_or_default();
                let init = local
                    .initializer
                    .as_ref()
                    .map(|i| format!(" = {}", i))
                    .unwrap_or_default();
                format!("{} {}{}{};", self.spell(&local.ty), local.name, size, init)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn params_declaration<'p>(&self, params: impl Iterator<Item = &'p Param>) -> Vec<String> {
        params
            .map(|p| match &p.default_value {
                Some(default) => format!("{} {}={}", self.spell(&p.ty), p.name, default),
                None => format!("{} {}", self.spell(&p.ty), p.name),
            })
            .collect()
    }

    /// Code pieces of the exposed function. `self_type` is the class type of
    /// the instance argument prepended for member functions.
    pub fn wrapper_code(&self, self_type: Option<&str>, pre_call: &[String], post_call: &[String]) -> CallCode {
        let mut args = Vec::new();
        if let Some(class) = self_type {
            args.push(format!("{} & self", class));
        }
        args.extend(self.params_declaration(self.exposed_params()));

        let return_stmt = match self.wrapper_results.as_slice() {
            [] => String::new(),
            [single] => format!("return {};", single.expr),
            many => format!(
                "return boost::python::make_tuple( {} );",
                many.iter()
                    .map(|r| r.expr.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        CallCode {
            return_type: self.exposed_return_type(),
            arg_list: args.join(", "),
            declarations: self.declarations(&self.wrapper_locals),
            pre_call: pre_call.join("\n\n"),
            post_call: post_call.join("\n\n"),
            result_assignment: self
                .result_var
                .as_ref()
                .map(|r| format!("{} = ", r))
                .unwrap_or_default(),
            input_params: self.call_params.join(", "),
            return_stmt,
            result_type: String::new(),
        }
    }

    /// Code pieces of the virtual override calling into Python.
    pub fn virtual_code(&self, pre_call: &[String], post_call: &[String]) -> CallCode {
        let has_results = !self.virtual_results.is_empty();
        let return_stmt = if self.native_return.is_void() {
            String::new()
        } else {
            let position = self
                .virtual_results
                .iter()
                .position(|r| *r == VirtualResult::NativeReturn)
                .unwrap_or(0);
            format!(
                "return boost::python::extract< {} >( {} );",
                self.spell(&self.native_return),
                self.py_result_at(position)
            )
        };
        CallCode {
            return_type: self.spell(&self.native_return),
            arg_list: self.params_declaration(self.native_args.iter()).join(", "),
            declarations: self.declarations(&self.virtual_locals),
            pre_call: pre_call.join("\n\n"),
            post_call: post_call.join("\n\n"),
            result_assignment: if has_results {
                "pyresult = ".to_string()
            } else {
                String::new()
            },
            input_params: self.override_params.join(", "),
            return_stmt,
            result_type: if has_results {
                "boost::python::object".to_string()
            } else {
                "void".to_string()
            },
        }
    }
}
