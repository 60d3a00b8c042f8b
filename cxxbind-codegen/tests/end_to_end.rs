use cxxbind_codegen::{
    creators::{MakerStyle, NodeKind, ShimKind},
    options::ModuleOptions,
    pipeline::{CompilationContext, Pipeline},
    testing::{
        assert_content_eq, generate_to_temp, geometry_graph, get_value_graph, shape_graph,
    },
    transformers::Transformation,
};
use cxxbind_decl::{
    Access, Argument, CallableDecl, CallableKind, CppType, DeclGraph, Fundamental, Location,
    TransformerSpec, Virtuality,
};

fn run(graph: DeclGraph) -> CompilationContext {
    Pipeline::new()
        .run(graph, ModuleOptions::new("m"))
        .expect("pipeline should succeed")
}

fn nodes(ctx: &CompilationContext) -> Vec<NodeKind> {
    let tree = ctx.tree().expect("tree built");
    tree.descendants(tree.root())
        .into_iter()
        .filter_map(|id| tree.kind(id).cloned())
        .collect()
}

fn position(code: &str, needle: &str) -> usize {
    code.find(needle)
        .unwrap_or_else(|| panic!("`{}` not found in:\n{}", needle, code))
}

#[test]
fn test_shape_scenario() {
    let ctx = run(shape_graph());
    let shape = ctx.graph.find_all("Shape")[0];
    assert!(ctx.exportability[&shape].is_exportable());

    let nodes = nodes(&ctx);
    let classes = nodes
        .iter()
        .filter(|k| matches!(k, NodeKind::Class(c) if c.full_name == "::Shape"))
        .count();
    let wrappers = nodes
        .iter()
        .filter(|k| matches!(k, NodeKind::ClassWrapper(_)))
        .count();
    let shims: Vec<_> = nodes
        .iter()
        .filter_map(|k| match k {
            NodeKind::Shim(shim) => Some(shim),
            _ => None,
        })
        .collect();
    assert_eq!(classes, 1);
    assert_eq!(wrappers, 1);
    assert_eq!(shims.len(), 1);
    assert_eq!(shims[0].kind, ShimKind::PureVirtual);
    assert_eq!(shims[0].name, "area");

    for kind in &nodes {
        if let NodeKind::Maker(maker) = kind {
            assert_eq!(maker.style, MakerStyle::PureVirtual);
        }
    }
    let code = ctx.render().expect("rendered");
    assert!(code.contains("bp::pure_virtual( &::Shape::area )"));
}

#[test]
fn test_get_value_scenario() {
    let graph = get_value_graph();
    let id = graph.find_all("getValue")[0];
    let callable = graph.as_callable(id).expect("callable");
    let transformation = Transformation::new(
        &graph,
        "::getValue",
        callable,
        &graph[id].config.transformers,
    )
    .expect("valid transformers");
    let state = transformation.state();
    assert_eq!(state.exposed_params().count(), 0);
    assert_eq!(state.exposed_return_type(), "int");
    assert_eq!(state.wrapper_results().len(), 1);

    let code = run(graph).render().expect("rendered");
    assert!(code.contains("static int _py_getValue(  ){"));
    assert!(code.contains("\"getValue\"\n"));
    assert!(code.contains(", &_py_getValue );"));
}

#[test]
fn test_rendering_is_idempotent_and_deterministic() {
    let first = run(geometry_graph());
    let once = first.render().expect("rendered");
    let twice = first.render().expect("rendered");
    assert_content_eq(&once, &twice);

    for _ in 0..3 {
        let again = run(geometry_graph()).render().expect("rendered");
        assert_content_eq(&once, &again);
    }
}

#[test]
fn test_bases_are_registered_first() {
    let ctx = run(geometry_graph());
    let code = ctx.render().expect("rendered");

    assert!(position(&code, "\"Shape\"") < position(&code, "\"Circle\""));

    let mut graph = DeclGraph::new();
    let derived = graph.add_class(DeclGraph::ROOT, "Alpha");
    let base = graph.add_class(DeclGraph::ROOT, "Omega");
    let options = graph.add_class(DeclGraph::ROOT, "Beta");
    graph.add_base(derived, base, Access::Public);
    graph.add_callable(
        base,
        "configure",
        CallableDecl::new(CallableKind::MemberFunction)
            .returns(CppType::void())
            .arg(
                Argument::new("o", CppType::Declared(options).constant().reference())
                    .with_default("Beta()"),
            ),
    );
    let code = run(graph).render().expect("rendered");
    assert!(position(&code, "( \"Beta\" )") < position(&code, "( \"Omega\" )"));
    assert!(position(&code, "( \"Omega\" )") < position(&code, "( \"Alpha\" )"));
}

#[test]
fn test_wrapper_only_when_needed() {
    let ctx = run(geometry_graph());
    let code = ctx.render().expect("rendered");

    assert!(!code.contains("Point_wrapper"));
    assert!(code.contains("struct geo_scope_Shape_wrapper : ::geo::Shape, bp::wrapper< ::geo::Shape > {"));
    assert!(code.contains("struct geo_scope_Circle_wrapper : ::geo::Circle, bp::wrapper< ::geo::Circle > {"));
}

#[test]
fn test_geometry_module() {
    let ctx = run(geometry_graph());
    assert_eq!(
        ctx.warnings().count(),
        0,
        "unexpected warnings: {:?}",
        ctx.warnings().collect::<Vec<_>>()
    );

    let code = ctx.render().expect("rendered");
    assert!(code.contains("bp::enum_< ::geo::Color >( \"Color\" )"));
    assert!(code.contains("bp::init< double, bp::optional< double > >"));
    assert!(code.contains("def_readwrite( \"x\", &::geo::Point::x )"));
    assert!(code.contains("bp::self + bp::self"));
    assert!(code.contains("bp::vector_indexing_suite< ::std::vector<double> >"));

    let headers: Vec<String> = ctx
        .required_headers()
        .expect("tree built")
        .into_iter()
        .collect();
    assert_eq!(
        headers,
        vec!["boost/python/suite/indexing/vector_indexing_suite.hpp"]
    );
    assert_eq!(
        ctx.tree().expect("tree built").includes(),
        vec![
            "boost/python.hpp",
            "geo/color.hpp",
            "geo/shape.hpp",
            "geo/point.hpp",
            "boost/python/suite/indexing/vector_indexing_suite.hpp",
        ]
    );
}

#[test]
fn test_unexposed_dependencies_are_reported() {
    let mut graph = shape_graph();
    let shape = graph.find_all("Shape")[0];
    graph[shape].config.ignore = true;
    graph.add_callable(
        DeclGraph::ROOT,
        "largest",
        CallableDecl::new(CallableKind::FreeFunction)
            .returns(CppType::Declared(shape).constant().reference()),
    );

    let ctx = run(graph);
    let warning = ctx
        .warnings()
        .find(|d| d.location.as_deref() == Some("::Shape"))
        .expect("dependency warning");
    assert_eq!(warning.phase, "diagnose");
    assert!(warning.message.contains("::largest (return type)"));
    assert!(ctx.render().expect("rendered").contains("\"largest\""));
}

#[test]
fn test_colliding_names_are_reported() {
    let mut graph = DeclGraph::new();
    graph.add_class(DeclGraph::ROOT, "vector<int>");
    graph.add_class(DeclGraph::ROOT, "vector_less_int_grate_");

    let ctx = run(graph);
    assert_eq!(ctx.collisions.len(), 1);
    assert!(
        ctx.warnings()
            .any(|d| d.message.contains("are both exposed as 'vector_less_int_grate_'"))
    );
}

#[test]
fn test_array_transformer_ships_convenience_header() {
    let mut graph = DeclGraph::new();
    let fill = graph.add_callable(
        DeclGraph::ROOT,
        "fill",
        CallableDecl::new(CallableKind::FreeFunction)
            .returns(CppType::void())
            .arg(Argument::new(
                "values",
                CppType::fundamental(Fundamental::Double).pointer(),
            )),
    );
    graph[fill].location = Location::new("fill.hpp", 1);
    graph[fill].config.transformers = vec![TransformerSpec::InputArray { arg: 1, size: 3 }];

    let ctx = run(graph);
    let code = ctx.render().expect("rendered");
    assert!(code.contains("ensure_uniform_sequence< double >( values, 3 );"));

    let dir = generate_to_temp(&ctx).expect("written");
    let module = std::fs::read_to_string(dir.path().join("m.cpp")).expect("module written");
    assert_content_eq(&code, &module);
    let header = std::fs::read_to_string(dir.path().join("__convenience.pypp.hpp"))
        .expect("header written");
    assert!(header.contains("namespace pyplusplus"));
}

#[test]
fn test_virtual_member_of_plain_class() {
    let mut graph = DeclGraph::new();
    let widget = graph.add_class(DeclGraph::ROOT, "Widget");
    graph.add_callable(
        widget,
        "draw",
        CallableDecl::new(CallableKind::MemberFunction)
            .returns(CppType::void())
            .virtuality(Virtuality::Virtual),
    );

    let ctx = run(graph);
    let shims: Vec<ShimKind> = nodes(&ctx)
        .into_iter()
        .filter_map(|k| match k {
            NodeKind::Shim(shim) => Some(shim.kind),
            _ => None,
        })
        .collect();
    assert_eq!(shims, vec![ShimKind::Virtual]);
}
