//! Test utilities for the generator.
//!
//! This module is only available when the `testing` feature is enabled
//! or during tests.

use std::path::Path;

use cxxbind_decl::{
    Access, Argument, CallableDecl, CallableKind, CppType, DeclGraph, Fundamental, Location,
    TransformerSpec, Virtuality,
};
use eyre::Result;

use crate::pipeline::CompilationContext;

fn double() -> CppType {
    CppType::fundamental(Fundamental::Double)
}

/// `class Shape { public: virtual double area() const = 0; };`
pub fn shape_graph() -> DeclGraph {
    let mut graph = DeclGraph::new();
    let shape = graph.add_class(DeclGraph::ROOT, "Shape");
    graph[shape].location = Location::new("shape.hpp", 1);
    graph.add_callable(
        shape,
        "area",
        CallableDecl::new(CallableKind::MemberFunction)
            .returns(double())
            .virtuality(Virtuality::PureVirtual)
            .constant(),
    );
    graph
}

/// `void getValue(int& v);` with `output(1)` applied.
pub fn get_value_graph() -> DeclGraph {
    let mut graph = DeclGraph::new();
    let get_value = graph.add_callable(
        DeclGraph::ROOT,
        "getValue",
        CallableDecl::new(CallableKind::FreeFunction)
            .returns(CppType::void())
            .arg(Argument::new(
                "v",
                CppType::fundamental(Fundamental::Int).reference(),
            )),
    );
    graph[get_value].location = Location::new("value.hpp", 1);
    graph[get_value].config.transformers = vec![TransformerSpec::Output { arg: 1 }];
    graph
}

/// A small geometry library:
///
/// ```cpp
/// namespace geo {
///     enum Color { red, green };
///     struct Point {
///         Point(double x, double y = 0);
///         double x, y;
///     };
///     Point operator+(Point const& a, Point const& b);
///     class Shape {
///     public:
///         virtual double area() const = 0;
///         virtual Color color() const;
///     protected:
///         void invalidate();
///     };
///     class Circle : public Shape {
///     public:
///         Circle(Point const& center, double radius = 1);
///         double area() const;
///     };
///     double total(std::vector<double> const& values);
/// }
/// ```
pub fn geometry_graph() -> DeclGraph {
    let mut graph = DeclGraph::new();
    let namespace = graph.add_namespace(DeclGraph::ROOT, "std");
    let doubles = graph.add_class(namespace, "vector<double>");

    let geo = graph.add_namespace(DeclGraph::ROOT, "geo");
    let color = graph.add_enum(geo, "Color", &[("red", 0), ("green", 1)]);
    graph[color].location = Location::new("geo/color.hpp", 1);

    let point = graph.add_class(geo, "Point");
    graph[point].location = Location::new("geo/point.hpp", 1);
    graph.add_callable(
        point,
        "Point",
        CallableDecl::new(CallableKind::Constructor {
            is_copy: false,
            is_explicit: false,
        })
        .arg(Argument::new("x", double()))
        .arg(Argument::new("y", double()).with_default("0")),
    );
    graph.add_variable(point, "x", double());
    graph.add_variable(point, "y", double());
    let point_ref = CppType::Declared(point).constant().reference();
    let plus = graph.add_callable(
        geo,
        "operator+",
        CallableDecl::new(CallableKind::FreeOperator {
            symbol: "+".to_string(),
        })
        .returns(CppType::Declared(point))
        .arg(Argument::new("a", point_ref.clone()))
        .arg(Argument::new("b", point_ref.clone())),
    );
    graph[plus].location = Location::new("geo/point.hpp", 9);

    let shape = graph.add_class(geo, "Shape");
    graph[shape].location = Location::new("geo/shape.hpp", 1);
    graph.add_callable(
        shape,
        "area",
        CallableDecl::new(CallableKind::MemberFunction)
            .returns(double())
            .virtuality(Virtuality::PureVirtual)
            .constant(),
    );
    graph.add_callable(
        shape,
        "color",
        CallableDecl::new(CallableKind::MemberFunction)
            .returns(CppType::Declared(color))
            .virtuality(Virtuality::Virtual)
            .constant(),
    );
    let invalidate = graph.add_callable(
        shape,
        "invalidate",
        CallableDecl::new(CallableKind::MemberFunction).returns(CppType::void()),
    );
    graph[invalidate].access = Access::Protected;

    let circle = graph.add_class(geo, "Circle");
    graph[circle].location = Location::new("geo/shape.hpp", 12);
    graph.add_base(circle, shape, Access::Public);
    graph.add_callable(
        circle,
        "Circle",
        CallableDecl::new(CallableKind::Constructor {
            is_copy: false,
            is_explicit: false,
        })
        .arg(Argument::new("center", point_ref))
        .arg(Argument::new("radius", double()).with_default("1")),
    );
    graph.add_callable(
        circle,
        "area",
        CallableDecl::new(CallableKind::MemberFunction)
            .returns(double())
            .virtuality(Virtuality::Virtual)
            .constant(),
    );

    let total = graph.add_callable(
        geo,
        "total",
        CallableDecl::new(CallableKind::FreeFunction)
            .returns(double())
            .arg(Argument::new(
                "values",
                CppType::Declared(doubles).constant().reference(),
            )),
    );
    graph[total].location = Location::new("geo/shape.hpp", 20);
    graph
}

/// Assert that two strings are equal, with a nice diff on failure.
pub fn assert_content_eq(expected: &str, actual: &str) {
    if expected != actual {
        let expected_lines: Vec<&str> = expected.lines().collect();
        let actual_lines: Vec<&str> = actual.lines().collect();

        let mut diff = String::new();
        let max_lines = expected_lines.len().max(actual_lines.len());

        for i in 0..max_lines {
            let exp = expected_lines.get(i).copied().unwrap_or("<missing>");
            let act = actual_lines.get(i).copied().unwrap_or("<missing>");

            if exp != act {
                diff.push_str(&format!("Line {}:\n", i + 1));
                diff.push_str(&format!("  expected: {}\n", exp));
                diff.push_str(&format!("  actual:   {}\n", act));
            }
        }

        panic!("Content mismatch:\n{}", diff);
    }
}

/// Write every output file of a finished pass into `dir`.
pub fn write_output(ctx: &CompilationContext, dir: &Path) -> Result<()> {
    for (name, contents) in ctx.output_files()? {
        std::fs::write(dir.join(name), contents)?;
    }
    Ok(())
}

/// Write the output of a finished pass into a temporary directory.
///
/// The directory will be cleaned up when the returned `TempDir` is dropped.
pub fn generate_to_temp(ctx: &CompilationContext) -> Result<tempfile::TempDir> {
    let temp_dir = tempfile::TempDir::new()?;
    write_output(ctx, temp_dir.path())?;
    Ok(temp_dir)
}
