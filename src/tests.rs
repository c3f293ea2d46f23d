/*
MIT License

Copyright (c) 2026 Raja Lehtihet and Wael El Oraiby

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Crate unit tests.

use super::*;
use crate::compiler::generator::ExprGenerator;
use proptest::prelude::*;

fn scalar_scope(name: &str, lo: f64, hi: f64) -> Scope {
    let mut scope = Scope::new();
    scope
        .add_var(name, Dim::Scalar, Domain::scalar(Interval::new(lo, hi)))
        .unwrap();
    scope
}

fn as_const_scalar(label: &Label) -> Interval {
    match label {
        Label::Const(c) => c.value.as_scalar().unwrap(),
        Label::Node(_) => panic!("expected a constant label"),
    }
}

#[test]
fn literal_only_tree_never_touches_the_graph() {
    let mut ast = Ast::new();
    let two = ast.number(2.0);
    let three = ast.number(3.0);
    let sum = ast.binary(AstKind::Add, two, three);
    let four = ast.number(4.0);
    let prod = ast.binary(AstKind::Mul, sum, four);

    let scope = Scope::new();
    let mut graph = ExprGraph::new();
    let mut generator = ExprGenerator::new(&scope, false);
    let label = generator.generate(&mut ast, &mut graph, prod).unwrap();

    assert!(graph.is_empty());
    assert!(as_const_scalar(&label).contains(20.0));
}

#[test]
fn shared_nodes_are_generated_once() {
    let mut ast = Ast::new();
    let x = ast.symbol("x");
    let one = ast.number(1.0);
    let s = ast.binary(AstKind::Add, x, one);
    // The same child appears twice: `(x+1)*(x+1)` shares one subtree.
    let prod = ast.binary(AstKind::Mul, s, s);

    let scope = scalar_scope("x", -1.0, 1.0);
    let mut graph = ExprGraph::new();
    let mut generator = ExprGenerator::new(&scope, false);
    generator.generate(&mut ast, &mut graph, prod).unwrap();
    // prod, s, x, 1: four visits, the shared subtree only once.
    assert_eq!(generator.generated(), 4);

    // A second call on the same root is a pure memo hit.
    generator.generate(&mut ast, &mut graph, prod).unwrap();
    assert_eq!(generator.generated(), 4);
}

#[test]
fn constant_power_folds_to_a_constant() {
    let mut ast = Ast::new();
    let two = ast.number(2.0);
    let three = ast.number(3.0);
    let p = ast.binary(AstKind::Power, two, three);

    let c = eval_constant(&mut ast, p, &Scope::new()).unwrap();
    assert!(c.value.as_scalar().unwrap().contains(8.0));
    assert_eq!(c.num, NumKind::Finite);
}

#[test]
fn variable_to_integer_power_uses_the_dedicated_lowering() {
    let mut ast = Ast::new();
    let x = ast.symbol("x");
    let two = ast.number(2.0);
    let p = ast.binary(AstKind::Power, x, two);

    let scope = scalar_scope("x", -1.0, 1.0);
    let mut graph = ExprGraph::new();
    let mut generator = ExprGenerator::new(&scope, false);
    let label = generator.generate(&mut ast, &mut graph, p).unwrap();
    let Label::Node(n) = label else {
        panic!("expected an IR node")
    };
    let dump = graph.dump(n);
    assert_eq!(dump, "(powi x 2)");
    assert!(!dump.contains("exp"));
}

#[test]
fn non_integer_exponent_falls_back_to_exp_log() {
    let mut ast = Ast::new();
    let x = ast.symbol("x");
    let half = ast.number(0.5);
    let p = ast.binary(AstKind::Power, x, half);

    let scope = scalar_scope("x", 1.0, 2.0);
    let mut graph = ExprGraph::new();
    let mut generator = ExprGenerator::new(&scope, false);
    let label = generator.generate(&mut ast, &mut graph, p).unwrap();
    let Label::Node(n) = label else {
        panic!("expected an IR node")
    };
    let dump = graph.dump(n);
    assert!(dump.starts_with("(exp "));
    assert!(dump.contains("(log x)"));
}

#[test]
fn constant_base_with_variable_exponent_folds_the_log() {
    let mut ast = Ast::new();
    let two = ast.number(2.0);
    let x = ast.symbol("x");
    let p = ast.binary(AstKind::Power, two, x);

    let scope = scalar_scope("x", 0.0, 1.0);
    let mut graph = ExprGraph::new();
    let mut generator = ExprGenerator::new(&scope, false);
    let label = generator.generate(&mut ast, &mut graph, p).unwrap();
    let Label::Node(n) = label else {
        panic!("expected an IR node")
    };
    let dump = graph.dump(n);
    // The base's log is a folded constant, not a log node.
    assert!(dump.starts_with("(exp (* x "));
    assert!(!dump.contains("(log"));
}

#[test]
fn one_based_index_into_vector_variable() {
    let mut ast = Ast::new();
    let v = ast.symbol("v");
    let three = ast.number(3.0);
    let sel = ast.idx(three);
    let e = ast.index1(IndexStyle::OneBased, v, sel);

    let mut scope = Scope::new();
    let comps = vec![Interval::new(0.0, 1.0); 5];
    scope
        .add_var(
            "v",
            Dim::Row(5),
            Domain::with_dim(Dim::Row(5), comps).unwrap(),
        )
        .unwrap();
    let mut graph = ExprGraph::new();
    let mut generator = ExprGenerator::new(&scope, false);
    let label = generator.generate(&mut ast, &mut graph, e).unwrap();
    let Label::Node(n) = label else {
        panic!("expected an IR node")
    };
    assert_eq!(graph.dump(n), "(index OneCol(2) v)");
    assert_eq!(graph.dim(n), Dim::Scalar);
}

#[test]
fn degenerate_row_range_selects_a_single_row() {
    // m(2:2) on a 3x3 matrix is row 2, shaped as a row vector.
    let mut ast = Ast::new();
    let m = ast.symbol("m");
    let lo = ast.number(2.0);
    let hi = ast.number(2.0);
    let sel = ast.idx_range(lo, hi);
    let e = ast.index1(IndexStyle::OneBased, m, sel);

    let mut scope = Scope::new();
    scope
        .add_var(
            "m",
            Dim::Matrix(3, 3),
            Domain::with_dim(Dim::Matrix(3, 3), vec![Interval::ALL; 9]).unwrap(),
        )
        .unwrap();
    let mut graph = ExprGraph::new();
    let mut generator = ExprGenerator::new(&scope, false);
    let label = generator.generate(&mut ast, &mut graph, e).unwrap();
    let Label::Node(n) = label else {
        panic!("expected an IR node")
    };
    assert_eq!(graph.dim(n), Dim::Row(3));
    assert_eq!(graph.dump(n), "(index OneRow(1) m)");
}

#[test]
fn two_selector_access_on_a_vector() {
    // v(1,2) on a row vector of 3 is component 2, a scalar.
    let mut ast = Ast::new();
    let v = ast.symbol("v");
    let one = ast.number(1.0);
    let two = ast.number(2.0);
    let s1 = ast.idx(one);
    let s2 = ast.idx(two);
    let e = ast.index2(IndexStyle::OneBased, v, s1, s2);

    let mut scope = Scope::new();
    scope
        .add_var(
            "v",
            Dim::Row(3),
            Domain::with_dim(Dim::Row(3), vec![Interval::ALL; 3]).unwrap(),
        )
        .unwrap();
    let mut graph = ExprGraph::new();
    let mut generator = ExprGenerator::new(&scope, false);
    let label = generator.generate(&mut ast, &mut graph, e).unwrap();
    let Label::Node(n) = label else {
        panic!("expected an IR node")
    };
    assert_eq!(graph.dim(n), Dim::Scalar);
    assert_eq!(graph.dump(n), "(index OneCol(1) v)");
}

#[test]
fn malformed_arity_is_a_shape_error() {
    // A host-built node with the wrong child count must error, not panic.
    let mut ast = Ast::new();
    let one = ast.number(1.0);
    let bad = ast.push(AstKind::Add, vec![one]);
    let err = eval_constant(&mut ast, bad, &Scope::new()).unwrap_err();
    assert!(matches!(err, CompileError::Shape { .. }));

    let mut ast = Ast::new();
    let bad = ast.push(AstKind::Sqrt, vec![]);
    let err = eval_constant(&mut ast, bad, &Scope::new()).unwrap_err();
    assert!(matches!(err, CompileError::Shape { .. }));
}

#[test]
fn one_based_index_zero_reports_the_addressing_hint() {
    let mut ast = Ast::new();
    let v = ast.symbol("v");
    let zero = ast.number(0.0);
    let sel = ast.idx(zero);
    let e = ast.index1(IndexStyle::OneBased, v, sel);

    let mut scope = Scope::new();
    let comps = vec![Interval::ALL; 3];
    scope
        .add_var(
            "v",
            Dim::Col(3),
            Domain::with_dim(Dim::Col(3), comps).unwrap(),
        )
        .unwrap();
    let mut graph = ExprGraph::new();
    let mut generator = ExprGenerator::new(&scope, false);
    let err = generator.generate(&mut ast, &mut graph, e).unwrap_err();
    match err {
        CompileError::Index { message } => assert!(message.contains("starts from 1")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn constant_matrix_index_folds_without_graph_nodes() {
    let mut ast = Ast::new();
    let m = ast.constant(
        Domain::with_dim(
            Dim::Matrix(2, 2),
            vec![
                Interval::point(1.0),
                Interval::point(2.0),
                Interval::point(3.0),
                Interval::point(4.0),
            ],
        )
        .unwrap(),
    );
    let r = ast.number(2.0);
    let c = ast.number(1.0);
    let sr = ast.idx(r);
    let sc = ast.idx(c);
    let e = ast.index2(IndexStyle::OneBased, m, sr, sc);

    let c = eval_constant(&mut ast, e, &Scope::new()).unwrap();
    assert!(c.value.as_scalar().unwrap().contains(3.0));
}

#[test]
fn indexing_a_scalar_aborts_assembly() {
    let mut ast = Ast::new();
    let x = ast.symbol("x");
    let one = ast.number(1.0);
    let sel = ast.idx(one);
    let e = ast.index1(IndexStyle::OneBased, x, sel);
    let zero = ast.number(0.0);

    let mut source = SystemSource::new(ast);
    source.ctrs.push(ConstraintDecl {
        lhs: e,
        rhs: zero,
        op: Cmp::Eq,
    });
    let scope = scalar_scope("x", -1.0, 1.0);
    let err = assemble_system(source, &scope).unwrap_err();
    assert!(matches!(err, CompileError::Shape { .. }));
}

#[test]
fn assembly_requires_variables() {
    let mut ast = Ast::new();
    let one = ast.number(1.0);
    let zero = ast.number(0.0);
    let mut source = SystemSource::new(ast);
    source.ctrs.push(ConstraintDecl {
        lhs: one,
        rhs: zero,
        op: Cmp::Ge,
    });
    let err = assemble_system(source, &Scope::new()).unwrap_err();
    assert!(matches!(err, CompileError::NoVariables));
}

#[test]
fn end_to_end_scalar_problem() {
    // min x^2  s.t.  x + 1 >= 0,  x in [-1, 1]
    let mut ast = Ast::new();
    let x = ast.symbol("x");
    let two = ast.number(2.0);
    let sq = ast.binary(AstKind::Power, x, two);
    let one = ast.number(1.0);
    let lhs = ast.binary(AstKind::Add, x, one);
    let zero = ast.number(0.0);

    let mut source = SystemSource::new(ast);
    source.goal = Some(sq);
    source.ctrs.push(ConstraintDecl {
        lhs,
        rhs: zero,
        op: Cmp::Ge,
    });

    let scope = scalar_scope("x", -1.0, 1.0);
    let system = assemble_system(source, &scope).unwrap();

    assert_eq!(system.nb_vars(), 1);
    assert_eq!(system.vars()[0].name, "x");
    assert_eq!(system.bounds(), &[Interval::new(-1.0, 1.0)]);

    let goal = system.goal().unwrap();
    assert_eq!(system.graph().dump(goal), "(powi x 2)");

    assert_eq!(system.constraints().len(), 1);
    let ctr = system.constraints()[0];
    assert_eq!(ctr.op, Cmp::Ge);
    assert_eq!(system.graph().dump(ctr.expr), "(- (+ x [1, 1]) [0, 0])");
}

#[test]
fn assembly_is_reproducible_across_copies() {
    let mut ast = Ast::new();
    let x = ast.symbol("x");
    let two = ast.number(2.0);
    let sq = ast.binary(AstKind::Power, x, two);
    let one = ast.number(1.0);
    let lhs = ast.binary(AstKind::Sub, sq, one);
    let zero = ast.number(0.0);

    let mut source = SystemSource::new(ast);
    source.goal = Some(sq);
    source.ctrs.push(ConstraintDecl {
        lhs,
        rhs: zero,
        op: Cmp::Le,
    });
    let copy = source.clone();

    let scope = scalar_scope("x", -2.0, 2.0);
    let a = assemble_system(source, &scope).unwrap();
    let b = assemble_system(copy, &scope).unwrap();

    assert_eq!(a.graph().len(), b.graph().len());
    assert_eq!(
        a.graph().dump(a.goal().unwrap()),
        b.graph().dump(b.goal().unwrap())
    );
    assert_eq!(
        a.graph().dump(a.constraints()[0].expr),
        b.graph().dump(b.constraints()[0].expr)
    );
    assert_eq!(a.bounds(), b.bounds());
}

#[test]
fn sharing_survives_the_copy_out() {
    // Objective and constraint share the `x^2` AST node; after copy-out the
    // system graph must still hold a single `powi` node.
    let mut ast = Ast::new();
    let x = ast.symbol("x");
    let two = ast.number(2.0);
    let sq = ast.binary(AstKind::Power, x, two);
    let one = ast.number(1.0);
    let lhs = ast.binary(AstKind::Sub, sq, one);
    let zero = ast.number(0.0);

    let mut source = SystemSource::new(ast);
    source.goal = Some(sq);
    source.ctrs.push(ConstraintDecl {
        lhs,
        rhs: zero,
        op: Cmp::Le,
    });
    let scope = scalar_scope("x", -2.0, 2.0);
    let system = assemble_system(source, &scope).unwrap();

    // x, powi, [1,1], (- powi [1,1]), [0,0], (- ... [0,0])
    assert_eq!(system.graph().len(), 6);
}

#[test]
fn negated_infinity_flips_kind() {
    let mut ast = Ast::new();
    let inf = ast.infinity();
    let neg = ast.unary(AstKind::Minus, inf);
    let c = eval_constant(&mut ast, neg, &Scope::new()).unwrap();
    assert_eq!(c.num, NumKind::NegInf);

    let mut ast = Ast::new();
    let inf = ast.infinity();
    let neg = ast.unary(AstKind::Minus, inf);
    let back = ast.unary(AstKind::Minus, neg);
    let c = eval_constant(&mut ast, back, &Scope::new()).unwrap();
    assert_eq!(c.num, NumKind::PosInf);
}

#[test]
fn infinity_in_arithmetic_is_rejected() {
    let mut ast = Ast::new();
    let inf = ast.infinity();
    let one = ast.number(1.0);
    let sum = ast.binary(AstKind::Add, inf, one);
    let err = eval_constant(&mut ast, sum, &Scope::new()).unwrap_err();
    assert!(matches!(err, CompileError::SymbolMisuse { .. }));
}

#[test]
fn variables_are_rejected_in_constant_context() {
    let mut ast = Ast::new();
    let x = ast.symbol("x");
    let one = ast.number(1.0);
    let sum = ast.binary(AstKind::Add, x, one);
    let scope = scalar_scope("x", -1.0, 1.0);
    let err = eval_constant(&mut ast, sum, &scope).unwrap_err();
    assert!(matches!(err, CompileError::SymbolMisuse { .. }));
}

#[test]
fn log_of_non_positive_constant_is_an_empty_error() {
    let mut ast = Ast::new();
    let neg = ast.number(-1.0);
    let lg = ast.unary(AstKind::Log, neg);
    let err = eval_constant(&mut ast, lg, &Scope::new()).unwrap_err();
    assert!(matches!(err, CompileError::Empty { .. }));
}

#[test]
fn named_constants_and_iterators_resolve() {
    let mut scope = Scope::new();
    scope
        .add_constant("pi", ConstValue::finite(Domain::point(std::f64::consts::PI)))
        .unwrap();
    scope.bind_iter("i", 3).unwrap();

    let mut ast = Ast::new();
    let pi = ast.symbol("pi");
    let i = ast.iter_ref("i");
    let prod = ast.binary(AstKind::Mul, pi, i);
    let c = eval_constant(&mut ast, prod, &scope).unwrap();
    assert!(c
        .value
        .as_scalar()
        .unwrap()
        .contains(3.0 * std::f64::consts::PI));
}

#[test]
fn function_application_inlines_the_body() {
    // f(a) = a^2 + 1, applied to the variable x.
    let mut body = Ast::new();
    let a = body.symbol("a");
    let two = body.number(2.0);
    let sq = body.binary(AstKind::Power, a, two);
    let one = body.number(1.0);
    let root = body.binary(AstKind::Add, sq, one);

    let mut scope = scalar_scope("x", 0.0, 1.0);
    scope
        .add_function(Function {
            name: "f".into(),
            params: vec![("a".into(), Dim::Scalar)],
            body,
            root,
        })
        .unwrap();

    let mut ast = Ast::new();
    let x = ast.symbol("x");
    let call = ast.apply("f", vec![x]);

    let mut graph = ExprGraph::new();
    let mut generator = ExprGenerator::new(&scope, false);
    let label = generator.generate(&mut ast, &mut graph, call).unwrap();
    let Label::Node(n) = label else {
        panic!("expected an IR node")
    };
    assert_eq!(graph.dump(n), "(+ (powi x 2) [1, 1])");
}

#[test]
fn constant_function_application_folds() {
    let mut body = Ast::new();
    let a = body.symbol("a");
    let two = body.number(2.0);
    let root = body.binary(AstKind::Power, a, two);

    let mut scope = Scope::new();
    scope
        .add_function(Function {
            name: "f".into(),
            params: vec![("a".into(), Dim::Scalar)],
            body,
            root,
        })
        .unwrap();

    let mut ast = Ast::new();
    let three = ast.number(3.0);
    let call = ast.apply("f", vec![three]);
    let c = eval_constant(&mut ast, call, &scope).unwrap();
    assert!(c.value.as_scalar().unwrap().contains(9.0));
}

#[test]
fn function_argument_shapes_are_checked() {
    let mut body = Ast::new();
    let a = body.symbol("a");
    let two = body.number(2.0);
    let root = body.binary(AstKind::Power, a, two);

    let mut scope = Scope::new();
    let comps = vec![Interval::ALL; 2];
    scope
        .add_var(
            "v",
            Dim::Col(2),
            Domain::with_dim(Dim::Col(2), comps).unwrap(),
        )
        .unwrap();
    scope
        .add_function(Function {
            name: "f".into(),
            params: vec![("a".into(), Dim::Scalar)],
            body,
            root,
        })
        .unwrap();

    let mut ast = Ast::new();
    let v = ast.symbol("v");
    let call = ast.apply("f", vec![v]);
    let mut graph = ExprGraph::new();
    let mut generator = ExprGenerator::new(&scope, false);
    let err = generator.generate(&mut ast, &mut graph, call).unwrap_err();
    assert!(matches!(err, CompileError::Shape { .. }));
}

#[test]
fn recursive_functions_are_rejected() {
    let mut body = Ast::new();
    let a = body.symbol("a");
    let root = body.apply("f", vec![a]);

    let mut scope = scalar_scope("x", 0.0, 1.0);
    scope
        .add_function(Function {
            name: "f".into(),
            params: vec![("a".into(), Dim::Scalar)],
            body,
            root,
        })
        .unwrap();

    let mut ast = Ast::new();
    let x = ast.symbol("x");
    let call = ast.apply("f", vec![x]);
    let mut graph = ExprGraph::new();
    let mut generator = ExprGenerator::new(&scope, false);
    let err = generator.generate(&mut ast, &mut graph, call).unwrap_err();
    match err {
        CompileError::SymbolMisuse { message } => assert!(message.contains("recursive")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn min_max_fold_and_lower() {
    let mut ast = Ast::new();
    let a = ast.number(3.0);
    let b = ast.number(1.0);
    let c = ast.number(2.0);
    let m = ast.push(AstKind::Min, vec![a, b, c]);
    let folded = eval_constant(&mut ast, m, &Scope::new()).unwrap();
    assert!(folded.value.as_scalar().unwrap().contains(1.0));

    let mut ast = Ast::new();
    let x = ast.symbol("x");
    let one = ast.number(1.0);
    let m = ast.push(AstKind::Max, vec![x, one]);
    let scope = scalar_scope("x", -1.0, 1.0);
    let mut graph = ExprGraph::new();
    let mut generator = ExprGenerator::new(&scope, false);
    let label = generator.generate(&mut ast, &mut graph, m).unwrap();
    let Label::Node(n) = label else {
        panic!("expected an IR node")
    };
    assert_eq!(graph.dump(n), "(max x [1, 1])");
}

#[test]
fn mismatched_constraint_sides_are_a_shape_error() {
    let mut ast = Ast::new();
    let x = ast.symbol("x");
    let vec = {
        let a = ast.number(1.0);
        let b = ast.number(2.0);
        ast.push(AstKind::ColVec, vec![a, b])
    };
    let mut source = SystemSource::new(ast);
    source.ctrs.push(ConstraintDecl {
        lhs: x,
        rhs: vec,
        op: Cmp::Eq,
    });
    let scope = scalar_scope("x", -1.0, 1.0);
    let err = assemble_system(source, &scope).unwrap_err();
    assert!(matches!(err, CompileError::Shape { .. }));
}

#[test]
fn non_scalar_objective_is_rejected() {
    let mut ast = Ast::new();
    let a = ast.number(1.0);
    let b = ast.number(2.0);
    let v = ast.push(AstKind::RowVec, vec![a, b]);
    let mut source = SystemSource::new(ast);
    source.goal = Some(v);
    let scope = scalar_scope("x", -1.0, 1.0);
    let err = assemble_system(source, &scope).unwrap_err();
    assert!(matches!(err, CompileError::Shape { .. }));
}

proptest! {
    #[test]
    fn folded_constants_enclose_pointwise_evaluation(
        a in -100.0..100.0f64,
        b in -100.0..100.0f64,
    ) {
        // (a + b) * a - b, folded as intervals, must contain the f64 result.
        let mut ast = Ast::new();
        let na = ast.number(a);
        let nb = ast.number(b);
        let sum = ast.binary(AstKind::Add, na, nb);
        let prod = ast.binary(AstKind::Mul, sum, na);
        let root = ast.binary(AstKind::Sub, prod, nb);
        let c = eval_constant(&mut ast, root, &Scope::new()).unwrap();
        let exact = (a + b) * a - b;
        prop_assert!(c.value.as_scalar().unwrap().contains(exact));
    }

    #[test]
    fn folded_integer_powers_enclose_pointwise_evaluation(
        base in -10.0..10.0f64,
        n in 0i32..6,
    ) {
        let mut ast = Ast::new();
        let b = ast.number(base);
        let e = ast.number(n as f64);
        let p = ast.binary(AstKind::Power, b, e);
        let c = eval_constant(&mut ast, p, &Scope::new()).unwrap();
        prop_assert!(c.value.as_scalar().unwrap().contains(base.powi(n)));
    }
}
