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

//! Memoized AST-to-IR generation.
//!
//! [`ExprGenerator::generate`] walks an AST post-order, labeling every node
//! exactly once. A label is either a folded constant or an IR node; constant
//! subtrees stay constants until a non-constant ancestor forces them into the
//! graph, so a literal-only tree never touches the graph at all.
//!
//! Two nodes get dedicated lowering instead of the generic fold-or-build
//! path: `^`, whose meaning depends on what the exponent folded to, and
//! indexed access, whose selectors must fold to integers.

use crate::ast::{Ast, AstId, AstKind, ConstValue, IndexStyle, Label, NumKind};
use crate::compiler::index::{self, Selector};
use crate::domain::{Dim, DimError, Domain, Interval};
use crate::error::CompileError;
use crate::ir::{ExprGraph, NodeId, UnaryFn};
use crate::scope::Scope;
use std::collections::HashMap;
use tracing::trace;

fn sherr(e: DimError) -> CompileError {
    CompileError::shape(e.message)
}

fn misplaced_infinity() -> CompileError {
    CompileError::symbol("misplaced 'oo': infinity can only be negated or used alone")
}

// Degenerate scalar integer, if the constant is one.
fn const_int(c: &ConstValue) -> Option<i64> {
    if c.num != NumKind::Finite {
        return None;
    }
    let iv = c.value.as_scalar().ok()?;
    if !iv.is_degenerate() {
        return None;
    }
    let v = iv.lo;
    if v.fract() != 0.0 || v < i64::MIN as f64 || v > i64::MAX as f64 {
        return None;
    }
    Some(v as i64)
}

fn const_i32(c: &ConstValue) -> Option<i32> {
    let v = const_int(c)?;
    i32::try_from(v).ok()
}

// The arena's push is public, so a host can hand in a node with the wrong
// child count; report it instead of indexing out of bounds.
fn expect_args(kind: &AstKind, args: &[AstId], n: usize) -> Result<(), CompileError> {
    if args.len() != n {
        return Err(CompileError::shape(format!(
            "'{}' expects {n} argument(s), got {}",
            op_name(kind),
            args.len()
        )));
    }
    Ok(())
}

fn check_nonempty(op: &str, d: &Domain) -> Result<(), CompileError> {
    if d.has_empty() {
        return Err(CompileError::empty(format!(
            "'{op}' applied to a constant produced an empty interval"
        )));
    }
    Ok(())
}

fn unary_fn(kind: &AstKind) -> Option<UnaryFn> {
    Some(match kind {
        AstKind::Sign => UnaryFn::Sign,
        AstKind::Abs => UnaryFn::Abs,
        AstKind::Sqr => UnaryFn::Sqr,
        AstKind::Sqrt => UnaryFn::Sqrt,
        AstKind::Exp => UnaryFn::Exp,
        AstKind::Log => UnaryFn::Log,
        AstKind::Cos => UnaryFn::Cos,
        AstKind::Sin => UnaryFn::Sin,
        AstKind::Tan => UnaryFn::Tan,
        AstKind::Acos => UnaryFn::Acos,
        AstKind::Asin => UnaryFn::Asin,
        AstKind::Atan => UnaryFn::Atan,
        AstKind::Cosh => UnaryFn::Cosh,
        AstKind::Sinh => UnaryFn::Sinh,
        AstKind::Tanh => UnaryFn::Tanh,
        AstKind::Acosh => UnaryFn::Acosh,
        AstKind::Asinh => UnaryFn::Asinh,
        AstKind::Atanh => UnaryFn::Atanh,
        _ => return None,
    })
}

fn apply_scalar_fn(f: UnaryFn, iv: Interval) -> Interval {
    match f {
        UnaryFn::Sign => iv.sign(),
        UnaryFn::Abs => iv.abs(),
        UnaryFn::Sqr => iv.sqr(),
        UnaryFn::Sqrt => iv.sqrt(),
        UnaryFn::Exp => iv.exp(),
        UnaryFn::Log => iv.ln(),
        UnaryFn::Cos => iv.cos(),
        UnaryFn::Sin => iv.sin(),
        UnaryFn::Tan => iv.tan(),
        UnaryFn::Acos => iv.acos(),
        UnaryFn::Asin => iv.asin(),
        UnaryFn::Atan => iv.atan(),
        UnaryFn::Cosh => iv.cosh(),
        UnaryFn::Sinh => iv.sinh(),
        UnaryFn::Tanh => iv.tanh(),
        UnaryFn::Acosh => iv.acosh(),
        UnaryFn::Asinh => iv.asinh(),
        UnaryFn::Atanh => iv.atanh(),
    }
}

fn op_name(kind: &AstKind) -> &'static str {
    match kind {
        AstKind::Add => "+",
        AstKind::Sub => "-",
        AstKind::Mul => "*",
        AstKind::Div => "/",
        AstKind::Minus => "-",
        AstKind::Power => "^",
        AstKind::Atan2 => "atan2",
        AstKind::Min => "min",
        AstKind::Max => "max",
        AstKind::Transpose => "'",
        AstKind::Sign => "sign",
        AstKind::Abs => "abs",
        AstKind::Sqr => "sqr",
        AstKind::Sqrt => "sqrt",
        AstKind::Exp => "exp",
        AstKind::Log => "log",
        AstKind::Cos => "cos",
        AstKind::Sin => "sin",
        AstKind::Tan => "tan",
        AstKind::Acos => "acos",
        AstKind::Asin => "asin",
        AstKind::Atan => "atan",
        AstKind::Cosh => "cosh",
        AstKind::Sinh => "sinh",
        AstKind::Tanh => "tanh",
        AstKind::Acosh => "acosh",
        AstKind::Asinh => "asinh",
        AstKind::Atanh => "atanh",
        AstKind::Idx => "index",
        AstKind::IdxRange => "index range",
        _ => "?",
    }
}

/// The memoized AST-to-IR pass.
///
/// One generator serves one assembly (or one constant evaluation); its visit
/// counter is observable for testing the memoization contract.
pub(crate) struct ExprGenerator<'s> {
    scope: &'s Scope,
    // Parameter bindings of in-flight function applications, innermost last.
    frames: Vec<HashMap<String, Label>>,
    // Names of in-flight applications, for the recursion check.
    call_stack: Vec<String>,
    constants_only: bool,
    generated: usize,
}

impl<'s> ExprGenerator<'s> {
    pub(crate) fn new(scope: &'s Scope, constants_only: bool) -> Self {
        Self {
            scope,
            frames: Vec::new(),
            call_stack: Vec::new(),
            constants_only,
            generated: 0,
        }
    }

    /// Number of nodes actually generated (memo hits excluded).
    pub(crate) fn generated(&self) -> usize {
        self.generated
    }

    /// Generates the label of `id`, reusing the memo slot when present.
    pub(crate) fn generate(
        &mut self,
        ast: &mut Ast,
        graph: &mut ExprGraph,
        id: AstId,
    ) -> Result<Label, CompileError> {
        if let Some(label) = ast.label(id) {
            return Ok(label.clone());
        }
        self.generated += 1;
        let kind = ast.node(id).kind.clone();
        let args = ast.node(id).args.clone();
        trace!(node = ?kind, "generate");

        let label = match &kind {
            AstKind::Cst(d) => Label::Const(ConstValue::finite(d.clone())),
            AstKind::Infinity => Label::Const(ConstValue::pos_inf()),
            AstKind::Symbol(name) => self.gen_symbol(graph, name)?,
            AstKind::Iter(name) => {
                let v = self.scope.iter_value(name).ok_or_else(|| {
                    CompileError::symbol(format!("unknown iterator '{name}'"))
                })?;
                Label::Const(ConstValue::finite(Domain::point(v as f64)))
            }
            AstKind::Power => {
                expect_args(&kind, &args, 2)?;
                self.gen_power(ast, graph, args[0], args[1])?
            }
            AstKind::IndexedAccess(style) => {
                if args.len() != 2 && args.len() != 3 {
                    return Err(CompileError::shape(
                        "indexed access expects a target and one or two selectors",
                    ));
                }
                self.gen_index(ast, graph, *style, &args)?
            }
            AstKind::IdxAll | AstKind::IdxRange | AstKind::Idx => {
                return Err(CompileError::shape(
                    "index selector used outside an indexed access",
                ));
            }
            AstKind::Apply(name) => self.gen_apply(ast, graph, name, &args)?,
            AstKind::Min | AstKind::Max => self.gen_minmax(ast, graph, &kind, &args)?,
            AstKind::RowVec | AstKind::ColVec => {
                self.gen_vector(ast, graph, matches!(kind, AstKind::RowVec), &args)?
            }
            AstKind::Add | AstKind::Sub | AstKind::Mul | AstKind::Div | AstKind::Atan2 => {
                expect_args(&kind, &args, 2)?;
                self.gen_binary(ast, graph, &kind, args[0], args[1])?
            }
            _ => {
                expect_args(&kind, &args, 1)?;
                self.gen_unary(ast, graph, &kind, args[0])?
            }
        };

        ast.set_label(id, label.clone());
        Ok(label)
    }

    fn gen_symbol(&mut self, graph: &mut ExprGraph, name: &str) -> Result<Label, CompileError> {
        for frame in self.frames.iter().rev() {
            if let Some(label) = frame.get(name) {
                return Ok(label.clone());
            }
        }
        if let Some(c) = self.scope.constant(name) {
            return Ok(Label::Const(c.clone()));
        }
        if let Some((index, decl)) = self.scope.var(name) {
            if self.constants_only {
                return Err(CompileError::symbol(format!(
                    "variable '{name}' cannot be used inside a constant expression"
                )));
            }
            return Ok(Label::Node(graph.var(index, &decl.name, decl.dim)));
        }
        Err(CompileError::symbol(format!("unknown symbol '{name}'")))
    }

    // Forces a label into the graph; constants enter lazily here and nowhere
    // else.
    fn as_node(&self, graph: &mut ExprGraph, label: &Label) -> Result<NodeId, CompileError> {
        match label {
            Label::Node(n) => Ok(*n),
            Label::Const(c) if c.is_infinity() => Err(misplaced_infinity()),
            Label::Const(c) => Ok(graph.constant(c.value.clone())),
        }
    }

    fn label_dim(&self, graph: &ExprGraph, label: &Label) -> Result<Dim, CompileError> {
        match label {
            Label::Node(n) => Ok(graph.dim(*n)),
            Label::Const(c) if c.is_infinity() => Err(misplaced_infinity()),
            Label::Const(c) => Ok(c.value.dim()),
        }
    }

    fn gen_binary(
        &mut self,
        ast: &mut Ast,
        graph: &mut ExprGraph,
        kind: &AstKind,
        lhs: AstId,
        rhs: AstId,
    ) -> Result<Label, CompileError> {
        let a = self.generate(ast, graph, lhs)?;
        let b = self.generate(ast, graph, rhs)?;
        if let (Label::Const(x), Label::Const(y)) = (&a, &b) {
            return Ok(Label::Const(fold_binary(kind, x, y)?));
        }
        let an = self.as_node(graph, &a)?;
        let bn = self.as_node(graph, &b)?;
        let n = match kind {
            AstKind::Add => graph.add(an, bn),
            AstKind::Sub => graph.sub(an, bn),
            AstKind::Mul => graph.mul(an, bn),
            AstKind::Div => graph.div(an, bn),
            AstKind::Atan2 => graph.atan2(an, bn),
            _ => unreachable!(),
        }
        .map_err(sherr)?;
        Ok(Label::Node(n))
    }

    fn gen_unary(
        &mut self,
        ast: &mut Ast,
        graph: &mut ExprGraph,
        kind: &AstKind,
        arg: AstId,
    ) -> Result<Label, CompileError> {
        let a = self.generate(ast, graph, arg)?;
        if let Label::Const(c) = &a {
            return Ok(Label::Const(fold_unary(kind, c)?));
        }
        let an = self.as_node(graph, &a)?;
        let n = match kind {
            AstKind::Minus => graph.minus(an),
            AstKind::Transpose => graph.transpose(an),
            _ => match unary_fn(kind) {
                Some(f) => graph.unary(f, an).map_err(sherr)?,
                None => {
                    return Err(CompileError::shape(format!(
                        "unsupported operator '{}'",
                        op_name(kind)
                    )))
                }
            },
        };
        Ok(Label::Node(n))
    }

    fn gen_minmax(
        &mut self,
        ast: &mut Ast,
        graph: &mut ExprGraph,
        kind: &AstKind,
        args: &[AstId],
    ) -> Result<Label, CompileError> {
        let name = op_name(kind);
        if args.is_empty() {
            return Err(CompileError::shape(format!(
                "'{name}' expects at least one argument"
            )));
        }
        let labels = args
            .iter()
            .map(|&a| self.generate(ast, graph, a))
            .collect::<Result<Vec<_>, _>>()?;
        if labels.iter().all(|l| matches!(l, Label::Const(c) if !c.is_infinity())) {
            let mut acc: Option<Interval> = None;
            for l in &labels {
                let Label::Const(c) = l else { unreachable!() };
                let iv = c.value.as_scalar().map_err(sherr)?;
                acc = Some(match (acc, kind) {
                    (None, _) => iv,
                    (Some(a), AstKind::Min) => a.min(iv),
                    (Some(a), _) => a.max(iv),
                });
            }
            let folded = acc.unwrap_or(Interval::EMPTY);
            let d = Domain::scalar(folded);
            check_nonempty(name, &d)?;
            return Ok(Label::Const(ConstValue::finite(d)));
        }
        let nodes = labels
            .iter()
            .map(|l| self.as_node(graph, l))
            .collect::<Result<Vec<_>, _>>()?;
        let n = match kind {
            AstKind::Min => graph.min(nodes),
            _ => graph.max(nodes),
        }
        .map_err(sherr)?;
        Ok(Label::Node(n))
    }

    fn gen_vector(
        &mut self,
        ast: &mut Ast,
        graph: &mut ExprGraph,
        row: bool,
        args: &[AstId],
    ) -> Result<Label, CompileError> {
        let labels = args
            .iter()
            .map(|&a| self.generate(ast, graph, a))
            .collect::<Result<Vec<_>, _>>()?;
        if labels.iter().all(|l| matches!(l, Label::Const(c) if !c.is_infinity())) {
            let values: Vec<Domain> = labels
                .iter()
                .map(|l| {
                    let Label::Const(c) = l else { unreachable!() };
                    c.value.clone()
                })
                .collect();
            let v = Domain::vector(&values, row).map_err(sherr)?;
            return Ok(Label::Const(ConstValue::finite(v)));
        }
        let nodes = labels
            .iter()
            .map(|l| self.as_node(graph, l))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Label::Node(graph.vector(nodes, row).map_err(sherr)?))
    }

    // The power decision table. Which lowering applies depends on what the
    // exponent (and base) folded to; `exp(e*log(b))` is the fallback that is
    // always sound but weakest for interval evaluation.
    fn gen_power(
        &mut self,
        ast: &mut Ast,
        graph: &mut ExprGraph,
        base: AstId,
        expo: AstId,
    ) -> Result<Label, CompileError> {
        let b = self.generate(ast, graph, base)?;
        let e = self.generate(ast, graph, expo)?;
        match (&b, &e) {
            (Label::Const(bc), Label::Const(ec)) => {
                if bc.is_infinity() || ec.is_infinity() {
                    return Err(misplaced_infinity());
                }
                let bi = bc.value.as_scalar().map_err(sherr)?;
                let r = if let Some(n) = const_i32(ec) {
                    bi.pow_int(n)
                } else {
                    let ei = ec.value.as_scalar().map_err(sherr)?;
                    bi.pow(ei)
                };
                let d = Domain::scalar(r);
                check_nonempty("^", &d)?;
                Ok(Label::Const(ConstValue::finite(d)))
            }
            (Label::Const(bc), Label::Node(en)) => {
                if bc.is_infinity() {
                    return Err(misplaced_infinity());
                }
                let bi = bc.value.as_scalar().map_err(sherr)?;
                let lb = bi.ln();
                if lb.is_empty() {
                    return Err(CompileError::empty(
                        "'^' with a non-positive constant base and a non-constant exponent",
                    ));
                }
                let c = graph.constant(Domain::scalar(lb));
                let m = graph.mul(*en, c).map_err(sherr)?;
                Ok(Label::Node(graph.unary(UnaryFn::Exp, m).map_err(sherr)?))
            }
            (Label::Node(bn), Label::Const(ec)) => {
                if ec.is_infinity() {
                    return Err(misplaced_infinity());
                }
                if let Some(n) = const_i32(ec) {
                    return Ok(Label::Node(graph.pow_int(*bn, n).map_err(sherr)?));
                }
                let ei = ec.value.as_scalar().map_err(sherr)?;
                let c = graph.constant(Domain::scalar(ei));
                let lg = graph.unary(UnaryFn::Log, *bn).map_err(sherr)?;
                let m = graph.mul(c, lg).map_err(sherr)?;
                Ok(Label::Node(graph.unary(UnaryFn::Exp, m).map_err(sherr)?))
            }
            (Label::Node(bn), Label::Node(en)) => {
                let lg = graph.unary(UnaryFn::Log, *bn).map_err(sherr)?;
                let m = graph.mul(*en, lg).map_err(sherr)?;
                Ok(Label::Node(graph.unary(UnaryFn::Exp, m).map_err(sherr)?))
            }
        }
    }

    fn gen_index(
        &mut self,
        ast: &mut Ast,
        graph: &mut ExprGraph,
        style: IndexStyle,
        args: &[AstId],
    ) -> Result<Label, CompileError> {
        let target = self.generate(ast, graph, args[0])?;
        let first = self.eval_selector(ast, graph, args[1])?;
        let second = if args.len() > 2 {
            Some(self.eval_selector(ast, graph, args[2])?)
        } else {
            None
        };
        match target {
            Label::Const(c) => {
                if c.is_infinity() {
                    return Err(misplaced_infinity());
                }
                let region = index::resolve(c.value.dim(), first, second, style)?;
                let v = c.value.index(region).map_err(sherr)?;
                Ok(Label::Const(ConstValue::finite(v)))
            }
            Label::Node(n) => {
                let region = index::resolve(graph.dim(n), first, second, style)?;
                Ok(Label::Node(graph.index(n, region).map_err(sherr)?))
            }
        }
    }

    fn eval_selector(
        &mut self,
        ast: &mut Ast,
        graph: &mut ExprGraph,
        sel: AstId,
    ) -> Result<Selector, CompileError> {
        let kind = ast.node(sel).kind.clone();
        let args = ast.node(sel).args.clone();
        match kind {
            AstKind::IdxAll => Ok(Selector::All),
            AstKind::Idx => {
                expect_args(&kind, &args, 1)?;
                Ok(Selector::Single(self.eval_index_bound(ast, graph, args[0])?))
            }
            AstKind::IdxRange => {
                expect_args(&kind, &args, 2)?;
                Ok(Selector::Range(
                    self.eval_index_bound(ast, graph, args[0])?,
                    self.eval_index_bound(ast, graph, args[1])?,
                ))
            }
            _ => Err(CompileError::index("expected an index selector")),
        }
    }

    fn eval_index_bound(
        &mut self,
        ast: &mut Ast,
        graph: &mut ExprGraph,
        bound: AstId,
    ) -> Result<i64, CompileError> {
        match self.generate(ast, graph, bound)? {
            Label::Const(c) => const_int(&c).ok_or_else(|| {
                CompileError::index("index bound must be a constant integer")
            }),
            Label::Node(_) => Err(CompileError::index(
                "index bound does not fold to a constant",
            )),
        }
    }

    // Function application: type-check the arguments, bind them to the
    // parameters in an overlay frame, and inline a fresh copy of the body.
    fn gen_apply(
        &mut self,
        ast: &mut Ast,
        graph: &mut ExprGraph,
        name: &str,
        args: &[AstId],
    ) -> Result<Label, CompileError> {
        let scope = self.scope;
        let f = scope
            .function(name)
            .ok_or_else(|| CompileError::symbol(format!("unknown function '{name}'")))?;
        if self.call_stack.iter().any(|n| n == name) {
            return Err(CompileError::symbol(format!(
                "recursive call of function '{name}'"
            )));
        }
        if args.len() != f.params.len() {
            return Err(CompileError::symbol(format!(
                "function '{name}' expects {} argument(s), got {}",
                f.params.len(),
                args.len()
            )));
        }
        let mut frame = HashMap::new();
        for (&arg, (pname, pdim)) in args.iter().zip(&f.params) {
            let label = self.generate(ast, graph, arg)?;
            let adim = self.label_dim(graph, &label)?;
            if adim != *pdim {
                return Err(CompileError::shape(format!(
                    "argument '{pname}' of '{name}' expects a {pdim}, got a {adim}"
                )));
            }
            frame.insert(pname.clone(), label);
        }
        // Each instantiation works on its own copy so labels never leak
        // between applications.
        let mut body = f.body.clone();
        let root = f.root;
        self.call_stack.push(name.to_string());
        self.frames.push(frame);
        let result = self.generate(&mut body, graph, root);
        self.frames.pop();
        self.call_stack.pop();
        result
    }
}

fn fold_binary(
    kind: &AstKind,
    a: &ConstValue,
    b: &ConstValue,
) -> Result<ConstValue, CompileError> {
    if a.is_infinity() || b.is_infinity() {
        return Err(misplaced_infinity());
    }
    let name = op_name(kind);
    let d = match kind {
        AstKind::Add => a.value.add(&b.value).map_err(sherr)?,
        AstKind::Sub => a.value.sub(&b.value).map_err(sherr)?,
        AstKind::Mul => a.value.mul(&b.value).map_err(sherr)?,
        AstKind::Div => a.value.div(&b.value).map_err(sherr)?,
        AstKind::Atan2 => {
            let y = a.value.as_scalar().map_err(sherr)?;
            let x = b.value.as_scalar().map_err(sherr)?;
            Domain::scalar(y.atan2(x))
        }
        _ => unreachable!(),
    };
    check_nonempty(name, &d)?;
    Ok(ConstValue::finite(d))
}

fn fold_unary(kind: &AstKind, a: &ConstValue) -> Result<ConstValue, CompileError> {
    // Unary minus is the one operator defined on the infinity literals.
    if let AstKind::Minus = kind {
        return Ok(match a.num {
            NumKind::PosInf => ConstValue::neg_inf(),
            NumKind::NegInf => ConstValue::pos_inf(),
            NumKind::Finite => ConstValue::finite(a.value.neg()),
        });
    }
    if a.is_infinity() {
        return Err(misplaced_infinity());
    }
    if let AstKind::Transpose = kind {
        return Ok(ConstValue::finite(a.value.transposed()));
    }
    let name = op_name(kind);
    let f = unary_fn(kind).ok_or_else(|| {
        CompileError::shape(format!("unsupported operator '{name}'"))
    })?;
    let iv = a.value.as_scalar().map_err(sherr)?;
    let d = Domain::scalar(apply_scalar_fn(f, iv));
    check_nonempty(name, &d)?;
    Ok(ConstValue::finite(d))
}
