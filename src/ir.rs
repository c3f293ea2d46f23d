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

//! Shared expression IR.
//!
//! [`ExprGraph`] is an arena of immutable nodes addressed by [`NodeId`].
//! Nodes are built only through the graph's constructors, which shape-check
//! the operands and hash-cons structurally identical nodes, so a
//! sub-expression appearing twice is stored once. Each node carries its
//! [`Dim`].
//!
//! A graph is either the scratch arena of one assembly pass, dropped
//! wholesale when the pass ends, or the long-lived graph owned by the
//! assembled system; [`ExprGraph::copy_into`] moves expressions from the
//! former to the latter while preserving sharing.

use crate::domain::{Dim, DimError, Domain, IndexRegion};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Handle to a node in an [`ExprGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

/// Scalar unary functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum UnaryFn {
    Sign,
    Abs,
    Sqr,
    Sqrt,
    Exp,
    Log,
    Cos,
    Sin,
    Tan,
    Acos,
    Asin,
    Atan,
    Cosh,
    Sinh,
    Tanh,
    Acosh,
    Asinh,
    Atanh,
}

impl UnaryFn {
    fn name(self) -> &'static str {
        match self {
            UnaryFn::Sign => "sign",
            UnaryFn::Abs => "abs",
            UnaryFn::Sqr => "sqr",
            UnaryFn::Sqrt => "sqrt",
            UnaryFn::Exp => "exp",
            UnaryFn::Log => "log",
            UnaryFn::Cos => "cos",
            UnaryFn::Sin => "sin",
            UnaryFn::Tan => "tan",
            UnaryFn::Acos => "acos",
            UnaryFn::Asin => "asin",
            UnaryFn::Atan => "atan",
            UnaryFn::Cosh => "cosh",
            UnaryFn::Sinh => "sinh",
            UnaryFn::Tanh => "tanh",
            UnaryFn::Acosh => "acosh",
            UnaryFn::Asinh => "asinh",
            UnaryFn::Atanh => "atanh",
        }
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BinFn {
    Add,
    Sub,
    Mul,
    Div,
    Atan2,
}

impl BinFn {
    fn name(self) -> &'static str {
        match self {
            BinFn::Add => "+",
            BinFn::Sub => "-",
            BinFn::Mul => "*",
            BinFn::Div => "/",
            BinFn::Atan2 => "atan2",
        }
    }
}

/// Operator of an IR node.
#[derive(Debug, Clone, PartialEq)]
pub enum IrOp {
    /// A declared variable, identified by its registration index.
    Var {
        /// Position in the system's variable list.
        index: usize,
        /// Declared name, kept for rendering.
        name: String,
    },
    /// An interval constant.
    Const(Domain),
    /// Binary arithmetic.
    Binary(BinFn, NodeId, NodeId),
    /// Unary minus (any shape).
    Minus(NodeId),
    /// Scalar unary function.
    Unary(UnaryFn, NodeId),
    /// Integer power with the dedicated certified lowering.
    PowInt(NodeId, i32),
    /// N-ary minimum over scalars.
    Min(Vec<NodeId>),
    /// N-ary maximum over scalars.
    Max(Vec<NodeId>),
    /// Transpose.
    Transpose(NodeId),
    /// Vector/matrix constructor from parts.
    Vector {
        /// Component expressions.
        args: Vec<NodeId>,
        /// Row constructor when true, column constructor otherwise.
        row: bool,
    },
    /// Sub-region extraction.
    Index {
        /// Indexed expression.
        target: NodeId,
        /// Resolved region.
        region: IndexRegion,
    },
}

/// One immutable IR node.
#[derive(Debug, Clone, PartialEq)]
pub struct IrNode {
    /// Operator and children.
    pub op: IrOp,
    /// Shape of the value this node produces.
    pub dim: Dim,
}

// Structural identity key for hash-consing. Floats enter by bit pattern, so
// two constants are shared only when their components are bit-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NodeKey {
    tag: u8,
    data: Vec<u64>,
}

fn region_code(region: &IndexRegion) -> Vec<u64> {
    match *region {
        IndexRegion::All => vec![0],
        IndexRegion::OneRow(r) => vec![1, r as u64],
        IndexRegion::OneCol(c) => vec![2, c as u64],
        IndexRegion::Rows(a, b) => vec![3, a as u64, b as u64],
        IndexRegion::Cols(a, b) => vec![4, a as u64, b as u64],
        IndexRegion::OneElt(r, c) => vec![5, r as u64, c as u64],
        IndexRegion::SubRow { row, c1, c2 } => vec![6, row as u64, c1 as u64, c2 as u64],
        IndexRegion::SubCol { r1, r2, col } => vec![7, r1 as u64, r2 as u64, col as u64],
        IndexRegion::SubMatrix { r1, r2, c1, c2 } => {
            vec![8, r1 as u64, r2 as u64, c1 as u64, c2 as u64]
        }
    }
}

fn dim_code(dim: Dim) -> Vec<u64> {
    match dim {
        Dim::Scalar => vec![0],
        Dim::Row(n) => vec![1, n as u64],
        Dim::Col(n) => vec![2, n as u64],
        Dim::Matrix(r, c) => vec![3, r as u64, c as u64],
    }
}

fn key_of(op: &IrOp, dim: Dim) -> NodeKey {
    let mut data = Vec::new();
    let tag = match op {
        IrOp::Var { index, .. } => {
            data.push(*index as u64);
            0
        }
        IrOp::Const(d) => {
            data.extend(dim_code(d.dim()));
            for c in d.components() {
                data.push(c.lo.to_bits());
                data.push(c.hi.to_bits());
            }
            1
        }
        IrOp::Binary(f, a, b) => {
            data.push(*f as u64);
            data.push(a.0 as u64);
            data.push(b.0 as u64);
            2
        }
        IrOp::Minus(a) => {
            data.push(a.0 as u64);
            3
        }
        IrOp::Unary(f, a) => {
            data.push(*f as u64);
            data.push(a.0 as u64);
            4
        }
        IrOp::PowInt(a, n) => {
            data.push(a.0 as u64);
            data.push(*n as i64 as u64);
            5
        }
        IrOp::Min(args) => {
            data.extend(args.iter().map(|a| a.0 as u64));
            6
        }
        IrOp::Max(args) => {
            data.extend(args.iter().map(|a| a.0 as u64));
            7
        }
        IrOp::Transpose(a) => {
            data.push(a.0 as u64);
            8
        }
        IrOp::Vector { args, row } => {
            data.push(*row as u64);
            data.extend(args.iter().map(|a| a.0 as u64));
            9
        }
        IrOp::Index { target, region } => {
            data.push(target.0 as u64);
            data.extend(region_code(region));
            10
        }
    };
    data.extend(dim_code(dim));
    NodeKey { tag, data }
}

// Shape of a vector/matrix constructor, mirroring Domain::vector.
fn vector_dim(dims: &[Dim], row: bool) -> Result<Dim, DimError> {
    if dims.is_empty() {
        return Err(DimError::new("empty vector constructor"));
    }
    if dims.iter().all(Dim::is_scalar) {
        let n = dims.len();
        return Ok(if row { Dim::Row(n) } else { Dim::Col(n) });
    }
    if row && dims.iter().all(|d| matches!(d, Dim::Row(_))) {
        let n = dims.iter().map(Dim::size).sum();
        return Ok(Dim::Row(n));
    }
    if !row && dims.iter().all(|d| matches!(d, Dim::Col(_))) {
        let n = dims.iter().map(Dim::size).sum();
        return Ok(Dim::Col(n));
    }
    if row {
        let rows = match dims[0] {
            Dim::Col(n) => n,
            other => {
                return Err(DimError::new(format!(
                    "row constructor expects scalars or columns, got a {other}"
                )))
            }
        };
        for d in dims {
            if *d != Dim::Col(rows) {
                return Err(DimError::new(format!(
                    "row constructor mixes a {} with a {d}",
                    dims[0]
                )));
            }
        }
        Ok(Dim::Matrix(rows, dims.len()))
    } else {
        let cols = match dims[0] {
            Dim::Row(n) => n,
            other => {
                return Err(DimError::new(format!(
                    "column constructor expects scalars or rows, got a {other}"
                )))
            }
        };
        for d in dims {
            if *d != Dim::Row(cols) {
                return Err(DimError::new(format!(
                    "column constructor mixes a {} with a {d}",
                    dims[0]
                )));
            }
        }
        Ok(Dim::Matrix(dims.len(), cols))
    }
}

/// Arena of hash-consed IR nodes.
#[derive(Debug, Default)]
pub struct ExprGraph {
    nodes: Vec<IrNode>,
    dedup: HashMap<NodeKey, NodeId>,
}

impl ExprGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node behind a handle.
    pub fn node(&self, id: NodeId) -> &IrNode {
        &self.nodes[id.0 as usize]
    }

    /// Returns the shape of a node's value.
    pub fn dim(&self, id: NodeId) -> Dim {
        self.nodes[id.0 as usize].dim
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn intern(&mut self, op: IrOp, dim: Dim) -> NodeId {
        let key = key_of(&op, dim);
        if let Some(&id) = self.dedup.get(&key) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(IrNode { op, dim });
        self.dedup.insert(key, id);
        id
    }

    fn scalar_arg(&self, what: &str, a: NodeId) -> Result<(), DimError> {
        let d = self.dim(a);
        if d.is_scalar() {
            Ok(())
        } else {
            Err(DimError::new(format!("'{what}' expects a scalar, got a {d}")))
        }
    }

    /// Inserts a variable node.
    pub fn var(&mut self, index: usize, name: impl Into<String>, dim: Dim) -> NodeId {
        self.intern(
            IrOp::Var {
                index,
                name: name.into(),
            },
            dim,
        )
    }

    /// Inserts a constant node.
    pub fn constant(&mut self, value: Domain) -> NodeId {
        let dim = value.dim();
        self.intern(IrOp::Const(value), dim)
    }

    /// Builds `a + b`.
    pub fn add(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, DimError> {
        let dim = self.dim(a).add(self.dim(b))?;
        Ok(self.intern(IrOp::Binary(BinFn::Add, a, b), dim))
    }

    /// Builds `a - b`.
    pub fn sub(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, DimError> {
        let dim = self.dim(a).add(self.dim(b))?;
        Ok(self.intern(IrOp::Binary(BinFn::Sub, a, b), dim))
    }

    /// Builds `a * b` under linear-algebra rules.
    pub fn mul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, DimError> {
        let dim = self.dim(a).mul(self.dim(b))?;
        Ok(self.intern(IrOp::Binary(BinFn::Mul, a, b), dim))
    }

    /// Builds `a / b` with a scalar divisor.
    pub fn div(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, DimError> {
        let dim = self.dim(a).div(self.dim(b))?;
        Ok(self.intern(IrOp::Binary(BinFn::Div, a, b), dim))
    }

    /// Builds `-a`.
    pub fn minus(&mut self, a: NodeId) -> NodeId {
        let dim = self.dim(a);
        self.intern(IrOp::Minus(a), dim)
    }

    /// Builds a scalar unary function application.
    pub fn unary(&mut self, f: UnaryFn, a: NodeId) -> Result<NodeId, DimError> {
        self.scalar_arg(f.name(), a)?;
        Ok(self.intern(IrOp::Unary(f, a), Dim::Scalar))
    }

    /// Builds the dedicated integer power `a^n`.
    pub fn pow_int(&mut self, a: NodeId, n: i32) -> Result<NodeId, DimError> {
        self.scalar_arg("^", a)?;
        Ok(self.intern(IrOp::PowInt(a, n), Dim::Scalar))
    }

    /// Builds `atan2(y, x)`.
    pub fn atan2(&mut self, y: NodeId, x: NodeId) -> Result<NodeId, DimError> {
        self.scalar_arg("atan2", y)?;
        self.scalar_arg("atan2", x)?;
        Ok(self.intern(IrOp::Binary(BinFn::Atan2, y, x), Dim::Scalar))
    }

    /// Builds an n-ary minimum over scalars.
    pub fn min(&mut self, args: Vec<NodeId>) -> Result<NodeId, DimError> {
        if args.is_empty() {
            return Err(DimError::new("'min' expects at least one argument"));
        }
        for &a in &args {
            self.scalar_arg("min", a)?;
        }
        Ok(self.intern(IrOp::Min(args), Dim::Scalar))
    }

    /// Builds an n-ary maximum over scalars.
    pub fn max(&mut self, args: Vec<NodeId>) -> Result<NodeId, DimError> {
        if args.is_empty() {
            return Err(DimError::new("'max' expects at least one argument"));
        }
        for &a in &args {
            self.scalar_arg("max", a)?;
        }
        Ok(self.intern(IrOp::Max(args), Dim::Scalar))
    }

    /// Builds the transpose of `a`.
    pub fn transpose(&mut self, a: NodeId) -> NodeId {
        let dim = self.dim(a).transposed();
        self.intern(IrOp::Transpose(a), dim)
    }

    /// Builds a vector/matrix constructor from parts.
    pub fn vector(&mut self, args: Vec<NodeId>, row: bool) -> Result<NodeId, DimError> {
        let dims: Vec<Dim> = args.iter().map(|&a| self.dim(a)).collect();
        let dim = vector_dim(&dims, row)?;
        Ok(self.intern(IrOp::Vector { args, row }, dim))
    }

    /// Builds a sub-region extraction.
    pub fn index(&mut self, target: NodeId, region: IndexRegion) -> Result<NodeId, DimError> {
        let dim = region.result_dim(self.dim(target))?;
        Ok(self.intern(IrOp::Index { target, region }, dim))
    }

    /// Deep-copies the expression rooted at `root` into `dest`.
    ///
    /// `map` carries already-copied nodes; passing the same map across
    /// several roots preserves sharing between them in the destination
    /// graph.
    pub fn copy_into(
        &self,
        root: NodeId,
        dest: &mut ExprGraph,
        map: &mut HashMap<NodeId, NodeId>,
    ) -> NodeId {
        if let Some(&copied) = map.get(&root) {
            return copied;
        }
        let node = self.node(root);
        let op = match &node.op {
            IrOp::Var { index, name } => IrOp::Var {
                index: *index,
                name: name.clone(),
            },
            IrOp::Const(d) => IrOp::Const(d.clone()),
            IrOp::Binary(f, a, b) => {
                let a = self.copy_into(*a, dest, map);
                let b = self.copy_into(*b, dest, map);
                IrOp::Binary(*f, a, b)
            }
            IrOp::Minus(a) => IrOp::Minus(self.copy_into(*a, dest, map)),
            IrOp::Unary(f, a) => IrOp::Unary(*f, self.copy_into(*a, dest, map)),
            IrOp::PowInt(a, n) => IrOp::PowInt(self.copy_into(*a, dest, map), *n),
            IrOp::Min(args) => {
                IrOp::Min(args.iter().map(|&a| self.copy_into(a, dest, map)).collect())
            }
            IrOp::Max(args) => {
                IrOp::Max(args.iter().map(|&a| self.copy_into(a, dest, map)).collect())
            }
            IrOp::Transpose(a) => IrOp::Transpose(self.copy_into(*a, dest, map)),
            IrOp::Vector { args, row } => IrOp::Vector {
                args: args.iter().map(|&a| self.copy_into(a, dest, map)).collect(),
                row: *row,
            },
            IrOp::Index { target, region } => IrOp::Index {
                target: self.copy_into(*target, dest, map),
                region: *region,
            },
        };
        let copied = dest.intern(op, node.dim);
        map.insert(root, copied);
        copied
    }

    /// Renders the expression rooted at `root` as an s-expression, for
    /// display and structural comparison in tests.
    pub fn dump(&self, root: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(root, &mut out);
        out
    }

    fn dump_into(&self, id: NodeId, out: &mut String) {
        match &self.node(id).op {
            IrOp::Var { name, .. } => out.push_str(name),
            IrOp::Const(d) => {
                let _ = write!(out, "{d}");
            }
            IrOp::Binary(f, a, b) => {
                let _ = write!(out, "({} ", f.name());
                self.dump_into(*a, out);
                out.push(' ');
                self.dump_into(*b, out);
                out.push(')');
            }
            IrOp::Minus(a) => {
                out.push_str("(- ");
                self.dump_into(*a, out);
                out.push(')');
            }
            IrOp::Unary(f, a) => {
                let _ = write!(out, "({} ", f.name());
                self.dump_into(*a, out);
                out.push(')');
            }
            IrOp::PowInt(a, n) => {
                out.push_str("(powi ");
                self.dump_into(*a, out);
                let _ = write!(out, " {n})");
            }
            IrOp::Min(args) | IrOp::Max(args) => {
                let name = if matches!(self.node(id).op, IrOp::Min(_)) {
                    "min"
                } else {
                    "max"
                };
                let _ = write!(out, "({name}");
                for &a in args {
                    out.push(' ');
                    self.dump_into(a, out);
                }
                out.push(')');
            }
            IrOp::Transpose(a) => {
                out.push_str("(t ");
                self.dump_into(*a, out);
                out.push(')');
            }
            IrOp::Vector { args, row } => {
                let _ = write!(out, "({}", if *row { "row" } else { "col" });
                for &a in args {
                    out.push(' ');
                    self.dump_into(a, out);
                }
                out.push(')');
            }
            IrOp::Index { target, region } => {
                let _ = write!(out, "(index {region:?} ");
                self.dump_into(*target, out);
                out.push(')');
            }
        }
    }
}
