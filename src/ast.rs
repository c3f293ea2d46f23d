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

//! Input AST for the compiler.
//!
//! The AST is an arena of nodes addressed by [`AstId`] handles. It arrives
//! from an external parser; this crate only reads its structure and writes
//! each node's memo slot once during generation. Because the arena hands out
//! plain indices, a node shared between the objective and several constraints
//! is a single entry visited a single time.

use crate::domain::Domain;
use crate::ir::NodeId;
use std::fmt;

/// Handle to a node in an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AstId(pub(crate) u32);

/// Addressing style for indexed access, set per index node by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexStyle {
    /// `x[i]`: indices start at 0.
    ZeroBased,
    /// `x(i)`: indices start at 1 and are decremented during resolution.
    OneBased,
}

/// Numeric kind of a folded constant.
///
/// Infinity literals stay symbolic until an operator consumes them, so that
/// `-oo` flips kind instead of collapsing into interval arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumKind {
    /// An ordinary (possibly unbounded-endpoint) interval value.
    Finite,
    /// The `+oo` literal.
    PosInf,
    /// The `-oo` literal.
    NegInf,
}

/// A folded compile-time constant: a dimensioned interval value plus its
/// numeric kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstValue {
    /// The folded value.
    pub value: Domain,
    /// Finite or an infinity literal.
    pub num: NumKind,
}

impl ConstValue {
    /// Wraps an ordinary folded value.
    pub fn finite(value: Domain) -> Self {
        Self {
            value,
            num: NumKind::Finite,
        }
    }

    /// The `+oo` literal.
    pub fn pos_inf() -> Self {
        Self {
            value: Domain::point(f64::INFINITY),
            num: NumKind::PosInf,
        }
    }

    /// The `-oo` literal.
    pub fn neg_inf() -> Self {
        Self {
            value: Domain::point(f64::NEG_INFINITY),
            num: NumKind::NegInf,
        }
    }

    /// Returns whether this is one of the infinity literals.
    pub fn is_infinity(&self) -> bool {
        !matches!(self.num, NumKind::Finite)
    }
}

/// Result of generating one AST node, stored in its memo slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Label {
    /// The subtree folded to a compile-time constant.
    Const(ConstValue),
    /// The subtree became an IR node in the scratch graph.
    Node(NodeId),
}

/// Operator tag of an AST node. Children live in the node's ordered argument
/// list; kinds that carry payload (constants, names) embed it here.
#[derive(Debug, Clone, PartialEq)]
pub enum AstKind {
    /// Literal constant (scalar, vector, or matrix of intervals).
    Cst(Domain),
    /// The `oo` literal.
    Infinity,
    /// Reference to a declared variable or named constant.
    Symbol(String),
    /// Reference to an iterator, bound to an integer by the scope.
    Iter(String),
    /// Binary addition.
    Add,
    /// Binary subtraction.
    Sub,
    /// Multiplication (linear-algebra rules).
    Mul,
    /// Division by a scalar.
    Div,
    /// Unary minus.
    Minus,
    /// Power; lowering is decided by the generator's decision table.
    Power,
    /// Sign function.
    Sign,
    /// Absolute value.
    Abs,
    /// Square.
    Sqr,
    /// Square root.
    Sqrt,
    /// Exponential.
    Exp,
    /// Natural logarithm.
    Log,
    /// Cosine.
    Cos,
    /// Sine.
    Sin,
    /// Tangent.
    Tan,
    /// Arc-cosine.
    Acos,
    /// Arc-sine.
    Asin,
    /// Arc-tangent.
    Atan,
    /// Hyperbolic cosine.
    Cosh,
    /// Hyperbolic sine.
    Sinh,
    /// Hyperbolic tangent.
    Tanh,
    /// Inverse hyperbolic cosine.
    Acosh,
    /// Inverse hyperbolic sine.
    Asinh,
    /// Inverse hyperbolic tangent.
    Atanh,
    /// Two-argument arc-tangent.
    Atan2,
    /// N-ary minimum over scalars.
    Min,
    /// N-ary maximum over scalars.
    Max,
    /// Transpose.
    Transpose,
    /// Row constructor `(a, b, c)`.
    RowVec,
    /// Column constructor `(a; b; c)`.
    ColVec,
    /// Application of a declared function.
    Apply(String),
    /// Indexed access; args are the target then one or two selectors.
    IndexedAccess(IndexStyle),
    /// Wildcard selector `:` (legal only directly under an indexed access).
    IdxAll,
    /// Range selector `a:b`; args are the two bound expressions.
    IdxRange,
    /// Single-index selector; arg is the index expression.
    Idx,
}

/// One AST node: tag, ordered children, and the write-once memo slot.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    /// Operator tag.
    pub kind: AstKind,
    /// Ordered children.
    pub args: Vec<AstId>,
    pub(crate) label: Option<Label>,
}

/// Arena of AST nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ast {
    nodes: Vec<AstNode>,
}

impl Ast {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node and returns its handle.
    pub fn push(&mut self, kind: AstKind, args: Vec<AstId>) -> AstId {
        let id = AstId(self.nodes.len() as u32);
        self.nodes.push(AstNode {
            kind,
            args,
            label: None,
        });
        id
    }

    /// Returns the node behind a handle.
    pub fn node(&self, id: AstId) -> &AstNode {
        &self.nodes[id.0 as usize]
    }

    /// Returns the memo slot of a node.
    pub(crate) fn label(&self, id: AstId) -> Option<&Label> {
        self.nodes[id.0 as usize].label.as_ref()
    }

    // The memo slot is write-once; generation never revisits a labeled node.
    pub(crate) fn set_label(&mut self, id: AstId, label: Label) {
        let slot = &mut self.nodes[id.0 as usize].label;
        debug_assert!(slot.is_none());
        *slot = Some(label);
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // Convenience constructors, used by tests and by hosts building an AST
    // without a parser in front.

    /// Literal constant node.
    pub fn constant(&mut self, value: Domain) -> AstId {
        self.push(AstKind::Cst(value), vec![])
    }

    /// Degenerate scalar literal.
    pub fn number(&mut self, v: f64) -> AstId {
        self.constant(Domain::point(v))
    }

    /// The `oo` literal.
    pub fn infinity(&mut self) -> AstId {
        self.push(AstKind::Infinity, vec![])
    }

    /// Symbol reference.
    pub fn symbol(&mut self, name: impl Into<String>) -> AstId {
        self.push(AstKind::Symbol(name.into()), vec![])
    }

    /// Iterator reference.
    pub fn iter_ref(&mut self, name: impl Into<String>) -> AstId {
        self.push(AstKind::Iter(name.into()), vec![])
    }

    /// Binary node.
    pub fn binary(&mut self, kind: AstKind, lhs: AstId, rhs: AstId) -> AstId {
        self.push(kind, vec![lhs, rhs])
    }

    /// Unary node.
    pub fn unary(&mut self, kind: AstKind, arg: AstId) -> AstId {
        self.push(kind, vec![arg])
    }

    /// Function application node.
    pub fn apply(&mut self, name: impl Into<String>, args: Vec<AstId>) -> AstId {
        self.push(AstKind::Apply(name.into()), args)
    }

    /// Indexed access with one selector.
    pub fn index1(&mut self, style: IndexStyle, target: AstId, sel: AstId) -> AstId {
        self.push(AstKind::IndexedAccess(style), vec![target, sel])
    }

    /// Indexed access with two selectors.
    pub fn index2(&mut self, style: IndexStyle, target: AstId, s1: AstId, s2: AstId) -> AstId {
        self.push(AstKind::IndexedAccess(style), vec![target, s1, s2])
    }

    /// Wildcard selector.
    pub fn idx_all(&mut self) -> AstId {
        self.push(AstKind::IdxAll, vec![])
    }

    /// Range selector.
    pub fn idx_range(&mut self, lo: AstId, hi: AstId) -> AstId {
        self.push(AstKind::IdxRange, vec![lo, hi])
    }

    /// Single-index selector.
    pub fn idx(&mut self, e: AstId) -> AstId {
        self.push(AstKind::Idx, vec![e])
    }
}

/// Comparison operator of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    /// Equality.
    Eq,
    /// Less than or equal.
    Le,
    /// Greater than or equal.
    Ge,
    /// Strictly less than.
    Lt,
    /// Strictly greater than.
    Gt,
}

impl fmt::Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cmp::Eq => "=",
            Cmp::Le => "<=",
            Cmp::Ge => ">=",
            Cmp::Lt => "<",
            Cmp::Gt => ">",
        };
        write!(f, "{s}")
    }
}

/// One parsed constraint: `lhs op rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDecl {
    /// Left-hand side root.
    pub lhs: AstId,
    /// Right-hand side root.
    pub rhs: AstId,
    /// Comparison operator.
    pub op: Cmp,
}

/// Everything the assembler consumes: the AST arena, the optional objective
/// root, and the parsed constraints.
///
/// Taken by value by `assemble_system`; generation writes memo slots into the
/// arena and those are never rolled back on failure.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSource {
    /// The AST arena.
    pub ast: Ast,
    /// Objective root, when the model declares one.
    pub goal: Option<AstId>,
    /// Parsed constraints, in declaration order.
    pub ctrs: Vec<ConstraintDecl>,
}

impl SystemSource {
    /// Creates a source bundle over an arena.
    pub fn new(ast: Ast) -> Self {
        Self {
            ast,
            goal: None,
            ctrs: Vec::new(),
        }
    }
}
