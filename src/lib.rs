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

//! Compiler from parsed numeric models to a shared interval expression IR.
//!
//! The input is the AST of a constraint/optimization model (variables with
//! initial domains, an optional objective, constraints) as produced by an
//! external parser. This crate compiles it into:
//! - a hash-consed expression graph whose constants are certified intervals,
//!   with every fully-constant subtree folded at compile time;
//! - an assembled [`System`]: variable list, objective, constraints in
//!   `expr op 0` normal form, and the initial bounds box.
//!
//! # Pipeline
//!
//! 1. The host parses its model syntax into an [`Ast`] arena plus a
//!    [`Scope`] of declarations.
//! 2. [`assemble_system`] generates every expression once (shared AST nodes
//!    are labeled a single time), folding constants with outward-rounded
//!    interval arithmetic.
//! 3. The retained expressions are copied into the [`System`]'s own graph;
//!    the scratch graph of the pass is dropped.
//!
//! [`eval_constant`] runs the same generator in constants-only mode, for
//! contexts such as declared array bounds where a variable reference is an
//! error rather than an IR node.

pub mod ast;
pub mod compiler;
pub mod domain;
pub mod error;
pub mod ir;
pub mod scope;
pub mod system;

pub use ast::{Ast, AstId, AstKind, Cmp, ConstValue, ConstraintDecl, IndexStyle, Label, NumKind,
    SystemSource};
pub use compiler::assemble;
pub use domain::{Dim, DimError, Domain, IndexRegion, Interval};
pub use error::CompileError;
pub use ir::{BinFn, ExprGraph, IrNode, IrOp, NodeId, UnaryFn};
pub use scope::{Function, Scope, VarDecl};
pub use system::{Constraint, System, Variable};

use compiler::generator::ExprGenerator;

/// Assembles a parsed model into a [`System`].
///
/// Alias of [`compiler::assemble`], re-exported as the crate's main entry
/// point.
pub fn assemble_system(source: SystemSource, scope: &Scope) -> Result<System, CompileError> {
    compiler::assemble(source, scope)
}

/// Evaluates a fully constant expression.
///
/// The generator runs in constants-only mode: named constants and iterator
/// bindings resolve as usual, but a declared variable is a
/// [`CompileError::SymbolMisuse`]. The AST's memo slots are written as in a
/// normal pass.
pub fn eval_constant(
    ast: &mut Ast,
    root: AstId,
    scope: &Scope,
) -> Result<ConstValue, CompileError> {
    let mut scratch = ir::ExprGraph::new();
    let mut generator = ExprGenerator::new(scope, true);
    match generator.generate(ast, &mut scratch, root)? {
        Label::Const(c) => Ok(c),
        // Unreachable in practice: constants-only mode errors before it can
        // build an IR node.
        Label::Node(_) => Err(CompileError::symbol(
            "expression does not fold to a constant",
        )),
    }
}

#[cfg(test)]
mod tests;
