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

//! Assembled problem description.
//!
//! A [`System`] owns its own expression graph; nothing in it aliases the
//! scratch arena the assembler worked in, which is dropped when assembly
//! ends. Constraints are stored in normal form, `expr op 0`.

use crate::ast::Cmp;
use crate::domain::{Dim, Interval};
use crate::ir::{ExprGraph, NodeId};

/// A registered variable of an assembled system.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Declared name.
    pub name: String,
    /// Declared shape.
    pub dim: Dim,
}

/// One assembled constraint in normal form: `expr op 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    /// Root of the constraint expression in the system's graph.
    pub expr: NodeId,
    /// Comparison against zero.
    pub op: Cmp,
}

/// The output of assembly: variables, optional objective, constraints, and
/// the initial bounds box.
#[derive(Debug)]
pub struct System {
    pub(crate) graph: ExprGraph,
    pub(crate) vars: Vec<Variable>,
    pub(crate) goal: Option<NodeId>,
    pub(crate) ctrs: Vec<Constraint>,
    pub(crate) bounds: Vec<Interval>,
}

impl System {
    /// The expression graph owning every retained node.
    pub fn graph(&self) -> &ExprGraph {
        &self.graph
    }

    /// Registered variables, in declaration order.
    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    /// Number of registered variables.
    pub fn nb_vars(&self) -> usize {
        self.vars.len()
    }

    /// Objective root, when the model declared one.
    pub fn goal(&self) -> Option<NodeId> {
        self.goal
    }

    /// Assembled constraints, in declaration order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.ctrs
    }

    /// Initial bounds box: one interval per flattened variable component,
    /// declaration order.
    pub fn bounds(&self) -> &[Interval] {
        &self.bounds
    }
}
