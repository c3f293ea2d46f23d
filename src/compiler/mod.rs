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

//! Problem assembly.
//!
//! [`assemble`] drives one generation pass over a [`SystemSource`]: it
//! registers the scope's variables, generates the objective and every
//! constraint into a scratch graph, then copies the retained expressions into
//! the [`System`]'s own graph and drops the scratch arena. Failure at any
//! step aborts the whole assembly; there is no partial output.

pub(crate) mod generator;
pub(crate) mod index;

use crate::ast::{Label, SystemSource};
use crate::error::CompileError;
use crate::ir::{ExprGraph, NodeId};
use crate::scope::Scope;
use crate::system::{Constraint, System, Variable};
use std::collections::HashMap;
use tracing::debug;

use self::generator::ExprGenerator;

/// Assembles a problem description from a parsed source and its scope.
///
/// The source is consumed: generation writes memo slots into its AST and a
/// failed assembly leaves them set, so the AST must not be resubmitted.
pub fn assemble(source: SystemSource, scope: &Scope) -> Result<System, CompileError> {
    if scope.vars().is_empty() {
        return Err(CompileError::NoVariables);
    }

    let SystemSource {
        mut ast,
        goal,
        ctrs,
    } = source;

    let mut scratch = ExprGraph::new();
    let mut generator = ExprGenerator::new(scope, false);

    // Variable list and bounds box come straight from the scope, in
    // declaration order; the box is flat, one interval per component.
    let mut vars = Vec::with_capacity(scope.vars().len());
    let mut bounds = Vec::new();
    for decl in scope.vars() {
        vars.push(Variable {
            name: decl.name.clone(),
            dim: decl.dim,
        });
        bounds.extend_from_slice(decl.domain.components());
    }
    debug!(vars = vars.len(), "registered variables");

    let goal_node = match goal {
        Some(root) => {
            let label = generator.generate(&mut ast, &mut scratch, root)?;
            let dim = match &label {
                Label::Node(n) => scratch.dim(*n),
                Label::Const(c) if c.is_infinity() => {
                    return Err(CompileError::shape("objective cannot be an infinity"))
                }
                Label::Const(c) => c.value.dim(),
            };
            if !dim.is_scalar() {
                return Err(CompileError::shape(format!(
                    "objective must be scalar, got a {dim}"
                )));
            }
            Some(force_node(&mut scratch, &label)?)
        }
        None => None,
    };

    // Constraints are normalized to `lhs - rhs op 0`; the subtraction's
    // shape check is what rejects mismatched sides.
    let mut scratch_ctrs = Vec::with_capacity(ctrs.len());
    for ctr in &ctrs {
        let lhs = generator.generate(&mut ast, &mut scratch, ctr.lhs)?;
        let rhs = generator.generate(&mut ast, &mut scratch, ctr.rhs)?;
        let ln = force_node(&mut scratch, &lhs)?;
        let rn = force_node(&mut scratch, &rhs)?;
        let expr = scratch
            .sub(ln, rn)
            .map_err(|e| CompileError::shape(e.message))?;
        scratch_ctrs.push(Constraint { expr, op: ctr.op });
    }
    debug!(
        generated = generator.generated(),
        scratch_nodes = scratch.len(),
        "generation finished"
    );

    // Copy-out with one shared map, so expressions shared between the
    // objective and constraints stay shared in the system's graph. The
    // scratch arena is dropped wholesale when this function returns.
    let mut graph = ExprGraph::new();
    let mut map = HashMap::new();
    let goal_node = goal_node.map(|n| scratch.copy_into(n, &mut graph, &mut map));
    let ctrs: Vec<Constraint> = scratch_ctrs
        .iter()
        .map(|c| Constraint {
            expr: scratch.copy_into(c.expr, &mut graph, &mut map),
            op: c.op,
        })
        .collect();

    debug!(
        vars = vars.len(),
        ctrs = ctrs.len(),
        nodes = graph.len(),
        "assembled system"
    );
    Ok(System {
        graph,
        vars,
        goal: goal_node,
        ctrs,
        bounds,
    })
}

fn force_node(graph: &mut ExprGraph, label: &Label) -> Result<NodeId, CompileError> {
    match label {
        Label::Node(n) => Ok(*n),
        Label::Const(c) if c.is_infinity() => Err(CompileError::symbol(
            "misplaced 'oo': infinity can only be negated or used alone",
        )),
        Label::Const(c) => Ok(graph.constant(c.value.clone())),
    }
}
