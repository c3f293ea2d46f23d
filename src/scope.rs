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

//! Declaration scope handed to the compiler.
//!
//! The scope is an explicit parameter of every entry point, never ambient
//! state. It records what the model declared before its expressions are
//! compiled: variables (with shapes and initial domains), named constants
//! (already folded), iterator bindings, and functions.

use crate::ast::{Ast, AstId, ConstValue};
use crate::domain::{Dim, Domain};
use crate::error::CompileError;
use std::collections::HashMap;

/// A declared decision variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    /// Declared name.
    pub name: String,
    /// Declared shape.
    pub dim: Dim,
    /// Initial domain, one interval per component.
    pub domain: Domain,
}

/// A declared function: typed parameters and a body AST.
///
/// The stored body is pristine (no memo slots written); each application
/// clones it, so instantiations never share labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Declared name.
    pub name: String,
    /// Parameter names and shapes, in order.
    pub params: Vec<(String, Dim)>,
    /// Body arena.
    pub body: Ast,
    /// Body root.
    pub root: AstId,
}

/// All declarations visible to one compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    vars: Vec<VarDecl>,
    var_index: HashMap<String, usize>,
    constants: HashMap<String, ConstValue>,
    iters: HashMap<String, i64>,
    functions: HashMap<String, Function>,
}

impl Scope {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    fn check_fresh(&self, name: &str) -> Result<(), CompileError> {
        if self.var_index.contains_key(name)
            || self.constants.contains_key(name)
            || self.iters.contains_key(name)
            || self.functions.contains_key(name)
        {
            return Err(CompileError::symbol(format!(
                "symbol '{name}' is already declared"
            )));
        }
        Ok(())
    }

    /// Declares a variable. Declaration order defines the variable index.
    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        dim: Dim,
        domain: Domain,
    ) -> Result<(), CompileError> {
        let name = name.into();
        self.check_fresh(&name)?;
        if domain.dim() != dim {
            return Err(CompileError::shape(format!(
                "variable '{name}' declared as {dim} with a {} domain",
                domain.dim()
            )));
        }
        self.var_index.insert(name.clone(), self.vars.len());
        self.vars.push(VarDecl { name, dim, domain });
        Ok(())
    }

    /// Declares a named constant with its folded value.
    pub fn add_constant(
        &mut self,
        name: impl Into<String>,
        value: ConstValue,
    ) -> Result<(), CompileError> {
        let name = name.into();
        self.check_fresh(&name)?;
        self.constants.insert(name, value);
        Ok(())
    }

    /// Binds an iterator to its current integer value.
    pub fn bind_iter(&mut self, name: impl Into<String>, value: i64) -> Result<(), CompileError> {
        let name = name.into();
        if self.var_index.contains_key(&name)
            || self.constants.contains_key(&name)
            || self.functions.contains_key(&name)
        {
            return Err(CompileError::symbol(format!(
                "symbol '{name}' is already declared"
            )));
        }
        // Rebinding an iterator is how loops advance.
        self.iters.insert(name, value);
        Ok(())
    }

    /// Declares a function.
    pub fn add_function(&mut self, f: Function) -> Result<(), CompileError> {
        self.check_fresh(&f.name)?;
        self.functions.insert(f.name.clone(), f);
        Ok(())
    }

    /// Looks up a variable by name, returning its index and declaration.
    pub fn var(&self, name: &str) -> Option<(usize, &VarDecl)> {
        self.var_index.get(name).map(|&i| (i, &self.vars[i]))
    }

    /// Looks up a named constant.
    pub fn constant(&self, name: &str) -> Option<&ConstValue> {
        self.constants.get(name)
    }

    /// Looks up an iterator binding.
    pub fn iter_value(&self, name: &str) -> Option<i64> {
        self.iters.get(name).copied()
    }

    /// Looks up a function.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Declared variables, in declaration order.
    pub fn vars(&self) -> &[VarDecl] {
        &self.vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Interval;

    #[test]
    fn duplicate_declarations_are_rejected() {
        let mut s = Scope::new();
        s.add_var("x", Dim::Scalar, Domain::scalar(Interval::new(-1.0, 1.0)))
            .unwrap();
        assert!(s
            .add_var("x", Dim::Scalar, Domain::scalar(Interval::ALL))
            .is_err());
        assert!(s.add_constant("x", ConstValue::finite(Domain::point(1.0))).is_err());
        assert!(s.bind_iter("x", 3).is_err());
    }

    #[test]
    fn var_domain_shape_must_match() {
        let mut s = Scope::new();
        let err = s.add_var("v", Dim::Col(3), Domain::point(0.0));
        assert!(matches!(err, Err(CompileError::Shape { .. })));
    }

    #[test]
    fn iterators_can_be_rebound() {
        let mut s = Scope::new();
        s.bind_iter("i", 1).unwrap();
        s.bind_iter("i", 2).unwrap();
        assert_eq!(s.iter_value("i"), Some(2));
    }
}
