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

//! Structured compile errors raised during generation and assembly.
//!
//! Every failure in this crate is one of these variants; there is no side
//! channel and no partial output. Messages are written to be shown to the
//! model author as-is.

use thiserror::Error;

/// Fatal error raised while generating or assembling a system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Operator arity/dimension mismatch, during constant folding or IR
    /// construction.
    #[error("shape error: {message}")]
    Shape {
        /// Underlying dimension-mismatch description.
        message: String,
    },

    /// Negative or out-of-range resolved index, or an index bound that does
    /// not fold to a constant integer.
    #[error("index error: {message}")]
    Index {
        /// User-facing description, including the 1-based addressing hint
        /// when applicable.
        message: String,
    },

    /// A symbol was used in a context where it is not legal, for example a
    /// declared variable inside a constant expression.
    #[error("symbol error: {message}")]
    SymbolMisuse {
        /// User-facing description.
        message: String,
    },

    /// A certified operation produced an empty interval while folding a
    /// constant expression (for example `log` of a non-positive constant).
    #[error("empty interval: {message}")]
    Empty {
        /// Operation and operand description.
        message: String,
    },

    /// The source declares no variables, so there is nothing to assemble.
    #[error("system declares no variables")]
    NoVariables,
}

impl CompileError {
    /// Creates a [`CompileError::Shape`].
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape {
            message: message.into(),
        }
    }

    /// Creates a [`CompileError::Index`].
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index {
            message: message.into(),
        }
    }

    /// Creates a [`CompileError::SymbolMisuse`].
    pub fn symbol(message: impl Into<String>) -> Self {
        Self::SymbolMisuse {
            message: message.into(),
        }
    }

    /// Creates a [`CompileError::Empty`].
    pub fn empty(message: impl Into<String>) -> Self {
        Self::Empty {
            message: message.into(),
        }
    }
}
