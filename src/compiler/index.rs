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

//! Index selector resolution.
//!
//! Turns one or two already-folded selectors plus the target shape into an
//! [`IndexRegion`]. All numeric work here is on plain integers; the generator
//! folds the selector expressions before calling in.
//!
//! A range whose ends are equal is a single index and collapses before
//! classification, so `m(2:2)` selects a row, not a one-row sub-matrix.
//! Two-selector access applies to any non-scalar target; against a vector
//! the selectors address its 1 x n (or n x 1) layout and the resolved region
//! folds back onto the component axis.
//!
//! One-based style decrements every numeric index before validation. A
//! negative result after adjustment is reported with the addressing hint,
//! since `x(0)` under one-based style is the classic off-by-one.

use crate::ast::IndexStyle;
use crate::domain::{Dim, IndexRegion};
use crate::error::CompileError;

/// A folded index selector, before adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Selector {
    /// The wildcard `:`.
    All,
    /// A single index.
    Single(i64),
    /// An inclusive range `a:b`.
    Range(i64, i64),
}

const ONE_BASED_HINT: &str =
    "note: one-based indexed access (like \"x(i)\") starts from 1, not 0";

fn adjust_one(i: i64, style: IndexStyle) -> Result<usize, CompileError> {
    let dec = match style {
        IndexStyle::ZeroBased => 0,
        IndexStyle::OneBased => 1,
    };
    let i = i - dec;
    if i < 0 {
        let mut msg = format!("negative index {i}");
        if style == IndexStyle::OneBased {
            msg.push_str("; ");
            msg.push_str(ONE_BASED_HINT);
        }
        return Err(CompileError::index(msg));
    }
    Ok(i as usize)
}

fn adjust(sel: Selector, style: IndexStyle) -> Result<Selector2, CompileError> {
    Ok(match sel {
        Selector::All => Selector2::All,
        Selector::Single(i) => Selector2::Single(adjust_one(i, style)?),
        Selector::Range(a0, b0) => {
            let a = adjust_one(a0, style)?;
            let b = adjust_one(b0, style)?;
            if a > b {
                // Report the indices as the user wrote them.
                return Err(CompileError::index(format!("empty index range {a0}:{b0}")));
            }
            if a == b {
                // A degenerate range is a single index.
                Selector2::Single(a)
            } else {
                Selector2::Range(a, b)
            }
        }
    })
}

// Adjusted, validated-non-negative selector.
#[derive(Debug, Clone, Copy)]
enum Selector2 {
    All,
    Single(usize),
    Range(usize, usize),
}

fn check_bound(i: usize, n: usize, axis: &str) -> Result<(), CompileError> {
    if i >= n {
        return Err(CompileError::index(format!(
            "{axis} index {i} out of range (0..{n})"
        )));
    }
    Ok(())
}

/// Resolves one or two selectors against the target shape.
pub(crate) fn resolve(
    dim: Dim,
    first: Selector,
    second: Option<Selector>,
    style: IndexStyle,
) -> Result<IndexRegion, CompileError> {
    if dim.is_scalar() {
        return Err(CompileError::shape("cannot index a scalar expression"));
    }
    let first = adjust(first, style)?;
    match second {
        None => resolve_one(dim, first),
        Some(second) => {
            let second = adjust(second, style)?;
            let region = resolve_two(dim, first, second)?;
            Ok(if dim.is_matrix() {
                region
            } else {
                onto_component_axis(region, matches!(dim, Dim::Row(_)))
            })
        }
    }
}

// Two-selector regions against a vector address its 1 x n (or n x 1)
// layout; fold them back onto the component axis. The size-1 axis can only
// be addressed whole, so its selector degrades to the wildcard.
fn onto_component_axis(region: IndexRegion, row_target: bool) -> IndexRegion {
    use IndexRegion::*;
    if row_target {
        match region {
            All | OneRow(_) | Rows(_, _) => All,
            OneCol(c) | OneElt(_, c) => OneCol(c),
            Cols(a, b) | SubRow { c1: a, c2: b, .. } | SubMatrix { c1: a, c2: b, .. } => {
                Cols(a, b)
            }
            SubCol { col, .. } => OneCol(col),
        }
    } else {
        match region {
            All | OneCol(_) | Cols(_, _) => All,
            OneRow(r) | OneElt(r, _) => OneCol(r),
            Rows(a, b) | SubCol { r1: a, r2: b, .. } | SubMatrix { r1: a, r2: b, .. } => {
                Cols(a, b)
            }
            SubRow { row, .. } => OneCol(row),
        }
    }
}

fn resolve_one(dim: Dim, sel: Selector2) -> Result<IndexRegion, CompileError> {
    let rows = dim.nb_rows();
    match sel {
        Selector2::All => Ok(IndexRegion::All),
        Selector2::Single(i) => {
            if dim.is_matrix() {
                // One index against a matrix selects a row.
                check_bound(i, rows, "row")?;
                Ok(IndexRegion::OneRow(i))
            } else {
                check_bound(i, dim.size(), "component")?;
                Ok(IndexRegion::OneCol(i))
            }
        }
        Selector2::Range(a, b) => {
            if dim.is_matrix() {
                check_bound(b, rows, "row")?;
                Ok(IndexRegion::Rows(a, b))
            } else {
                check_bound(b, dim.size(), "component")?;
                Ok(IndexRegion::Cols(a, b))
            }
        }
    }
}

fn resolve_two(dim: Dim, s1: Selector2, s2: Selector2) -> Result<IndexRegion, CompileError> {
    let rows = dim.nb_rows();
    let cols = dim.nb_cols();
    match (s1, s2) {
        (Selector2::All, Selector2::All) => Ok(IndexRegion::All),
        (Selector2::All, Selector2::Single(c)) => {
            check_bound(c, cols, "column")?;
            Ok(IndexRegion::OneCol(c))
        }
        (Selector2::All, Selector2::Range(a, b)) => {
            check_bound(b, cols, "column")?;
            Ok(IndexRegion::Cols(a, b))
        }
        (Selector2::Single(r), Selector2::All) => {
            check_bound(r, rows, "row")?;
            Ok(IndexRegion::OneRow(r))
        }
        (Selector2::Single(r), Selector2::Single(c)) => {
            check_bound(r, rows, "row")?;
            check_bound(c, cols, "column")?;
            Ok(IndexRegion::OneElt(r, c))
        }
        (Selector2::Single(r), Selector2::Range(c1, c2)) => {
            check_bound(r, rows, "row")?;
            check_bound(c2, cols, "column")?;
            Ok(IndexRegion::SubRow { row: r, c1, c2 })
        }
        (Selector2::Range(a, b), Selector2::All) => {
            check_bound(b, rows, "row")?;
            Ok(IndexRegion::Rows(a, b))
        }
        (Selector2::Range(r1, r2), Selector2::Single(c)) => {
            check_bound(r2, rows, "row")?;
            check_bound(c, cols, "column")?;
            Ok(IndexRegion::SubCol { r1, r2, col: c })
        }
        (Selector2::Range(r1, r2), Selector2::Range(c1, c2)) => {
            check_bound(r2, rows, "row")?;
            check_bound(c2, cols, "column")?;
            Ok(IndexRegion::SubMatrix { r1, r2, c1, c2 })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_based_single_index_into_vector() {
        let r = resolve(
            Dim::Row(5),
            Selector::Single(3),
            None,
            IndexStyle::OneBased,
        )
        .unwrap();
        assert_eq!(r, IndexRegion::OneCol(2));
    }

    #[test]
    fn one_based_zero_is_negative_with_hint() {
        let err = resolve(
            Dim::Row(5),
            Selector::Single(0),
            None,
            IndexStyle::OneBased,
        )
        .unwrap_err();
        match err {
            CompileError::Index { message } => {
                assert!(message.contains("starts from 1"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn zero_based_negative_has_no_hint() {
        let err = resolve(
            Dim::Col(4),
            Selector::Single(-1),
            None,
            IndexStyle::ZeroBased,
        )
        .unwrap_err();
        match err {
            CompileError::Index { message } => {
                assert!(!message.contains("starts from 1"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn row_range_with_wildcard_columns() {
        let r = resolve(
            Dim::Matrix(4, 4),
            Selector::Range(2, 4),
            Some(Selector::All),
            IndexStyle::OneBased,
        )
        .unwrap();
        assert_eq!(r, IndexRegion::Rows(1, 3));
    }

    #[test]
    fn wildcard_row_single_and_range_columns_are_consistent() {
        let single = resolve(
            Dim::Matrix(3, 3),
            Selector::All,
            Some(Selector::Single(2)),
            IndexStyle::OneBased,
        )
        .unwrap();
        assert_eq!(single, IndexRegion::OneCol(1));
        let range = resolve(
            Dim::Matrix(3, 3),
            Selector::All,
            Some(Selector::Range(1, 2)),
            IndexStyle::OneBased,
        )
        .unwrap();
        assert_eq!(range, IndexRegion::Cols(0, 1));
    }

    #[test]
    fn degenerate_range_collapses_to_a_single_index() {
        let r = resolve(
            Dim::Matrix(3, 3),
            Selector::Range(2, 2),
            None,
            IndexStyle::OneBased,
        )
        .unwrap();
        assert_eq!(r, IndexRegion::OneRow(1));
        let r = resolve(
            Dim::Matrix(3, 3),
            Selector::Range(2, 2),
            Some(Selector::Single(1)),
            IndexStyle::OneBased,
        )
        .unwrap();
        assert_eq!(r, IndexRegion::OneElt(1, 0));
        let r = resolve(
            Dim::Row(5),
            Selector::Range(3, 3),
            None,
            IndexStyle::OneBased,
        )
        .unwrap();
        assert_eq!(r, IndexRegion::OneCol(2));
    }

    #[test]
    fn two_selectors_on_a_vector_address_components() {
        let r = resolve(
            Dim::Row(3),
            Selector::Single(1),
            Some(Selector::Single(2)),
            IndexStyle::OneBased,
        )
        .unwrap();
        assert_eq!(r, IndexRegion::OneCol(1));
        let r = resolve(
            Dim::Col(3),
            Selector::Single(2),
            Some(Selector::Single(1)),
            IndexStyle::OneBased,
        )
        .unwrap();
        assert_eq!(r, IndexRegion::OneCol(1));
        let r = resolve(
            Dim::Row(4),
            Selector::Single(1),
            Some(Selector::Range(2, 3)),
            IndexStyle::OneBased,
        )
        .unwrap();
        assert_eq!(r, IndexRegion::Cols(1, 2));
        let r = resolve(
            Dim::Row(4),
            Selector::Single(1),
            Some(Selector::All),
            IndexStyle::OneBased,
        )
        .unwrap();
        assert_eq!(r, IndexRegion::All);
        // The size-1 axis still bounds-checks.
        let err = resolve(
            Dim::Row(3),
            Selector::Single(2),
            Some(Selector::Single(1)),
            IndexStyle::OneBased,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Index { .. }));
    }

    #[test]
    fn empty_range_reports_source_indices() {
        let err = resolve(
            Dim::Row(5),
            Selector::Range(3, 2),
            None,
            IndexStyle::OneBased,
        )
        .unwrap_err();
        match err {
            CompileError::Index { message } => assert!(message.contains("3:2")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn scalar_target_is_a_shape_error() {
        let err = resolve(
            Dim::Scalar,
            Selector::Single(1),
            None,
            IndexStyle::OneBased,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Shape { .. }));
    }

    #[test]
    fn out_of_range_is_an_index_error() {
        let err = resolve(
            Dim::Row(3),
            Selector::Single(4),
            None,
            IndexStyle::OneBased,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Index { .. }));
        let err = resolve(
            Dim::Matrix(2, 2),
            Selector::Single(1),
            Some(Selector::Range(1, 3)),
            IndexStyle::OneBased,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Index { .. }));
    }
}
