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

//! Certified interval arithmetic and dimensioned values.
//!
//! This module is the numeric substrate the compiler folds constants with:
//! - [`Interval`]: closed interval with outward-rounded operations, so every
//!   result is guaranteed to contain the exact real result.
//! - [`Dim`]: scalar / row-vector / column-vector / matrix geometry.
//! - [`Domain`]: an interval value with a [`Dim`], supporting shape-checked
//!   linear-algebra operations and sub-region extraction.
//!
//! Shape mismatches are reported as [`DimError`] and never silently coerced.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

const TWO_PI: f64 = 2.0 * PI;

/// Dimension mismatch raised by shape-checked operations.
///
/// The compiler wraps these into structured `CompileError`s, preserving the
/// message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimError {
    /// Human-readable mismatch description.
    pub message: String,
}

impl DimError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn mismatch(op: &str, left: Dim, right: Dim) -> Self {
        Self::new(format!("cannot apply '{op}' to {left} and {right}"))
    }
}

impl fmt::Display for DimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DimError {}

// Outward rounding helpers. One ulp each way after a correctly-rounded (or
// faithfully-rounded libm) operation keeps the enclosure property.

fn round_lo(x: f64) -> f64 {
    if x.is_nan() {
        f64::NEG_INFINITY
    } else if x.is_finite() {
        x.next_down()
    } else {
        x
    }
}

fn round_hi(x: f64) -> f64 {
    if x.is_nan() {
        f64::INFINITY
    } else if x.is_finite() {
        x.next_up()
    } else {
        x
    }
}

// Endpoint product with the 0 * inf = 0 convention of interval arithmetic.
fn endpoint_mul(a: f64, b: f64) -> f64 {
    let p = a * b;
    if p.is_nan() {
        0.0
    } else {
        p
    }
}

fn sgn(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

// Does [lo, hi] contain offset + period*k for some integer k?
// The test is padded outward: claiming an extremum that is marginally outside
// only widens the result, which keeps the enclosure certified.
fn contains_periodic(lo: f64, hi: f64, offset: f64, period: f64) -> bool {
    let t1 = (lo - offset) / period;
    let t2 = (hi - offset) / period;
    (t1 - 1e-9).ceil() <= (t2 + 1e-9).floor()
}

/// A closed interval `[lo, hi]` over the extended reals.
///
/// The empty interval is represented by `lo > hi`. Every arithmetic
/// operation rounds outward, so the result always contains the exact image
/// of its operands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Lower bound (may be `-inf`).
    pub lo: f64,
    /// Upper bound (may be `+inf`).
    pub hi: f64,
}

impl Interval {
    /// The empty interval.
    pub const EMPTY: Interval = Interval {
        lo: f64::INFINITY,
        hi: f64::NEG_INFINITY,
    };

    /// The whole real line.
    pub const ALL: Interval = Interval {
        lo: f64::NEG_INFINITY,
        hi: f64::INFINITY,
    };

    /// Creates `[lo, hi]`; a reversed pair yields the empty interval.
    pub fn new(lo: f64, hi: f64) -> Self {
        if lo.is_nan() || hi.is_nan() || lo > hi {
            Self::EMPTY
        } else {
            Self { lo, hi }
        }
    }

    /// Creates the degenerate interval `[v, v]`.
    pub fn point(v: f64) -> Self {
        Self::new(v, v)
    }

    /// Returns whether this interval contains no value.
    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// Returns whether this interval is a single finite point.
    pub fn is_degenerate(&self) -> bool {
        self.lo == self.hi && self.lo.is_finite()
    }

    /// Returns the midpoint (the point itself when degenerate).
    pub fn mid(&self) -> f64 {
        if self.is_degenerate() {
            return self.lo;
        }
        if self.lo == f64::NEG_INFINITY && self.hi == f64::INFINITY {
            return 0.0;
        }
        if self.lo == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }
        if self.hi == f64::INFINITY {
            return f64::INFINITY;
        }
        0.5 * (self.lo + self.hi)
    }

    /// Returns whether `v` lies inside the interval.
    pub fn contains(&self, v: f64) -> bool {
        !self.is_empty() && self.lo <= v && v <= self.hi
    }

    /// Certified addition.
    pub fn add(self, other: Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        Self::new(round_lo(self.lo + other.lo), round_hi(self.hi + other.hi))
    }

    /// Certified subtraction.
    pub fn sub(self, other: Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        Self::new(round_lo(self.lo - other.hi), round_hi(self.hi - other.lo))
    }

    /// Exact negation.
    pub fn neg(self) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        Self::new(-self.hi, -self.lo)
    }

    /// Certified multiplication.
    pub fn mul(self, other: Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        let candidates = [
            endpoint_mul(self.lo, other.lo),
            endpoint_mul(self.lo, other.hi),
            endpoint_mul(self.hi, other.lo),
            endpoint_mul(self.hi, other.hi),
        ];
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for c in candidates {
            lo = lo.min(c);
            hi = hi.max(c);
        }
        Self::new(round_lo(lo), round_hi(hi))
    }

    /// Certified division. A divisor straddling zero yields the whole line;
    /// division by the degenerate zero yields the empty interval.
    pub fn div(self, other: Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        if other.lo == 0.0 && other.hi == 0.0 {
            return Self::EMPTY;
        }
        if other.contains(0.0) {
            return Self::ALL;
        }
        let candidates = [
            self.lo / other.lo,
            self.lo / other.hi,
            self.hi / other.lo,
            self.hi / other.hi,
        ];
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for c in candidates {
            if c.is_nan() {
                continue;
            }
            lo = lo.min(c);
            hi = hi.max(c);
        }
        Self::new(round_lo(lo), round_hi(hi))
    }

    /// Certified integer power. Even exponents account for a sign change
    /// inside the interval; negative exponents go through [`Interval::div`].
    pub fn pow_int(self, n: i32) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        if n == 0 {
            return Self::point(1.0);
        }
        if n < 0 {
            return Self::point(1.0).div(self.pow_int(-n));
        }
        if n % 2 == 1 {
            return Self::new(round_lo(self.lo.powi(n)), round_hi(self.hi.powi(n)));
        }
        // Even power: the image is driven by magnitudes.
        let a = self.lo.abs();
        let b = self.hi.abs();
        let hi = a.max(b).powi(n);
        let lo = if self.contains(0.0) {
            0.0
        } else {
            round_lo(a.min(b).powi(n))
        };
        Self::new(lo, round_hi(hi))
    }

    /// Certified real power `self^other`, computed as `exp(other * ln(self))`.
    pub fn pow(self, other: Self) -> Self {
        self.ln().mul(other).exp()
    }

    /// Exact absolute value.
    pub fn abs(self) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        if self.lo >= 0.0 {
            self
        } else if self.hi <= 0.0 {
            self.neg()
        } else {
            Self::new(0.0, (-self.lo).max(self.hi))
        }
    }

    /// Exact sign: `[-1, -1]`, `[1, 1]`, or a span through zero.
    pub fn sign(self) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        Self::new(sgn(self.lo), sgn(self.hi))
    }

    /// Certified square.
    pub fn sqr(self) -> Self {
        self.pow_int(2)
    }

    /// Certified square root; the negative part of the operand is discarded.
    pub fn sqrt(self) -> Self {
        if self.is_empty() || self.hi < 0.0 {
            return Self::EMPTY;
        }
        let lo = if self.lo <= 0.0 {
            0.0
        } else {
            round_lo(self.lo.sqrt()).max(0.0)
        };
        Self::new(lo, round_hi(self.hi.sqrt()))
    }

    /// Certified exponential.
    pub fn exp(self) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        let lo = round_lo(self.lo.exp()).max(0.0);
        Self::new(lo, round_hi(self.hi.exp()))
    }

    /// Certified natural logarithm; empty when the operand is non-positive.
    pub fn ln(self) -> Self {
        if self.is_empty() || self.hi <= 0.0 {
            return Self::EMPTY;
        }
        let lo = if self.lo <= 0.0 {
            f64::NEG_INFINITY
        } else {
            round_lo(self.lo.ln())
        };
        Self::new(lo, round_hi(self.hi.ln()))
    }

    /// Certified cosine.
    pub fn cos(self) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        if !self.lo.is_finite() || !self.hi.is_finite() || self.hi - self.lo >= TWO_PI {
            return Self::new(-1.0, 1.0);
        }
        let hi = if contains_periodic(self.lo, self.hi, 0.0, TWO_PI) {
            1.0
        } else {
            round_hi(self.lo.cos().max(self.hi.cos())).min(1.0)
        };
        let lo = if contains_periodic(self.lo, self.hi, PI, TWO_PI) {
            -1.0
        } else {
            round_lo(self.lo.cos().min(self.hi.cos())).max(-1.0)
        };
        Self::new(lo, hi)
    }

    /// Certified sine.
    pub fn sin(self) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        if !self.lo.is_finite() || !self.hi.is_finite() || self.hi - self.lo >= TWO_PI {
            return Self::new(-1.0, 1.0);
        }
        let hi = if contains_periodic(self.lo, self.hi, FRAC_PI_2, TWO_PI) {
            1.0
        } else {
            round_hi(self.lo.sin().max(self.hi.sin())).min(1.0)
        };
        let lo = if contains_periodic(self.lo, self.hi, -FRAC_PI_2, TWO_PI) {
            -1.0
        } else {
            round_lo(self.lo.sin().min(self.hi.sin())).max(-1.0)
        };
        Self::new(lo, hi)
    }

    /// Certified tangent; spans crossing an asymptote yield the whole line.
    pub fn tan(self) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        if !self.lo.is_finite()
            || !self.hi.is_finite()
            || self.hi - self.lo >= PI
            || contains_periodic(self.lo, self.hi, FRAC_PI_2, PI)
        {
            return Self::ALL;
        }
        Self::new(round_lo(self.lo.tan()), round_hi(self.hi.tan()))
    }

    /// Certified arc-cosine over the intersection with `[-1, 1]`.
    pub fn acos(self) -> Self {
        let t = self.intersect(Self::new(-1.0, 1.0));
        if t.is_empty() {
            return Self::EMPTY;
        }
        // Decreasing on its domain.
        Self::new(round_lo(t.hi.acos()).max(0.0), round_hi(t.lo.acos()))
    }

    /// Certified arc-sine over the intersection with `[-1, 1]`.
    pub fn asin(self) -> Self {
        let t = self.intersect(Self::new(-1.0, 1.0));
        if t.is_empty() {
            return Self::EMPTY;
        }
        Self::new(round_lo(t.lo.asin()), round_hi(t.hi.asin()))
    }

    /// Certified arc-tangent.
    pub fn atan(self) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        Self::new(round_lo(self.lo.atan()), round_hi(self.hi.atan()))
    }

    /// Certified two-argument arc-tangent of `self` (as `y`) and `x`.
    ///
    /// Outside the right half-plane the result falls back to the full
    /// `[-pi, pi]` range, which is always an enclosure.
    pub fn atan2(self, x: Self) -> Self {
        if self.is_empty() || x.is_empty() {
            return Self::EMPTY;
        }
        if x.lo <= 0.0 {
            return Self::new(round_lo(-PI), round_hi(PI));
        }
        // For x > 0 the function is monotone in each argument, so corner
        // evaluation is exact up to rounding.
        let corners = [
            self.lo.atan2(x.lo),
            self.lo.atan2(x.hi),
            self.hi.atan2(x.lo),
            self.hi.atan2(x.hi),
        ];
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for c in corners {
            lo = lo.min(c);
            hi = hi.max(c);
        }
        Self::new(round_lo(lo), round_hi(hi))
    }

    /// Certified hyperbolic cosine.
    pub fn cosh(self) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        let a = self.lo.abs();
        let b = self.hi.abs();
        let lo = if self.contains(0.0) {
            1.0
        } else {
            round_lo(a.min(b).cosh()).max(1.0)
        };
        Self::new(lo, round_hi(a.max(b).cosh()))
    }

    /// Certified hyperbolic sine.
    pub fn sinh(self) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        Self::new(round_lo(self.lo.sinh()), round_hi(self.hi.sinh()))
    }

    /// Certified hyperbolic tangent.
    pub fn tanh(self) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        Self::new(
            round_lo(self.lo.tanh()).max(-1.0),
            round_hi(self.hi.tanh()).min(1.0),
        )
    }

    /// Certified inverse hyperbolic cosine over the intersection with
    /// `[1, +inf)`.
    pub fn acosh(self) -> Self {
        let t = self.intersect(Self::new(1.0, f64::INFINITY));
        if t.is_empty() {
            return Self::EMPTY;
        }
        let lo = if t.lo <= 1.0 {
            0.0
        } else {
            round_lo(t.lo.acosh()).max(0.0)
        };
        Self::new(lo, round_hi(t.hi.acosh()))
    }

    /// Certified inverse hyperbolic sine.
    pub fn asinh(self) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        Self::new(round_lo(self.lo.asinh()), round_hi(self.hi.asinh()))
    }

    /// Certified inverse hyperbolic tangent over the intersection with
    /// `(-1, 1)`.
    pub fn atanh(self) -> Self {
        let t = self.intersect(Self::new(-1.0, 1.0));
        if t.is_empty() {
            return Self::EMPTY;
        }
        let lo = if t.lo <= -1.0 {
            f64::NEG_INFINITY
        } else {
            round_lo(t.lo.atanh())
        };
        let hi = if t.hi >= 1.0 {
            f64::INFINITY
        } else {
            round_hi(t.hi.atanh())
        };
        Self::new(lo, hi)
    }

    /// Exact pairwise minimum.
    pub fn min(self, other: Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        Self::new(self.lo.min(other.lo), self.hi.min(other.hi))
    }

    /// Exact pairwise maximum.
    pub fn max(self, other: Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        Self::new(self.lo.max(other.lo), self.hi.max(other.hi))
    }

    /// Exact intersection.
    pub fn intersect(self, other: Self) -> Self {
        Self::new(self.lo.max(other.lo), self.hi.min(other.hi))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "[empty]")
        } else {
            write!(f, "[{}, {}]", self.lo, self.hi)
        }
    }
}

/// Value geometry: scalar, vector (with orientation), or matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    /// A single value.
    Scalar,
    /// A row vector of the given length.
    Row(usize),
    /// A column vector of the given length.
    Col(usize),
    /// A matrix with the given row and column counts.
    Matrix(usize, usize),
}

impl Dim {
    /// Returns whether the dimension is scalar.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Dim::Scalar)
    }

    /// Returns whether the dimension is a (row or column) vector.
    pub fn is_vector(&self) -> bool {
        matches!(self, Dim::Row(_) | Dim::Col(_))
    }

    /// Returns whether the dimension is a matrix.
    pub fn is_matrix(&self) -> bool {
        matches!(self, Dim::Matrix(_, _))
    }

    /// Number of rows when laid out as a matrix (vectors count as 1 x n or
    /// n x 1).
    pub fn nb_rows(&self) -> usize {
        match self {
            Dim::Scalar => 1,
            Dim::Row(_) => 1,
            Dim::Col(n) => *n,
            Dim::Matrix(r, _) => *r,
        }
    }

    /// Number of columns when laid out as a matrix.
    pub fn nb_cols(&self) -> usize {
        match self {
            Dim::Scalar => 1,
            Dim::Row(n) => *n,
            Dim::Col(_) => 1,
            Dim::Matrix(_, c) => *c,
        }
    }

    /// Total number of scalar components.
    pub fn size(&self) -> usize {
        self.nb_rows() * self.nb_cols()
    }

    /// Dimension of `self + other` / `self - other`.
    pub fn add(self, other: Dim) -> Result<Dim, DimError> {
        if self == other {
            Ok(self)
        } else {
            Err(DimError::mismatch("+/-", self, other))
        }
    }

    /// Dimension of `self * other` under linear-algebra rules.
    pub fn mul(self, other: Dim) -> Result<Dim, DimError> {
        match (self, other) {
            (Dim::Scalar, d) | (d, Dim::Scalar) => Ok(d),
            (Dim::Row(n), Dim::Col(m)) if n == m => Ok(Dim::Scalar),
            (Dim::Col(n), Dim::Row(m)) => Ok(Dim::Matrix(n, m)),
            (Dim::Matrix(r, k), Dim::Matrix(k2, c)) if k == k2 => Ok(Dim::Matrix(r, c)),
            (Dim::Matrix(r, k), Dim::Col(k2)) if k == k2 => Ok(Dim::Col(r)),
            (Dim::Row(k), Dim::Matrix(k2, c)) if k == k2 => Ok(Dim::Row(c)),
            _ => Err(DimError::mismatch("*", self, other)),
        }
    }

    /// Dimension of `self / other` (component-wise by a scalar divisor).
    pub fn div(self, other: Dim) -> Result<Dim, DimError> {
        if other.is_scalar() {
            Ok(self)
        } else {
            Err(DimError::mismatch("/", self, other))
        }
    }

    /// Dimension of the transpose.
    pub fn transposed(self) -> Dim {
        match self {
            Dim::Scalar => Dim::Scalar,
            Dim::Row(n) => Dim::Col(n),
            Dim::Col(n) => Dim::Row(n),
            Dim::Matrix(r, c) => Dim::Matrix(c, r),
        }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Scalar => write!(f, "scalar"),
            Dim::Row(n) => write!(f, "row vector of {n}"),
            Dim::Col(n) => write!(f, "column vector of {n}"),
            Dim::Matrix(r, c) => write!(f, "{r}x{c} matrix"),
        }
    }
}

/// A resolved sub-region of a value, produced by the index resolver.
///
/// Row/column coordinates are 0-based and inclusive. Against a bare vector,
/// the column forms address components directly (a vector is treated as one
/// row of columns, whatever its orientation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexRegion {
    /// The whole value.
    All,
    /// One matrix row.
    OneRow(usize),
    /// One matrix column, or one vector component.
    OneCol(usize),
    /// An inclusive range of matrix rows.
    Rows(usize, usize),
    /// An inclusive range of matrix columns, or a vector slice.
    Cols(usize, usize),
    /// A single matrix element.
    OneElt(usize, usize),
    /// A column slice of one matrix row.
    SubRow {
        /// Selected row.
        row: usize,
        /// First selected column.
        c1: usize,
        /// Last selected column.
        c2: usize,
    },
    /// A row slice of one matrix column.
    SubCol {
        /// First selected row.
        r1: usize,
        /// Last selected row.
        r2: usize,
        /// Selected column.
        col: usize,
    },
    /// A rectangular sub-block.
    SubMatrix {
        /// First selected row.
        r1: usize,
        /// Last selected row.
        r2: usize,
        /// First selected column.
        c1: usize,
        /// Last selected column.
        c2: usize,
    },
}

impl IndexRegion {
    /// Dimension of the extracted region when applied to `target`.
    pub fn result_dim(&self, target: Dim) -> Result<Dim, DimError> {
        let bad = || {
            DimError::new(format!(
                "index form {self:?} does not apply to a {target}"
            ))
        };
        match (*self, target) {
            (IndexRegion::All, d) => Ok(d),
            (IndexRegion::OneRow(_), Dim::Matrix(_, c)) => Ok(Dim::Row(c)),
            (IndexRegion::OneCol(_), Dim::Matrix(r, _)) => Ok(Dim::Col(r)),
            (IndexRegion::OneCol(_), Dim::Row(_) | Dim::Col(_)) => Ok(Dim::Scalar),
            (IndexRegion::Rows(a, b), Dim::Matrix(_, c)) => Ok(Dim::Matrix(b - a + 1, c)),
            (IndexRegion::Cols(a, b), Dim::Matrix(r, _)) => Ok(Dim::Matrix(r, b - a + 1)),
            (IndexRegion::Cols(a, b), Dim::Row(_)) => Ok(Dim::Row(b - a + 1)),
            (IndexRegion::Cols(a, b), Dim::Col(_)) => Ok(Dim::Col(b - a + 1)),
            (IndexRegion::OneElt(_, _), Dim::Matrix(_, _)) => Ok(Dim::Scalar),
            (IndexRegion::SubRow { c1, c2, .. }, Dim::Matrix(_, _)) => Ok(Dim::Row(c2 - c1 + 1)),
            (IndexRegion::SubCol { r1, r2, .. }, Dim::Matrix(_, _)) => Ok(Dim::Col(r2 - r1 + 1)),
            (IndexRegion::SubMatrix { r1, r2, c1, c2 }, Dim::Matrix(_, _)) => {
                Ok(Dim::Matrix(r2 - r1 + 1, c2 - c1 + 1))
            }
            _ => Err(bad()),
        }
    }

    // Matrix-coordinate extents (inclusive) against a target laid out as
    // nb_rows x nb_cols. Vector targets fold the component axis.
    fn extents(&self, target: Dim) -> Result<(usize, usize, usize, usize), DimError> {
        let rows = target.nb_rows();
        let cols = target.nb_cols();
        let vector_axis = |i: usize, j: usize| -> (usize, usize, usize, usize) {
            match target {
                Dim::Col(_) => (i, j, 0, 0),
                _ => (0, 0, i, j),
            }
        };
        let e = match (*self, target) {
            (IndexRegion::All, _) => (0, rows - 1, 0, cols - 1),
            (IndexRegion::OneRow(r), Dim::Matrix(_, _)) => (r, r, 0, cols - 1),
            (IndexRegion::OneCol(c), Dim::Matrix(_, _)) => (0, rows - 1, c, c),
            (IndexRegion::OneCol(c), Dim::Row(_) | Dim::Col(_)) => vector_axis(c, c),
            (IndexRegion::Rows(a, b), Dim::Matrix(_, _)) => (a, b, 0, cols - 1),
            (IndexRegion::Cols(a, b), Dim::Matrix(_, _)) => (0, rows - 1, a, b),
            (IndexRegion::Cols(a, b), Dim::Row(_) | Dim::Col(_)) => vector_axis(a, b),
            (IndexRegion::OneElt(r, c), Dim::Matrix(_, _)) => (r, r, c, c),
            (IndexRegion::SubRow { row, c1, c2 }, Dim::Matrix(_, _)) => (row, row, c1, c2),
            (IndexRegion::SubCol { r1, r2, col }, Dim::Matrix(_, _)) => (r1, r2, col, col),
            (IndexRegion::SubMatrix { r1, r2, c1, c2 }, Dim::Matrix(_, _)) => (r1, r2, c1, c2),
            _ => {
                return Err(DimError::new(format!(
                    "index form {self:?} does not apply to a {target}"
                )))
            }
        };
        Ok(e)
    }
}

/// A dimensioned interval value: a [`Dim`] plus row-major components.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    dim: Dim,
    comps: Vec<Interval>,
}

impl Domain {
    /// Creates a scalar value.
    pub fn scalar(v: Interval) -> Self {
        Self {
            dim: Dim::Scalar,
            comps: vec![v],
        }
    }

    /// Creates the degenerate scalar `[v, v]`.
    pub fn point(v: f64) -> Self {
        Self::scalar(Interval::point(v))
    }

    /// Creates a value with explicit geometry; `comps` is row-major and must
    /// match `dim.size()`.
    pub fn with_dim(dim: Dim, comps: Vec<Interval>) -> Result<Self, DimError> {
        if comps.len() != dim.size() {
            return Err(DimError::new(format!(
                "{} components provided for a {dim}",
                comps.len()
            )));
        }
        Ok(Self { dim, comps })
    }

    /// Assembles a vector (or matrix) from parts, mirroring the textual
    /// `(a, b, c)` / `(a; b; c)` constructors:
    /// - scalars side by side form a vector;
    /// - same-orientation vectors concatenate;
    /// - a row of column vectors / a column of row vectors forms a matrix.
    pub fn vector(items: &[Domain], row: bool) -> Result<Self, DimError> {
        if items.is_empty() {
            return Err(DimError::new("empty vector constructor"));
        }
        if items.iter().all(|d| d.dim.is_scalar()) {
            let comps: Vec<Interval> = items.iter().map(|d| d.comps[0]).collect();
            let n = comps.len();
            return Ok(Self {
                dim: if row { Dim::Row(n) } else { Dim::Col(n) },
                comps,
            });
        }
        if row && items.iter().all(|d| matches!(d.dim, Dim::Row(_))) {
            let comps: Vec<Interval> = items.iter().flat_map(|d| d.comps.iter().copied()).collect();
            let n = comps.len();
            return Ok(Self {
                dim: Dim::Row(n),
                comps,
            });
        }
        if !row && items.iter().all(|d| matches!(d.dim, Dim::Col(_))) {
            let comps: Vec<Interval> = items.iter().flat_map(|d| d.comps.iter().copied()).collect();
            let n = comps.len();
            return Ok(Self {
                dim: Dim::Col(n),
                comps,
            });
        }
        if row {
            // Row of column vectors: columns side by side.
            let rows = match items[0].dim {
                Dim::Col(n) => n,
                _ => return Err(DimError::new("row constructor expects scalars or columns")),
            };
            for d in items {
                if d.dim != Dim::Col(rows) {
                    return Err(DimError::mismatch("row constructor", items[0].dim, d.dim));
                }
            }
            let cols = items.len();
            let mut comps = vec![Interval::point(0.0); rows * cols];
            for (c, d) in items.iter().enumerate() {
                for r in 0..rows {
                    comps[r * cols + c] = d.comps[r];
                }
            }
            Ok(Self {
                dim: Dim::Matrix(rows, cols),
                comps,
            })
        } else {
            // Column of row vectors: stacked rows.
            let cols = match items[0].dim {
                Dim::Row(n) => n,
                _ => return Err(DimError::new("column constructor expects scalars or rows")),
            };
            for d in items {
                if d.dim != Dim::Row(cols) {
                    return Err(DimError::mismatch(
                        "column constructor",
                        items[0].dim,
                        d.dim,
                    ));
                }
            }
            let comps: Vec<Interval> = items.iter().flat_map(|d| d.comps.iter().copied()).collect();
            Ok(Self {
                dim: Dim::Matrix(items.len(), cols),
                comps,
            })
        }
    }

    /// Returns the geometry of this value.
    pub fn dim(&self) -> Dim {
        self.dim
    }

    /// Returns the row-major components.
    pub fn components(&self) -> &[Interval] {
        &self.comps
    }

    /// Extracts the interval of a scalar value.
    pub fn as_scalar(&self) -> Result<Interval, DimError> {
        if self.dim.is_scalar() {
            Ok(self.comps[0])
        } else {
            Err(DimError::new(format!("expected a scalar, got a {}", self.dim)))
        }
    }

    /// Returns whether any component is the empty interval.
    pub fn has_empty(&self) -> bool {
        self.comps.iter().any(Interval::is_empty)
    }

    fn at(&self, r: usize, c: usize) -> Interval {
        self.comps[r * self.dim.nb_cols() + c]
    }

    /// Component-wise certified addition.
    pub fn add(&self, other: &Domain) -> Result<Domain, DimError> {
        let dim = self.dim.add(other.dim)?;
        let comps = self
            .comps
            .iter()
            .zip(&other.comps)
            .map(|(a, b)| a.add(*b))
            .collect();
        Ok(Domain { dim, comps })
    }

    /// Component-wise certified subtraction.
    pub fn sub(&self, other: &Domain) -> Result<Domain, DimError> {
        let dim = self.dim.add(other.dim)?;
        let comps = self
            .comps
            .iter()
            .zip(&other.comps)
            .map(|(a, b)| a.sub(*b))
            .collect();
        Ok(Domain { dim, comps })
    }

    /// Component-wise exact negation.
    pub fn neg(&self) -> Domain {
        Domain {
            dim: self.dim,
            comps: self.comps.iter().map(|v| v.neg()).collect(),
        }
    }

    /// Certified multiplication under linear-algebra rules.
    pub fn mul(&self, other: &Domain) -> Result<Domain, DimError> {
        let dim = self.dim.mul(other.dim)?;
        // Scalar scaling short-circuits the inner-product loop.
        if self.dim.is_scalar() {
            let s = self.comps[0];
            return Ok(Domain {
                dim,
                comps: other.comps.iter().map(|v| s.mul(*v)).collect(),
            });
        }
        if other.dim.is_scalar() {
            let s = other.comps[0];
            return Ok(Domain {
                dim,
                comps: self.comps.iter().map(|v| v.mul(s)).collect(),
            });
        }
        // General case: lay both sides out as matrices and inner-product.
        let n = self.dim.nb_cols();
        debug_assert_eq!(n, other.dim.nb_rows());
        let rows = dim.nb_rows();
        let cols = dim.nb_cols();
        let mut comps = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let mut acc = Interval::point(0.0);
                for k in 0..n {
                    acc = acc.add(self.at(r, k).mul(other.at(k, c)));
                }
                comps.push(acc);
            }
        }
        Ok(Domain { dim, comps })
    }

    /// Certified division by a scalar divisor.
    pub fn div(&self, other: &Domain) -> Result<Domain, DimError> {
        let dim = self.dim.div(other.dim)?;
        let d = other.comps[0];
        Ok(Domain {
            dim,
            comps: self.comps.iter().map(|v| v.div(d)).collect(),
        })
    }

    /// Exact transpose.
    pub fn transposed(&self) -> Domain {
        let dim = self.dim.transposed();
        match self.dim {
            Dim::Scalar | Dim::Row(_) | Dim::Col(_) => Domain {
                dim,
                comps: self.comps.clone(),
            },
            Dim::Matrix(rows, cols) => {
                let mut comps = Vec::with_capacity(rows * cols);
                for c in 0..cols {
                    for r in 0..rows {
                        comps.push(self.at(r, c));
                    }
                }
                Domain { dim, comps }
            }
        }
    }

    /// Extracts the sub-region described by `region`.
    pub fn index(&self, region: IndexRegion) -> Result<Domain, DimError> {
        let dim = region.result_dim(self.dim)?;
        let (r1, r2, c1, c2) = region.extents(self.dim)?;
        let mut comps = Vec::with_capacity(dim.size());
        for r in r1..=r2 {
            for c in c1..=c2 {
                comps.push(self.at(r, c));
            }
        }
        Ok(Domain { dim, comps })
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dim {
            Dim::Scalar => write!(f, "{}", self.comps[0]),
            Dim::Row(_) => {
                write!(f, "(")?;
                for (i, v) in self.comps.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
            Dim::Col(_) => {
                write!(f, "(")?;
                for (i, v) in self.comps.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
            Dim::Matrix(rows, cols) => {
                write!(f, "(")?;
                for r in 0..rows {
                    if r > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "(")?;
                    for c in 0..cols {
                        if c > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", self.at(r, c))?;
                    }
                    write!(f, ")")?;
                }
                write!(f, ")")
            }
        }
    }
}
