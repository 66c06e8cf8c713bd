//! Integer row vector: in-place `add`/`sub`/`addmul_*` over a prefix of
//! columns, used for both the basis rows and the transformation rows.
//!
//! Wraps raw numeric storage in a small struct with plain methods rather
//! than overloading operators.

use crate::scalar::Z;

#[derive(Debug, Clone, Default)]
pub struct IntRow(Vec<Z>);

impl IntRow {
    pub fn zeros(n: usize) -> Self {
        Self(vec![Z::new(); n])
    }

    pub fn from_vec(v: Vec<Z>) -> Self {
        Self(v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Z] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [Z] {
        &mut self.0
    }

    pub fn get(&self, j: usize) -> &Z {
        &self.0[j]
    }

    /// Grow (or shrink) to exactly `n` columns, zero-filling new columns.
    pub fn resize(&mut self, n: usize) {
        self.0.resize_with(n, Z::new);
    }

    /// Count of nonzero entries within the first `n_cols` columns.
    pub fn nz(&self, n_cols: usize) -> usize {
        let n = n_cols.min(self.0.len());
        self.0[..n].iter().filter(|x| x.cmp0() != std::cmp::Ordering::Equal).count()
    }

    /// `self[0..n_cols] += other[0..n_cols]`.
    pub fn add(&mut self, other: &IntRow, n_cols: usize) {
        for j in 0..n_cols {
            self.0[j] += &other.0[j];
        }
    }

    /// `self[0..n_cols] -= other[0..n_cols]`.
    pub fn sub(&mut self, other: &IntRow, n_cols: usize) {
        for j in 0..n_cols {
            self.0[j] -= &other.0[j];
        }
    }

    /// `self[0..n_cols] += x * other[0..n_cols]` for a small-integer scalar `x`.
    pub fn addmul_si(&mut self, other: &IntRow, x: i64, n_cols: usize) {
        for j in 0..n_cols {
            let term = Z::from(&other.0[j] * x);
            self.0[j] += term;
        }
    }

    /// `self[0..n_cols] += (x * 2^e) * other[0..n_cols]`.
    pub fn addmul_si_2exp(&mut self, other: &IntRow, x: i64, e: u32, n_cols: usize) {
        for j in 0..n_cols {
            let scaled = Z::from(&other.0[j] * x);
            let shifted = Z::from(scaled << e);
            self.0[j] += shifted;
        }
    }

    /// `self[0..n_cols] += (big * 2^e) * other[0..n_cols]`, for an
    /// arbitrary-precision multiplicand.
    pub fn addmul_2exp(&mut self, other: &IntRow, big: &Z, e: u32, n_cols: usize) {
        for j in 0..n_cols {
            let scaled = Z::from(big * &other.0[j]);
            let shifted = Z::from(scaled << e);
            self.0[j] += shifted;
        }
    }

    /// Exact dot product over the first `n_cols` columns.
    pub fn dot(&self, other: &IntRow, n_cols: usize) -> Z {
        let mut acc = Z::new();
        for j in 0..n_cols {
            acc += Z::from(&self.0[j] * &other.0[j]);
        }
        acc
    }
}
