//! Read accessors and column locking.
//!
//! `get_mu`/`get_r` trade the out-parameter shape of the external-interface
//! table for a plain `Result` return -- idiomatic for a Rust crate with no
//! FFI boundary to satisfy. A non-finite `mu` upstream of the requested
//! column is reported as `Ok(None)` rather than an error, mirroring
//! `update_gso_row`'s own `bool`-not-`Result` treatment of that condition.

use super::Gso;
use crate::error::{GsoError, PreconditionError};
use crate::scalar::{self, F};

impl Gso {
    fn combined_expo(&self, i: usize, j: usize) -> i64 {
        match &self.row_expo {
            Some(expo) if self.config.row_expo_enabled => expo[i] + expo[j],
            _ => 0,
        }
    }

    fn check_query_indices(&self, i: usize, j: usize) -> Result<(), GsoError> {
        if j > i {
            return Err(PreconditionError::IndexOrder { i, j }.into());
        }
        if i >= self.d() {
            return Err(PreconditionError::RowOutOfRange { index: i, d: self.d() }.into());
        }
        Ok(())
    }

    /// `mu(i,j)` for `j <= i < d`; the diagonal is the implicit `1` of the
    /// unit lower-triangular `mu`, never stored.
    pub fn get_mu(&mut self, i: usize, j: usize) -> Result<Option<F>, GsoError> {
        self.check_query_indices(i, j)?;
        if i == j {
            return Ok(Some(F::with_val(scalar::get_prec(), 1)));
        }
        if !self.update_gso_row(i, j)? {
            return Ok(None);
        }
        Ok(Some(self.mu.row(i)[j].clone()))
    }

    /// `r(i,j)` for `j <= i < d`.
    pub fn get_r(&mut self, i: usize, j: usize) -> Result<Option<F>, GsoError> {
        self.check_query_indices(i, j)?;
        if !self.update_gso_row(i, j)? {
            return Ok(None);
        }
        Ok(Some(self.r.row(i)[j].clone()))
    }

    /// `(mu(i,j), row_expo[i] + row_expo[j])` -- the true coefficient is
    /// `mu(i,j) * 2^expo`.
    pub fn get_mu_exp(&mut self, i: usize, j: usize) -> Result<Option<(F, i64)>, GsoError> {
        let expo = self.combined_expo(i, j);
        Ok(self.get_mu(i, j)?.map(|v| (v, expo)))
    }

    /// `(r(i,j), row_expo[i] + row_expo[j])`.
    pub fn get_r_exp(&mut self, i: usize, j: usize) -> Result<Option<(F, i64)>, GsoError> {
        let expo = self.combined_expo(i, j);
        Ok(self.get_r(i, j)?.map(|v| (v, expo)))
    }

    /// `max_{j in [0, n_cols)} exponent(mu(i,j)) + row_expo[i] + row_expo[j]`.
    pub fn get_max_mu_exp(&mut self, i: usize, n_cols: usize) -> Result<i64, GsoError> {
        let mut max_expo = i64::MIN;
        for j in 0..n_cols.min(i) {
            if let Some(mu) = self.get_mu(i, j)? {
                let e = scalar::exponent(&mu) + self.combined_expo(i, j);
                max_expo = max_expo.max(e);
            }
        }
        Ok(if max_expo == i64::MIN { 0 } else { max_expo })
    }

    /// Maximum diagonal of `g` (or `gf`) over known rows.
    pub fn get_max_gram(&mut self) -> F {
        let mut best = scalar::zero();
        let mut any = false;
        for i in 0..self.n_known_rows {
            let v = self.gram(i, i);
            if !any || v > best {
                best = v;
                any = true;
            }
        }
        best
    }

    /// Maximum diagonal of `r` (i.e. `max_i ||b*(i)||^2`) over known rows.
    pub fn get_max_bstar(&mut self) -> Result<F, GsoError> {
        let mut best = scalar::zero();
        let mut any = false;
        for i in 0..self.n_known_rows {
            if let Some(r_ii) = self.get_r(i, i)? {
                if !any || r_ii > best {
                    best = r_ii;
                    any = true;
                }
            }
        }
        Ok(best)
    }

    /// Freeze `n_known_cols`. Forbidden under `int_gram` or while already
    /// locked.
    pub fn lock_cols(&mut self) -> Result<(), GsoError> {
        if self.config.int_gram {
            return Err(PreconditionError::LockForbiddenUnderIntGram.into());
        }
        if self.cols_locked {
            return Err(PreconditionError::ColumnsLocked.into());
        }
        self.cols_locked = true;
        Ok(())
    }

    /// Release the freeze, discarding any rows discovered while locked:
    /// `n_known_rows` is restored to `n_source_rows`.
    pub fn unlock_cols(&mut self) -> Result<(), GsoError> {
        if !self.cols_locked {
            return Err(PreconditionError::ColumnsNotLocked.into());
        }
        self.cols_locked = false;
        self.n_known_rows = self.n_source_rows;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gso::GsoConfig;
    use crate::scalar::Z;

    fn z_rows(rows: &[&[i64]]) -> Vec<Vec<Z>> {
        rows.iter()
            .map(|row| row.iter().map(|&x| Z::from(x)).collect())
            .collect()
    }

    #[test]
    fn get_mu_diagonal_is_one() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[3, 1], &[1, 3]]), None, None, cfg).unwrap();
        let mu = gso.get_mu(1, 1).unwrap().unwrap();
        assert_eq!(mu.to_f64(), 1.0);
    }

    #[test]
    fn get_mu_and_r_scenario_3() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[3, 1], &[1, 3]]), None, None, cfg).unwrap();
        let mu = gso.get_mu(1, 0).unwrap().unwrap();
        let r = gso.get_r(1, 1).unwrap().unwrap();
        assert!((mu.to_f64() - 0.6).abs() < 1e-9);
        assert!((r.to_f64() - 6.4).abs() < 1e-9);
    }

    #[test]
    fn get_mu_rejects_j_greater_than_i() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[3, 1], &[1, 3]]), None, None, cfg).unwrap();
        let err = gso.get_mu(0, 1).unwrap_err();
        assert!(matches!(err, GsoError::Precondition(PreconditionError::IndexOrder { .. })));
    }

    #[test]
    fn get_mu_reports_none_on_non_finite_upstream() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[0, 0], &[1, 1]]), None, None, cfg).unwrap();
        assert!(gso.get_mu(1, 0).unwrap().is_none());
    }

    #[test]
    fn lock_cols_forbidden_under_int_gram() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[1]]), None, None, cfg).unwrap();
        let err = gso.lock_cols().unwrap_err();
        assert!(matches!(
            err,
            GsoError::Precondition(PreconditionError::LockForbiddenUnderIntGram)
        ));
    }

    #[test]
    fn lock_then_unlock_restores_n_known_rows() {
        let mut gso = Gso::new(z_rows(&[&[1, 0], &[0, 1], &[1, 1]]), None, None, GsoConfig::default()).unwrap();
        gso.discover_row(0);
        gso.lock_cols().unwrap();
        gso.discover_row(2);
        assert_eq!(gso.n_known_rows(), 3);
        gso.unlock_cols().unwrap();
        assert_eq!(gso.n_known_rows(), 1);
    }

    #[test]
    fn get_max_gram_picks_largest_diagonal() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[2, 0], &[0, 5]]), None, None, cfg).unwrap();
        gso.discover_row(1);
        let max = gso.get_max_gram();
        assert_eq!(max.to_f64(), 25.0);
    }

    #[test]
    fn get_max_bstar_brings_up_every_dependency_row_without_manual_priming() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso =
            Gso::new(z_rows(&[&[4, 0, 0], &[0, 3, 0], &[0, 0, 2]]), None, None, cfg).unwrap();
        gso.discover_row(2);
        // Before row 0 (and row 1) are explicitly validated via
        // `update_gso_row`, r(2,2) depends on r(0,0) and r(1,1) through the
        // recursion -- this must not divide by the placeholder zero left by
        // `discover_row`.
        let max = gso.get_max_bstar().unwrap();
        assert_eq!(max.to_f64(), 16.0);
    }
}
