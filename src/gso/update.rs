//! Lazy triangular extension: `update_gso_row` brings `mu(i,·)`/`r(i,·)` up
//! to date for a requested column range, following the standard
//! Cholesky-like recursion described in the rationale (§4.3): `r(i,j)`
//! accumulates the non-normalized dot product, `mu(i,j)` normalizes by the
//! already-computed `r(j,j)`.

use super::Gso;
use crate::error::{GsoError, PreconditionError};
use crate::scalar::{self, F};

impl Gso {
    /// Bring `mu(i, 0..=last_j)` (for `j < i`) and `r(i, 0..=last_j)` up to
    /// date. Triggers `discover_row(i)` if needed. Returns `Ok(false)`
    /// (rather than an error) if a non-finite `mu` is produced -- per the
    /// error design, that condition is reported as the µ-validity signal,
    /// not a `GsoError`.
    pub fn update_gso_row(&mut self, i: usize, last_j: usize) -> Result<bool, GsoError> {
        if i >= self.alloc_dim.max(self.b.nrows()) {
            return Err(PreconditionError::RowOutOfRange { index: i, d: self.d() }.into());
        }
        if i >= self.n_known_rows {
            self.discover_row(i);
        }
        if last_j >= self.n_source_rows {
            return Err(PreconditionError::LastJOutOfRange {
                last_j,
                n_source_rows: self.n_source_rows,
            }
            .into());
        }

        let mut j = self.gso_valid_cols[i];
        while j <= last_j {
            if j < i && self.gso_valid_cols[j] <= j {
                // Dividing by r(j,j) below, and reading mu(j, 0..j) in the
                // loop just under this, both require row j to be valid
                // through its own diagonal. Bring it up first instead of
                // refusing -- the caller only asked about row i.
                if !self.update_gso_row(j, j)? {
                    self.gso_valid_cols[i] = j;
                    return Ok(false);
                }
            }

            let mut t = self.gram(i, j);
            for k in 0..j {
                let term = F::from(&self.mu.row(j)[k] * &self.r.row(i)[k]);
                t -= term;
            }
            self.r.row_mut(i)[j] = t.clone();

            if i > j {
                let r_jj = self.r.row(j)[j].clone();
                let mu_ij = F::from(&t / &r_jj);
                if !mu_ij.is_finite() {
                    self.gso_valid_cols[i] = j;
                    return Ok(false);
                }
                self.mu.row_mut(i)[j] = mu_ij;
            }

            j += 1;
        }

        self.gso_valid_cols[i] = last_j + 1;
        Ok(true)
    }

    /// `gram(i,j)`: exact via `g` when `int_gram`, else from `gf`,
    /// recomputing from `bf` (and caching back into `gf`) if the NaN
    /// sentinel is present.
    pub(crate) fn gram(&mut self, i: usize, j: usize) -> F {
        if let Some(g) = &self.g {
            return F::with_val(scalar::get_prec(), g.get(i, j));
        }

        let cached = self.gf.as_ref().unwrap().get(i, j).clone();
        if !cached.is_nan() {
            return cached;
        }

        let bf = self.bf.as_ref().expect("gf requires bf");
        let n = self.n;
        let mut acc = scalar::zero();
        for col in 0..n {
            let term = F::from(&bf.row(i)[col] * &bf.row(j)[col]);
            acc += term;
        }
        self.gf.as_mut().unwrap().set(i, j, acc.clone());
        acc
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

    fn approx_eq(a: &F, b: f64) -> bool {
        (a.to_f64() - b).abs() < 1e-9
    }

    #[test]
    fn scenario_1_orthogonal_basis() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[2, 0], &[0, 2]]), None, None, cfg).unwrap();
        assert!(gso.update_gso_row(1, 1).unwrap());
        assert!(approx_eq(&gso.r.row(0)[0], 4.0));
        assert!(approx_eq(&gso.r.row(1)[1], 4.0));
        assert!(approx_eq(&gso.mu.row(1)[0], 0.0));
        assert_eq!(gso.gso_valid_cols, vec![1, 2]);
    }

    #[test]
    fn scenario_3_nontrivial_mu_and_r() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[3, 1], &[1, 3]]), None, None, cfg).unwrap();
        assert!(gso.update_gso_row(1, 1).unwrap());
        let g = gso.g.as_ref().unwrap();
        assert_eq!(*g.get(0, 0), crate::scalar::Z::from(10));
        assert_eq!(*g.get(1, 0), crate::scalar::Z::from(6));
        assert_eq!(*g.get(1, 1), crate::scalar::Z::from(10));
        assert!(approx_eq(&gso.mu.row(1)[0], 0.6));
        assert!(approx_eq(&gso.r.row(1)[1], 6.4));
    }

    #[test]
    fn boundary_update_gso_row_zero_zero() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[5, 0], &[0, 1]]), None, None, cfg).unwrap();
        assert!(gso.update_gso_row(0, 0).unwrap());
        assert!(approx_eq(&gso.r.row(0)[0], 25.0));
        assert_eq!(gso.gso_valid_cols[0], 1);
    }

    #[test]
    fn update_gso_row_is_idempotent() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[3, 1], &[1, 3]]), None, None, cfg).unwrap();
        gso.update_gso_row(1, 1).unwrap();
        let mu_before = gso.mu.row(1)[0].clone();
        let r_before = gso.r.row(1)[1].clone();
        gso.update_gso_row(1, 1).unwrap();
        assert_eq!(gso.mu.row(1)[0], mu_before);
        assert_eq!(gso.r.row(1)[1], r_before);
    }

    #[test]
    fn update_gso_row_reports_non_finite_mu_on_zero_norm() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        // row 0 is the zero vector: r(0,0) = 0, so mu(1,0) = t/0 is non-finite.
        let mut gso = Gso::new(z_rows(&[&[0, 0], &[1, 1]]), None, None, cfg).unwrap();
        let ok = gso.update_gso_row(1, 1).unwrap();
        assert!(!ok);
        assert_eq!(gso.gso_valid_cols[1], 0);
    }
}
