//! Construction and row discovery.

use super::{Gso, GsoConfig};
use crate::error::{ConfigError, GsoError};
use crate::matrix::RowStore;
use crate::matrix::gram::GramStore;
use crate::scalar::{self, F, Z};
use crate::vector::IntRow;

impl Gso {
    /// Construct an engine over the given basis. `u`/`u_inv_t`, when
    /// provided, must have `config.transform_enabled`/`inv_transform_enabled`
    /// set and the same row count as `b`; when omitted but enabled, they
    /// default to the identity.
    ///
    /// `n_known_rows = 0` on return: every row is discovered lazily the
    /// first time it is queried or mutated (§4.2).
    pub fn new(
        b: Vec<Vec<Z>>,
        u: Option<Vec<Vec<Z>>>,
        u_inv_t: Option<Vec<Vec<Z>>>,
        config: GsoConfig,
    ) -> Result<Gso, GsoError> {
        if config.inv_transform_enabled && !config.transform_enabled {
            return Err(ConfigError::InvTransformRequiresTransform.into());
        }
        if config.int_gram && config.cols_locked {
            return Err(ConfigError::IntGramForbidsColumnLock.into());
        }

        let d = b.len();
        let n = b.first().map(|row| row.len()).unwrap_or(0);
        debug_assert!(b.iter().all(|row| row.len() == n));

        let init_row_size: Vec<usize> = b
            .iter()
            .map(|row| {
                let nz = row.iter().filter(|x| x.cmp0() != std::cmp::Ordering::Equal).count();
                nz.max(1).min(n)
            })
            .collect();

        let u = if config.transform_enabled {
            Some(RowStore::from(u.unwrap_or_else(|| identity(d))))
        } else {
            None
        };
        let u_inv_t = if config.inv_transform_enabled {
            Some(RowStore::from(u_inv_t.unwrap_or_else(|| identity(d))))
        } else {
            None
        };

        let bf = if !config.int_gram { Some(RowStore::new()) } else { None };
        let row_expo = if config.row_expo_enabled { Some(Vec::new()) } else { None };
        let g = if config.int_gram { Some(GramStore::new()) } else { None };
        let gf = if !config.int_gram { Some(GramStore::new()) } else { None };

        Ok(Gso {
            config,
            n,
            b: RowStore::from(b),
            u,
            u_inv_t,
            bf,
            row_expo,
            g,
            gf,
            mu: RowStore::new(),
            r: RowStore::new(),
            n_known_rows: 0,
            n_source_rows: 0,
            n_known_cols: 0,
            init_row_size,
            gso_valid_cols: vec![0; d],
            alloc_dim: d,
            cols_locked: config.cols_locked,
            row_op_window: None,
        })
    }

    /// Bring row `i` into known state if it is not already, establishing the
    /// GSO prefix `[0..i]`. No-op if `i < n_known_rows`.
    pub(crate) fn discover_row(&mut self, i: usize) {
        while self.n_known_rows <= i {
            let k = self.n_known_rows;
            self.mu.push_row(vec![scalar::zero(); k]);
            self.r.push_row(vec![scalar::zero(); k + 1]);

            if let Some(bf) = &mut self.bf {
                bf.push_row(vec![scalar::nan(); self.n]);
            }
            if let Some(row_expo) = &mut self.row_expo {
                row_expo.push(0);
            }
            if let Some(g) = &mut self.g {
                g.discover_row(Z::new());
                for j in 0..=k {
                    let dot = IntRow::from_vec(self.b.row(k).to_vec())
                        .dot(&IntRow::from_vec(self.b.row(j).to_vec()), self.n);
                    g.set(k, j, dot);
                }
            }
            if let Some(gf) = &mut self.gf {
                gf.discover_row(scalar::nan());
            }

            self.gso_valid_cols[k] = 0;
            self.n_known_rows += 1;
            if !self.cols_locked {
                self.n_source_rows = self.n_known_rows;
                self.n_known_cols = self.n_known_cols.max(self.init_row_size[k]).min(self.n);
            }
        }
    }

    /// Refresh `bf[i]` from `b[i]`. With `row_expo_enabled`, every column is
    /// converted via `to_float_with_exponent` and then renormalized to the
    /// row's maximum exponent; otherwise columns are converted directly.
    pub(crate) fn update_bf(&mut self, i: usize) {
        let Some(bf) = &mut self.bf else { return };
        let row = self.b.row(i);

        if let Some(row_expo) = &mut self.row_expo {
            let mut tmp_col_expo = vec![0i64; row.len()];
            let mut mantissas = vec![scalar::zero(); row.len()];
            let mut max_expo = 0i64;
            for (j, z) in row.iter().enumerate() {
                let (m, e) = scalar::to_float_with_exponent(z);
                tmp_col_expo[j] = e;
                mantissas[j] = m;
                max_expo = max_expo.max(e);
            }
            row_expo[i] = max_expo;
            let out = bf.row_mut(i);
            for j in 0..row.len() {
                out[j] = scalar::scale_2exp(&mantissas[j], tmp_col_expo[j] - max_expo);
            }
        } else {
            let out = bf.row_mut(i);
            for j in 0..row.len() {
                out[j] = F::with_val(scalar::get_prec(), &row[j]);
            }
        }
    }

    /// Grow every row-indexed container so that `d() >= new_d`, appending
    /// zero/empty placeholder rows. Used by `apply_transform`'s scratch
    /// rows; pointers into row interiors (slices returned by `row`/`row_mut`)
    /// are invalidated by this call, as documented in the resource model.
    ///
    /// `u`/`u_inv_t` are square (`d x d`): every existing row is widened to
    /// `new_d` columns before any new row is appended, so all rows stay the
    /// same width -- the row mutators index `u`/`u_inv_t` rows by their own
    /// length, which would otherwise go out of bounds against a
    /// newly-widened scratch row.
    pub(crate) fn size_increased(&mut self, new_d: usize) {
        if let Some(u) = &mut self.u {
            for i in 0..u.nrows() {
                u.row_mut(i).resize_with(new_d, Z::new);
            }
        }
        if let Some(u_inv_t) = &mut self.u_inv_t {
            for i in 0..u_inv_t.nrows() {
                u_inv_t.row_mut(i).resize_with(new_d, Z::new);
            }
        }
        while self.b.nrows() < new_d {
            self.b.push_row(vec![Z::new(); self.n]);
            if let Some(u) = &mut self.u {
                u.push_row(vec![Z::new(); new_d]);
            }
            if let Some(u_inv_t) = &mut self.u_inv_t {
                u_inv_t.push_row(vec![Z::new(); new_d]);
            }
            self.init_row_size.push(1);
            self.gso_valid_cols.push(0);
        }
        self.alloc_dim = self.alloc_dim.max(new_d);
    }
}

fn identity(d: usize) -> Vec<Vec<Z>> {
    (0..d)
        .map(|i| {
            (0..d)
                .map(|j| if i == j { Z::from(1) } else { Z::new() })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gso::GsoConfig;

    fn z_rows(rows: &[&[i64]]) -> Vec<Vec<Z>> {
        rows.iter()
            .map(|row| row.iter().map(|&x| Z::from(x)).collect())
            .collect()
    }

    #[test]
    fn construction_starts_with_no_known_rows() {
        let gso = Gso::new(z_rows(&[&[2, 0], &[0, 2]]), None, None, GsoConfig::default()).unwrap();
        assert_eq!(gso.n_known_rows(), 0);
        assert_eq!(gso.d(), 2);
        assert_eq!(gso.b_ncols(), 2);
    }

    #[test]
    fn config_validation_rejects_inv_transform_without_transform() {
        let cfg = GsoConfig { inv_transform_enabled: true, ..Default::default() };
        let err = Gso::new(z_rows(&[&[1]]), None, None, cfg).unwrap_err();
        assert!(matches!(err, GsoError::Config(ConfigError::InvTransformRequiresTransform)));
    }

    #[test]
    fn config_validation_rejects_int_gram_with_locked_cols() {
        let cfg = GsoConfig { int_gram: true, cols_locked: true, ..Default::default() };
        let err = Gso::new(z_rows(&[&[1]]), None, None, cfg).unwrap_err();
        assert!(matches!(err, GsoError::Config(ConfigError::IntGramForbidsColumnLock)));
    }

    #[test]
    fn discover_row_computes_exact_gram_under_int_gram() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[3, 1], &[1, 3]]), None, None, cfg).unwrap();
        gso.discover_row(1);
        let g = gso.g.as_ref().unwrap();
        assert_eq!(*g.get(0, 0), Z::from(10));
        assert_eq!(*g.get(1, 0), Z::from(6));
        assert_eq!(*g.get(1, 1), Z::from(10));
    }

    #[test]
    fn update_bf_with_row_expo_normalizes_to_row_max_exponent() {
        let cfg = GsoConfig { row_expo_enabled: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[1 << 60, 1 << 60]]), None, None, cfg).unwrap();
        gso.discover_row(0);
        gso.update_bf(0);
        let expo = gso.row_expo.as_ref().unwrap()[0];
        assert_eq!(expo, 61);
        let bf = gso.bf.as_ref().unwrap().row(0);
        for v in bf {
            assert!((v.to_f64() - 0.5).abs() < 1e-9);
        }
    }
}
