//! Derived metrics: thin functions on top of the engine (log-det, root-det,
//! current slope, slide potential, Gaussian heuristic), worked in `f64`
//! since they are reduction-driver heuristics rather than values the
//! engine's own invariants depend on.

use crate::error::{GsoError, PreconditionError};
use crate::gso::Gso;

const LN2: f64 = std::f64::consts::LN_2;

fn diag_log(gso: &mut Gso, i: usize) -> Result<f64, GsoError> {
    let (r, expo) = gso
        .get_r_exp(i, i)?
        .ok_or(GsoError::Precondition(PreconditionError::IndexOrder { i, j: i }))?;
    Ok(r.to_f64().ln() + expo as f64 * LN2)
}

impl Gso {
    /// `sum_{i in [s,e)} log(r(i,i))`, row exponents folded in.
    pub fn get_log_det(&mut self, s: usize, e: usize) -> Result<f64, GsoError> {
        if s >= e || e > self.d() {
            return Err(PreconditionError::EmptyRange { s, e }.into());
        }
        let mut acc = 0.0;
        for i in s..e {
            acc += diag_log(self, i)?;
        }
        Ok(acc)
    }

    /// `exp(get_log_det(s,e) / (e - s))`.
    pub fn get_root_det(&mut self, s: usize, e: usize) -> Result<f64, GsoError> {
        let log_det = self.get_log_det(s, e)?;
        Ok((log_det / (e - s) as f64).exp())
    }

    /// Least-squares slope of `log(r(i,i))` against `i` over `[s,e)`.
    pub fn get_current_slope(&mut self, s: usize, e: usize) -> Result<f64, GsoError> {
        if s >= e || e > self.d() {
            return Err(PreconditionError::EmptyRange { s, e }.into());
        }
        let n = (e - s) as f64;
        let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
        for i in s..e {
            let x = (i - s) as f64;
            let y = diag_log(self, i)?;
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_xx += x * x;
        }
        let denom = n * sum_xx - sum_x * sum_x;
        if denom == 0.0 {
            return Ok(0.0);
        }
        Ok((n * sum_xy - sum_x * sum_y) / denom)
    }

    /// `sum_{i=0}^{p-1} (p-i) * log_det(i*block, (i+1)*block)`, with
    /// `p = floor((e-s)/block)` decremented by one on an exact multiple.
    pub fn get_slide_potential(&mut self, s: usize, e: usize, block: usize) -> Result<f64, GsoError> {
        if block == 0 || s >= e || e > self.d() {
            return Err(PreconditionError::EmptyRange { s, e }.into());
        }
        let span = e - s;
        let mut p = span / block;
        if span % block == 0 {
            p = p.saturating_sub(1);
        }
        let mut acc = 0.0;
        for i in 0..p {
            let lo = s + i * block;
            let hi = s + (i + 1) * block;
            acc += (p - i) as f64 * self.get_log_det(lo, hi)?;
        }
        Ok(acc)
    }
}

/// `t = Gamma(block/2 + 1)^(2/block) / pi`; writes `t * root_det * 2^-max_dist_expo * factor`
/// into `*max_dist` if that is smaller than the current value.
pub fn gaussian_heuristic(max_dist: &mut f64, max_dist_expo: i64, block: usize, root_det: f64, factor: f64) {
    let half_plus_one = block as f64 / 2.0 + 1.0;
    let ln_t = (2.0 / block as f64) * ln_gamma(half_plus_one) - std::f64::consts::PI.ln();
    let t = ln_t.exp();
    let candidate = t * root_det * 2f64.powi(-max_dist_expo as i32) * factor;
    if candidate < *max_dist {
        *max_dist = candidate;
    }
}

/// Lanczos approximation of `ln(Gamma(x))` for `x > 0`.
fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_93,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_13,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        return (std::f64::consts::PI / (std::f64::consts::PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut acc = COEFFS[0];
    for (i, c) in COEFFS.iter().enumerate().skip(1) {
        acc += c / (x + i as f64);
    }
    let t = x + G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
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
    fn log_det_of_orthogonal_basis() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[2, 0], &[0, 2]]), None, None, cfg).unwrap();
        let log_det = gso.get_log_det(0, 2).unwrap();
        assert!((log_det - (4.0_f64.ln() * 2.0)).abs() < 1e-9);
    }

    #[test]
    fn root_det_of_orthogonal_basis() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[2, 0], &[0, 2]]), None, None, cfg).unwrap();
        let root_det = gso.get_root_det(0, 2).unwrap();
        assert!((root_det - 4.0).abs() < 1e-9);
    }

    #[test]
    fn current_slope_of_decreasing_norms_is_negative() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[8, 0, 0], &[0, 4, 0], &[0, 0, 2]]), None, None, cfg).unwrap();
        let slope = gso.get_current_slope(0, 3).unwrap();
        assert!(slope < 0.0);
    }

    #[test]
    fn slide_potential_matches_single_block_log_det() {
        let cfg = GsoConfig { int_gram: true, ..Default::default() };
        let mut gso = Gso::new(z_rows(&[&[2, 0], &[0, 2]]), None, None, cfg).unwrap();
        let potential = gso.get_slide_potential(0, 2, 2).unwrap();
        let log_det = gso.get_log_det(0, 2).unwrap();
        assert!((potential - log_det).abs() < 1e-9);
    }

    #[test]
    fn gaussian_heuristic_lowers_an_overestimate() {
        let mut max_dist = 1.0e9;
        gaussian_heuristic(&mut max_dist, 0, 10, 1.0, 1.0);
        assert!(max_dist < 1.0e9);
        assert!(max_dist > 0.0);
    }
}
