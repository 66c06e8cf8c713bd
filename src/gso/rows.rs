//! Row mutators: `row_add`/`row_sub`/`row_addmul_*`/`row_swap`/`move_row`,
//! bracketed by `row_op_begin`/`row_op_end` so the engine can batch the
//! `update_bf` refresh and GSO invalidation once per window (§4.4, §9).

use super::Gso;
use crate::error::{GsoError, PreconditionError};
use crate::scalar::{self, F, Z};
use std::cmp::Ordering;

impl Gso {
    fn check_row_index(&self, i: usize) -> Result<(), GsoError> {
        if i >= self.d() {
            return Err(PreconditionError::RowOutOfRange { index: i, d: self.d() }.into());
        }
        Ok(())
    }

    /// Debug builds reject mutation outside a `row_op_begin`/`row_op_end`
    /// bracket, per the resource model.
    fn require_bracket(&self) -> Result<(), GsoError> {
        if cfg!(debug_assertions) && self.row_op_window.is_none() {
            return Err(PreconditionError::UnbracketedMutation.into());
        }
        Ok(())
    }

    fn ensure_discovered(&mut self, i: usize) {
        if i >= self.n_known_rows {
            self.discover_row(i);
        }
    }

    /// Force the GSO validity of every known row at or after `first` down to
    /// at most `first` -- the same "downstream rows lose validity for the
    /// modified prefix only" rule `row_op_end` applies.
    fn invalidate_suffix_from(&mut self, first: usize) {
        for k in first..self.n_known_rows {
            self.gso_valid_cols[k] = self.gso_valid_cols[k].min(first);
        }
    }

    /// NaN out every `gf` entry that references row `idx` (its own row, and
    /// the column-`idx` entry of every later row).
    fn invalidate_gf_row(&mut self, idx: usize) {
        if let Some(gf) = &mut self.gf {
            for k in 0..=idx {
                gf.set(idx, k, scalar::nan());
            }
            for later in (idx + 1)..self.n_known_rows {
                gf.set(later, idx, scalar::nan());
            }
        }
    }

    /// Rebuild `mu`/`r` row lengths to match `mu[i].len() == i`,
    /// `r[i].len() == i + 1` for `i` in `[0, n_known_rows)`, zero-filling.
    /// Used after `move_row`, whose permutation can leave a jagged row at
    /// the wrong length for its new index; the content doesn't need to
    /// survive the move (it is invalidated by the same operation).
    fn resize_triangular_rows(&mut self) {
        let n = self.n_known_rows;
        while self.mu.nrows() > n {
            self.mu.pop_row();
        }
        while self.r.nrows() > n {
            self.r.pop_row();
        }
        while self.mu.nrows() < n {
            let k = self.mu.nrows();
            self.mu.push_row(vec![scalar::zero(); k]);
        }
        while self.r.nrows() < n {
            let k = self.r.nrows();
            self.r.push_row(vec![scalar::zero(); k + 1]);
        }
        for i in 0..n {
            if self.mu.row(i).len() != i {
                *self.mu.row_mut(i) = vec![scalar::zero(); i];
            }
            if self.r.row(i).len() != i + 1 {
                *self.r.row_mut(i) = vec![scalar::zero(); i + 1];
            }
        }
    }

    /// Open a row-mutation window. Debug builds reject opening a second
    /// window before the first is closed.
    pub fn row_op_begin(&mut self, first: usize, last: usize) -> Result<(), GsoError> {
        if cfg!(debug_assertions) && self.row_op_window.is_some() {
            return Err(PreconditionError::UnbalancedRowOpBracket { first, last }.into());
        }
        self.row_op_window = Some((first, last));
        Ok(())
    }

    /// Close the window opened by a matching `row_op_begin`: refresh `bf`
    /// and invalidate `gf` for every touched row, then clip the GSO
    /// validity of every row at or beyond `last` down to `first`.
    pub fn row_op_end(&mut self, first: usize, last: usize) -> Result<(), GsoError> {
        match self.row_op_window {
            Some((f, l)) if f == first && l == last => {}
            _ => return Err(PreconditionError::UnbalancedRowOpBracket { first, last }.into()),
        }

        for i in first..last {
            self.ensure_discovered(i);
            if !self.config.int_gram {
                self.update_bf(i);
                self.invalidate_gf_row(i);
            }
            self.gso_valid_cols[i] = 0;
        }
        for i in last..self.n_known_rows {
            self.gso_valid_cols[i] = self.gso_valid_cols[i].min(first);
        }

        self.row_op_window = None;
        Ok(())
    }

    /// `b[i] += b[j]`.
    pub fn row_add(&mut self, i: usize, j: usize) -> Result<(), GsoError> {
        self.require_bracket()?;
        self.check_row_index(i)?;
        self.check_row_index(j)?;
        self.ensure_discovered(i.max(j));
        let n = self.n;

        let other = self.b.row(j).to_vec();
        let row_i = self.b.row_mut(i);
        for k in 0..n {
            row_i[k] += &other[k];
        }

        if let Some(u) = &mut self.u {
            let other = u.row(j).to_vec();
            let row_i = u.row_mut(i);
            for k in 0..row_i.len() {
                row_i[k] += &other[k];
            }
        }
        if let Some(u_inv_t) = &mut self.u_inv_t {
            let other = u_inv_t.row(i).to_vec();
            let row_j = u_inv_t.row_mut(j);
            for k in 0..row_j.len() {
                row_j[k] -= &other[k];
            }
        }

        if let Some(g) = &mut self.g {
            let gij = g.get(i, j).clone();
            let gjj = g.get(j, j).clone();
            let gii = g.get(i, i).clone();
            let d = g.nrows();
            for k in 0..d {
                if k == i {
                    continue;
                }
                let gjk = g.get(j, k).clone();
                let cur = g.get(i, k).clone();
                g.set(i, k, Z::from(&cur + &gjk));
            }
            let new_ii = Z::from(&gii + Z::from(&gij * 2));
            let new_ii = Z::from(&new_ii + &gjj);
            g.set(i, i, new_ii);
        }
        Ok(())
    }

    /// `b[i] -= b[j]`.
    pub fn row_sub(&mut self, i: usize, j: usize) -> Result<(), GsoError> {
        self.require_bracket()?;
        self.check_row_index(i)?;
        self.check_row_index(j)?;
        self.ensure_discovered(i.max(j));
        let n = self.n;

        let other = self.b.row(j).to_vec();
        let row_i = self.b.row_mut(i);
        for k in 0..n {
            row_i[k] -= &other[k];
        }

        if let Some(u) = &mut self.u {
            let other = u.row(j).to_vec();
            let row_i = u.row_mut(i);
            for k in 0..row_i.len() {
                row_i[k] -= &other[k];
            }
        }
        if let Some(u_inv_t) = &mut self.u_inv_t {
            let other = u_inv_t.row(i).to_vec();
            let row_j = u_inv_t.row_mut(j);
            for k in 0..row_j.len() {
                row_j[k] += &other[k];
            }
        }

        if let Some(g) = &mut self.g {
            let gij = g.get(i, j).clone();
            let gjj = g.get(j, j).clone();
            let gii = g.get(i, i).clone();
            let d = g.nrows();
            for k in 0..d {
                if k == i {
                    continue;
                }
                let gjk = g.get(j, k).clone();
                let cur = g.get(i, k).clone();
                g.set(i, k, Z::from(&cur - &gjk));
            }
            let new_ii = Z::from(&gii - Z::from(&gij * 2));
            let new_ii = Z::from(&new_ii + &gjj);
            g.set(i, i, new_ii);
        }
        Ok(())
    }

    /// `b[i] += x * b[j]` for a small-integer scalar.
    pub fn row_addmul_si(&mut self, i: usize, j: usize, x: i64) -> Result<(), GsoError> {
        self.require_bracket()?;
        self.check_row_index(i)?;
        self.check_row_index(j)?;
        if x == 0 {
            return Ok(());
        }
        self.ensure_discovered(i.max(j));
        let n = self.n;

        let other = self.b.row(j).to_vec();
        let row_i = self.b.row_mut(i);
        for k in 0..n {
            let term = Z::from(&other[k] * x);
            row_i[k] += term;
        }

        if let Some(u) = &mut self.u {
            let other = u.row(j).to_vec();
            let row_i = u.row_mut(i);
            for k in 0..row_i.len() {
                row_i[k] += Z::from(&other[k] * x);
            }
        }
        if let Some(u_inv_t) = &mut self.u_inv_t {
            let other = u_inv_t.row(i).to_vec();
            let row_j = u_inv_t.row_mut(j);
            for k in 0..row_j.len() {
                row_j[k] -= Z::from(&other[k] * x);
            }
        }

        if let Some(g) = &mut self.g {
            let gij = g.get(i, j).clone();
            let gjj = g.get(j, j).clone();
            let gii = g.get(i, i).clone();
            let d = g.nrows();
            for k in 0..d {
                if k == i {
                    continue;
                }
                let gjk = g.get(j, k).clone();
                let cur = g.get(i, k).clone();
                g.set(i, k, Z::from(&cur + Z::from(&gjk * x)));
            }
            let two_x_gij = Z::from(Z::from(&gij * x) * 2);
            let x2_gjj = Z::from(Z::from(&gjj * x) * x);
            let new_ii = Z::from(&gii + &two_x_gij);
            let new_ii = Z::from(&new_ii + &x2_gjj);
            g.set(i, i, new_ii);
        }
        Ok(())
    }

    /// `b[i] += (x * 2^e) * b[j]`.
    pub fn row_addmul_si_2exp(&mut self, i: usize, j: usize, x: i64, e: u32) -> Result<(), GsoError> {
        self.require_bracket()?;
        self.check_row_index(i)?;
        self.check_row_index(j)?;
        if x == 0 {
            return Ok(());
        }
        self.ensure_discovered(i.max(j));
        let n = self.n;

        let other = self.b.row(j).to_vec();
        let row_i = self.b.row_mut(i);
        for k in 0..n {
            let scaled = Z::from(&other[k] * x);
            row_i[k] += Z::from(scaled << e);
        }

        if let Some(u) = &mut self.u {
            let other = u.row(j).to_vec();
            let row_i = u.row_mut(i);
            for k in 0..row_i.len() {
                let scaled = Z::from(&other[k] * x);
                row_i[k] += Z::from(scaled << e);
            }
        }
        if let Some(u_inv_t) = &mut self.u_inv_t {
            let other = u_inv_t.row(i).to_vec();
            let row_j = u_inv_t.row_mut(j);
            for k in 0..row_j.len() {
                let scaled = Z::from(&other[k] * x);
                row_j[k] -= Z::from(scaled << e);
            }
        }

        if let Some(g) = &mut self.g {
            let gij = g.get(i, j).clone();
            let gjj = g.get(j, j).clone();
            let gii = g.get(i, i).clone();
            let d = g.nrows();
            for k in 0..d {
                if k == i {
                    continue;
                }
                let gjk = g.get(j, k).clone();
                let delta = Z::from(Z::from(&gjk * x) << e);
                let cur = g.get(i, k).clone();
                g.set(i, k, Z::from(&cur + &delta));
            }
            let term1 = Z::from(Z::from(Z::from(&gij * x) << (e + 1)));
            let term2 = Z::from(Z::from(Z::from(&gjj * x) * x) << (2 * e));
            let new_ii = Z::from(&gii + &term1);
            let new_ii = Z::from(&new_ii + &term2);
            g.set(i, i, new_ii);
        }
        Ok(())
    }

    /// `b[i] += (big * 2^e) * b[j]` for an arbitrary-precision multiplicand.
    pub fn row_addmul_2exp(&mut self, i: usize, j: usize, big: &Z, e: u32) -> Result<(), GsoError> {
        self.require_bracket()?;
        self.check_row_index(i)?;
        self.check_row_index(j)?;
        if big.cmp0() == Ordering::Equal {
            return Ok(());
        }
        self.ensure_discovered(i.max(j));
        let n = self.n;

        let other = self.b.row(j).to_vec();
        let row_i = self.b.row_mut(i);
        for k in 0..n {
            let scaled = Z::from(big * &other[k]);
            row_i[k] += Z::from(scaled << e);
        }

        if let Some(u) = &mut self.u {
            let other = u.row(j).to_vec();
            let row_i = u.row_mut(i);
            for k in 0..row_i.len() {
                let scaled = Z::from(big * &other[k]);
                row_i[k] += Z::from(scaled << e);
            }
        }
        if let Some(u_inv_t) = &mut self.u_inv_t {
            let other = u_inv_t.row(i).to_vec();
            let row_j = u_inv_t.row_mut(j);
            for k in 0..row_j.len() {
                let scaled = Z::from(big * &other[k]);
                row_j[k] -= Z::from(scaled << e);
            }
        }

        if let Some(g) = &mut self.g {
            let gij = g.get(i, j).clone();
            let gjj = g.get(j, j).clone();
            let gii = g.get(i, i).clone();
            let d = g.nrows();
            for k in 0..d {
                if k == i {
                    continue;
                }
                let gjk = g.get(j, k).clone();
                let delta = Z::from(Z::from(big * &gjk) << e);
                let cur = g.get(i, k).clone();
                g.set(i, k, Z::from(&cur + &delta));
            }
            let term1 = Z::from(Z::from(big * &gij) << (e + 1));
            let term2 = Z::from(Z::from(Z::from(big * big) * &gjj) << (2 * e));
            let new_ii = Z::from(&gii + &term1);
            let new_ii = Z::from(&new_ii + &term2);
            g.set(i, i, new_ii);
        }
        Ok(())
    }

    /// Generic entry point for reduction algorithms: decomposes `x` (scaled
    /// by an additional `2^expo_add`) into a mantissa/exponent pair and
    /// routes to the cheapest applicable mutator.
    pub fn row_addmul_we(&mut self, i: usize, j: usize, x: &F, expo_add: i64) -> Result<(), GsoError> {
        if let Some((m, e)) = get_si_exp_we(x, expo_add) {
            if e == 0 && m == 1 {
                return self.row_add(i, j);
            }
            if e == 0 && m == -1 {
                return self.row_sub(i, j);
            }
            if e == 0 {
                return self.row_addmul_si(i, j, m);
            }
            if self.config.row_op_force_long {
                debug_assert!(e >= 0);
                return self.row_addmul_si_2exp(i, j, m, e as u32);
            }
        }
        let (big, e) = get_z_exp_we(x, expo_add)
            .expect("row_addmul_we requires a finite coefficient");
        debug_assert!(e >= 0);
        self.row_addmul_2exp(i, j, &big, e.max(0) as u32)
    }

    /// Swap `b[i] <-> b[j]` (`i < j`). Forbidden when
    /// `inv_transform_enabled`, per the design notes' open question.
    pub fn row_swap(&mut self, i: usize, j: usize) -> Result<(), GsoError> {
        self.require_bracket()?;
        if self.config.inv_transform_enabled {
            return Err(PreconditionError::SwapForbiddenUnderInvTransform.into());
        }
        debug_assert!(i < j, "row_swap requires i < j");
        self.check_row_index(j)?;
        self.ensure_discovered(j);

        self.b.swap_rows(i, j);
        if let Some(u) = &mut self.u {
            u.swap_rows(i, j);
        }
        if let Some(bf) = &mut self.bf {
            bf.swap_rows(i, j);
        }
        if let Some(row_expo) = &mut self.row_expo {
            row_expo.swap(i, j);
        }
        if let Some(g) = &mut self.g {
            g.swap_rows_cols(i, j);
        }
        self.invalidate_gf_row(i);
        self.invalidate_gf_row(j);
        self.invalidate_suffix_from(i);
        Ok(())
    }

    /// Logical rotation of all row-indexed state. `new < old` right-rotates
    /// `[new, old]`; `new > old` left-rotates `[old, new]` and, if
    /// `new >= n_known_rows`, retracts `n_known_rows` to `old`.
    pub fn move_row(&mut self, old: usize, new: usize) -> Result<(), GsoError> {
        let d = self.d();
        if old >= d || new > d {
            return Err(PreconditionError::MoveRowOutOfRange { old, new, d }.into());
        }
        if old == new {
            return Ok(());
        }

        if new < old {
            self.b.rotate_right(new, old);
            if let Some(u) = &mut self.u {
                u.rotate_right(new, old);
            }
            if let Some(u_inv_t) = &mut self.u_inv_t {
                u_inv_t.rotate_right(new, old);
            }
            self.gso_valid_cols[new..=old].rotate_right(1);
            self.init_row_size[new..=old].rotate_right(1);
        } else {
            self.b.rotate_left(old, new);
            if let Some(u) = &mut self.u {
                u.rotate_left(old, new);
            }
            if let Some(u_inv_t) = &mut self.u_inv_t {
                u_inv_t.rotate_left(old, new);
            }
            self.gso_valid_cols[old..=new].rotate_left(1);
            self.init_row_size[old..=new].rotate_left(1);
        }

        // Lazily-populated companion state exists only for [0, n_known_rows);
        // rotate within that bound and let anything shifted past it drop out
        // (it becomes unknown again, rebuilt by a future `discover_row`).
        if old < self.n_known_rows {
            let lo = new.min(old);
            let hi = new.max(old).min(self.n_known_rows.saturating_sub(1));
            if lo < hi {
                if new < old {
                    if let Some(bf) = &mut self.bf {
                        bf.rotate_right(lo, hi);
                    }
                    if let Some(g) = &mut self.g {
                        g.rotate_gram_right(lo, hi);
                    }
                    if let Some(gf) = &mut self.gf {
                        gf.rotate_gram_right(lo, hi);
                    }
                    if let Some(row_expo) = &mut self.row_expo {
                        row_expo[lo..=hi].rotate_right(1);
                    }
                } else {
                    if let Some(bf) = &mut self.bf {
                        bf.rotate_left(lo, hi);
                    }
                    if let Some(g) = &mut self.g {
                        g.rotate_gram_left(lo, hi);
                    }
                    if let Some(gf) = &mut self.gf {
                        gf.rotate_gram_left(lo, hi);
                    }
                    if let Some(row_expo) = &mut self.row_expo {
                        row_expo[lo..=hi].rotate_left(1);
                    }
                }
            }
        }

        if new < old {
            for i in new..self.n_known_rows {
                self.gso_valid_cols[i] = new;
            }
        } else {
            for i in old..self.n_known_rows {
                self.gso_valid_cols[i] = old;
            }
            if new >= self.n_known_rows {
                self.n_known_rows = old;
                if !self.cols_locked {
                    self.n_source_rows = self.n_known_rows;
                }
                let nz = self
                    .b
                    .row(new)
                    .iter()
                    .filter(|x| x.cmp0() != Ordering::Equal)
                    .count();
                self.init_row_size[new] = nz.max(1).min(self.n);
            }
        }

        self.resize_triangular_rows();
        Ok(())
    }

    /// Shrink `d` by `k`, dropping the trailing `k` rows from every
    /// container.
    pub fn remove_last_rows(&mut self, k: usize) -> Result<(), GsoError> {
        let d = self.d();
        if k > d {
            return Err(PreconditionError::RemoveExceedsDim { k, d }.into());
        }
        let new_d = d - k;

        self.b.truncate(new_d);
        if let Some(u) = &mut self.u {
            u.truncate(new_d);
        }
        if let Some(u_inv_t) = &mut self.u_inv_t {
            u_inv_t.truncate(new_d);
        }
        self.gso_valid_cols.truncate(new_d);
        self.init_row_size.truncate(new_d);
        self.alloc_dim = self.alloc_dim.min(new_d);
        self.n_known_rows = self.n_known_rows.min(new_d);
        self.n_source_rows = self.n_source_rows.min(new_d);

        if let Some(bf) = &mut self.bf {
            bf.truncate(self.n_known_rows);
        }
        if let Some(row_expo) = &mut self.row_expo {
            row_expo.truncate(self.n_known_rows);
        }
        if let Some(g) = &mut self.g {
            g.truncate(self.n_known_rows);
        }
        if let Some(gf) = &mut self.gf {
            gf.truncate(self.n_known_rows);
        }
        self.resize_triangular_rows();
        Ok(())
    }

    /// Append `rows(t)` scratch rows computed as `sum_j t[k][j] * b[src_base+j]`,
    /// swap them into `[target_base, target_base + rows(t))`, then drop the
    /// now-empty trailing scratch rows.
    pub fn apply_transform(
        &mut self,
        t: &[Vec<Z>],
        src_base: usize,
        target_base: usize,
    ) -> Result<(), GsoError> {
        let rows_t = t.len();
        if rows_t == 0 {
            return Ok(());
        }
        let old_d = self.d();
        self.size_increased(old_d + rows_t);

        self.row_op_begin(old_d, old_d + rows_t)?;
        for (k, coeffs) in t.iter().enumerate() {
            let scratch = old_d + k;
            for (j, coeff) in coeffs.iter().enumerate() {
                if coeff.cmp0() != Ordering::Equal {
                    self.row_addmul_2exp(scratch, src_base + j, coeff, 0)?;
                }
            }
        }
        self.row_op_end(old_d, old_d + rows_t)?;

        let lo = target_base.min(old_d);
        let hi = (old_d + rows_t).max(target_base + rows_t);
        self.row_op_begin(lo, hi)?;
        for k in 0..rows_t {
            let scratch = old_d + k;
            let target = target_base + k;
            if scratch != target {
                let (a, b) = if target < scratch { (target, scratch) } else { (scratch, target) };
                self.row_swap(a, b)?;
            }
        }
        self.row_op_end(lo, hi)?;

        self.remove_last_rows(rows_t)
    }
}

/// `x * 2^expo_add == m * 2^e` with `m` a small (`i64`-representable)
/// integer. Prefers `e == 0` whenever the scaled value is itself already a
/// whole number that fits in an `i64` -- `x`'s own stored significand
/// carries trailing zero-bit padding out to the working precision, so
/// extracting its mantissa/exponent pair via `get_z_exp_we` and reducing
/// out shared factors of two converges to the *odd*-mantissa form (e.g.
/// `x=-2.0` lands on `m=-1, e=1`, not the exact-integer `m=-2, e=0`), and
/// `row_addmul_we`'s routing table depends on seeing `e == 0` for integer
/// coefficients. Falls back to the reduced mantissa/exponent form when the
/// scaled value isn't an exact small integer. `None` if the result doesn't
/// fit in an `i64` even after reducing out every shared factor of two.
fn get_si_exp_we(x: &F, expo_add: i64) -> Option<(i64, i64)> {
    let scaled = scalar::scale_2exp(x, expo_add);
    if scaled.is_integer() {
        if let Some(m) = scaled.to_integer().and_then(|z| z.to_i64()) {
            return Some((m, 0));
        }
    }

    let (mut z, mut e) = get_z_exp_we(x, expo_add)?;
    if let Some(m) = z.to_i64() {
        return Some((m, e));
    }
    if z.cmp0() != Ordering::Equal {
        while z.is_even() {
            z >>= 1u32;
            e += 1;
            if let Some(m) = z.to_i64() {
                return Some((m, e));
            }
        }
    }
    None
}

/// `x * 2^expo_add == big * 2^e`, exactly, for an arbitrary-precision `big`.
fn get_z_exp_we(x: &F, expo_add: i64) -> Option<(Z, i64)> {
    let scaled = scalar::scale_2exp(x, expo_add);
    scalar::to_integer_with_exponent(&scaled).map(|(z, e)| (z, e as i64))
}
