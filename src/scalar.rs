//! Numeric back-end glue.
//!
//! `Z` is `rug::Integer`, `F` is `rug::Float`, used directly rather than
//! behind a newtype. This module supplies the handful of free functions the
//! GSO engine needs beyond what `rug` exposes natively: process-wide
//! precision, a NaN sentinel, and the mantissa/exponent conversions described
//! in the numeric back-end contract.

use rug::Integer;
use rug::float::Special;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

pub type Z = Integer;
pub type F = rug::Float;

/// Default working precision, in bits, for newly created `F` values.
const DEFAULT_PREC: u32 = 128;

static PRECISION: AtomicU32 = AtomicU32::new(DEFAULT_PREC);

/// Current process-wide `F` precision, in bits.
pub fn get_prec() -> u32 {
    PRECISION.load(AtomicOrdering::Relaxed)
}

/// Set the process-wide `F` precision, returning the previous value.
///
/// Per the resource model, changing precision while an engine is populated
/// invalidates every stored `F` value already computed at the old
/// precision; callers must follow up with a full invalidation of any live
/// `Gso` before trusting its lazily-extended state again.
pub fn set_prec(prec: u32) -> u32 {
    PRECISION.swap(prec, AtomicOrdering::Relaxed)
}

/// A fresh zero at the current working precision.
pub fn zero() -> F {
    F::with_val(get_prec(), 0)
}

/// The NaN sentinel used to mark an invalidated `gf`/`bf` entry.
pub fn nan() -> F {
    F::with_val(get_prec(), Special::Nan)
}

/// `value == mantissa * 2^exponent`, with `mantissa` in `[0.5, 1)` (or exactly
/// zero, with exponent zero, for a zero input).
pub fn to_float_with_exponent(z: &Z) -> (F, i64) {
    if z.cmp0() == Ordering::Equal {
        return (zero(), 0);
    }
    let bits = z.significant_bits();
    let mantissa = F::from(F::with_val(get_prec(), z) >> bits);
    (mantissa, bits as i64)
}

/// Round `f` to the nearest integer and report the binary exponent such that
/// `f == integer * 2^exponent`. `None` for non-finite input.
pub fn to_integer_with_exponent(f: &F) -> Option<(Z, i32)> {
    if !f.is_finite() {
        return None;
    }
    f.clone().to_integer_exp()
}

/// Exact scaling of an `F` by `2^k` (k may be negative).
pub fn scale_2exp(f: &F, k: i64) -> F {
    if k >= 0 {
        F::from(f << k as u32)
    } else {
        F::from(f >> (-k) as u32)
    }
}

/// Binary exponent of a nonzero, finite `F` (i.e. `f = m * 2^e`, `m` in
/// `[0.5, 1)`). Returns 0 for zero.
pub fn exponent(f: &F) -> i64 {
    if f.cmp0() == Ordering::Equal || !f.is_finite() {
        return 0;
    }
    f.get_exp().map(|e| e as i64).unwrap_or(0)
}
