//! Error types for the GSO engine.
//!
//! Layered error enums composed via `#[from]`/`#[error(transparent)]`:
//! construction failures are `ConfigError`, everything else the engine can
//! refuse is `PreconditionError`, and both compose into `GsoError`. There is
//! deliberately no `NumericNonFinite` variant here — that condition is
//! surfaced as a plain `bool` return from `update_gso_row`, not an error.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("inv_transform_enabled requires transform_enabled")]
    InvTransformRequiresTransform,

    #[error("int_gram and cols_locked are mutually exclusive")]
    IntGramForbidsColumnLock,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("row index {index} out of range (d={d})")]
    RowOutOfRange { index: usize, d: usize },

    #[error("column index {index} out of range (known cols: {known})")]
    ColOutOfRange { index: usize, known: usize },

    #[error("row_swap is unsupported when inv_transform_enabled")]
    SwapForbiddenUnderInvTransform,

    #[error("lock_cols is unsupported when int_gram is enabled")]
    LockForbiddenUnderIntGram,

    #[error("columns are locked; unlock_cols before this operation")]
    ColumnsLocked,

    #[error("columns are not locked")]
    ColumnsNotLocked,

    #[error("row_op brackets are not matched (first={first}, last={last})")]
    UnbalancedRowOpBracket { first: usize, last: usize },

    #[error("mutation attempted outside a row_op_begin/row_op_end bracket")]
    UnbracketedMutation,

    #[error("remove_last_rows({k}) exceeds current dimension {d}")]
    RemoveExceedsDim { k: usize, d: usize },

    #[error("move_row indices out of range: old={old}, new={new}, d={d}")]
    MoveRowOutOfRange { old: usize, new: usize, d: usize },

    #[error("update_gso_row: last_j={last_j} out of range for n_source_rows={n_source_rows}")]
    LastJOutOfRange { last_j: usize, n_source_rows: usize },

    #[error("query index out of order: expected j <= i, got i={i}, j={j}")]
    IndexOrder { i: usize, j: usize },

    #[error("metrics range is empty or inverted: s={s}, e={e}")]
    EmptyRange { s: usize, e: usize },
}

#[derive(Debug, Error)]
pub enum GsoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),
}
