//! Symmetric Gram-matrix storage: `g(i,j)` is meaningful only for `j <= i`
//! (V1); accessors normalize `(i,j)` to `(max(i,j), min(i,j))`, matching the
//! `sym_g` helper described in the design notes.
//!
//! Storage itself is a plain square array (each row allocated to the full
//! current dimension), not a ragged triangular one: that makes the
//! row/column rotations `move_row` needs a pair of ordinary slice rotations
//! instead of a full O(d^2) rebuild, at the cost of storing (and ignoring)
//! the upper triangle. The `get`/`set`/`rotate_gram_*` methods are the only
//! places that know this.

#[derive(Debug, Clone, Default)]
pub struct GramStore<T> {
    rows: Vec<Vec<T>>,
}

fn normalize(i: usize, j: usize) -> (usize, usize) {
    if i >= j { (i, j) } else { (j, i) }
}

impl<T: Clone> GramStore<T> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, i: usize, j: usize) -> &T {
        let (a, b) = normalize(i, j);
        &self.rows[a][b]
    }

    pub fn get_mut(&mut self, i: usize, j: usize) -> &mut T {
        let (a, b) = normalize(i, j);
        &mut self.rows[a][b]
    }

    pub fn set(&mut self, i: usize, j: usize, v: T) {
        let (a, b) = normalize(i, j);
        self.rows[a][b] = v;
    }

    /// Append a new row (and matching column in every existing row) for a
    /// newly discovered basis row, filled with `zero`.
    pub fn discover_row(&mut self, zero: T) {
        let n = self.rows.len();
        for row in self.rows.iter_mut() {
            row.push(zero.clone());
        }
        self.rows.push(vec![zero; n + 1]);
    }

    pub fn truncate(&mut self, n: usize) {
        self.rows.truncate(n);
        for row in self.rows.iter_mut() {
            row.truncate(n);
        }
    }

    /// Symmetric permutation swapping rows/columns `i` and `j` (`i < j`),
    /// exactly matching the explicit case split in `row_swap`'s Gram update:
    /// every cross term `sym_g(i,k)`/`sym_g(j,k)` for `k != i,j` is swapped,
    /// then the two diagonals are swapped; `g(i,j)` itself is left alone
    /// (symmetric under the same permutation).
    pub fn swap_rows_cols(&mut self, i: usize, j: usize) {
        debug_assert!(i < j);
        let d = self.rows.len();
        for k in 0..d {
            if k == i || k == j {
                continue;
            }
            let a = self.get(i, k).clone();
            let b = self.get(j, k).clone();
            self.set(i, k, b);
            self.set(j, k, a);
        }
        let di = self.get(i, i).clone();
        let dj = self.get(j, j).clone();
        self.set(i, i, dj);
        self.set(j, j, di);
    }

    /// Reflect a right-rotation of basis rows `[new, old]` (row `old` moves
    /// to `new`) into the symmetric storage: rotate the row blocks, then
    /// rotate the matching column range within every row (including rows
    /// outside the window, whose stored column entries for `[new, old]`
    /// must follow the same permutation).
    pub fn rotate_gram_right(&mut self, new: usize, old: usize) {
        self.rows[new..=old].rotate_right(1);
        for row in self.rows.iter_mut() {
            if row.len() > old {
                row[new..=old].rotate_right(1);
            }
        }
    }

    /// Reflect a left-rotation of basis rows `[old, new]` (row `old` moves
    /// to `new`).
    pub fn rotate_gram_left(&mut self, old: usize, new: usize) {
        self.rows[old..=new].rotate_left(1);
        for row in self.rows.iter_mut() {
            if row.len() > new {
                row[old..=new].rotate_left(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gram3() -> GramStore<i32> {
        // g(i,j) = i*10 + j for j <= i
        let mut g = GramStore::new();
        for i in 0..4 {
            g.discover_row(0);
            for j in 0..=i {
                g.set(i, j, (i * 10 + j) as i32);
            }
        }
        g
    }

    #[test]
    fn get_normalizes_to_lower_triangle() {
        let g = gram3();
        assert_eq!(*g.get(1, 2), *g.get(2, 1));
        assert_eq!(*g.get(2, 1), 21);
    }

    #[test]
    fn swap_rows_cols_is_involution() {
        let mut g = gram3();
        let before: Vec<Vec<i32>> = (0..4)
            .map(|i| (0..4).map(|j| *g.get(i, j)).collect())
            .collect();
        g.swap_rows_cols(1, 2);
        g.swap_rows_cols(1, 2);
        let after: Vec<Vec<i32>> = (0..4)
            .map(|i| (0..4).map(|j| *g.get(i, j)).collect())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn rotate_gram_right_then_left_is_identity() {
        let mut g = gram3();
        let before: Vec<Vec<i32>> = (0..4)
            .map(|i| (0..4).map(|j| *g.get(i, j)).collect())
            .collect();
        g.rotate_gram_right(1, 3);
        g.rotate_gram_left(1, 3);
        let after: Vec<Vec<i32>> = (0..4)
            .map(|i| (0..4).map(|j| *g.get(i, j)).collect())
            .collect();
        assert_eq!(before, after);
    }
}
