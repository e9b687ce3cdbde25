use crate::error::{EngineError, Result};
use crate::matrix::{CompetitorMask, MatchupMatrix, NamedMatchupCell};

/// View the matrix from the column competitor's side: transpose, invert every
/// win rate, swap the labels. The input is left untouched.
pub fn invert_and_transpose(matrix: &MatchupMatrix) -> MatchupMatrix {
    let mut copy = matrix.clone();
    invert_and_transpose_in_place(&mut copy);
    copy
}

/// In-place variant of [`invert_and_transpose`]. Only call this on a matrix the
/// caller owns outright.
pub fn invert_and_transpose_in_place(matrix: &mut MatchupMatrix) {
    let rows = &mut matrix.rows;
    let n = rows.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let upper = rows[i][j];
            rows[i][j] = rows[j][i];
            rows[j][i] = upper;
        }
    }
    for row in rows.iter_mut() {
        for named in row.iter_mut() {
            *named = NamedMatchupCell {
                with: named.against,
                against: named.with,
                cell: named.cell.inverted(),
            };
        }
    }
}

/// Drop every competitor whose mask entry is `false`, as row and as column.
/// Surviving rows and columns keep their relative order.
pub fn filter_by_mask(matrix: &MatchupMatrix, mask: &CompetitorMask) -> Result<MatchupMatrix> {
    let n = matrix.dimension();
    if mask.len() != n {
        return Err(EngineError::MaskLength {
            expected: n,
            found: mask.len(),
        });
    }
    let keep = mask.flags();
    let rows = matrix
        .rows
        .iter()
        .zip(keep)
        .filter(|(_, k)| **k)
        .map(|(row, _)| {
            row.iter()
                .zip(keep)
                .filter(|(_, k)| **k)
                .map(|(cell, _)| *cell)
                .collect()
        })
        .collect();
    Ok(MatchupMatrix { rows })
}

/// New row `k` is old row `row_order[k]`; new column `k` is old column
/// `col_order[k]`. The two orders are independent.
pub fn reorder(
    matrix: &MatchupMatrix,
    row_order: &[usize],
    col_order: &[usize],
) -> Result<MatchupMatrix> {
    let n = matrix.dimension();
    validate_permutation(row_order, n)?;
    validate_permutation(col_order, n)?;
    let rows = row_order
        .iter()
        .map(|&r| {
            let row = &matrix.rows[r];
            col_order.iter().map(|&c| row[c]).collect()
        })
        .collect();
    Ok(MatchupMatrix { rows })
}

pub fn identity_order(n: usize) -> Vec<usize> {
    (0..n).collect()
}

/// Checks `order` is a bijection on `0..n`.
pub fn validate_permutation(order: &[usize], n: usize) -> Result<()> {
    if let Some(&index) = order.iter().find(|&&i| i >= n) {
        return Err(EngineError::InvalidIndex { index, len: n });
    }
    if order.len() != n {
        return Err(EngineError::NotAPermutation {
            expected: n,
            found: order.len(),
        });
    }
    let mut seen = vec![false; n];
    for &i in order {
        if seen[i] {
            return Err(EngineError::NotAPermutation {
                expected: n,
                found: order.len(),
            });
        }
        seen[i] = true;
    }
    Ok(())
}
