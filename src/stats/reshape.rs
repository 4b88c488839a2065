//! Pile <-> table reshaping
//!
//! A `[W, W, N]` pile becomes an `[N, W*W]` table with one row per window
//! and pixels in row-major order: column `i * W + j` holds pixel `(i, j)`.

use crate::core::error::{DataError, Result};
use crate::stats::pileup::Pile;
use ndarray::{Array2, Array3};

/// Flatten every window of `pile` into one table row
pub fn pile_to_table(pile: &Pile) -> Array2<f64> {
    let data = pile.data();
    let w = pile.window_bins();
    Array2::from_shape_fn((pile.len(), w * w), |(n, k)| data[[k / w, k % w, n]])
}

/// Rebuild a pile of `w x w` windows from its table form
pub fn table_to_pile(table: &Array2<f64>, w: usize) -> Result<Pile> {
    if table.ncols() != w * w {
        return Err(DataError::ShapeMismatch {
            expected: format!("{} columns", w * w),
            found: format!("{} columns", table.ncols()),
        }
        .into());
    }
    let data = Array3::from_shape_fn((w, w, table.nrows()), |(i, j, n)| table[[n, i * w + j]]);
    Ok(Pile::new(data))
}
