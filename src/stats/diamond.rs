//! Sliding diamond along the main diagonal
//!
//! Walks a square of `side_len / 2 + 1` bins down the diagonal of a matrix
//! (typically a collapsed pile) and reports the mean of each square with
//! its position relative to the matrix centre, in bins.

use crate::core::error::{ConfigError, Result};
use crate::stats::reduce::{nan_mean, nan_median};
use ndarray::{s, ArrayView2};

/// Diamond means and their centred offsets
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiamondProfile {
    /// Position of each square relative to the matrix centre (bins)
    pub offsets: Vec<f64>,
    /// NaN-mean of each square, infinities treated as missing
    pub values: Vec<f64>,
}

impl DiamondProfile {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Slide a diamond of side `side_len` down the diagonal of `matrix`.
///
/// Produces `rows - side_len / 2` values (none when the matrix is smaller
/// than half the side).
pub fn sliding_diamond(matrix: ArrayView2<'_, f64>, side_len: usize) -> Result<DiamondProfile> {
    if side_len == 0 {
        return Err(ConfigError::InvalidSideLength.into());
    }
    let half = side_len / 2;
    let rows = matrix.nrows();
    let cols = matrix.ncols();
    if rows <= half {
        return Ok(DiamondProfile::default());
    }

    let mut offsets = Vec::with_capacity(rows - half);
    let mut values = Vec::with_capacity(rows - half);
    for i in 0..rows - half {
        let col_end = (i + half + 1).min(cols);
        let col_start = i.min(col_end);
        let square = matrix.slice(s![i..i + half + 1, col_start..col_end]);
        values.push(nan_mean(
            square
                .iter()
                .map(|&v| if v.is_infinite() { f64::NAN } else { v }),
        ));
        offsets.push(i as f64 + half as f64 / 2.0);
    }

    let centre = nan_median(&offsets);
    for offset in &mut offsets {
        *offset -= centre;
    }

    Ok(DiamondProfile { offsets, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_length_and_symmetry() {
        for n in [5usize, 6, 11] {
            let m = Array2::from_elem((n, n), 1.0);
            let profile = sliding_diamond(m.view(), 4).unwrap();
            assert_eq!(profile.len(), n - 2);
            let sum: f64 = profile.offsets.iter().sum();
            assert!(sum.abs() < 1e-9, "offsets not centred for n={}", n);
            assert!(profile.values.iter().all(|&v| v == 1.0));
        }
    }

    #[test]
    fn test_square_means() {
        let m = Array2::from_shape_fn((4, 4), |(i, j)| (i * 4 + j) as f64);
        let profile = sliding_diamond(m.view(), 2).unwrap();
        // squares at (0,0), (1,1), (2,2) of side 2
        assert_eq!(profile.values, vec![2.5, 7.5, 12.5]);
        assert_eq!(profile.offsets, vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_infinity_treated_as_missing() {
        let mut m = Array2::from_elem((3, 3), 2.0);
        m[[0, 0]] = f64::INFINITY;
        m[[0, 1]] = f64::NAN;
        let profile = sliding_diamond(m.view(), 2).unwrap();
        assert_eq!(profile.values[0], 2.0);
    }

    #[test]
    fn test_small_matrix_and_bad_side() {
        let m = Array2::from_elem((2, 2), 1.0);
        assert!(sliding_diamond(m.view(), 6).unwrap().is_empty());
        assert!(sliding_diamond(m.view(), 0).is_err());
    }
}
