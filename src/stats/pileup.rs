//! Pileups of contact sub-matrices
//!
//! Extracts one dense sub-matrix ("snip") per 2D window, either as balanced
//! counts or divided by the distance-matched expected, and stacks them into
//! a `[W, W, N]` pile. Windows are snipped in parallel on a scoped pool and
//! the pile keeps the caller's window order.
//!
//! Cell values:
//! - NaN for bins outside the window's arm or chromosome and for masked bins
//! - 0 for valid bins without a stored pixel
//! - ±Inf/NaN where obs/exp divides by a zero or missing expected; these are
//!   counted and logged, never raised. Sanitize before reducing if an
//!   all-finite result is wanted.

use crate::core::error::{DataError, Result};
use crate::core::interval::Arm;
use crate::core::pool::parallel_map;
use crate::core::source::{BinTable, ContactSource, Pixel};
use crate::stats::expected::ExpectedTable;
use crate::stats::reduce::nan_mean;
use crate::stats::regions::{Window2D, WindowSpan};
use ndarray::{Array2, Array3, ArrayView2, Axis};
use std::collections::HashMap;

/// A stack of equally sized window matrices, shape `[W, W, N]`
#[derive(Debug, Clone, PartialEq)]
pub struct Pile {
    data: Array3<f64>,
}

impl Pile {
    pub fn new(data: Array3<f64>) -> Self {
        Self { data }
    }

    /// Pile with no windows
    pub fn empty(window_bins: usize) -> Self {
        Self {
            data: Array3::zeros((window_bins, window_bins, 0)),
        }
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn into_inner(self) -> Array3<f64> {
        self.data
    }

    /// Side length W in bins
    pub fn window_bins(&self) -> usize {
        self.data.shape()[0]
    }

    /// Number of windows N
    pub fn len(&self) -> usize {
        self.data.shape()[2]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matrix of window `n`
    pub fn window(&self, n: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(2), n)
    }

    /// Replace ±Inf cells by NaN so they are skipped by [`Pile::collapse`]
    pub fn sanitize_infinite(&mut self) {
        self.data.mapv_inplace(|v| if v.is_infinite() { f64::NAN } else { v });
    }

    /// Average over windows, ignoring NaN.
    ///
    /// Infinite cells are not ignored; call [`Pile::sanitize_infinite`]
    /// first to exclude them.
    pub fn collapse(&self) -> Array2<f64> {
        self.data
            .map_axis(Axis(2), |lane| nan_mean(lane.iter().copied()))
    }
}

/// How snipped values are normalized
#[derive(Debug, Clone, Copy)]
pub enum PileupMode<'a> {
    /// Balanced counts
    Raw,
    /// Balanced counts divided by the expected at the same diagonal
    ObsExp(&'a ExpectedTable),
}

/// Global bin ids of a window side, `None` where the bin lies outside the
/// chromosome or the window's arm
fn side_ids(table: &BinTable, span: &WindowSpan, arm: Option<&std::ops::Range<u64>>) -> Vec<Option<u64>> {
    let chrom = table.chrom_range(&span.interval.chrom);
    span.local_bins()
        .map(|local| {
            let chrom = chrom.as_ref()?;
            if local < 0 {
                return None;
            }
            let id = chrom.start + local as u64;
            if id >= chrom.end {
                return None;
            }
            match arm {
                Some(arm) if arm.contains(&id) => Some(id),
                _ => None,
            }
        })
        .collect()
}

fn snip<S: ContactSource + ?Sized>(
    source: &S,
    table: &BinTable,
    window: &Window2D,
    profile: Option<&[f64]>,
) -> Result<(Array2<f64>, usize)> {
    let arm_range = table.interval_range(&window.region);
    let rows = side_ids(table, &window.first, arm_range.as_ref());
    let cols = side_ids(table, &window.second, arm_range.as_ref());

    let mut matrix = Array2::from_elem((rows.len(), cols.len()), f64::NAN);
    for (i, row) in rows.iter().enumerate() {
        for (j, col) in cols.iter().enumerate() {
            if let (Some(r), Some(c)) = (row, col) {
                let w = table.weight(*r) * table.weight(*c);
                matrix[[i, j]] = if w.is_nan() { f64::NAN } else { 0.0 };
            }
        }
    }

    let row_pos: HashMap<u64, usize> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, id)| id.map(|id| (id, i)))
        .collect();
    let col_pos: HashMap<u64, usize> = cols
        .iter()
        .enumerate()
        .filter_map(|(j, id)| id.map(|id| (id, j)))
        .collect();

    // one balanced value per pixel, written to both mirrored cells
    let mut place = |px: &Pixel| {
        let value = px.count * table.weight(px.bin1) * table.weight(px.bin2);
        for (a, b) in [(px.bin1, px.bin2), (px.bin2, px.bin1)] {
            if let (Some(&i), Some(&j)) = (row_pos.get(&a), col_pos.get(&b)) {
                matrix[[i, j]] = value;
            }
        }
    };

    let first = &window.first.interval;
    let second = &window.second.interval;
    for px in source.pixels(first, second)? {
        place(&px);
    }
    if first != second {
        for px in source.pixels(second, first)? {
            place(&px);
        }
    }

    let mut non_finite = 0;
    if let Some(profile) = profile {
        for (i, row) in rows.iter().enumerate() {
            for (j, col) in cols.iter().enumerate() {
                let (Some(r), Some(c)) = (row, col) else {
                    continue;
                };
                let diag = r.abs_diff(*c) as usize;
                let expected = profile.get(diag).copied().unwrap_or(f64::NAN);
                let observed = matrix[[i, j]];
                let ratio = observed / expected;
                if observed.is_finite() && !ratio.is_finite() {
                    non_finite += 1;
                }
                matrix[[i, j]] = ratio;
            }
        }
    }

    Ok((matrix, non_finite))
}

/// Check that every window has the same square shape
fn window_bins(windows: &[Window2D]) -> Result<usize> {
    let w = windows.first().map(|w| w.first.n_bins).unwrap_or(0);
    for window in windows {
        if window.first.n_bins != w || window.second.n_bins != w {
            return Err(DataError::ShapeMismatch {
                expected: format!("{}x{}", w, w),
                found: format!("{}x{}", window.first.n_bins, window.second.n_bins),
            }
            .into());
        }
    }
    Ok(w)
}

/// Snip every window and stack the results in window order
pub fn pileup<S: ContactSource + ?Sized>(
    source: &S,
    windows: &[Window2D],
    mode: PileupMode<'_>,
    threads: usize,
) -> Result<Pile> {
    let w = window_bins(windows)?;
    if windows.is_empty() {
        return Ok(Pile::empty(w));
    }
    let table = BinTable::from_source(source)?;

    let profiles: HashMap<&Arm, Vec<f64>> = match mode {
        PileupMode::Raw => HashMap::new(),
        PileupMode::ObsExp(expected) => {
            let mut profiles = HashMap::new();
            for window in windows {
                profiles.entry(&window.region).or_insert_with(|| {
                    let len = table
                        .interval_range(&window.region)
                        .map(|r| (r.end - r.start) as usize)
                        .unwrap_or(0);
                    expected.arm_profile(&window.region, len)
                });
            }
            profiles
        }
    };

    log::debug!("Snipping {} windows of {}x{} bins", windows.len(), w, w);

    let snips = parallel_map(threads, windows, |window| {
        let profile = profiles.get(&window.region).map(|p| p.as_slice());
        snip(source, &table, window, profile)
    })?;

    let mut data = Array3::from_elem((w, w, snips.len()), f64::NAN);
    let mut non_finite = 0;
    for (n, (matrix, bad)) in snips.into_iter().enumerate() {
        data.index_axis_mut(Axis(2), n).assign(&matrix);
        non_finite += bad;
    }
    if non_finite > 0 {
        log::debug!(
            "obs/exp division produced {} non-finite cells (zero or missing expected)",
            non_finite
        );
    }

    Ok(Pile::new(data))
}

/// Pile of balanced counts
pub fn pileup_raw<S: ContactSource + ?Sized>(
    source: &S,
    windows: &[Window2D],
    threads: usize,
) -> Result<Pile> {
    pileup(source, windows, PileupMode::Raw, threads)
}

/// Pile of observed / expected values
pub fn pileup_obs_exp<S: ContactSource + ?Sized>(
    source: &S,
    expected: &ExpectedTable,
    windows: &[Window2D],
    threads: usize,
) -> Result<Pile> {
    pileup(source, windows, PileupMode::ObsExp(expected), threads)
}
