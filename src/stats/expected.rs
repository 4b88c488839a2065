//! Distance-decay expected per chromosome arm
//!
//! For every arm and diagonal offset `d`, sums the balanced contacts over
//! all pixels `(i, i + d)` inside the arm and counts the bin pairs where
//! both bins carry a finite weight. Arms are processed in parallel and the
//! partial sums are merged by addition.

use crate::core::error::Result;
use crate::core::interval::Arm;
use crate::core::pool::parallel_map;
use crate::core::source::{BinTable, ContactSource};
use crate::stats::regions::ArmSet;
use std::collections::HashMap;

/// One row of the expected table
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedRow {
    pub region: Arm,
    pub diag: u64,
    /// Bin pairs at this offset where both weights are finite
    pub n_valid: u64,
    /// Raw contact count over valid pairs
    pub count_sum: f64,
    /// Balanced contact sum over valid pairs
    pub balanced_sum: f64,
    /// `balanced_sum / n_valid`, NaN when `n_valid == 0`
    pub balanced_avg: f64,
}

/// Expected contact frequency keyed by (arm, diagonal)
#[derive(Debug, Clone, Default)]
pub struct ExpectedTable {
    rows: Vec<ExpectedRow>,
    lookup: HashMap<(Arm, u64), usize>,
}

impl ExpectedTable {
    /// Build from rows, recomputing `balanced_avg`.
    ///
    /// Rows sharing a key are merged by summing their counts.
    pub fn from_rows(rows: Vec<ExpectedRow>) -> Self {
        let mut table = Self::default();
        for row in rows {
            table.accumulate(row);
        }
        for row in &mut table.rows {
            row.balanced_avg = average(row.balanced_sum, row.n_valid);
        }
        table
    }

    fn accumulate(&mut self, row: ExpectedRow) {
        let key = (row.region.clone(), row.diag);
        match self.lookup.get(&key) {
            Some(&idx) => {
                let existing = &mut self.rows[idx];
                existing.n_valid += row.n_valid;
                existing.count_sum += row.count_sum;
                existing.balanced_sum += row.balanced_sum;
            }
            None => {
                self.lookup.insert(key, self.rows.len());
                self.rows.push(row);
            }
        }
    }

    pub fn rows(&self) -> &[ExpectedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for `(region, diag)`, if retained
    pub fn get(&self, region: &Arm, diag: u64) -> Option<&ExpectedRow> {
        self.lookup
            .get(&(region.clone(), diag))
            .map(|&idx| &self.rows[idx])
    }

    /// Expected balanced value at `diag` within `region`; NaN when the
    /// offset was ignored or never observed
    pub fn balanced_avg(&self, region: &Arm, diag: u64) -> f64 {
        self.get(region, diag)
            .map(|row| row.balanced_avg)
            .unwrap_or(f64::NAN)
    }

    /// Dense per-diagonal expected values for one arm, `len` entries
    pub fn arm_profile(&self, region: &Arm, len: usize) -> Vec<f64> {
        (0..len as u64)
            .map(|d| self.balanced_avg(region, d))
            .collect()
    }
}

fn average(sum: f64, n_valid: u64) -> f64 {
    if n_valid > 0 {
        sum / n_valid as f64
    } else {
        f64::NAN
    }
}

/// Per-diagonal sums for one arm
fn arm_diagsums<S: ContactSource + ?Sized>(
    source: &S,
    table: &BinTable,
    arm: &Arm,
    ignore_diagonals: usize,
) -> Result<Vec<ExpectedRow>> {
    let range = match table.interval_range(arm) {
        Some(r) if !r.is_empty() => r,
        _ => return Ok(Vec::new()),
    };
    let n = (range.end - range.start) as usize;
    let valid: Vec<bool> = range.clone().map(|id| table.weight(id).is_finite()).collect();

    let mut n_valid = vec![0u64; n];
    for (d, slot) in n_valid.iter_mut().enumerate().skip(ignore_diagonals) {
        *slot = (0..n - d).filter(|&i| valid[i] && valid[i + d]).count() as u64;
    }

    let mut count_sum = vec![0.0f64; n];
    let mut balanced_sum = vec![0.0f64; n];
    for px in source.pixels(arm, arm)? {
        if !range.contains(&px.bin1) || !range.contains(&px.bin2) {
            continue;
        }
        let d = (px.bin2 - px.bin1) as usize;
        if d < ignore_diagonals {
            continue;
        }
        let w1 = table.weight(px.bin1);
        let w2 = table.weight(px.bin2);
        if !(w1.is_finite() && w2.is_finite()) {
            continue;
        }
        count_sum[d] += px.count;
        balanced_sum[d] += px.count * w1 * w2;
    }

    Ok((ignore_diagonals..n)
        .map(|d| ExpectedRow {
            region: arm.clone(),
            diag: d as u64,
            n_valid: n_valid[d],
            count_sum: count_sum[d],
            balanced_sum: balanced_sum[d],
            balanced_avg: average(balanced_sum[d], n_valid[d]),
        })
        .collect())
}

/// Compute the expected table over all arms.
///
/// Offsets below `ignore_diagonals` are left out of the table; 0 keeps the
/// main diagonal, 2 drops the main diagonal and its first neighbour.
pub fn compute_expected<S: ContactSource + ?Sized>(
    source: &S,
    arms: &ArmSet,
    ignore_diagonals: usize,
    threads: usize,
) -> Result<ExpectedTable> {
    let table = BinTable::from_source(source)?;
    let work: Vec<&Arm> = arms.arms().iter().filter(|arm| !arm.is_empty()).collect();

    log::info!(
        "Computing expected over {} arms (ignoring {} diagonals)",
        work.len(),
        ignore_diagonals
    );

    let partials = parallel_map(threads, &work, |arm| {
        arm_diagsums(source, &table, arm, ignore_diagonals)
    })?;

    let expected = ExpectedTable::from_rows(partials.into_iter().flatten().collect());
    log::debug!("Expected table has {} rows", expected.len());
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interval::GenomicInterval;
    use crate::core::source::{Bin, MemoryContactSource, Pixel};

    fn source(weights: &[f64], pixels: Vec<Pixel>) -> MemoryContactSource {
        let bins = weights
            .iter()
            .enumerate()
            .map(|(i, &w)| Bin {
                chrom: "chr1".to_string(),
                start: i as u64 * 10,
                end: (i as u64 + 1) * 10,
                weight: w,
            })
            .collect();
        MemoryContactSource::new(10, bins, pixels).unwrap()
    }

    fn whole_chrom(n: u64) -> ArmSet {
        ArmSet::new(vec![GenomicInterval::new("chr1", 0, n * 10)])
    }

    #[test]
    fn test_ignored_diagonals_are_absent() {
        let src = source(&[1.0; 4], vec![]);
        let exp = compute_expected(&src, &whole_chrom(4), 2, 1).unwrap();
        let diags: Vec<u64> = exp.rows().iter().map(|r| r.diag).collect();
        assert_eq!(diags, vec![2, 3]);
        let arm = GenomicInterval::new("chr1", 0, 40);
        assert!(exp.balanced_avg(&arm, 0).is_nan());
    }

    #[test]
    fn test_masked_bins_reduce_n_valid() {
        let pixels = vec![
            Pixel { bin1: 0, bin2: 1, count: 2.0 },
            Pixel { bin1: 1, bin2: 2, count: 5.0 },
            Pixel { bin1: 2, bin2: 3, count: 3.0 },
        ];
        let src = source(&[2.0, 0.5, f64::NAN, 1.0], pixels);
        let exp = compute_expected(&src, &whole_chrom(4), 0, 2).unwrap();
        let arm = GenomicInterval::new("chr1", 0, 40);

        let d1 = exp.get(&arm, 1).unwrap();
        assert_eq!(d1.n_valid, 1);
        assert_eq!(d1.count_sum, 2.0);
        assert_eq!(d1.balanced_sum, 2.0);
        assert_eq!(d1.balanced_avg, 2.0);

        let d0 = exp.get(&arm, 0).unwrap();
        assert_eq!(d0.n_valid, 3);
        assert_eq!(d0.balanced_avg, 0.0);
    }

    #[test]
    fn test_no_valid_pairs_gives_nan() {
        let src = source(&[f64::NAN, 1.0], vec![]);
        let exp = compute_expected(&src, &whole_chrom(2), 0, 1).unwrap();
        let arm = GenomicInterval::new("chr1", 0, 20);
        let d1 = exp.get(&arm, 1).unwrap();
        assert_eq!(d1.n_valid, 0);
        assert!(d1.balanced_avg.is_nan());
    }

    #[test]
    fn test_duplicate_rows_merge_by_sum() {
        let arm = GenomicInterval::new("chr1", 0, 10);
        let row = ExpectedRow {
            region: arm.clone(),
            diag: 3,
            n_valid: 2,
            count_sum: 4.0,
            balanced_sum: 4.0,
            balanced_avg: 0.0,
        };
        let table = ExpectedTable::from_rows(vec![row.clone(), row]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.balanced_avg(&arm, 3), 2.0);
    }
}
