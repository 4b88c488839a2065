//! Pairing score
//!
//! For each anchor region, piles up the square window of side
//! `2 * window` centred on its midpoint and reduces the window's pixels to
//! one number. Without explicit regions every unmasked bin of the contact
//! map is scored, giving a genome-wide track.

use crate::core::assembly::AssemblyMetadata;
use crate::core::error::Result;
use crate::core::source::{BinTable, ContactSource};
use crate::stats::pileup::pileup_raw;
use crate::stats::reduce::{nan_median, Reducer};
use crate::stats::regions::{build_arms, build_windows_1d, Window2D};
use crate::stats::reshape::pile_to_table;

/// Default half-width of the scoring window (bp)
pub const DEFAULT_WINDOW: u64 = 40_000;

/// A region to score; `mid` is the anchor, regions without one are skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorRegion {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub mid: Option<u64>,
}

impl AnchorRegion {
    /// Region anchored on its own midpoint
    pub fn centred(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            mid: Some((start + end) / 2),
        }
    }
}

/// One scored region
#[derive(Debug, Clone, PartialEq)]
pub struct PairingScore {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub pairing_score: f64,
}

/// Options for [`pairing_score`]
#[derive(Debug, Clone)]
pub struct PairingScoreOptions {
    /// Half-width of the window around each anchor (bp)
    pub window: u64,
    /// Regions to score; `None` scores every bin with a finite weight
    pub regions: Option<Vec<AnchorRegion>>,
    /// Subtract the median score from every score
    pub normalize: bool,
    /// Worker threads for the pileup (0 = all cores)
    pub threads: usize,
}

impl Default for PairingScoreOptions {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            regions: None,
            normalize: true,
            threads: 1,
        }
    }
}

/// One region per unmasked bin, anchored at the bin midpoint
fn genome_wide_regions(table: &BinTable) -> Vec<AnchorRegion> {
    table
        .bins()
        .iter()
        .filter(|bin| !bin.weight.is_nan())
        .map(|bin| AnchorRegion::centred(bin.chrom.clone(), bin.start, bin.end))
        .collect()
}

/// Subtract the median of the non-NaN scores; NaN scores stay NaN
pub fn median_normalize(scores: &mut [PairingScore]) {
    let values: Vec<f64> = scores.iter().map(|s| s.pairing_score).collect();
    let median = nan_median(&values);
    if median.is_nan() {
        log::warn!("All pairing scores are NaN, skipping median normalization");
        return;
    }
    for score in scores {
        score.pairing_score -= median;
    }
}

/// Compute pairing scores over `options.regions` (or all bins).
///
/// Regions whose anchor has no chromosome arm are dropped from the output.
pub fn pairing_score<S, A, R>(
    source: &S,
    assembly: &A,
    reducer: &R,
    options: &PairingScoreOptions,
) -> Result<Vec<PairingScore>>
where
    S: ContactSource + ?Sized,
    A: AssemblyMetadata + ?Sized,
    R: Reducer + ?Sized,
{
    let bin_size = source.bin_size();
    let regions = match &options.regions {
        Some(regions) => regions.clone(),
        None => genome_wide_regions(&BinTable::from_source(source)?),
    };

    // bin id = position in the anchored region list
    let anchored: Vec<(AnchorRegion, u64)> = regions
        .into_iter()
        .filter_map(|r| r.mid.map(|mid| (r, mid)))
        .collect();
    let anchors: Vec<(&str, u64)> = anchored
        .iter()
        .map(|(r, mid)| (r.chrom.as_str(), *mid))
        .collect();

    let arms = build_arms(assembly)?;
    let windows = build_windows_1d(options.window, bin_size, &anchors, &arms)?;

    let (bin_ids, windows): (Vec<usize>, Vec<Window2D>) = windows
        .iter()
        .enumerate()
        .filter_map(|(bin_id, w)| Window2D::diagonal(w).map(|w2| (bin_id, w2)))
        .unzip();

    let dropped = anchored.len() - windows.len();
    if dropped > 0 {
        log::debug!("{} regions have no chromosome arm and are not scored", dropped);
    }

    let pile = pileup_raw(source, &windows, options.threads)?;
    let table = pile_to_table(&pile);

    let mut scores: Vec<PairingScore> = bin_ids
        .iter()
        .zip(table.rows())
        .map(|(&bin_id, row)| {
            let region = &anchored[bin_id].0;
            let values = row.to_vec();
            PairingScore {
                chrom: region.chrom.clone(),
                start: region.start,
                end: region.end,
                pairing_score: reducer.reduce(&values),
            }
        })
        .collect();

    if options.normalize {
        median_normalize(&mut scores);
    }

    log::info!(
        "Scored {} regions with a {} bp window",
        scores.len(),
        options.window
    );
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assembly::Assembly;
    use crate::core::source::{Bin, MemoryContactSource, Pixel};
    use crate::stats::reduce::Reduction;
    use std::collections::HashMap;

    fn source(weights: &[f64]) -> MemoryContactSource {
        let n = weights.len() as u64;
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
        let pixels = (0..n)
            .flat_map(|i| (i..n).map(move |j| Pixel { bin1: i, bin2: j, count: (i + 1) as f64 }))
            .collect();
        MemoryContactSource::new(10, bins, pixels).unwrap()
    }

    fn assembly(len: u64) -> Assembly {
        Assembly::new(vec![("chr1".to_string(), len)], HashMap::new())
    }

    #[test]
    fn test_genome_wide_skips_masked_bins() {
        let src = source(&[1.0, 1.0, f64::NAN, 1.0, 1.0]);
        let options = PairingScoreOptions {
            window: 10,
            normalize: false,
            ..Default::default()
        };
        let scores = pairing_score(&src, &assembly(50), &Reduction::Mean, &options).unwrap();
        let starts: Vec<u64> = scores.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0, 10, 30, 40]);
    }

    #[test]
    fn test_default_reducer_scores_bins_near_masked_bin() {
        let mut weights = vec![1.0; 10];
        weights[5] = f64::NAN;
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
        let pixels = (0..10u64)
            .flat_map(|i| (i..10).map(move |j| Pixel { bin1: i, bin2: j, count: 1.0 }))
            .collect();
        let src = MemoryContactSource::new(10, bins, pixels).unwrap();
        let options = PairingScoreOptions {
            window: 20,
            normalize: false,
            ..Default::default()
        };

        let scores = pairing_score(&src, &assembly(100), &Reduction::default(), &options).unwrap();
        assert_eq!(scores.len(), 9);
        for s in &scores {
            assert_eq!(s.pairing_score, 1.0, "bin at {}", s.start);
        }

        let strict = pairing_score(&src, &assembly(100), &Reduction::StrictMean, &options).unwrap();
        assert!(strict[0].pairing_score.is_nan());
    }

    #[test]
    fn test_normalized_median_is_zero() {
        let src = source(&[1.0; 8]);
        let options = PairingScoreOptions {
            window: 10,
            ..Default::default()
        };
        let scores = pairing_score(&src, &assembly(80), &Reduction::Mean, &options).unwrap();
        let values: Vec<f64> = scores.iter().map(|s| s.pairing_score).collect();
        assert!(nan_median(&values).abs() < 1e-12);
    }

    #[test]
    fn test_explicit_regions_and_missing_anchor() {
        let src = source(&[1.0; 6]);
        let regions = vec![
            AnchorRegion::centred("chr1", 20, 30),
            AnchorRegion {
                chrom: "chr1".to_string(),
                start: 0,
                end: 10,
                mid: None,
            },
            AnchorRegion::centred("chr7", 0, 10),
        ];
        let options = PairingScoreOptions {
            window: 10,
            regions: Some(regions),
            normalize: false,
            threads: 2,
        };
        let max = |v: &[f64]| v.iter().copied().fold(f64::NAN, f64::max);
        let scores = pairing_score(&src, &assembly(60), &max, &options).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].start, 20);
        // window bins 1..=3, count = lower bin + 1 -> max at (3, 3)
        assert_eq!(scores[0].pairing_score, 4.0);
    }

    #[test]
    fn test_median_normalize_keeps_nan() {
        let mut scores: Vec<PairingScore> = [1.0, f64::NAN, 3.0, 5.0]
            .iter()
            .map(|&v| PairingScore {
                chrom: "chr1".to_string(),
                start: 0,
                end: 1,
                pairing_score: v,
            })
            .collect();
        median_normalize(&mut scores);
        assert_eq!(scores[0].pairing_score, -2.0);
        assert!(scores[1].pairing_score.is_nan());
        assert_eq!(scores[3].pairing_score, 2.0);
    }
}
