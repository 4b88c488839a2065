//! Chromosome arms and bin-aligned snipping windows
//!
//! Arms come from splitting every assembled chromosome at its centromere.
//! Windows are built around anchor positions, aligned to bin boundaries and
//! assigned to the arm containing the anchor via a per-chromosome
//! rust-lapper index.

use crate::core::assembly::{is_assembled_chrom, AssemblyMetadata};
use crate::core::error::{ConfigError, DataError, Result};
use crate::core::interval::{Arm, GenomicInterval};
use rust_lapper::{Interval, Lapper};
use std::collections::HashMap;

/// Ordered chromosome arms with a containment index
#[derive(Debug, Clone)]
pub struct ArmSet {
    arms: Vec<Arm>,
    /// chrom -> arm intervals, value is the index into `arms`
    index: HashMap<String, Lapper<u64, usize>>,
    /// chrom -> end of its last arm (the chromosome length)
    chrom_lengths: HashMap<String, u64>,
}

impl ArmSet {
    /// Index an explicit list of arms; empty arms are ignored for lookups
    pub fn new(arms: Vec<Arm>) -> Self {
        let mut by_chrom: HashMap<String, Vec<Interval<u64, usize>>> = HashMap::new();
        let mut chrom_lengths: HashMap<String, u64> = HashMap::new();

        for (idx, arm) in arms.iter().enumerate() {
            let len = chrom_lengths.entry(arm.chrom.clone()).or_insert(0);
            *len = (*len).max(arm.end);
            if arm.is_empty() {
                continue;
            }
            by_chrom.entry(arm.chrom.clone()).or_default().push(Interval {
                start: arm.start,
                stop: arm.end,
                val: idx,
            });
        }

        let index = by_chrom
            .into_iter()
            .map(|(chrom, ivs)| (chrom, Lapper::new(ivs)))
            .collect();

        Self {
            arms,
            index,
            chrom_lengths,
        }
    }

    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    /// Arm whose `[start, end)` contains `pos`
    pub fn find(&self, chrom: &str, pos: u64) -> Option<&Arm> {
        let lapper = self.index.get(chrom)?;
        lapper
            .find(pos, pos + 1)
            .map(|iv| iv.val)
            .min()
            .map(|idx| &self.arms[idx])
    }

    /// Length of `chrom` as covered by its arms
    pub fn chrom_length(&self, chrom: &str) -> Option<u64> {
        self.chrom_lengths.get(chrom).copied()
    }
}

/// Split every assembled chromosome at its centromere midpoint.
///
/// Chromosomes without a centromere record get a midpoint of 0, which
/// leaves a single arm covering the whole chromosome.
pub fn build_arms<A: AssemblyMetadata + ?Sized>(assembly: &A) -> Result<ArmSet> {
    let mut arms = Vec::new();

    for (chrom, length) in assembly.chrom_sizes() {
        if !is_assembled_chrom(&chrom) {
            log::debug!("Skipping unassembled contig {}", chrom);
            continue;
        }
        let mid = assembly.centromere(&chrom).unwrap_or(0);
        if mid > length {
            return Err(DataError::CentromereOutOfBounds { chrom, mid, length }.into());
        }
        if mid == 0 {
            log::debug!("No centromere for {}, using a single arm", chrom);
        } else {
            arms.push(GenomicInterval::new(chrom.clone(), 0, mid));
        }
        arms.push(GenomicInterval::new(chrom, mid, length));
    }

    log::debug!("Built {} chromosome arms", arms.len());
    Ok(ArmSet::new(arms))
}

/// Reject bin sizes and windows that cannot produce a pile
pub fn validate_window(window: u64, bin_size: u64) -> Result<()> {
    if bin_size == 0 {
        return Err(ConfigError::InvalidBinSize.into());
    }
    if window == 0 || window < bin_size {
        return Err(ConfigError::InvalidWindow { window, bin_size }.into());
    }
    Ok(())
}

/// Bin-aligned extent of a window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpan {
    /// Window clipped to `[0, chromosome length]`
    pub interval: GenomicInterval,
    /// Chromosome-local index of the first nominal bin (negative near the start)
    pub first_bin: i64,
    /// Nominal number of bins, identical for every window of one size
    pub n_bins: usize,
}

impl WindowSpan {
    /// Chromosome-local bin indices covered by the nominal window
    pub fn local_bins(&self) -> impl Iterator<Item = i64> {
        self.first_bin..self.first_bin + self.n_bins as i64
    }
}

/// A 1D window around an anchor, with the arm it falls in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window1D {
    pub span: WindowSpan,
    pub anchor: u64,
    pub region: Option<Arm>,
}

/// A pair of windows on the same arm: a candidate sub-matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window2D {
    pub first: WindowSpan,
    pub second: WindowSpan,
    pub region: Arm,
}

impl Window2D {
    /// On-diagonal window of a 1D window, if it has an arm
    pub fn diagonal(window: &Window1D) -> Option<Self> {
        window.region.as_ref().map(|region| Self {
            first: window.span.clone(),
            second: window.span.clone(),
            region: region.clone(),
        })
    }

    pub fn chrom1(&self) -> &str {
        &self.first.interval.chrom
    }

    pub fn chrom2(&self) -> &str {
        &self.second.interval.chrom
    }
}

fn make_window(window: u64, bin_size: u64, chrom: &str, pos: u64, arms: &ArmSet) -> Result<Window1D> {
    let length = arms.chrom_length(chrom);
    if let Some(length) = length {
        if pos >= length {
            return Err(DataError::PositionOutOfBounds {
                chrom: chrom.to_string(),
                pos,
                length,
            }
            .into());
        }
    }

    let flank_bins = (window / bin_size) as i64;
    let center_bin = (pos / bin_size) as i64;
    let first_bin = center_bin - flank_bins;
    let last_bin = center_bin + flank_bins + 1;

    let start = (first_bin.max(0) as u64) * bin_size;
    let mut end = last_bin as u64 * bin_size;
    if let Some(length) = length {
        end = end.min(length);
    }

    Ok(Window1D {
        span: WindowSpan {
            interval: GenomicInterval::new(chrom, start, end),
            first_bin,
            n_bins: (last_bin - first_bin) as usize,
        },
        anchor: pos,
        region: arms.find(chrom, pos).cloned(),
    })
}

/// Build one window per anchor, covering `pos - window .. pos + window`
/// rounded outward to whole bins.
///
/// Anchors on chromosomes without arms keep a `None` region and are
/// returned, not dropped.
pub fn build_windows_1d<S: AsRef<str>>(
    window: u64,
    bin_size: u64,
    anchors: &[(S, u64)],
    arms: &ArmSet,
) -> Result<Vec<Window1D>> {
    validate_window(window, bin_size)?;

    let windows: Vec<Window1D> = anchors
        .iter()
        .map(|(chrom, pos)| make_window(window, bin_size, chrom.as_ref(), *pos, arms))
        .collect::<Result<_>>()?;

    let unassigned = windows.iter().filter(|w| w.region.is_none()).count();
    if unassigned > 0 {
        log::debug!("{} of {} windows have no arm", unassigned, windows.len());
    }
    Ok(windows)
}

/// Build 2D windows from positionally paired anchors, keeping only pairs
/// whose two sides fall in the same arm
pub fn build_windows_2d<S: AsRef<str>>(
    window: u64,
    bin_size: u64,
    anchors1: &[(S, u64)],
    anchors2: &[(S, u64)],
    arms: &ArmSet,
) -> Result<Vec<Window2D>> {
    if anchors1.len() != anchors2.len() {
        return Err(DataError::AnchorCountMismatch {
            first: anchors1.len(),
            second: anchors2.len(),
        }
        .into());
    }

    let first = build_windows_1d(window, bin_size, anchors1, arms)?;
    let second = build_windows_1d(window, bin_size, anchors2, arms)?;

    let total = first.len();
    let windows: Vec<Window2D> = first
        .into_iter()
        .zip(second)
        .filter_map(|(w1, w2)| match (w1.region, w2.region) {
            (Some(r1), Some(r2)) if r1 == r2 => Some(Window2D {
                first: w1.span,
                second: w2.span,
                region: r1,
            }),
            _ => None,
        })
        .collect();

    log::debug!(
        "Kept {} of {} window pairs on a shared arm",
        windows.len(),
        total
    );
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assembly::Assembly;

    fn assembly() -> Assembly {
        let sizes = vec![
            ("chr1".to_string(), 1000),
            ("chr2".to_string(), 600),
            ("chrM".to_string(), 16),
            ("chrUn_gl1".to_string(), 50),
        ];
        let cens = HashMap::from([("chr1".to_string(), 400)]);
        Assembly::new(sizes, cens)
    }

    #[test]
    fn test_build_arms_splits_at_centromere() {
        let arms = build_arms(&assembly()).unwrap();
        assert_eq!(
            arms.arms(),
            &[
                GenomicInterval::new("chr1", 0, 400),
                GenomicInterval::new("chr1", 400, 1000),
                GenomicInterval::new("chr2", 0, 600),
            ]
        );
    }

    #[test]
    fn test_centromere_out_of_bounds() {
        let asm = Assembly::new(
            vec![("chr1".to_string(), 100)],
            HashMap::from([("chr1".to_string(), 150)]),
        );
        assert!(build_arms(&asm).is_err());
    }

    #[test]
    fn test_find_arm() {
        let arms = build_arms(&assembly()).unwrap();
        assert_eq!(arms.find("chr1", 399).unwrap().end, 400);
        assert_eq!(arms.find("chr1", 400).unwrap().start, 400);
        assert!(arms.find("chr1", 1000).is_none());
        assert!(arms.find("chrM", 3).is_none());
    }

    #[test]
    fn test_window_is_bin_aligned() {
        let arms = build_arms(&assembly()).unwrap();
        let windows = build_windows_1d(20, 10, &[("chr1", 155u64)], &arms).unwrap();
        let w = &windows[0];
        assert_eq!(w.span.interval, GenomicInterval::new("chr1", 130, 180));
        assert_eq!(w.span.first_bin, 13);
        assert_eq!(w.span.n_bins, 5);
        assert_eq!(w.region, Some(GenomicInterval::new("chr1", 0, 400)));
    }

    #[test]
    fn test_window_clipped_at_chrom_edges() {
        let arms = build_arms(&assembly()).unwrap();
        let windows =
            build_windows_1d(30, 10, &[("chr2", 5u64), ("chr2", 595u64)], &arms).unwrap();
        assert_eq!(windows[0].span.interval, GenomicInterval::new("chr2", 0, 40));
        assert_eq!(windows[0].span.first_bin, -3);
        assert_eq!(windows[0].span.n_bins, 7);
        assert_eq!(windows[1].span.interval, GenomicInterval::new("chr2", 560, 600));
    }

    #[test]
    fn test_unknown_chrom_kept_without_region() {
        let arms = build_arms(&assembly()).unwrap();
        let windows = build_windows_1d(10, 10, &[("chr9", 55u64)], &arms).unwrap();
        assert_eq!(windows.len(), 1);
        assert!(windows[0].region.is_none());
    }

    #[test]
    fn test_anchor_past_chrom_end_is_error() {
        let arms = build_arms(&assembly()).unwrap();
        let err = build_windows_1d(10, 10, &[("chr2", 600u64)], &arms).unwrap_err();
        assert!(err.to_string().contains("outside chr2"));
    }

    #[test]
    fn test_invalid_window_config() {
        let arms = build_arms(&assembly()).unwrap();
        assert!(build_windows_1d(5, 10, &[("chr1", 5u64)], &arms).is_err());
        assert!(build_windows_1d(10, 0, &[("chr1", 5u64)], &arms).is_err());
    }

    #[test]
    fn test_windows_2d_drop_cross_arm_and_none() {
        let arms = build_arms(&assembly()).unwrap();
        let a1 = [("chr1", 100u64), ("chr1", 100), ("chr9", 10), ("chr2", 50)];
        let a2 = [("chr1", 300u64), ("chr1", 500), ("chr9", 10), ("chr2", 550)];
        let windows = build_windows_2d(10, 10, &a1, &a2, &arms).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].region, GenomicInterval::new("chr1", 0, 400));
        assert_eq!(windows[1].region, GenomicInterval::new("chr2", 0, 600));
        assert_eq!(windows[1].chrom1(), "chr2");
    }

    #[test]
    fn test_windows_2d_length_mismatch() {
        let arms = build_arms(&assembly()).unwrap();
        let err = build_windows_2d(10, 10, &[("chr1", 1u64)], &[], &arms).unwrap_err();
        assert!(err.to_string().contains("Anchor count mismatch"));
    }
}
