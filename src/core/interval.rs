//! Genomic interval value types
//!
//! Half-open, 0-based intervals used for arms, windows and bins.

use std::fmt;

/// A half-open genomic interval `[start, end)` on one chromosome
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenomicInterval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

/// A chromosome arm: one side of the centromere
pub type Arm = GenomicInterval;

impl GenomicInterval {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    /// Length in base pairs
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Check if the interval covers no bases
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check whether `pos` falls inside `[start, end)` on `chrom`
    pub fn contains(&self, chrom: &str, pos: u64) -> bool {
        self.chrom == chrom && self.start <= pos && pos < self.end
    }

    /// Bin index range `[first, last)` overlapped by this interval
    pub fn bin_range(&self, bin_size: u64) -> (u64, u64) {
        let first = self.start / bin_size;
        let last = self.end.div_ceil(bin_size);
        (first, last)
    }
}

impl fmt::Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_half_open() {
        let iv = GenomicInterval::new("chr1", 100, 200);
        assert!(iv.contains("chr1", 100));
        assert!(iv.contains("chr1", 199));
        assert!(!iv.contains("chr1", 200));
        assert!(!iv.contains("chr2", 150));
    }

    #[test]
    fn test_bin_range_rounds_outward() {
        let iv = GenomicInterval::new("chr1", 15, 35);
        assert_eq!(iv.bin_range(10), (1, 4));
        let aligned = GenomicInterval::new("chr1", 10, 30);
        assert_eq!(aligned.bin_range(10), (1, 3));
    }

    #[test]
    fn test_display() {
        assert_eq!(GenomicInterval::new("chrX", 0, 5).to_string(), "chrX:0-5");
    }
}
