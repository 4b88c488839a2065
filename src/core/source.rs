//! Contact matrix access
//!
//! The storage backend is a collaborator behind [`ContactSource`]. This
//! module also provides [`BinTable`] (bin id <-> coordinate mapping and
//! weights) and [`MemoryContactSource`], a small in-memory backend used by
//! tests and by the CLI when reading `cooler dump` tables.

use crate::core::error::{ConfigError, DataError, Result};
use crate::core::interval::GenomicInterval;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

/// One row of the bin table
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    /// Balancing weight; NaN marks a masked bin
    pub weight: f64,
}

/// One stored contact: `bin1 <= bin2`, ids are rows of the bin table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixel {
    pub bin1: u64,
    pub bin2: u64,
    pub count: f64,
}

/// Read-only, thread-safe access to a binned contact matrix
pub trait ContactSource: Sync {
    /// Resolution in base pairs
    fn bin_size(&self) -> u64;

    /// All bins of the genome in storage order
    fn bins(&self) -> Result<Vec<Bin>>;

    /// Stored pixels with `bin1` in `region1` and `bin2` in `region2`.
    ///
    /// Storage is upper-triangular, so callers wanting the symmetric matrix
    /// must also query the transposed pair of regions.
    fn pixels(&self, region1: &GenomicInterval, region2: &GenomicInterval) -> Result<Vec<Pixel>>;
}

/// Bin table indexed by chromosome
#[derive(Debug, Clone)]
pub struct BinTable {
    bin_size: u64,
    bins: Vec<Bin>,
    /// chrom -> (offset of first bin, number of bins)
    chrom_offsets: HashMap<String, (u64, u64)>,
}

impl BinTable {
    /// Index the bins of a source
    pub fn from_source<S: ContactSource + ?Sized>(source: &S) -> Result<Self> {
        Self::new(source.bin_size(), source.bins()?)
    }

    pub fn new(bin_size: u64, bins: Vec<Bin>) -> Result<Self> {
        if bin_size == 0 {
            return Err(ConfigError::InvalidBinSize.into());
        }
        let mut chrom_offsets: HashMap<String, (u64, u64)> = HashMap::new();
        for (idx, bin) in bins.iter().enumerate() {
            chrom_offsets
                .entry(bin.chrom.clone())
                .and_modify(|(_, n)| *n += 1)
                .or_insert((idx as u64, 1));
        }
        Ok(Self {
            bin_size,
            bins,
            chrom_offsets,
        })
    }

    pub fn bin_size(&self) -> u64 {
        self.bin_size
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Global id range of the bins of `chrom`
    pub fn chrom_range(&self, chrom: &str) -> Option<Range<u64>> {
        self.chrom_offsets
            .get(chrom)
            .map(|&(offset, n)| offset..offset + n)
    }

    /// Global bin id for the bin with chromosome-local index `local`
    pub fn global_id(&self, chrom: &str, local: u64) -> Option<u64> {
        let range = self.chrom_range(chrom)?;
        let id = range.start + local;
        (id < range.end).then_some(id)
    }

    /// Global id range of bins overlapping `interval`, clipped to its chromosome
    pub fn interval_range(&self, interval: &GenomicInterval) -> Option<Range<u64>> {
        let chrom = self.chrom_range(&interval.chrom)?;
        let (first, last) = interval.bin_range(self.bin_size);
        let lo = (chrom.start + first).min(chrom.end);
        let hi = (chrom.start + last).min(chrom.end);
        Some(lo..hi)
    }

    /// Balancing weight of a bin (NaN if masked or unknown)
    pub fn weight(&self, id: u64) -> f64 {
        self.bins
            .get(id as usize)
            .map(|b| b.weight)
            .unwrap_or(f64::NAN)
    }
}

/// In-memory contact matrix, upper-triangular pixel storage
#[derive(Debug, Clone)]
pub struct MemoryContactSource {
    table: BinTable,
    pixels: BTreeMap<(u64, u64), f64>,
}

impl MemoryContactSource {
    /// Build from bins and pixels; pixels are folded into the upper triangle
    /// and duplicate entries are summed.
    pub fn new(bin_size: u64, bins: Vec<Bin>, pixels: Vec<Pixel>) -> Result<Self> {
        let table = BinTable::new(bin_size, bins)?;
        let n_bins = table.len() as u64;
        let mut stored = BTreeMap::new();
        for px in pixels {
            let (b1, b2) = if px.bin1 <= px.bin2 {
                (px.bin1, px.bin2)
            } else {
                (px.bin2, px.bin1)
            };
            if b2 >= n_bins {
                return Err(DataError::UnknownBin(b2).into());
            }
            *stored.entry((b1, b2)).or_insert(0.0) += px.count;
        }
        Ok(Self {
            table,
            pixels: stored,
        })
    }

    /// Bin table of this source
    pub fn table(&self) -> &BinTable {
        &self.table
    }

    /// Number of stored (upper-triangular) pixels
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }
}

impl ContactSource for MemoryContactSource {
    fn bin_size(&self) -> u64 {
        self.table.bin_size()
    }

    fn bins(&self) -> Result<Vec<Bin>> {
        Ok(self.table.bins().to_vec())
    }

    fn pixels(&self, region1: &GenomicInterval, region2: &GenomicInterval) -> Result<Vec<Pixel>> {
        let (rows, cols) = match (
            self.table.interval_range(region1),
            self.table.interval_range(region2),
        ) {
            (Some(r), Some(c)) => (r, c),
            _ => return Ok(Vec::new()),
        };
        if rows.is_empty() || cols.is_empty() {
            return Ok(Vec::new());
        }

        let pixels = self
            .pixels
            .range((rows.start, 0)..(rows.end, 0))
            .filter(|((_, b2), _)| cols.contains(b2))
            .map(|(&(bin1, bin2), &count)| Pixel { bin1, bin2, count })
            .collect();
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bins(chrom: &str, n: u64, bin_size: u64) -> Vec<Bin> {
        (0..n)
            .map(|i| Bin {
                chrom: chrom.to_string(),
                start: i * bin_size,
                end: (i + 1) * bin_size,
                weight: 1.0,
            })
            .collect()
    }

    fn source() -> MemoryContactSource {
        let mut all = bins("chr1", 5, 10);
        all.extend(bins("chr2", 3, 10));
        let pixels = vec![
            Pixel { bin1: 0, bin2: 0, count: 4.0 },
            Pixel { bin1: 3, bin2: 1, count: 2.0 },
            Pixel { bin1: 1, bin2: 3, count: 1.0 },
            Pixel { bin1: 5, bin2: 7, count: 9.0 },
        ];
        MemoryContactSource::new(10, all, pixels).unwrap()
    }

    #[test]
    fn test_bin_table_offsets() {
        let src = source();
        let table = src.table();
        assert_eq!(table.chrom_range("chr1"), Some(0..5));
        assert_eq!(table.chrom_range("chr2"), Some(5..8));
        assert_eq!(table.global_id("chr2", 2), Some(7));
        assert_eq!(table.global_id("chr2", 3), None);
    }

    #[test]
    fn test_interval_range_clips_to_chrom() {
        let src = source();
        let iv = GenomicInterval::new("chr2", 15, 100);
        assert_eq!(src.table().interval_range(&iv), Some(6..8));
    }

    #[test]
    fn test_pixels_folded_and_summed() {
        let src = source();
        assert_eq!(src.pixel_count(), 3);
        let chr1 = GenomicInterval::new("chr1", 0, 50);
        let px = src.pixels(&chr1, &chr1).unwrap();
        assert!(px.contains(&Pixel { bin1: 1, bin2: 3, count: 3.0 }));
    }

    #[test]
    fn test_pixels_region_filter() {
        let src = source();
        let rows = GenomicInterval::new("chr1", 10, 20);
        let cols = GenomicInterval::new("chr1", 30, 40);
        assert_eq!(src.pixels(&rows, &cols).unwrap().len(), 1);
        assert!(src.pixels(&cols, &rows).unwrap().is_empty());
        let unknown = GenomicInterval::new("chr9", 0, 10);
        assert!(src.pixels(&unknown, &rows).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_bin_rejected() {
        let err = MemoryContactSource::new(
            10,
            bins("chr1", 2, 10),
            vec![Pixel { bin1: 0, bin2: 5, count: 1.0 }],
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unknown bin id 5"));
    }
}
