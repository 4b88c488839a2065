//! FastHicTools - Hi-C contact map statistics
//!
//! Derived summaries of binned, balanced Hi-C contact maps.
//!
//! # Features
//!
//! - Expected contacts per chromosome arm and diagonal
//! - Parallel pileups of balanced or observed/expected windows with rayon
//! - Sliding-diamond and pairing-score summaries
//! - Read-pair downsampling to a common depth
//! - Support for compressed inputs (gzip, bzip2)
//!
//! # Example
//!
//! ```ignore
//! use fast_hictools::{Assembly, MemoryContactSource, build_arms, build_windows_2d, pileup_raw};
//!
//! let source = MemoryContactSource::from_dump("bins.tsv", "pixels.tsv", None)?;
//! let assembly = Assembly::from_files("hg19.chrom.sizes", Some("centromeres.tsv"))?;
//! let arms = build_arms(&assembly)?;
//!
//! let anchors = [("chr1", 1_000_000u64)];
//! let windows = build_windows_2d(100_000, source.bin_size(), &anchors, &anchors, &arms)?;
//! let pile = pileup_raw(&source, &windows, 4)?;
//! let mean = pile.collapse();
//! ```

pub mod core;
pub mod formats;
pub mod stats;

// Re-export commonly used types
pub use core::{
    Arm, Assembly, AssemblyMetadata, Bin, ContactSource, GenomicInterval, HicToolsError,
    MemoryContactSource, Pixel, Result,
};
pub use stats::{
    build_arms, build_windows_1d, build_windows_2d, compute_expected, downsample_pairs,
    pairing_score, pile_to_table, pileup, pileup_obs_exp, pileup_raw, sliding_diamond,
    table_to_pile, ArmSet, ExpectedTable, Pile, PileupMode, Reducer, Reduction,
};
