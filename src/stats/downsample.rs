//! Read-pair downsampling across samples
//!
//! Brings every sample down to the same number of read pairs: pairs closer
//! than a minimum distance are dropped, then each sample is randomly
//! subsampled (without replacement, cis and trans together) to the size of
//! the smallest filtered sample.

use crate::core::error::{DataError, Result};
use crate::formats::pairs::{CisTransPairs, PairRecord};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Default minimum separation of the two sides of a pair (bp)
pub const DEFAULT_MIN_DISTANCE: u64 = 10_000;

/// How the distance filter treats cross-chromosome pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransFilter {
    /// Filter trans pairs on `|pos2 - pos1|` like cis pairs.
    ///
    /// The positions of a trans pair lie on different chromosomes, so this
    /// drops an arbitrary subset of them; removals are logged as warnings.
    #[default]
    ApplyDistance,
    /// Keep every trans pair regardless of distance
    KeepAll,
}

/// Options for [`downsample_pairs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownsampleOptions {
    /// Pairs must be separated by strictly more than this (bp)
    pub min_distance: u64,
    pub trans_filter: TransFilter,
    /// Seed for a reproducible draw; entropy-seeded when `None`
    pub seed: Option<u64>,
}

impl Default for DownsampleOptions {
    fn default() -> Self {
        Self {
            min_distance: DEFAULT_MIN_DISTANCE,
            trans_filter: TransFilter::default(),
            seed: None,
        }
    }
}

/// A pair tagged with the table it came from
#[derive(Debug, Clone, Copy)]
struct Tagged<'a> {
    cis: bool,
    record: &'a PairRecord,
}

/// Concatenate cis then trans rows and apply the distance filter
fn filtered<'a>(name: &str, pairs: &'a CisTransPairs, options: &DownsampleOptions) -> Vec<Tagged<'a>> {
    let cis = pairs
        .cis
        .rows()
        .iter()
        .filter(|r| r.distance() > options.min_distance)
        .map(|record| Tagged { cis: true, record });

    let trans: Vec<Tagged<'a>> = pairs
        .trans
        .rows()
        .iter()
        .filter(|r| match options.trans_filter {
            TransFilter::ApplyDistance => r.distance() > options.min_distance,
            TransFilter::KeepAll => true,
        })
        .map(|record| Tagged { cis: false, record })
        .collect();

    let removed_trans = pairs.trans.len() - trans.len();
    if removed_trans > 0 {
        log::warn!(
            "Sample '{}': distance filter removed {} of {} trans pairs; \
             trans positions lie on different chromosomes",
            name,
            removed_trans,
            pairs.trans.len()
        );
    }

    cis.chain(trans).collect()
}

/// Downsample every sample to the smallest distance-filtered pair count.
///
/// Sampled rows keep their file order within the cis and trans tables.
/// Samples are drawn in key order from one generator, so a fixed seed
/// reproduces the whole result.
pub fn downsample_pairs(
    samples: &BTreeMap<String, CisTransPairs>,
    options: &DownsampleOptions,
) -> Result<BTreeMap<String, CisTransPairs>> {
    if samples.is_empty() {
        return Err(DataError::NoSamples.into());
    }

    let pools: Vec<(&String, &CisTransPairs, Vec<Tagged<'_>>)> = samples
        .iter()
        .map(|(name, pairs)| (name, pairs, filtered(name, pairs, options)))
        .collect();

    for (name, _, pool) in &pools {
        log::debug!("Sample '{}': {} pairs pass the distance filter", name, pool.len());
    }

    let (smallest, min_reads) = pools
        .iter()
        .map(|(name, _, pool)| (*name, pool.len()))
        .min_by_key(|(_, n)| *n)
        .ok_or(DataError::NoSamples)?;
    if min_reads == 0 {
        return Err(DataError::NoQualifyingPairs {
            sample: smallest.clone(),
            min_distance: options.min_distance,
        }
        .into());
    }

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut result = BTreeMap::new();
    for (name, pairs, pool) in pools {
        let mut picked = sample(&mut rng, pool.len(), min_reads).into_vec();
        picked.sort_unstable();

        let mut cis = Vec::new();
        let mut trans = Vec::new();
        for idx in picked {
            let tagged = pool[idx];
            if tagged.cis {
                cis.push(tagged.record.clone());
            } else {
                trans.push(tagged.record.clone());
            }
        }
        log::debug!(
            "Sample '{}': kept {} cis and {} trans pairs",
            name,
            cis.len(),
            trans.len()
        );
        result.insert(
            name.clone(),
            CisTransPairs {
                cis: pairs.cis.with_rows(cis),
                trans: pairs.trans.with_rows(trans),
            },
        );
    }

    log::info!("Downsampled {} samples to {} pairs each", result.len(), min_reads);
    Ok(result)
}
