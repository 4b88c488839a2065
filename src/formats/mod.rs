//! Text format adapters
//!
//! Adapters for the tables read and written around the analysis stages
//! (.pairs files, `cooler dump` output, TSV results).

pub mod dump;
pub mod pairs;
pub mod table;

pub use dump::{read_bins, read_pixels};
pub use pairs::{read_pairs, split_cis_trans, write_pairs, CisTransPairs, PairRecord, PairsTable};
pub use table::{
    read_anchor_pairs, read_matrix, read_regions, write_arms, write_diamond, write_expected,
    write_matrix, write_pairing_scores,
};
