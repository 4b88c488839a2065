//! Analysis stages
//!
//! Arms and windows, expected, pileups, the sliding diamond, pile
//! reshaping, pairing scores and pairs downsampling.

pub mod diamond;
pub mod downsample;
pub mod expected;
pub mod pairing;
pub mod pileup;
pub mod reduce;
pub mod regions;
pub mod reshape;

pub use diamond::{sliding_diamond, DiamondProfile};
pub use downsample::{downsample_pairs, DownsampleOptions, TransFilter};
pub use expected::{compute_expected, ExpectedRow, ExpectedTable};
pub use pairing::{pairing_score, AnchorRegion, PairingScore, PairingScoreOptions};
pub use pileup::{pileup, pileup_obs_exp, pileup_raw, Pile, PileupMode};
pub use reduce::{nan_mean, nan_median, Reducer, Reduction};
pub use regions::{build_arms, build_windows_1d, build_windows_2d, ArmSet, Window1D, Window2D, WindowSpan};
pub use reshape::{pile_to_table, table_to_pile};
