//! NaN-aware reductions and the pluggable reducer used by pairing scores
//!
//! Every reducer takes a slice that may contain NaN and returns one value.
//! Reducing an empty or all-NaN slice yields NaN, never a panic.

use std::fmt;
use std::str::FromStr;

/// Mean of the non-NaN values (NaN if there are none).
///
/// Infinite values are kept and dominate the result.
pub fn nan_mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (sum, n) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Arithmetic mean; any NaN propagates
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of the non-NaN values (NaN if there are none)
pub fn nan_median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sum of the non-NaN values (NaN if there are none)
pub fn nan_sum(values: &[f64]) -> f64 {
    let mut finite = values.iter().filter(|v| !v.is_nan()).peekable();
    if finite.peek().is_none() {
        return f64::NAN;
    }
    finite.sum()
}

/// Maximum of the non-NaN values (NaN if there are none)
pub fn nan_max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
        .unwrap_or(f64::NAN)
}

/// Summary function applied to one flattened window.
///
/// Implementations must accept NaN entries and return NaN for all-NaN input.
pub trait Reducer: Sync {
    fn reduce(&self, values: &[f64]) -> f64;
}

impl<F> Reducer for F
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    fn reduce(&self, values: &[f64]) -> f64 {
        self(values)
    }
}

/// Built-in reducers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reduction {
    /// Mean of the non-NaN pixels
    #[default]
    Mean,
    /// Plain mean: a single NaN pixel makes the score NaN
    StrictMean,
    NanMedian,
    NanSum,
    NanMax,
}

impl Reducer for Reduction {
    fn reduce(&self, values: &[f64]) -> f64 {
        match self {
            Reduction::Mean => nan_mean(values.iter().copied()),
            Reduction::StrictMean => mean(values),
            Reduction::NanMedian => nan_median(values),
            Reduction::NanSum => nan_sum(values),
            Reduction::NanMax => nan_max(values),
        }
    }
}

impl FromStr for Reduction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean" | "nanmean" => Ok(Reduction::Mean),
            "strict-mean" => Ok(Reduction::StrictMean),
            "median" | "nanmedian" => Ok(Reduction::NanMedian),
            "sum" | "nansum" => Ok(Reduction::NanSum),
            "max" | "nanmax" => Ok(Reduction::NanMax),
            other => Err(format!("unknown reducer '{}'", other)),
        }
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reduction::Mean => "mean",
            Reduction::StrictMean => "strict-mean",
            Reduction::NanMedian => "nanmedian",
            Reduction::NanSum => "nansum",
            Reduction::NanMax => "nanmax",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAN: f64 = f64::NAN;

    #[test]
    fn test_nan_mean_skips_nan_keeps_inf() {
        assert_eq!(nan_mean([1.0, NAN, 3.0]), 2.0);
        assert!(nan_mean([NAN, NAN]).is_nan());
        assert_eq!(nan_mean([1.0, f64::INFINITY]), f64::INFINITY);
    }

    #[test]
    fn test_median_odd_even() {
        assert_eq!(nan_median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(nan_median(&[4.0, 1.0, NAN, 2.0, 3.0]), 2.5);
        assert!(nan_median(&[]).is_nan());
    }

    #[test]
    fn test_all_nan_contract() {
        let all_nan = [NAN, NAN, NAN];
        for r in [
            Reduction::Mean,
            Reduction::StrictMean,
            Reduction::NanMedian,
            Reduction::NanSum,
            Reduction::NanMax,
        ] {
            assert!(r.reduce(&all_nan).is_nan(), "{} should give NaN", r);
            assert!(r.reduce(&[]).is_nan(), "{} should give NaN on empty", r);
        }
    }

    #[test]
    fn test_default_mean_skips_nan() {
        assert_eq!(Reduction::default(), Reduction::Mean);
        assert_eq!(Reduction::default().reduce(&[1.0, NAN, 3.0]), 2.0);
        assert!(Reduction::StrictMean.reduce(&[1.0, NAN]).is_nan());
    }

    #[test]
    fn test_closure_reducer() {
        let first = |v: &[f64]| v.first().copied().unwrap_or(NAN);
        assert_eq!(first.reduce(&[7.0, 1.0]), 7.0);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("NaNMedian".parse::<Reduction>(), Ok(Reduction::NanMedian));
        assert_eq!(Reduction::NanSum.to_string(), "nansum");
        assert_eq!("nanmean".parse::<Reduction>(), Ok(Reduction::Mean));
        assert_eq!("strict-mean".parse::<Reduction>(), Ok(Reduction::StrictMean));
        assert!("mode".parse::<Reduction>().is_err());
    }
}
