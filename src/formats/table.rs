//! Tab-separated result tables
//!
//! Writers for everything the analysis stages produce, and readers for the
//! small inputs the CLI takes (anchor lists, regions, dense matrices).
//! Non-finite values are written as `NaN`/`inf`/`-inf`, which read back.

use crate::core::error::{DataError, ParseError, Result};
use crate::core::io::{create_text, open_text, split_fields, LineIterator};
use crate::stats::diamond::DiamondProfile;
use crate::stats::expected::ExpectedTable;
use crate::stats::pairing::{AnchorRegion, PairingScore};
use crate::stats::regions::ArmSet;
use ndarray::{Array2, ArrayView2};
use std::io::Write;
use std::path::Path;

/// Positionally paired anchors for 2D windows
pub type AnchorPairs = (Vec<(String, u64)>, Vec<(String, u64)>);

fn parse_u64(value: &str, field: &'static str, line: usize) -> std::result::Result<u64, ParseError> {
    value.parse::<u64>().map_err(|_| ParseError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}

/// Visit the fields of every data line; `#` comments and blank lines are
/// skipped, as is a first line whose `numeric_column` is not a number
fn for_each_row<P, F>(path: P, numeric_column: usize, mut f: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnMut(usize, &[&str]) -> Result<()>,
{
    let mut lines = LineIterator::new(open_text(path)?);
    let mut first = true;
    while let Some(line) = lines.next_line() {
        let (line_number, line) = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields = split_fields(line.trim_end());
        if first {
            first = false;
            let numeric = fields
                .get(numeric_column)
                .map_or(false, |v| v.parse::<f64>().is_ok());
            if !numeric {
                continue;
            }
        }
        f(line_number, &fields)?;
    }
    Ok(())
}

fn too_few(line: usize, expected: &str, found: usize) -> ParseError {
    ParseError::InvalidLine {
        line,
        message: format!("expected '{}', got {} fields", expected, found),
    }
}

/// Write an expected table
pub fn write_expected<P: AsRef<Path>>(path: P, expected: &ExpectedTable) -> Result<()> {
    let mut out = create_text(path)?;
    writeln!(
        out,
        "chrom\tstart\tend\tdiag\tn_valid\tcount.sum\tbalanced.sum\tbalanced.avg"
    )?;
    for row in expected.rows() {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.region.chrom,
            row.region.start,
            row.region.end,
            row.diag,
            row.n_valid,
            row.count_sum,
            row.balanced_sum,
            row.balanced_avg
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Write pairing scores
pub fn write_pairing_scores<P: AsRef<Path>>(path: P, scores: &[PairingScore]) -> Result<()> {
    let mut out = create_text(path)?;
    writeln!(out, "chrom\tstart\tend\tpairing_score")?;
    for s in scores {
        writeln!(out, "{}\t{}\t{}\t{}", s.chrom, s.start, s.end, s.pairing_score)?;
    }
    out.flush()?;
    Ok(())
}

/// Write chromosome arms
pub fn write_arms<P: AsRef<Path>>(path: P, arms: &ArmSet) -> Result<()> {
    let mut out = create_text(path)?;
    writeln!(out, "chrom\tstart\tend")?;
    for arm in arms.arms() {
        writeln!(out, "{}\t{}\t{}", arm.chrom, arm.start, arm.end)?;
    }
    out.flush()?;
    Ok(())
}

/// Write a sliding-diamond profile
pub fn write_diamond<P: AsRef<Path>>(path: P, profile: &DiamondProfile) -> Result<()> {
    let mut out = create_text(path)?;
    writeln!(out, "offset\tvalue")?;
    for (offset, value) in profile.offsets.iter().zip(&profile.values) {
        writeln!(out, "{}\t{}", offset, value)?;
    }
    out.flush()?;
    Ok(())
}

/// Write a dense matrix, one row per line, no header
pub fn write_matrix<P: AsRef<Path>>(path: P, matrix: ArrayView2<'_, f64>) -> Result<()> {
    let mut out = create_text(path)?;
    for row in matrix.rows() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{}", line.join("\t"))?;
    }
    out.flush()?;
    Ok(())
}

/// Read a dense matrix written by [`write_matrix`]
pub fn read_matrix<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let mut values = Vec::new();
    let mut ncols: Option<usize> = None;
    let mut nrows = 0;

    for_each_row(path, 0, |line, fields| {
        let width = *ncols.get_or_insert(fields.len());
        if fields.len() != width {
            return Err(DataError::ShapeMismatch {
                expected: format!("{} columns", width),
                found: format!("{} columns at line {}", fields.len(), line),
            }
            .into());
        }
        for v in fields {
            values.push(v.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                line,
                field: "matrix value",
                value: v.to_string(),
            })?);
        }
        nrows += 1;
        Ok(())
    })?;

    let shape = (nrows, ncols.unwrap_or(0));
    Array2::from_shape_vec(shape, values).map_err(|e| {
        DataError::ShapeMismatch {
            expected: format!("{}x{}", shape.0, shape.1),
            found: e.to_string(),
        }
        .into()
    })
}

/// Read anchors for 2D windows: `chrom1 pos1 chrom2 pos2` per line, or
/// `chrom pos` for on-diagonal windows
pub fn read_anchor_pairs<P: AsRef<Path>>(path: P) -> Result<AnchorPairs> {
    let mut first = Vec::new();
    let mut second = Vec::new();

    for_each_row(path, 1, |line, fields| {
        match fields.len() {
            2 | 3 => {
                let pos = parse_u64(fields[1], "pos", line)?;
                first.push((fields[0].to_string(), pos));
                second.push((fields[0].to_string(), pos));
            }
            n if n >= 4 => {
                first.push((fields[0].to_string(), parse_u64(fields[1], "pos1", line)?));
                second.push((fields[2].to_string(), parse_u64(fields[3], "pos2", line)?));
            }
            n => return Err(too_few(line, "chrom1 pos1 chrom2 pos2", n).into()),
        }
        Ok(())
    })?;

    log::debug!("Read {} anchor pairs", first.len());
    Ok((first, second))
}

/// Read pairing-score regions: `chrom start end [mid]`.
///
/// Without a mid column each region is anchored on its midpoint; a mid of
/// `.`, `NA` or empty leaves the region unanchored.
pub fn read_regions<P: AsRef<Path>>(path: P) -> Result<Vec<AnchorRegion>> {
    let mut regions = Vec::new();

    for_each_row(path, 1, |line, fields| {
        if fields.len() < 3 {
            return Err(too_few(line, "chrom start end [mid]", fields.len()).into());
        }
        let chrom = fields[0];
        let start = parse_u64(fields[1], "start", line)?;
        let end = parse_u64(fields[2], "end", line)?;
        let region = match fields.get(3) {
            None => AnchorRegion::centred(chrom, start, end),
            Some(&"") | Some(&".") | Some(&"NA") => AnchorRegion {
                chrom: chrom.to_string(),
                start,
                end,
                mid: None,
            },
            Some(mid) => AnchorRegion {
                chrom: chrom.to_string(),
                start,
                end,
                mid: Some(parse_u64(mid, "mid", line)?),
            },
        };
        regions.push(region);
        Ok(())
    })?;

    Ok(regions)
}
