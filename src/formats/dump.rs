//! `cooler dump` table adapter
//!
//! Reads the bin table (`cooler dump -t bins`: chrom, start, end, weight)
//! and pixel table (`cooler dump -t pixels`: bin1_id, bin2_id, count) of a
//! single-resolution contact map into a [`MemoryContactSource`]. A header
//! row (as written by `--header`) is skipped. Missing or empty weights read
//! as NaN; a bin table without a weight column is treated as unbalanced
//! (weight 1).

use crate::core::error::{ParseError, Result};
use crate::core::io::{open_text, split_fields, LineIterator};
use crate::core::source::{Bin, MemoryContactSource, Pixel};
use std::path::Path;

fn is_header(fields: &[&str], numeric_column: usize) -> bool {
    fields
        .get(numeric_column)
        .map_or(false, |f| f.parse::<f64>().is_err())
}

fn parse_number<T: std::str::FromStr>(
    value: &str,
    field: &'static str,
    line: usize,
) -> std::result::Result<T, ParseError> {
    value.parse::<T>().map_err(|_| ParseError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}

fn parse_weight(value: Option<&&str>, line: usize) -> std::result::Result<f64, ParseError> {
    match value {
        None => Ok(1.0),
        Some(v) if v.is_empty() => Ok(f64::NAN),
        Some(v) => parse_number(v, "weight", line),
    }
}

/// Read a bin table dump
pub fn read_bins<P: AsRef<Path>>(path: P) -> Result<Vec<Bin>> {
    let mut lines = LineIterator::new(open_text(path)?);
    let mut bins = Vec::new();

    while let Some(line) = lines.next_line() {
        let (line_number, line) = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields = split_fields(line);
        if bins.is_empty() && is_header(&fields, 1) {
            continue;
        }
        if fields.len() < 3 {
            return Err(ParseError::InvalidLine {
                line: line_number,
                message: format!("expected 'chrom start end [weight]', got {} fields", fields.len()),
            }
            .into());
        }
        bins.push(Bin {
            chrom: fields[0].to_string(),
            start: parse_number(fields[1], "start", line_number)?,
            end: parse_number(fields[2], "end", line_number)?,
            weight: parse_weight(fields.get(3), line_number)?,
        });
    }

    Ok(bins)
}

/// Read a pixel table dump
pub fn read_pixels<P: AsRef<Path>>(path: P) -> Result<Vec<Pixel>> {
    let mut lines = LineIterator::new(open_text(path)?);
    let mut pixels = Vec::new();

    while let Some(line) = lines.next_line() {
        let (line_number, line) = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields = split_fields(line);
        if pixels.is_empty() && is_header(&fields, 0) {
            continue;
        }
        if fields.len() < 3 {
            return Err(ParseError::InvalidLine {
                line: line_number,
                message: format!("expected 'bin1_id bin2_id count', got {} fields", fields.len()),
            }
            .into());
        }
        pixels.push(Pixel {
            bin1: parse_number(fields[0], "bin1_id", line_number)?,
            bin2: parse_number(fields[1], "bin2_id", line_number)?,
            count: parse_number(fields[2], "count", line_number)?,
        });
    }

    Ok(pixels)
}

impl MemoryContactSource {
    /// Load a contact map from `cooler dump` bin and pixel tables.
    ///
    /// Without an explicit `bin_size` the width of the first bin is used.
    pub fn from_dump<P: AsRef<Path>, Q: AsRef<Path>>(
        bins_path: P,
        pixels_path: Q,
        bin_size: Option<u64>,
    ) -> Result<Self> {
        let bins = read_bins(bins_path)?;
        let pixels = read_pixels(pixels_path)?;
        let bin_size = bin_size
            .or_else(|| bins.first().map(|b| b.end - b.start))
            .unwrap_or(0);
        log::info!(
            "Loaded {} bins and {} pixels at {} bp resolution",
            bins.len(),
            pixels.len(),
            bin_size
        );
        Self::new(bin_size, bins, pixels)
    }
}
