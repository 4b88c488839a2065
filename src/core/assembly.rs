//! Genome assembly metadata
//!
//! Chromosome sizes and centromere midpoints are supplied by the caller
//! through [`AssemblyMetadata`]; nothing here fetches a genome build.

use crate::core::error::{ParseError, Result};
use crate::core::io::{open_text, split_fields, LineIterator};
use std::collections::HashMap;
use std::path::Path;

/// Read-only view of an assembly's chromosome sizes and centromeres
pub trait AssemblyMetadata {
    /// Chromosomes and their lengths, in assembly order
    fn chrom_sizes(&self) -> Vec<(String, u64)>;

    /// Centromere midpoint of `chrom`, if known
    fn centromere(&self, chrom: &str) -> Option<u64>;
}

/// In-memory assembly description
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    sizes: Vec<(String, u64)>,
    centromeres: HashMap<String, u64>,
}

impl Assembly {
    pub fn new(sizes: Vec<(String, u64)>, centromeres: HashMap<String, u64>) -> Self {
        Self { sizes, centromeres }
    }

    /// Load a chromsizes table (`chrom length`) and an optional centromere
    /// table (`chrom mid` or `chrom start end`, midpoint taken)
    pub fn from_files<P: AsRef<Path>>(chromsizes: P, centromeres: Option<P>) -> Result<Self> {
        let sizes = read_chrom_sizes(chromsizes)?;
        let centromeres = match centromeres {
            Some(path) => read_centromeres(path)?,
            None => HashMap::new(),
        };
        log::debug!(
            "Loaded assembly with {} chromosomes, {} centromeres",
            sizes.len(),
            centromeres.len()
        );
        Ok(Self { sizes, centromeres })
    }

    /// Length of `chrom`, if present
    pub fn chrom_length(&self, chrom: &str) -> Option<u64> {
        self.sizes
            .iter()
            .find(|(name, _)| name == chrom)
            .map(|(_, len)| *len)
    }
}

impl AssemblyMetadata for Assembly {
    fn chrom_sizes(&self) -> Vec<(String, u64)> {
        self.sizes.clone()
    }

    fn centromere(&self, chrom: &str) -> Option<u64> {
        self.centromeres.get(chrom).copied()
    }
}

/// Check whether a contig is an assembled chromosome.
///
/// Unplaced/unlocalized/alt contigs (`chrUn_...`, `..._random`, `..._alt`)
/// and the mitochondrial genome are excluded.
pub fn is_assembled_chrom(chrom: &str) -> bool {
    if chrom.contains('_') {
        return false;
    }
    let short = chrom
        .strip_prefix("chr")
        .or_else(|| chrom.strip_prefix("Chr"))
        .unwrap_or(chrom);
    !matches!(short, "M" | "MT" | "m")
}

fn parse_u64(value: &str, field: &'static str, line: usize) -> std::result::Result<u64, ParseError> {
    value.parse::<u64>().map_err(|_| ParseError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}

fn read_chrom_sizes<P: AsRef<Path>>(path: P) -> Result<Vec<(String, u64)>> {
    let mut lines = LineIterator::new(open_text(path)?);
    let mut sizes = Vec::new();

    while let Some(line) = lines.next_line() {
        let (line_number, line) = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields = split_fields(trimmed);
        if fields.len() < 2 {
            return Err(ParseError::InvalidLine {
                line: line_number,
                message: format!("expected 'chrom length', got {} fields", fields.len()),
            }
            .into());
        }
        let length = parse_u64(fields[1], "length", line_number)?;
        sizes.push((fields[0].to_string(), length));
    }

    Ok(sizes)
}

fn read_centromeres<P: AsRef<Path>>(path: P) -> Result<HashMap<String, u64>> {
    let mut lines = LineIterator::new(open_text(path)?);
    let mut centromeres = HashMap::new();

    while let Some(line) = lines.next_line() {
        let (line_number, line) = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields = split_fields(trimmed);
        let mid = match fields.len() {
            2 => parse_u64(fields[1], "mid", line_number)?,
            n if n >= 3 => {
                let start = parse_u64(fields[1], "start", line_number)?;
                let end = parse_u64(fields[2], "end", line_number)?;
                (start + end) / 2
            }
            n => {
                return Err(ParseError::InvalidLine {
                    line: line_number,
                    message: format!("expected 'chrom mid' or 'chrom start end', got {} fields", n),
                }
                .into())
            }
        };
        centromeres.insert(fields[0].to_string(), mid);
    }

    Ok(centromeres)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_is_assembled_chrom() {
        assert!(is_assembled_chrom("chr1"));
        assert!(is_assembled_chrom("chrX"));
        assert!(is_assembled_chrom("2"));
        assert!(!is_assembled_chrom("chrM"));
        assert!(!is_assembled_chrom("MT"));
        assert!(!is_assembled_chrom("chrUn_gl000220"));
        assert!(!is_assembled_chrom("chr1_gl000191_random"));
    }

    #[test]
    fn test_from_files() -> Result<()> {
        let mut sizes = NamedTempFile::new()?;
        writeln!(sizes, "chr1\t1000\nchr2\t500\n# comment")?;
        let mut cens = NamedTempFile::new()?;
        writeln!(cens, "chr1\t400\t600\nchr2 120")?;

        let assembly = Assembly::from_files(sizes.path(), Some(cens.path()))?;
        assert_eq!(
            assembly.chrom_sizes(),
            vec![("chr1".to_string(), 1000), ("chr2".to_string(), 500)]
        );
        assert_eq!(assembly.centromere("chr1"), Some(500));
        assert_eq!(assembly.centromere("chr2"), Some(120));
        assert_eq!(assembly.centromere("chr3"), None);
        assert_eq!(assembly.chrom_length("chr2"), Some(500));
        Ok(())
    }

    #[test]
    fn test_bad_length_reports_line() {
        let mut sizes = NamedTempFile::new().unwrap();
        writeln!(sizes, "chr1\t1000\nchr2\tabc").unwrap();
        let err = Assembly::from_files(sizes.path(), None).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
