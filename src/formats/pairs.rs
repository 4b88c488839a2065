//! .pairs / .pairsam adapter
//!
//! Loads a pairs file into memory, keeping every field as text and parsing
//! only the coordinates. Column order comes from the `#columns:` header line;
//! files without one use the standard pairs layout. Only suitable for files
//! that fit in memory.

use crate::core::error::{ParseError, Result};
use crate::core::io::{create_text, open_text, split_tabs, LineIterator};
use std::io::{BufRead, Write};
use std::path::Path;

/// Column layout of a pairs file without a `#columns:` line
pub const DEFAULT_COLUMNS: [&str; 7] = [
    "readID", "chrom1", "pos1", "chrom2", "pos2", "strand1", "strand2",
];

const COLUMNS_PREFIX: &str = "#columns:";

/// One read pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRecord {
    /// All fields of the line, in column order
    pub fields: Vec<String>,
    pub chrom1: String,
    pub pos1: u64,
    pub chrom2: String,
    pub pos2: u64,
}

impl PairRecord {
    /// Both sides on the same chromosome
    pub fn is_cis(&self) -> bool {
        self.chrom1 == self.chrom2
    }

    /// Separation of the two sides in bp
    pub fn distance(&self) -> u64 {
        self.pos1.abs_diff(self.pos2)
    }
}

/// Positions of the coordinate columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    chrom1: usize,
    pos1: usize,
    chrom2: usize,
    pos2: usize,
}

impl ColumnLayout {
    fn from_columns(columns: &[String]) -> std::result::Result<Self, ParseError> {
        let find = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| ParseError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            chrom1: find("chrom1")?,
            pos1: find("pos1")?,
            chrom2: find("chrom2")?,
            pos2: find("pos2")?,
        })
    }
}

/// An in-memory pairs table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairsTable {
    /// Header lines other than `#columns:`, verbatim
    header: Vec<String>,
    columns: Vec<String>,
    layout: ColumnLayout,
    rows: Vec<PairRecord>,
}

impl PairsTable {
    /// Empty table with the given columns
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let layout = ColumnLayout::from_columns(&columns)?;
        Ok(Self {
            header: Vec::new(),
            columns,
            layout,
            rows: Vec::new(),
        })
    }

    /// Empty table with [`DEFAULT_COLUMNS`]
    pub fn with_default_columns() -> Self {
        let columns: Vec<String> = DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect();
        Self {
            header: Vec::new(),
            columns,
            layout: ColumnLayout {
                chrom1: 1,
                pos1: 2,
                chrom2: 3,
                pos2: 4,
            },
            rows: Vec::new(),
        }
    }

    /// Same header and columns with different rows
    pub fn with_rows(&self, rows: Vec<PairRecord>) -> Self {
        Self {
            header: self.header.clone(),
            columns: self.columns.clone(),
            layout: self.layout,
            rows,
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[PairRecord] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<PairRecord> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parse one data line's fields and append the record
    pub fn push_fields(&mut self, fields: Vec<String>, line: usize) -> Result<()> {
        if fields.len() < self.columns.len() {
            return Err(ParseError::InvalidLine {
                line,
                message: format!(
                    "expected {} fields, found {}",
                    self.columns.len(),
                    fields.len()
                ),
            }
            .into());
        }
        let parse_pos = |idx: usize, field: &'static str| {
            fields[idx].parse::<u64>().map_err(|_| ParseError::InvalidNumber {
                line,
                field,
                value: fields[idx].clone(),
            })
        };
        let pos1 = parse_pos(self.layout.pos1, "pos1")?;
        let pos2 = parse_pos(self.layout.pos2, "pos2")?;
        let record = PairRecord {
            chrom1: fields[self.layout.chrom1].clone(),
            chrom2: fields[self.layout.chrom2].clone(),
            pos1,
            pos2,
            fields,
        };
        self.rows.push(record);
        Ok(())
    }

    /// Append a pair given only its coordinates; other fields are "."
    pub fn push_pair(&mut self, chrom1: &str, pos1: u64, chrom2: &str, pos2: u64) {
        let mut fields = vec![".".to_string(); self.columns.len()];
        fields[self.layout.chrom1] = chrom1.to_string();
        fields[self.layout.pos1] = pos1.to_string();
        fields[self.layout.chrom2] = chrom2.to_string();
        fields[self.layout.pos2] = pos2.to_string();
        self.rows.push(PairRecord {
            fields,
            chrom1: chrom1.to_string(),
            pos1,
            chrom2: chrom2.to_string(),
            pos2,
        });
    }
}

/// The pairs of one sample split by chromosome equality
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CisTransPairs {
    pub cis: PairsTable,
    pub trans: PairsTable,
}

impl CisTransPairs {
    /// Total number of pairs
    pub fn len(&self) -> usize {
        self.cis.len() + self.trans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a pairs table from a reader
pub fn parse_pairs<R: BufRead>(reader: R) -> Result<PairsTable> {
    let mut lines = LineIterator::new(reader);
    let mut header = Vec::new();
    let mut table: Option<PairsTable> = None;
    let mut in_data = false;

    while let Some(line) = lines.next_line() {
        let (line_number, line) = line?;
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') {
            if in_data {
                return Err(ParseError::InvalidLine {
                    line: line_number,
                    message: "header line after data".to_string(),
                }
                .into());
            }
            if let Some(rest) = line.strip_prefix(COLUMNS_PREFIX) {
                if table.is_some() {
                    return Err(ParseError::InvalidLine {
                        line: line_number,
                        message: "duplicate #columns: line".to_string(),
                    }
                    .into());
                }
                let columns = rest.split_whitespace().map(String::from).collect();
                let mut parsed = PairsTable::new(columns)?;
                parsed.header = std::mem::take(&mut header);
                table = Some(parsed);
            } else if let Some(parsed) = table.as_mut() {
                parsed.header.push(line.to_string());
            } else {
                header.push(line.to_string());
            }
            continue;
        }
        in_data = true;

        let table = table.get_or_insert_with(|| {
            log::debug!("No #columns: header, using the default pairs layout");
            let mut default = PairsTable::with_default_columns();
            default.header = std::mem::take(&mut header);
            default
        });
        let fields = split_tabs(line).into_iter().map(String::from).collect();
        table.push_fields(fields, line_number)?;
    }

    let table = table.unwrap_or_else(|| {
        let mut empty = PairsTable::with_default_columns();
        empty.header = header;
        empty
    });
    Ok(table)
}

/// Load a `.pairs`/`.pairsam` file (plain, gzip or bzip2)
pub fn read_pairs<P: AsRef<Path>>(path: P) -> Result<PairsTable> {
    let path = path.as_ref();
    let table = parse_pairs(open_text(path)?)?;
    log::info!("Loaded {} pairs from {}", table.len(), path.display());
    Ok(table)
}

/// Partition a table into same-chromosome and cross-chromosome pairs
pub fn split_cis_trans(table: &PairsTable) -> CisTransPairs {
    let (cis, trans): (Vec<PairRecord>, Vec<PairRecord>) =
        table.rows().iter().cloned().partition(|r| r.is_cis());
    CisTransPairs {
        cis: table.with_rows(cis),
        trans: table.with_rows(trans),
    }
}

/// Write header, `#columns:` line and rows
pub fn write_pairs_to<W: Write>(writer: &mut W, table: &PairsTable) -> Result<()> {
    for line in table.header() {
        writeln!(writer, "{}", line)?;
    }
    writeln!(writer, "{} {}", COLUMNS_PREFIX, table.columns().join(" "))?;
    for row in table.rows() {
        writeln!(writer, "{}", row.fields.join("\t"))?;
    }
    Ok(())
}

/// Write a pairs file; a `.gz` path is gzip-compressed
pub fn write_pairs<P: AsRef<Path>>(path: P, table: &PairsTable) -> Result<()> {
    let mut writer = create_text(path)?;
    write_pairs_to(&mut writer, table)?;
    writer.flush()?;
    Ok(())
}
