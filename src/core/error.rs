//! Error types for FastHicTools
//!
//! Defines all error types used throughout the library.

use thiserror::Error;

/// Main error type for FastHicTools operations
#[derive(Debug, Error)]
pub enum HicToolsError {
    /// Invalid parameters, rejected before any work is dispatched
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Inputs that are well-formed but inconsistent with each other
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// A parallel worker failed; the whole batch is aborted
    #[error("Worker failure: {0}")]
    Worker(#[from] WorkerError),

    /// Text input parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid window, bin size or pool parameters
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Bin size must be positive
    #[error("Bin size must be positive")]
    InvalidBinSize,

    /// Window must be positive and at least one bin wide
    #[error("Invalid window {window} for bin size {bin_size}: window must be >= bin size")]
    InvalidWindow { window: u64, bin_size: u64 },

    /// Diamond side length must be positive
    #[error("Diamond side length must be positive")]
    InvalidSideLength,
}

/// Inputs that cannot be processed as given
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataError {
    /// Anchor position at or past the end of its chromosome
    #[error("Position {pos} is outside {chrom} (length {length})")]
    PositionOutOfBounds { chrom: String, pos: u64, length: u64 },

    /// Centromere midpoint past the end of its chromosome
    #[error("Centromere {mid} is outside {chrom} (length {length})")]
    CentromereOutOfBounds { chrom: String, mid: u64, length: u64 },

    /// Anchor lists for the two window sides differ in length
    #[error("Anchor count mismatch: {first} vs {second}")]
    AnchorCountMismatch { first: usize, second: usize },

    /// Arrays whose shapes must agree do not
    #[error("Shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },

    /// Downsampling target would be zero reads
    #[error("Sample '{sample}' has no pairs with distance > {min_distance}")]
    NoQualifyingPairs { sample: String, min_distance: u64 },

    /// Downsampling needs at least one sample
    #[error("No samples to downsample")]
    NoSamples,

    /// Pixel refers to a bin id the bin table does not have
    #[error("Unknown bin id {0}")]
    UnknownBin(u64),
}

/// Failure inside the worker pool
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The rayon pool could not be created
    #[error("Failed to create thread pool: {0}")]
    PoolBuild(String),

    /// A work item failed; carries the index of the item in the batch
    #[error("Work item {item} failed: {source}")]
    Task {
        item: usize,
        #[source]
        source: Box<HicToolsError>,
    },
}

/// Errors raised while reading text tables (pairs, dumps, chrom sizes)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Line with too few fields or bad structure
    #[error("Invalid line {line}: {message}")]
    InvalidLine { line: usize, message: String },

    /// Required column missing from a header
    #[error("Missing column '{0}' in header")]
    MissingColumn(String),

    /// Failed to parse a numeric field
    #[error("Invalid {field} value '{value}' at line {line}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
}

impl WorkerError {
    /// Wrap a failed work item's error
    pub fn task(item: usize, source: HicToolsError) -> Self {
        WorkerError::Task {
            item,
            source: Box::new(source),
        }
    }
}

/// Result type alias for FastHicTools operations
pub type Result<T> = std::result::Result<T, HicToolsError>;
