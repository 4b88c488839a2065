//! Shared building blocks
//!
//! Genomic value types, the collaborator traits for contact maps and
//! assemblies, the error taxonomy, worker pool scoping and compressed
//! text input.

pub mod assembly;
pub mod error;
pub mod interval;
pub mod io;
pub mod pool;
pub mod source;

pub use assembly::{is_assembled_chrom, Assembly, AssemblyMetadata};
pub use error::{ConfigError, DataError, HicToolsError, ParseError, Result, WorkerError};
pub use interval::{Arm, GenomicInterval};
pub use io::{open_text, CompressionFormat, LineIterator, DEFAULT_BUFFER_SIZE};
pub use pool::{parallel_map, with_pool};
pub use source::{Bin, BinTable, ContactSource, MemoryContactSource, Pixel};
