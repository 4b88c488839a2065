//! FastHicTools CLI entry point
//!
//! Hi-C contact map statistics from `cooler dump` tables and .pairs files.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fast_hictools::core::{Assembly, ContactSource, MemoryContactSource};
use fast_hictools::formats::{self, pairs::split_cis_trans};
use fast_hictools::stats::{
    build_arms, build_windows_2d, compute_expected, downsample_pairs, pairing_score, pileup,
    sliding_diamond, DownsampleOptions, PairingScoreOptions, PileupMode, Reduction, TransFilter,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Pileup normalization (CLI enum)
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum PileupModeArg {
    /// Balanced counts
    #[default]
    #[value(name = "raw")]
    Raw,
    /// Balanced counts divided by the expected
    #[value(name = "obs-exp")]
    ObsExp,
}

#[derive(Parser)]
#[command(name = "fast-hictools")]
#[command(about = "Hi-C contact map statistics: expected, pileups, pairing scores")]
#[command(version)]
#[command(author = "FastHicTools Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Chromosome sizes and centromeres
#[derive(Args)]
struct AssemblyArgs {
    /// Chromosome sizes table (chrom, length)
    #[arg(long)]
    chromsizes: PathBuf,
    /// Centromere table (chrom, mid) or (chrom, start, end)
    #[arg(long)]
    centromeres: Option<PathBuf>,
}

impl AssemblyArgs {
    fn load(&self) -> anyhow::Result<Assembly> {
        Assembly::from_files(self.chromsizes.as_path(), self.centromeres.as_deref())
            .with_context(|| format!("Failed to load assembly from {:?}", self.chromsizes))
    }
}

/// Contact map as `cooler dump` tables
#[derive(Args)]
struct ContactMapArgs {
    /// Bin table (`cooler dump -t bins`)
    #[arg(long)]
    bins: PathBuf,
    /// Pixel table (`cooler dump -t pixels`)
    #[arg(long)]
    pixels: PathBuf,
    /// Resolution in bp (default: width of the first bin)
    #[arg(long)]
    bin_size: Option<u64>,
}

impl ContactMapArgs {
    fn load(&self) -> anyhow::Result<MemoryContactSource> {
        let start = Instant::now();
        eprintln!("Loading contact map: {:?}", self.bins);
        let source = MemoryContactSource::from_dump(&self.bins, &self.pixels, self.bin_size)
            .context("Failed to load contact map")?;
        eprintln!("Contact map loaded in {:.2}s", start.elapsed().as_secs_f64());
        Ok(source)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Split chromosomes into arms at their centromeres
    Arms {
        #[command(flatten)]
        assembly: AssemblyArgs,
        /// Output file (default: arms.tsv)
        output: Option<PathBuf>,
    },
    /// Expected contacts per arm and diagonal
    Expected {
        #[command(flatten)]
        map: ContactMapArgs,
        #[command(flatten)]
        assembly: AssemblyArgs,
        /// Number of diagonals to leave out, starting from the main one
        #[arg(long = "ignore-diags", default_value = "2")]
        ignore_diags: usize,
        /// Number of threads (0: number of CPUs)
        #[arg(short = 't', long, default_value = "1")]
        threads: usize,
        /// Output file (default: expected.tsv)
        output: Option<PathBuf>,
    },
    /// Average sub-matrix around pairs of anchors
    Pileup {
        #[command(flatten)]
        map: ContactMapArgs,
        #[command(flatten)]
        assembly: AssemblyArgs,
        /// Anchors (chrom1, pos1, chrom2, pos2) or (chrom, pos)
        #[arg(long)]
        anchors: PathBuf,
        /// Half-width of each window (bp)
        #[arg(short = 'w', long, default_value = "100000")]
        window: u64,
        /// Pixel normalization
        #[arg(long, default_value = "raw")]
        mode: PileupModeArg,
        /// Diagonals left out of the expected (obs-exp mode)
        #[arg(long = "ignore-diags", default_value = "2")]
        ignore_diags: usize,
        /// Number of threads (0: number of CPUs)
        #[arg(short = 't', long, default_value = "1")]
        threads: usize,
        /// Output file (default: pileup.tsv)
        output: Option<PathBuf>,
    },
    /// Genome-wide or per-region pairing score
    PairingScore {
        #[command(flatten)]
        map: ContactMapArgs,
        #[command(flatten)]
        assembly: AssemblyArgs,
        /// Half-width of the scoring window (bp)
        #[arg(short = 'w', long, default_value = "40000")]
        window: u64,
        /// Summary of each window: mean (NaN-skipping), strict-mean, nanmedian, nansum, nanmax
        #[arg(long, default_value = "mean")]
        reducer: Reduction,
        /// Keep raw scores instead of subtracting the median
        #[arg(long)]
        no_normalize: bool,
        /// Regions to score (chrom, start, end, [mid]); default: every bin
        #[arg(long)]
        regions: Option<PathBuf>,
        /// Number of threads (0: number of CPUs)
        #[arg(short = 't', long, default_value = "1")]
        threads: usize,
        /// Output file (default: pairing_score.tsv)
        output: Option<PathBuf>,
    },
    /// Sliding diamond along the diagonal of a matrix
    Diamond {
        /// Input matrix (tab-separated, e.g. a pileup output)
        input: PathBuf,
        /// Side length of the diamond in bins
        #[arg(long = "side-len", default_value = "6")]
        side_len: usize,
        /// Output file (default: diamond.tsv)
        output: Option<PathBuf>,
    },
    /// Downsample .pairs files to a common number of pairs
    Downsample {
        /// Sample as NAME=PATH (repeat for each sample)
        #[arg(long = "sample", value_parser = parse_sample, required = true)]
        samples: Vec<(String, PathBuf)>,
        /// Minimum distance between the two sides of a pair (bp)
        #[arg(long = "min-distance", default_value = "10000")]
        min_distance: u64,
        /// Seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,
        /// Exempt trans pairs from the distance filter
        #[arg(long)]
        keep_trans: bool,
        /// Output directory (default: current directory)
        #[arg(short = 'o', long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn parse_sample(value: &str) -> Result<(String, PathBuf), String> {
    let (name, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{}'", value))?;
    if name.is_empty() || path.is_empty() {
        return Err(format!("expected NAME=PATH, got '{}'", value));
    }
    Ok((name.to_string(), PathBuf::from(path)))
}

fn output_or(output: Option<PathBuf>, default: &str) -> PathBuf {
    output.unwrap_or_else(|| PathBuf::from(default))
}

fn write_sample(dir: &Path, name: &str, kind: &str, table: &formats::PairsTable) -> anyhow::Result<()> {
    let path = dir.join(format!("{}.{}.pairs.gz", name, kind));
    formats::write_pairs(&path, table).with_context(|| format!("Failed to write {:?}", path))?;
    eprintln!("  {:<10} {:>6} {:>10} pairs -> {:?}", name, kind, table.len(), path);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Commands::Arms { assembly, output } => {
            let assembly = assembly.load()?;
            let output_path = output_or(output, "arms.tsv");
            let arms = build_arms(&assembly)?;
            formats::write_arms(&output_path, &arms)?;

            eprintln!("\n=== Arm Statistics ===");
            eprintln!("Arms written:    {}", arms.len());
            eprintln!("Output:          {:?}", output_path);
        }

        Commands::Expected { map, assembly, ignore_diags, threads, output } => {
            let source = map.load()?;
            let assembly = assembly.load()?;
            let output_path = output_or(output, "expected.tsv");

            let arms = build_arms(&assembly)?;
            let expected = compute_expected(&source, &arms, ignore_diags, threads)?;
            formats::write_expected(&output_path, &expected)?;

            eprintln!("\n=== Expected Statistics ===");
            eprintln!("Arms:            {}", arms.len());
            eprintln!("Rows:            {}", expected.len());
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Pileup { map, assembly, anchors, window, mode, ignore_diags, threads, output } => {
            let source = map.load()?;
            let assembly = assembly.load()?;
            let output_path = output_or(output, "pileup.tsv");

            let arms = build_arms(&assembly)?;
            let (first, second) = formats::read_anchor_pairs(&anchors)
                .with_context(|| format!("Failed to read anchors from {:?}", anchors))?;
            let windows = build_windows_2d(window, source.bin_size(), &first, &second, &arms)?;

            let expected = match mode {
                PileupModeArg::Raw => None,
                PileupModeArg::ObsExp => Some(compute_expected(&source, &arms, ignore_diags, threads)?),
            };
            let mode = match &expected {
                Some(expected) => PileupMode::ObsExp(expected),
                None => PileupMode::Raw,
            };

            let mut pile = pileup(&source, &windows, mode, threads)?;
            pile.sanitize_infinite();
            formats::write_matrix(&output_path, pile.collapse().view())?;

            eprintln!("\n=== Pileup Statistics ===");
            eprintln!("Anchor pairs:    {}", first.len());
            eprintln!("Windows piled:   {}", pile.len());
            eprintln!("Window size:     {} bins", pile.window_bins());
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::PairingScore { map, assembly, window, reducer, no_normalize, regions, threads, output } => {
            let source = map.load()?;
            let assembly = assembly.load()?;
            let output_path = output_or(output, "pairing_score.tsv");

            let regions = match regions {
                Some(path) => Some(
                    formats::read_regions(&path)
                        .with_context(|| format!("Failed to read regions from {:?}", path))?,
                ),
                None => None,
            };
            let options = PairingScoreOptions {
                window,
                regions,
                normalize: !no_normalize,
                threads,
            };
            let scores = pairing_score(&source, &assembly, &reducer, &options)?;
            formats::write_pairing_scores(&output_path, &scores)?;

            let nan = scores.iter().filter(|s| s.pairing_score.is_nan()).count();
            eprintln!("\n=== Pairing Score Statistics ===");
            eprintln!("Regions scored:  {}", scores.len());
            eprintln!("NaN scores:      {}", nan);
            eprintln!("Reducer:         {}", reducer);
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Diamond { input, side_len, output } => {
            let output_path = output_or(output, "diamond.tsv");
            let matrix = formats::read_matrix(&input)
                .with_context(|| format!("Failed to read matrix from {:?}", input))?;
            let profile = sliding_diamond(matrix.view(), side_len)?;
            formats::write_diamond(&output_path, &profile)?;

            eprintln!("\n=== Diamond Statistics ===");
            eprintln!("Matrix:          {}x{}", matrix.nrows(), matrix.ncols());
            eprintln!("Values:          {}", profile.len());
        }

        Commands::Downsample { samples, min_distance, seed, keep_trans, output_dir } => {
            let mut loaded = BTreeMap::new();
            for (name, path) in &samples {
                eprintln!("Loading pairs: {} <- {:?}", name, path);
                let table = formats::read_pairs(path)
                    .with_context(|| format!("Failed to read pairs from {:?}", path))?;
                loaded.insert(name.clone(), split_cis_trans(&table));
            }

            let options = DownsampleOptions {
                min_distance,
                trans_filter: if keep_trans {
                    TransFilter::KeepAll
                } else {
                    TransFilter::ApplyDistance
                },
                seed,
            };
            let downsampled = downsample_pairs(&loaded, &options)?;

            std::fs::create_dir_all(&output_dir)?;
            eprintln!("\n=== Downsampling Statistics ===");
            for (name, pairs) in &downsampled {
                write_sample(&output_dir, name, "cis", &pairs.cis)?;
                write_sample(&output_dir, name, "trans", &pairs.trans)?;
            }
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }
    }

    Ok(())
}
