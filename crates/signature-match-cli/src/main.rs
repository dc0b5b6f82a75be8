//! signature-match CLI - Signature image comparison tool

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use signature_match::{DEFAULT_THRESHOLD, MetricConfig, ScorerConfig, SimilarityScorer};

mod commands;

/// Compare signature images with structural similarity (SSIM).
#[derive(Parser)]
#[command(name = "signature-match")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every scoring command.
#[derive(Args, Debug, Clone)]
pub struct ScoreOptions {
    /// Similarity percentage a score must exceed to count as a match
    #[arg(
        short,
        long,
        env = "SIGNATURE_MATCH_THRESHOLD",
        default_value_t = DEFAULT_THRESHOLD
    )]
    threshold: f64,

    /// Edge length of the square canonical size images are resized to
    #[arg(long, default_value_t = signature_match::CANONICAL_SIZE)]
    size: usize,

    /// Also report DSSIM
    #[arg(long)]
    dssim: bool,

    /// Also report PSNR
    #[arg(long)]
    psnr: bool,
}

impl ScoreOptions {
    /// Build a scorer from the command-line options.
    pub fn scorer(&self) -> anyhow::Result<SimilarityScorer> {
        let config = ScorerConfig::builder()
            .canonical_size(self.size, self.size)
            .metrics(MetricConfig {
                dssim: self.dssim,
                psnr: self.psnr,
            })
            .build()?;
        Ok(SimilarityScorer::new(config)?)
    }

    /// Validated match threshold.
    pub fn threshold(&self) -> anyhow::Result<signature_match::MatchThreshold> {
        Ok(signature_match::MatchThreshold::new(self.threshold)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two signature images
    Compare {
        /// First signature image
        first: PathBuf,

        /// Second signature image
        second: PathBuf,

        #[command(flatten)]
        options: ScoreOptions,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Write the per-window SSIM map as a grayscale PNG
        #[arg(long)]
        ssim_map: Option<PathBuf>,
    },

    /// Compare one reference signature against many candidates
    Batch {
        /// Reference signature image
        #[arg(short, long)]
        reference: PathBuf,

        /// Candidate signature images
        #[arg(required = true)]
        candidates: Vec<PathBuf>,

        #[command(flatten)]
        options: ScoreOptions,

        /// Output file (.json or .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compare {
            first,
            second,
            options,
            json,
            ssim_map,
        } => commands::compare::run(first, second, &options, json, ssim_map),
        Commands::Batch {
            reference,
            candidates,
            options,
            output,
        } => commands::batch::run(reference, candidates, &options, output),
    }
}
