use std::{fmt, path::PathBuf};

use clap::{Parser, ValueEnum};
use log::Level;

use crate::clusters::{Margin, DEFAULT_MARGIN, MAX_MARGIN};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// a FASTA-formatted genome (optionally gzip-compressed)
    #[arg(value_name = "GENOME", required = true)]
    genome: PathBuf,

    /// a tab-separated table of insertion clusters (id, chr, start, end, ..., reads);
    /// lines starting with `SV` are skipped
    #[arg(value_name = "CLUSTERS", required = true)]
    clusters: PathBuf,

    /// bases added on both sides of every cluster (a margin of 1 means none)
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_MARGIN,
        value_parser = clap::value_parser!(u64).range(..=MAX_MARGIN)
    )]
    margin: u64,

    /// output to this location (default is stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// how windows starting before the first base are resolved
    #[arg(short, long, value_enum, default_value_t = NegativeOffset::FromEnd)]
    negative_offset: NegativeOffset,

    /// logging verbosity level
    #[arg(short = 'L', long, default_value = "info")]
    level: Level,
}

impl Cli {
    pub fn get_input(&self) -> (PathBuf, PathBuf) {
        (self.genome.clone(), self.clusters.clone())
    }

    pub fn get_output(&self) -> Option<PathBuf> {
        self.output.clone()
    }

    pub fn get_level(&self) -> Level {
        self.level
    }

    pub fn config(&self) -> Config {
        let (genome, clusters) = self.get_input();
        Config {
            genome,
            clusters,
            margin: Margin::new(self.margin),
            negative_offset: self.negative_offset,
        }
    }
}

impl fmt::Display for Cli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "genome={}, clusters={}, margin={}, output={}, negative_offset={:?}, level={}",
            self.genome.display(),
            self.clusters.display(),
            self.margin,
            self.output
                .as_ref()
                .map_or_else(|| "stdout".to_string(), |p| p.display().to_string()),
            self.negative_offset,
            self.level,
        )
    }
}

/// Policy for windows whose start falls below the first base.
///
/// `FromEnd` counts a negative offset back from the end of the sequence, the
/// behavior of the substring primitive the original cluster output was built
/// with. Keep it for byte-identical output. `Clamp` starts the window at the
/// first base and leaves its end where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum NegativeOffset {
    #[default]
    FromEnd,
    Clamp,
}

/// Pre-validated inputs of one extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub genome: PathBuf,
    pub clusters: PathBuf,
    pub margin: Margin,
    pub negative_offset: NegativeOffset,
}

impl Config {
    /// Configuration with the default margin and offset policy.
    pub fn new<G: Into<PathBuf>, C: Into<PathBuf>>(genome: G, clusters: C) -> Self {
        Self {
            genome: genome.into(),
            clusters: clusters.into(),
            margin: Margin::default(),
            negative_offset: NegativeOffset::default(),
        }
    }

    pub fn with_margin(mut self, margin: u64) -> Self {
        self.margin = Margin::new(margin);
        self
    }

    pub fn with_negative_offset(mut self, negative_offset: NegativeOffset) -> Self {
        self.negative_offset = negative_offset;
        self
    }
}
