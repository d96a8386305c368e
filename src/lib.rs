//! Cut padded genome windows around clustered insertion coordinates.
//!
//! The genome FASTA is loaded into memory, the cluster table is read and
//! sorted by chromosome then start, and every cluster is written as a
//! two-line FASTA record:
//!
//! ```text
//! >{id}={window length} :{chr}:{start}:{end}
//! {bases from start - margin to end + margin + 22}
//! ```

use std::io::Write;

use log::info;

pub mod cli;
pub mod clusters;
pub mod error;
pub mod sequences;

pub use cli::{Cli, Config, NegativeOffset};
pub use clusters::{
    read_clusters, read_clusters_from_path, sort_clusters, substring, ClusterRecord,
    ExtractedRecord, Extractor, Margin, Window, DEFAULT_MARGIN, FIXED_BUFFER, MAX_MARGIN,
};
pub use error::{ExtractError, Result};
pub use sequences::Sequences;

/// Load both inputs, then write one record per cluster to `writer`.
///
/// Returns the number of records written. Nothing is written unless both
/// inputs could be read.
pub fn run<W: Write>(config: &Config, writer: &mut W) -> Result<usize> {
    let sequences = Sequences::from_path(&config.genome)?;
    let clusters = read_clusters_from_path(&config.clusters)?;

    let extractor = Extractor::new(&sequences, config.margin, config.negative_offset);
    let written = extractor.write_all(&clusters, writer)?;
    writer.flush()?;

    info!("Wrote {} cluster windows", written);
    Ok(written)
}
