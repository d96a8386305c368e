use std::{
    cmp::Ordering,
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use log::{debug, info};
use noodles::fasta::record::Definition;

use crate::{
    cli::NegativeOffset,
    error::{ExtractError, Result},
    sequences::Sequences,
};

/// Lines of the cluster table starting with this marker are headers.
pub const COMMENT_MARKER: &str = "SV";

/// Bases appended past every cluster end, covering the longest read
/// fragment expected beyond a reported interval.
pub const FIXED_BUFFER: i64 = 22;

pub const DEFAULT_MARGIN: u64 = 100;

/// Largest margin the window arithmetic can represent.
pub const MAX_MARGIN: u64 = i64::MAX as u64;

const MIN_COLUMNS: usize = 4;
const READ_COUNT_COLUMN: usize = 7;

/// Symmetric padding around a cluster. A margin of 1 is stored as 0, and
/// margins above [`MAX_MARGIN`] are capped to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margin(i64);

impl Margin {
    pub fn new(margin: u64) -> Self {
        match margin {
            1 => Self(0),
            m => Self(i64::try_from(m).unwrap_or(i64::MAX)),
        }
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Default for Margin {
    fn default() -> Self {
        Self::new(DEFAULT_MARGIN)
    }
}

/// One line of the cluster table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRecord {
    pub id: String,
    pub chr: String,
    pub start: i64,
    pub end: i64,
    pub read_count: Option<u64>,
    /// 1-based line in the cluster file
    pub line: usize,
}

impl ClusterRecord {
    pub fn parse(text: &str, line: usize) -> Result<Self> {
        let fields: Vec<&str> = text.split('\t').collect();
        if fields.len() < MIN_COLUMNS {
            return Err(ExtractError::MissingColumns {
                line,
                found: fields.len(),
            });
        }

        let number = |field: &'static str, value: &str| {
            value
                .parse::<i64>()
                .map_err(|source| ExtractError::InvalidNumber {
                    line,
                    field,
                    value: value.to_string(),
                    source,
                })
        };

        let read_count = fields
            .get(READ_COUNT_COLUMN)
            .map(|value| {
                value
                    .parse::<u64>()
                    .map_err(|source| ExtractError::InvalidNumber {
                        line,
                        field: "read count",
                        value: value.to_string(),
                        source,
                    })
            })
            .transpose()?;

        Ok(Self {
            id: fields[0].to_string(),
            chr: fields[1].to_string(),
            start: number("start", fields[2])?,
            end: number("end", fields[3])?,
            read_count,
            line,
        })
    }
}

// Chromosome names compare as strings, starts as integers.
fn cluster_order(a: &ClusterRecord, b: &ClusterRecord) -> Ordering {
    a.chr.cmp(&b.chr).then(a.start.cmp(&b.start))
}

/// Sort clusters by chromosome, then start. Fully tied records keep their
/// input order.
pub fn sort_clusters(clusters: &mut [ClusterRecord]) {
    clusters.sort_by(cluster_order);
}

/// Read every cluster line, skipping `SV` headers and blank lines, and return
/// the records sorted.
pub fn read_clusters<R: BufRead>(reader: R) -> Result<Vec<ClusterRecord>> {
    let mut clusters = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.starts_with(COMMENT_MARKER) || line.is_empty() {
            continue;
        }
        clusters.push(ClusterRecord::parse(&line, idx + 1)?);
    }

    sort_clusters(&mut clusters);
    Ok(clusters)
}

pub fn read_clusters_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ClusterRecord>> {
    let path = path.as_ref();
    info!("Reading clusters from file {}", path.display());

    let file = File::open(path).map_err(|source| ExtractError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let clusters = read_clusters(BufReader::new(file))?;

    info!(
        "Read {} clusters from file {}",
        clusters.len(),
        path.display()
    );
    Ok(clusters)
}

/// 0-based window around a cluster: `[start - margin, end + margin + 22]`.
/// Bounds saturate at the `i64` limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: i64,
    pub end: i64,
}

impl Window {
    pub fn around(record: &ClusterRecord, margin: Margin) -> Self {
        let margin = margin.get();
        Self {
            start: record.start.saturating_sub(margin),
            end: record
                .end
                .saturating_add(margin)
                .saturating_add(FIXED_BUFFER),
        }
    }

    pub fn len(&self) -> i64 {
        self.end.saturating_sub(self.start).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }
}

/// Take `length` bases of `sequence` from `offset`, truncating at either end.
///
/// Offsets past the end and non-positive lengths give an empty slice. A
/// negative offset is resolved by `policy`; with [`NegativeOffset::FromEnd`]
/// a window lying wholly before the sequence start is empty too.
pub fn substring(sequence: &[u8], offset: i64, length: i64, policy: NegativeOffset) -> &[u8] {
    let total = sequence.len() as i64;
    if length <= 0 {
        return &[];
    }

    let (begin, end) = match policy {
        NegativeOffset::FromEnd if offset < 0 => {
            let begin = offset.saturating_add(total);
            (begin, begin.saturating_add(length))
        }
        _ => (offset, offset.saturating_add(length)),
    };

    if begin > total || end <= 0 {
        return &[];
    }

    let begin = begin.max(0) as usize;
    let end = end.min(total) as usize;
    &sequence[begin..end]
}

/// A cluster with its window cut out of the genome, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord<'a> {
    pub cluster: &'a ClusterRecord,
    pub window: Window,
    pub sequence: &'a [u8],
}

impl ExtractedRecord<'_> {
    /// `{id}={window length} :{chr}:{start}:{end}`
    pub fn definition(&self) -> Definition {
        Definition::new(
            format!("{}={}", self.cluster.id, self.window.len()),
            Some(format!(
                ":{}:{}:{}",
                self.cluster.chr, self.cluster.start, self.cluster.end
            )),
        )
    }

    // The sequence line is always written, even when empty.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "{}", self.definition())?;
        writer.write_all(self.sequence)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Cuts cluster windows out of a genome store.
pub struct Extractor<'a> {
    sequences: &'a Sequences,
    margin: Margin,
    policy: NegativeOffset,
}

impl<'a> Extractor<'a> {
    pub fn new(sequences: &'a Sequences, margin: Margin, policy: NegativeOffset) -> Self {
        Self {
            sequences,
            margin,
            policy,
        }
    }

    pub fn extract<'c>(&self, cluster: &'c ClusterRecord) -> ExtractedRecord<'c>
    where
        'a: 'c,
    {
        let window = Window::around(cluster, self.margin);
        if window.is_empty() {
            debug!(
                "Cluster {} ends before it starts, writing an empty window",
                cluster.id
            );
        }
        if !self.sequences.contains(&cluster.chr) {
            debug!(
                "Sequence {} of cluster {} not found, writing an empty window",
                cluster.chr, cluster.id
            );
        }
        let parent = self.sequences.get(&cluster.chr);

        ExtractedRecord {
            cluster,
            window,
            sequence: substring(parent, window.start, window.len(), self.policy),
        }
    }

    /// Lazily extract every cluster in the given (already sorted) order.
    pub fn records<'c>(
        &'c self,
        clusters: &'c [ClusterRecord],
    ) -> impl Iterator<Item = ExtractedRecord<'c>> + 'c {
        clusters.iter().map(move |cluster| self.extract(cluster))
    }

    /// Write one record per cluster and return how many were written.
    pub fn write_all<W: Write>(&self, clusters: &[ClusterRecord], writer: &mut W) -> Result<usize> {
        let mut written = 0;
        for record in self.records(clusters) {
            record.write_to(writer)?;
            written += 1;
        }
        Ok(written)
    }
}
