use std::{
    borrow::Cow,
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    mem,
    path::Path,
};

use flate2::read::MultiGzDecoder;
use log::{debug, info};

use crate::error::{ExtractError, Result};

const HEADER_MARKER: u8 = b'>';

// The Sequences struct maps every header identifier of a genome FASTA file
// to its full, unwrapped sequence. It is built once and only read afterwards.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Sequences {
    data: HashMap<String, Vec<u8>>,
}

impl Sequences {
    // Open the genome and build the store. Files ending in `.gz` are
    // decompressed on the fly.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading sequences from file {}", path.display());

        let file = File::open(path).map_err(|source| ExtractError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let reader: Box<dyn BufRead> = match path.extension().and_then(|ext| ext.to_str()) {
            Some("gz") => Box::new(BufReader::new(MultiGzDecoder::new(file))),
            _ => Box::new(BufReader::new(file)),
        };

        let sequences = Self::from_reader(reader)?;
        info!(
            "Read {} sequences from file {}",
            sequences.len(),
            path.display()
        );
        Ok(sequences)
    }

    // Parse header-delimited records line by line. Content lines are kept
    // verbatim apart from their terminator.
    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut builder = StoreBuilder::default();
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            builder.push_line(strip_terminator(&line));
        }

        Ok(builder.finish())
    }

    /// Sequence for `id`, or an empty slice when the store has no such record.
    pub fn get(&self, id: &str) -> &[u8] {
        self.data.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.data.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// Parse state threaded through the line loop: the identifier of the record
// being read and its sequence so far.
#[derive(Default)]
struct StoreBuilder {
    current_id: String,
    buffer: Vec<u8>,
    data: HashMap<String, Vec<u8>>,
}

impl StoreBuilder {
    fn push_line(&mut self, line: &[u8]) {
        match line.split_first() {
            Some((&HEADER_MARKER, id)) => {
                if !self.current_id.is_empty() {
                    let id = mem::take(&mut self.current_id);
                    self.commit(id);
                }
                self.buffer.clear();
                self.current_id = match String::from_utf8_lossy(id) {
                    Cow::Borrowed(id) => id.to_string(),
                    Cow::Owned(id) => {
                        debug!("Header {} is not valid UTF-8, stored with replacement characters", id);
                        id
                    }
                };
            }
            _ => self.buffer.extend_from_slice(line),
        }
    }

    // The last record is committed even under an empty identifier, so input
    // without any header ends up stored under "".
    fn finish(mut self) -> Sequences {
        let id = mem::take(&mut self.current_id);
        self.commit(id);
        Sequences { data: self.data }
    }

    fn commit(&mut self, id: String) {
        let sequence = mem::take(&mut self.buffer);
        if let Some(previous) = self.data.insert(id, sequence) {
            debug!(
                "Duplicate header replaced an earlier record of {} bases",
                previous.len()
            );
        }
    }
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Sequences {
        Sequences::from_reader(input.as_bytes()).unwrap()
    }

    #[test]
    fn header_marker_is_stripped() {
        let sequences = parse(">chr2X\nACGT\n");
        assert!(sequences.contains("chr2X"));
        assert_eq!(sequences.get("chr2X"), b"ACGT");
        assert_eq!(sequences.len(), 1);
    }

    #[test]
    fn wrapped_lines_are_concatenated() {
        let sequences = parse(">chr1\nAAAA\nCCCC\nGG\n>chr2\nTT\n");
        assert_eq!(sequences.get("chr1"), b"AAAACCCCGG");
        assert_eq!(sequences.get("chr2"), b"TT");
    }

    #[test]
    fn content_is_kept_verbatim() {
        let sequences = parse(">chr1\nac gt\nN-N\n");
        assert_eq!(sequences.get("chr1"), b"ac gtN-N");
    }

    #[test]
    fn crlf_terminators_are_removed() {
        let sequences = parse(">chr1\r\nACGT\r\nTT\r\n");
        assert_eq!(sequences.get("chr1"), b"ACGTTT");
    }

    #[test]
    fn last_record_without_trailing_newline() {
        let sequences = parse(">a\nAC\n>b\nGT");
        assert_eq!(sequences.get("a"), b"AC");
        assert_eq!(sequences.get("b"), b"GT");
    }

    #[test]
    fn duplicate_header_last_write_wins() {
        let sequences = parse(">chr1\nAAAA\n>chr2\nCC\n>chr1\nGGGG\n");
        assert_eq!(sequences.get("chr1"), b"GGGG");
        assert_eq!(sequences.len(), 2);
    }

    #[test]
    fn headerless_input_is_stored_under_empty_id() {
        let sequences = parse("ACGT\nACGT\n");
        assert_eq!(sequences.get(""), b"ACGTACGT");
        assert_eq!(sequences.len(), 1);
    }

    #[test]
    fn content_before_first_header_is_dropped() {
        let sequences = parse("NNNN\n>chr1\nACGT\n");
        assert!(!sequences.contains(""));
        assert_eq!(sequences.get("chr1"), b"ACGT");
    }

    #[test]
    fn empty_input_yields_single_empty_entry() {
        let sequences = parse("");
        assert_eq!(sequences.len(), 1);
        assert!(sequences.get("").is_empty());
    }

    #[test]
    fn non_utf8_header_uses_replacement_characters() {
        let sequences = Sequences::from_reader(&b">chr\xff1\nACGT\n"[..]).unwrap();
        assert_eq!(sequences.get("chr\u{FFFD}1"), b"ACGT");
        assert!(!sequences.contains("chr1"));
    }

    #[test]
    fn unknown_id_is_empty() {
        let sequences = parse(">chr1\nACGT\n");
        assert!(sequences.get("chrUn").is_empty());
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = Sequences::from_path("/nonexistent/genome.fa").unwrap_err();
        assert!(matches!(err, ExtractError::Open { .. }));
    }
}
