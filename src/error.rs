use std::{io, num::ParseIntError, path::PathBuf};

/// Result type for cluster extraction, wrapping [`ExtractError`]
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Everything that can abort an extraction run.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// An input file could not be opened
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading an input or writing a record failed
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A cluster line is too short to carry id, chromosome, start and end
    #[error("cluster line {line}: expected at least 4 tab-separated columns, found {found}")]
    MissingColumns { line: usize, found: usize },

    /// A numeric cluster column did not parse
    #[error("cluster line {line}: invalid {field} `{value}`: {source}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}
