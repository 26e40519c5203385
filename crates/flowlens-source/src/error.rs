use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum SourceError {
    UnknownDataset(String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidPeriod {
        index: usize,
        label: String,
    },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownDataset(dataset_id) => write!(f, "unknown dataset `{dataset_id}`"),
            Self::Io { path, source } => write!(f, "read {}: {source}", path.display()),
            Self::Parse { path, source } => write!(f, "parse {}: {source}", path.display()),
            Self::InvalidPeriod { index, label } => {
                write!(f, "record {index}: unrecognized period `{label}`")
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::UnknownDataset(_) | Self::InvalidPeriod { .. } => None,
        }
    }
}
