use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StitchError {
    #[error("Circular include detected: {}", format_chain(.chain))]
    CircularInclude { chain: Vec<PathBuf> },

    #[error("Failed to read entry document {path}: {source}")]
    EntryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid delimiter configuration: {reason}")]
    InvalidDelimiters { reason: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Path resolution failed: {path}, reason: {reason}")]
    PathResolution { path: PathBuf, reason: String },

    #[error("Directory scan failed: {path}, reason: {reason}")]
    DirectoryScan { path: PathBuf, reason: String },

    #[error("Failed to determine working directory: {0}")]
    WorkingDir(#[source] std::io::Error),
}

pub type StitchResult<T> = Result<T, StitchError>;

/// Renders a cycle as `a -> b -> a` for error messages.
fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
