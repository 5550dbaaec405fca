//! I/O boundary for include loading
//!
//! The expander consumes exactly one external capability: "read a file as
//! text, given a path". Abstracting it lets tests and embedding hosts
//! substitute in-memory sources.

use std::io;
use std::path::Path;

/// Read capability injected into the expander.
pub trait FileLoader: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct OsFileLoader;

impl FileLoader for OsFileLoader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}
