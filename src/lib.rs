//! Build-time HTML include expansion.
//!
//! `htmlstitch` takes an HTML document containing `<include file="...">`
//! directives and recursively resolves them into a single expanded
//! document: each include pulls in another file, expands that file's own
//! includes depth-first, interpolates `{{ $variable }}` placeholders
//! against the scope the include call passed down, substitutes named and
//! default `<slot>`s, and merges the tag's `class`/`style` attributes onto
//! the fragment's root element.
//!
//! Per-directive failures (unreadable target, disallowed extension,
//! ambiguous attribute target) never abort the document; the directive is
//! dropped and a [`Diagnostic`] is recorded. The one fatal expansion error
//! is a circular include.
//!
//! ```no_run
//! use htmlstitch::{StitchConfig, Stitcher};
//!
//! let stitcher = Stitcher::new(StitchConfig::default())?;
//! let expansion = stitcher.expand_file(std::path::Path::new("site/index.html"))?;
//! print!("{}", expansion.html);
//! for warning in &expansion.diagnostics {
//!     eprintln!("{}", warning.render());
//! }
//! # Ok::<(), htmlstitch::StitchError>(())
//! ```
//!
//! Configuration loads from defaults, an optional `htmlstitch.toml`, and
//! `HTMLSTITCH_`-prefixed environment variables, in that order; see
//! [`StitchConfig::load`]. The [`graph`] module builds include dependency
//! trees without expanding, for watch registration and cycle checks up
//! front.

use std::path::Path;

pub mod config;
pub mod diagnostics;
pub mod dom;
pub mod errors;
pub mod expand;
pub mod graph;
pub mod loader;
pub mod resolve;
pub mod scope;
pub mod util;

pub use config::{AliasRule, StitchConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use errors::{StitchError, StitchResult};
pub use expand::{Expansion, Stitcher};
pub use graph::{GraphBuilder, IncludeTree};
pub use loader::{FileLoader, OsFileLoader};

/// Expands the document at `path` with the default configuration.
pub fn expand_file(path: &Path) -> StitchResult<Expansion> {
    Stitcher::new(StitchConfig::default())?.expand_file(path)
}

/// Expands in-memory markup with the default configuration, resolving
/// includes against `base_dir`.
pub fn expand_str(html: &str, base_dir: &Path) -> StitchResult<Expansion> {
    Stitcher::new(StitchConfig::default())?.expand_str(html, base_dir)
}
