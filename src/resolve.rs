//! Include path resolution
//!
//! Turns the `file` attribute of an include tag into an absolute path.
//! Resolution is purely lexical: `.` and `..` fold without touching the
//! file system and symlinks are never followed, so the same input always
//! maps to the same path regardless of what is on disk.
//!
//! Branch order, first hit wins:
//! 1. alias prefix (`find` + `/`): rewrite, resolve against the working
//!    directory,
//! 2. leading separator: root at the working directory after stripping it,
//! 3. otherwise resolve against the including document's directory, forced
//!    relative unless `allow_absolute_paths` is set.

use std::path::{Path, PathBuf};

use tracing::instrument;

use crate::config::{AliasRule, StitchConfig};
use crate::errors::{StitchError, StitchResult};
use crate::util::path::{has_allowed_suffix, lexical_absolute, PathExt};

/// Outcome of resolving one include target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Accepted(PathBuf),
    /// Path resolved fine but its suffix is not on the allow-list.
    DisallowedExtension(PathBuf),
}

/// Resolution context threaded through every expansion call.
///
/// Everything it reads (working directory, alias table, flags) is captured
/// at construction, so resolution never consults ambient process state.
#[derive(Debug, Clone)]
pub struct IncludeResolver {
    cwd: PathBuf,
    aliases: Vec<AliasRule>,
    allow_absolute_paths: bool,
    extensions: Vec<String>,
}

impl IncludeResolver {
    pub fn new(config: &StitchConfig, cwd: PathBuf) -> Self {
        Self {
            cwd,
            aliases: config.aliases.clone(),
            allow_absolute_paths: config.allow_absolute_paths,
            extensions: config.extensions.clone(),
        }
    }

    /// Captures the process working directory as the resolution root.
    pub fn from_config(config: &StitchConfig) -> StitchResult<Self> {
        let cwd = std::env::current_dir().map_err(StitchError::WorkingDir)?;
        Ok(Self::new(config, cwd))
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Resolves a requested include path against the directory of the
    /// document containing the tag.
    #[instrument(level = "trace", skip(self))]
    pub fn resolve(&self, requested: &str, base_dir: &Path) -> Resolution {
        let resolved = match self.apply_aliases(requested) {
            Some(rewritten) => lexical_absolute(Path::new(&rewritten), &self.cwd),
            None => self.resolve_plain(requested, base_dir),
        };
        if !has_allowed_suffix(&resolved, &self.extensions) {
            return Resolution::DisallowedExtension(resolved);
        }
        Resolution::Accepted(resolved)
    }

    fn resolve_plain(&self, requested: &str, base_dir: &Path) -> PathBuf {
        if let Some(rooted) = requested.strip_prefix('/') {
            // A still-absolute remainder ("//x") replaces the cwd on join,
            // mirroring resolve-against-cwd semantics.
            return self.cwd.join(rooted).lexical_normalized();
        }
        let requested = Path::new(requested);
        if self.allow_absolute_paths {
            base_dir.join(requested).lexical_normalized()
        } else {
            base_dir.join(requested.forced_relative()).lexical_normalized()
        }
    }

    /// First alias rule whose `find` prefixes the request (with a `/`
    /// boundary) rewrites it. A rewrite that changes nothing falls through
    /// to plain resolution.
    fn apply_aliases(&self, requested: &str) -> Option<String> {
        let rule = self
            .aliases
            .iter()
            .find(|rule| is_alias_match(requested, &rule.find))?;
        let rewritten = format!("{}{}", rule.replacement, &requested[rule.find.len()..]);
        if rewritten == requested {
            return None;
        }
        Some(rewritten)
    }
}

fn is_alias_match(requested: &str, find: &str) -> bool {
    !find.is_empty()
        && requested.len() > find.len()
        && requested.starts_with(find)
        && requested.as_bytes()[find.len()] == b'/'
}
