use std::path::{Component, Path, PathBuf};

use crate::errors::{StitchError, StitchResult};

pub trait PathExt {
    /// Folds `.` and `..` segments without touching the file system.
    ///
    /// `..` at the root is dropped (the path cannot climb above `/`);
    /// `..` at the start of a relative path is kept.
    fn lexical_normalized(&self) -> PathBuf;

    /// Strips root and prefix components, yielding a relative path.
    fn forced_relative(&self) -> PathBuf;

    /// Canonicalizes with a typed error. Resolves symlinks, so this is for
    /// file identity during directory scans, never for include resolution.
    fn to_canonical(&self) -> StitchResult<PathBuf>;
}

impl PathExt for Path {
    fn lexical_normalized(&self) -> PathBuf {
        let mut out = PathBuf::new();
        let mut depth: usize = 0;
        for component in self.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth > 0 {
                        out.pop();
                        depth -= 1;
                    } else if !self.has_root() {
                        out.push("..");
                    }
                }
                Component::Normal(part) => {
                    out.push(part);
                    depth += 1;
                }
                other => out.push(other.as_os_str()),
            }
        }
        out
    }

    fn forced_relative(&self) -> PathBuf {
        self.components()
            .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
            .collect()
    }

    fn to_canonical(&self) -> StitchResult<PathBuf> {
        self.canonicalize().map_err(|e| StitchError::PathResolution {
            path: self.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Resolves `path` against `cwd` when relative, then normalizes lexically.
pub fn lexical_absolute(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.lexical_normalized()
    } else {
        cwd.join(path).lexical_normalized()
    }
}

/// Suffix check against an extension allow-list (`.html` matches `a.html`
/// but also `a.tmpl.html`). String suffix semantics, not `Path::extension`.
pub fn has_allowed_suffix(path: &Path, extensions: &[String]) -> bool {
    let text = path.to_string_lossy();
    extensions.iter().any(|ext| text.ends_with(ext.as_str()))
}

pub fn get_relative_path(from: &Path, to: &Path) -> StitchResult<PathBuf> {
    pathdiff::diff_paths(to, from).ok_or_else(|| StitchError::PathResolution {
        path: to.to_path_buf(),
        reason: "Could not compute relative path".to_string(),
    })
}
