//! Recursive include expansion
//!
//! The engine behind `expand_file`/`expand_str`. One expansion call owns a
//! private document tree and walks it with a scan loop: find the first
//! `<include>` tag in document order, run it through the directive pipeline
//! (resolve, load, recurse, interpolate, slot merge, attribute merge,
//! replace), then rescan from the root, since replacements can introduce
//! new includes. The loop ends when no directive remains; every `<include>`
//! present at any point is either replaced or dropped, never emitted.
//!
//! Directive failures (missing file attribute, disallowed extension,
//! unreadable target, ambiguous class/style attachment) degrade locally:
//! the tag is dropped, a [`Diagnostic`] is recorded, and expansion
//! continues. The one fatal condition is a circular include, caught by an
//! ancestry stack of resolved paths.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use generational_arena::Index;
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use tracing::{debug, instrument, warn};

use crate::config::StitchConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::dom::Dom;
use crate::errors::{StitchError, StitchResult};
use crate::loader::{FileLoader, OsFileLoader};
use crate::resolve::{IncludeResolver, Resolution};
use crate::scope::{extract_scope, merge_scopes, Interpolator, VarScope, VARIABLE_SIGIL};
use crate::util::path::lexical_absolute;

/// Result of one expansion call.
#[derive(Debug, Clone)]
pub struct Expansion {
    /// The fully expanded document.
    pub html: String,
    /// Include targets read during expansion, absolute, deduplicated, in
    /// first-read order. Empty when `watch` is disabled. Hosts register
    /// these with their file watcher.
    pub files_read: Vec<PathBuf>,
    /// Recoverable conditions, in the order they occurred.
    pub diagnostics: Vec<Diagnostic>,
}

/// The include expansion engine.
///
/// Holds immutable configuration, the compiled interpolation pattern, the
/// path resolution context and the file-read capability. All mutable state
/// lives in a per-call context, so one `Stitcher` can serve concurrent
/// expansions of independent documents.
pub struct Stitcher {
    config: StitchConfig,
    resolver: IncludeResolver,
    interpolator: Interpolator,
    loader: Arc<dyn FileLoader>,
}

impl Stitcher {
    /// Builds a stitcher reading through the real file system.
    pub fn new(config: StitchConfig) -> StitchResult<Self> {
        Self::with_loader(config, Arc::new(OsFileLoader))
    }

    /// Builds a stitcher with an injected read capability.
    pub fn with_loader(config: StitchConfig, loader: Arc<dyn FileLoader>) -> StitchResult<Self> {
        let resolver = IncludeResolver::from_config(&config)?;
        let interpolator = Interpolator::from_config(&config)?;
        Ok(Self {
            config,
            resolver,
            interpolator,
            loader,
        })
    }

    /// Replaces the working directory captured at construction. Alias
    /// rewrites and leading-separator paths resolve against it.
    pub fn with_working_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.resolver = IncludeResolver::new(&self.config, cwd.into());
        self
    }

    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Expands the document at `entry`.
    ///
    /// The entry document itself must be readable; that failure is fatal,
    /// unlike include-target failures. Includes inside it resolve against
    /// the entry's directory, and diagnostics name the entry as origin.
    #[instrument(level = "debug", skip(self))]
    pub fn expand_file(&self, entry: &Path) -> StitchResult<Expansion> {
        let entry = lexical_absolute(entry, self.resolver.cwd());
        let html = self
            .loader
            .read_to_string(&entry)
            .map_err(|source| StitchError::EntryRead {
                path: entry.clone(),
                source,
            })?;
        let base_dir = match entry.parent() {
            Some(parent) => parent.to_path_buf(),
            None => self.resolver.cwd().to_path_buf(),
        };
        self.run(&html, &base_dir, Some(&entry))
    }

    /// Expands in-memory markup, resolving includes against `base_dir`.
    #[instrument(level = "debug", skip(self, html), fields(len = html.len()))]
    pub fn expand_str(&self, html: &str, base_dir: &Path) -> StitchResult<Expansion> {
        let base_dir = lexical_absolute(base_dir, self.resolver.cwd());
        self.run(html, &base_dir, None)
    }

    fn run(&self, html: &str, base_dir: &Path, origin: Option<&Path>) -> StitchResult<Expansion> {
        let mut run = ExpansionRun {
            stitcher: self,
            stack: Vec::new(),
            files_read: IndexSet::new(),
            diagnostics: Vec::new(),
        };
        let html = run.expand_document(html, base_dir, &VarScope::new(), origin)?;
        Ok(Expansion {
            html,
            files_read: run.files_read.into_iter().collect(),
            diagnostics: run.diagnostics,
        })
    }
}

/// Mutable state of one expansion call.
struct ExpansionRun<'a> {
    stitcher: &'a Stitcher,
    /// Resolved paths currently being expanded, outermost first.
    stack: Vec<PathBuf>,
    files_read: IndexSet<PathBuf>,
    diagnostics: Vec<Diagnostic>,
}

impl ExpansionRun<'_> {
    /// Scan loop over one document: expand the first remaining include,
    /// rescan, serialize once none remain.
    #[instrument(
        level = "trace",
        skip_all,
        fields(base_dir = %base_dir.display(), depth = self.stack.len())
    )]
    fn expand_document(
        &mut self,
        html: &str,
        base_dir: &Path,
        inherited: &VarScope,
        origin: Option<&Path>,
    ) -> StitchResult<String> {
        let mut dom = Dom::parse(html);
        while let Some(tag) = dom.find_first("include") {
            self.expand_directive(&mut dom, tag, base_dir, inherited, origin)?;
        }
        Ok(dom.serialize())
    }

    /// One directive through the pipeline. Always removes `tag` from the
    /// tree, so the caller's scan loop makes progress.
    fn expand_directive(
        &mut self,
        dom: &mut Dom,
        tag: Index,
        base_dir: &Path,
        inherited: &VarScope,
        origin: Option<&Path>,
    ) -> StitchResult<()> {
        let attrs = dom.attrs(tag).cloned().unwrap_or_default();
        let local = extract_scope(&attrs);
        let merged = merge_scopes(inherited, &local);

        // Missing or empty file attribute drops the directive silently.
        let raw_file = attrs.get("file").map(String::as_str).unwrap_or_default();
        if raw_file.is_empty() {
            dom.detach(tag);
            return Ok(());
        }
        let file_attr = self.stitcher.interpolator.apply(raw_file, &merged);

        let resolved = match self.stitcher.resolver.resolve(&file_attr, base_dir) {
            Resolution::Accepted(path) => path,
            Resolution::DisallowedExtension(path) => {
                let message = format!("Skipping (extension not allowed): {}", path.display());
                self.warn(
                    Diagnostic::new(DiagnosticKind::DisallowedExtension, message).with_path(path),
                );
                dom.detach(tag);
                return Ok(());
            }
        };

        // A path already on the ancestry stack means the file would expand
        // itself again; the chain starts at its first occurrence.
        if let Some(at) = self.stack.iter().position(|p| p == &resolved) {
            let mut chain = self.stack[at..].to_vec();
            chain.push(resolved);
            return Err(StitchError::CircularInclude { chain });
        }

        let content = match self.stitcher.loader.read_to_string(&resolved) {
            Ok(content) => content,
            Err(err) => {
                let source_label = origin
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(unknown source)".to_string());
                let message = format!(
                    "Error reading file: {} ({})\n  referenced in: {}\n  (include: file=\"{}\")",
                    resolved.display(),
                    err,
                    source_label,
                    raw_file
                );
                let mut diag =
                    Diagnostic::new(DiagnosticKind::UnreadableFile, message).with_path(resolved);
                if let Some(origin) = origin {
                    diag = diag.with_origin(origin);
                }
                self.warn(diag);
                dom.detach(tag);
                return Ok(());
            }
        };
        debug!(path = %resolved.display(), "Loaded include");
        if self.stitcher.config.watch {
            self.files_read.insert(resolved.clone());
        }

        // Nested includes resolve against the included file's directory and
        // see the merged scope. Diagnostics keep reporting the outermost
        // known origin.
        let child_base = match resolved.parent() {
            Some(parent) => parent.to_path_buf(),
            None => base_dir.to_path_buf(),
        };
        let child_origin = origin.unwrap_or(&resolved);
        self.stack.push(resolved.clone());
        let recursed = self.expand_document(&content, &child_base, &merged, Some(child_origin));
        self.stack.pop();
        let expanded = recursed?;

        let interpolated = self.stitcher.interpolator.apply(&expanded, &merged);

        // Slot map: named templates first, then the tag's remaining inner
        // markup as the default. A template claiming "default" beats the
        // remaining markup.
        let mut slot_map: BTreeMap<String, String> = BTreeMap::new();
        for template in dom.collect_tagged(tag, "template") {
            let name = match dom.attr(template, "slot") {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => continue,
            };
            let markup = dom.inner_html(template).trim().to_string();
            dom.detach(template);
            slot_map.insert(name, markup);
        }
        let default_markup = dom.inner_html(tag).trim().to_string();
        if !default_markup.is_empty() && !slot_map.contains_key("default") {
            slot_map.insert("default".to_string(), default_markup);
        }

        let mut frag_ids = dom.parse_fragment(&interpolated);

        // Slots are collected once; substitutions never re-enter them.
        let mut slots = Vec::new();
        for &root in &frag_ids {
            slots.extend(dom.collect_tagged(root, "slot"));
        }
        for slot in slots {
            let name = match dom.attr(slot, "name") {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => "default".to_string(),
            };
            let markup = match slot_map.get(&name) {
                Some(mapped) => mapped.clone(),
                // No matching entry: the slot's own content stands in.
                None => dom.inner_html(slot).trim().to_string(),
            };
            let replacement = dom.parse_fragment(&markup);
            match frag_ids.iter().position(|&id| id == slot) {
                // A top-level slot has no parent to splice through.
                Some(pos) => {
                    frag_ids.splice(pos..=pos, replacement.iter().copied());
                }
                None => dom.replace_with(slot, &replacement),
            }
        }

        // Attributes from the include tag land on the fragment's single
        // root element; with zero or several roots there is no unambiguous
        // target, so class/style intent is reported and dropped.
        let element_roots: Vec<Index> = frag_ids
            .iter()
            .copied()
            .filter(|&id| dom.is_element(id))
            .collect();
        if element_roots.len() == 1 {
            apply_attr_merge(dom, element_roots[0], &attrs);
        } else {
            let wants_class_or_style = attrs.get("class").map_or(false, |v| !v.is_empty())
                || attrs.get("style").map_or(false, |v| !v.is_empty());
            if wants_class_or_style {
                let message = format!(
                    "Cannot apply class/style: \"{}\" does not have a single root element",
                    file_attr
                );
                self.warn(
                    Diagnostic::new(DiagnosticKind::AmbiguousAttributeTarget, message)
                        .with_path(resolved),
                );
            }
        }

        dom.replace_with(tag, &frag_ids);
        Ok(())
    }

    /// Records a diagnostic and mirrors it to the log.
    fn warn(&mut self, diag: Diagnostic) {
        warn!(kind = diag.kind.as_str(), "{}", diag.message);
        self.diagnostics.push(diag);
    }
}

/// Copies include-tag attributes onto the fragment root, skipping variable
/// bindings and `file`. `class` concatenates, `style` joins declarations
/// with normalized semicolons, everything else overwrites.
fn apply_attr_merge(dom: &mut Dom, target: Index, attrs: &IndexMap<String, String>) {
    for (name, value) in attrs {
        if name.starts_with(VARIABLE_SIGIL) || name == "file" {
            continue;
        }
        match name.as_str() {
            "class" => {
                let existing = dom.attr(target, "class").unwrap_or_default().to_string();
                let merged = format!("{} {}", existing, value).trim().to_string();
                dom.set_attr(target, "class", &merged);
            }
            "style" => {
                let existing = dom.attr(target, "style").unwrap_or_default().to_string();
                let merged = [existing.as_str(), value.as_str()]
                    .iter()
                    .filter(|s| !s.is_empty())
                    .map(|s| s.trim().trim_end_matches(';'))
                    .join("; ");
                dom.set_attr(target, "style", &format!("{};", merged));
            }
            _ => dom.set_attr(target, name, value),
        }
    }
}
