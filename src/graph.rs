//! Include dependency graphs
//!
//! Static analysis companion to the expander: scans a directory for
//! documents, extracts each one's include targets without expanding
//! anything, and builds one dependency tree per entry point (a document no
//! other scanned document includes). Lets a build tool enumerate its entry
//! points, register watch paths, and reject circular includes before any
//! expansion runs.
//!
//! Target extraction interpolates `file` attributes against the empty
//! scope, so placeholder defaults apply and purely dynamic paths collapse
//! to their fallback. A document included twice appears twice; only a path
//! repeating on its own ancestry line is a cycle.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use generational_arena::{Arena, Index};
use termtree::Tree;
use tracing::instrument;
use walkdir::WalkDir;

use crate::config::StitchConfig;
use crate::dom::Dom;
use crate::errors::{StitchError, StitchResult};
use crate::resolve::{IncludeResolver, Resolution};
use crate::scope::{Interpolator, VarScope};
use crate::util::path::{get_relative_path, has_allowed_suffix, PathExt};

/// Data payload for tree nodes representing documents.
#[derive(Debug, Clone)]
pub struct DocumentNode {
    /// Directory the document's own includes resolve against
    pub base_path: PathBuf,
    /// Full path to the document
    pub file_path: PathBuf,
}

impl fmt::Display for DocumentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_path.display())
    }
}

/// Tree node in the arena-based dependency structure.
#[derive(Debug)]
pub struct GraphNode {
    /// Document data for this node
    pub data: DocumentNode,
    /// Index of parent node in the arena, None for the entry point
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena
    pub children: Vec<Index>,
}

/// Arena-based dependency tree rooted at one entry document.
///
/// Uses a generational arena for memory-safe node references. A document
/// included from several places appears once per inclusion site.
#[derive(Debug)]
pub struct IncludeTree {
    /// Arena storage for all tree nodes
    arena: Arena<GraphNode>,
    /// Index of the entry-point node, None for empty trees
    root: Option<Index>,
    /// Directory the scan started from; render labels are relative to it
    base: PathBuf,
}

impl IncludeTree {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            base: base.into(),
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: DocumentNode, parent: Option<Index>) -> Index {
        let node = GraphNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&GraphNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Entry-point document of this tree.
    pub fn entry(&self) -> Option<&Path> {
        self.root
            .and_then(|idx| self.get_node(idx))
            .map(|node| node.data.file_path.as_path())
    }

    /// Renders the dependency tree with labels relative to the scanned
    /// directory; paths outside it stay absolute.
    pub fn render(&self) -> Tree<String> {
        match self.root {
            Some(root_idx) => self.render_node(root_idx),
            None => Tree::new("(empty)".to_string()),
        }
    }

    fn render_node(&self, idx: Index) -> Tree<String> {
        let Some(node) = self.get_node(idx) else {
            return Tree::new(String::new());
        };
        let leaves: Vec<_> = node
            .children
            .iter()
            .map(|&child| self.render_node(child))
            .collect();
        Tree::new(self.label(&node.data.file_path)).with_leaves(leaves)
    }

    fn label(&self, path: &Path) -> String {
        match get_relative_path(&self.base, path) {
            Ok(relative) => relative.display().to_string(),
            Err(_) => path.display().to_string(),
        }
    }
}

impl fmt::Display for IncludeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Scans directories and assembles [`IncludeTree`]s.
pub struct GraphBuilder {
    config: StitchConfig,
    resolver: IncludeResolver,
    interpolator: Interpolator,
    /// Document path to its include targets, in document order
    relationship_cache: BTreeMap<PathBuf, Vec<PathBuf>>,
}

impl GraphBuilder {
    pub fn new(config: StitchConfig) -> StitchResult<Self> {
        let resolver = IncludeResolver::from_config(&config)?;
        let interpolator = Interpolator::from_config(&config)?;
        Ok(Self {
            config,
            resolver,
            interpolator,
            relationship_cache: BTreeMap::new(),
        })
    }

    /// Replaces the working directory captured at construction.
    pub fn with_working_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.resolver = IncludeResolver::new(&self.config, cwd.into());
        self
    }

    /// Scans `directory_path` for documents with allowed suffixes and
    /// builds one dependency tree per entry point, sorted by entry path.
    #[instrument(level = "debug", skip(self))]
    pub fn build_from_directory(&mut self, directory_path: &Path) -> StitchResult<Vec<IncludeTree>> {
        if !directory_path.exists() {
            return Err(StitchError::FileNotFound(directory_path.to_path_buf()));
        }
        if !directory_path.is_dir() {
            return Err(StitchError::NotADirectory(directory_path.to_path_buf()));
        }
        let scan_root = directory_path.to_canonical()?;

        // Scan directory and build relationship cache
        self.relationship_cache.clear();
        self.scan_directory(&scan_root)?;

        // Find entry points
        let entry_files = self.find_entry_points();

        // Build trees
        let mut trees = Vec::new();
        for entry in entry_files {
            let tree = self.build_tree(&entry, &scan_root)?;
            trees.push(tree);
        }

        Ok(trees)
    }

    #[instrument(level = "debug", skip(self))]
    fn scan_directory(&mut self, directory_path: &Path) -> StitchResult<()> {
        for entry in WalkDir::new(directory_path) {
            let entry = entry.map_err(|e| StitchError::DirectoryScan {
                path: directory_path.to_path_buf(),
                reason: e.to_string(),
            })?;

            if entry.file_type().is_file()
                && has_allowed_suffix(entry.path(), &self.config.extensions)
            {
                self.process_file(entry.path())?;
            }
        }
        Ok(())
    }

    /// Records one scanned document and its statically resolvable include
    /// targets. Targets that exist are canonicalized so they line up with
    /// scanned keys; missing ones keep their lexical path and render as
    /// leaves.
    #[instrument(level = "debug", skip(self))]
    fn process_file(&mut self, path: &Path) -> StitchResult<()> {
        let content = std::fs::read_to_string(path).map_err(|e| StitchError::DirectoryScan {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let abs_path = path.to_canonical()?;
        let base_dir = abs_path
            .parent()
            .ok_or_else(|| StitchError::PathResolution {
                path: abs_path.clone(),
                reason: "No parent directory".to_string(),
            })?
            .to_path_buf();

        let dom = Dom::parse(&content);
        let empty_scope = VarScope::new();
        let mut targets = Vec::new();
        for tag in dom.collect_tagged(dom.root(), "include") {
            let raw_file = dom.attr(tag, "file").unwrap_or_default();
            if raw_file.is_empty() {
                continue;
            }
            let file_attr = self.interpolator.apply(raw_file, &empty_scope);
            if let Resolution::Accepted(resolved) = self.resolver.resolve(&file_attr, &base_dir) {
                let target = resolved.to_canonical().unwrap_or(resolved);
                targets.push(target);
            }
        }

        self.relationship_cache.insert(abs_path, targets);
        Ok(())
    }

    /// Scanned documents no other scanned document includes.
    #[instrument(level = "debug", skip(self))]
    fn find_entry_points(&self) -> Vec<PathBuf> {
        self.relationship_cache
            .keys()
            .filter(|path| !self.relationship_cache.values().any(|v| v.contains(path)))
            .cloned()
            .collect()
    }

    #[instrument(level = "debug", skip(self))]
    fn build_tree(&self, entry: &Path, scan_root: &Path) -> StitchResult<IncludeTree> {
        let mut tree = IncludeTree::new(scan_root);
        let mut ancestry = Vec::new();
        self.add_node(&mut tree, entry, None, &mut ancestry)?;
        Ok(tree)
    }

    fn add_node(
        &self,
        tree: &mut IncludeTree,
        path: &Path,
        parent: Option<Index>,
        ancestry: &mut Vec<PathBuf>,
    ) -> StitchResult<()> {
        // A path repeating on its own ancestry line is a cycle; the same
        // document under two siblings is not.
        if let Some(at) = ancestry.iter().position(|p| p.as_path() == path) {
            let mut chain = ancestry[at..].to_vec();
            chain.push(path.to_path_buf());
            return Err(StitchError::CircularInclude { chain });
        }

        let base_path = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        let data = DocumentNode {
            base_path,
            file_path: path.to_path_buf(),
        };
        let current_idx = tree.insert_node(data, parent);

        if let Some(children) = self.relationship_cache.get(path) {
            ancestry.push(path.to_path_buf());
            for child in children {
                self.add_node(tree, child, Some(current_idx), ancestry)?;
            }
            ancestry.pop();
        }
        Ok(())
    }
}
