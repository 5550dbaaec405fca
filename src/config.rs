//! Configuration with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Project config file: `htmlstitch.toml` (path supplied by the host)
//! 3. Environment variables: `HTMLSTITCH_*` prefix

use std::path::Path;

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::errors::{StitchError, StitchResult};

/// Path-prefix rewrite rule for include resolution.
///
/// A rule applies when the requested path starts with `find` followed by a
/// path separator; the rewritten path resolves against the process working
/// directory, not the including document's directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasRule {
    pub find: String,
    pub replacement: String,
}

/// Unified configuration for include expansion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StitchConfig {
    /// Allowed include-target suffixes (string suffix match, default
    /// `.html` and `.svg`)
    pub extensions: Vec<String>,
    /// Interpolation delimiter pair (default `{{` / `}}`), matched literally
    pub delimiters: (String, String),
    /// Resolve include paths directly against the base directory instead of
    /// forcing them relative first
    pub allow_absolute_paths: bool,
    /// Collect read files for external watch registration
    pub watch: bool,
    /// Ordered alias rules, first match wins
    pub aliases: Vec<AliasRule>,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".html".into(), ".svg".into()],
            delimiters: ("{{".into(), "}}".into()),
            allow_absolute_paths: false,
            watch: true,
            aliases: Vec::new(),
        }
    }
}

/// Raw config for overlay parsing (fields are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    extensions: Option<Vec<String>>,
    delimiters: Option<(String, String)>,
    allow_absolute_paths: Option<bool>,
    watch: Option<bool>,
    aliases: Option<Vec<AliasRule>>,
}

/// Load a TOML file into RawConfig for manual merging.
fn load_raw_config(path: &Path) -> StitchResult<RawConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| StitchError::Config {
        reason: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| StitchError::Config {
        reason: format!("parse {}: {}", path.display(), e),
    })
}

impl StitchConfig {
    /// Merge overlay config onto self; overlay wins where specified.
    fn merge_with(&self, overlay: &RawConfig) -> Self {
        Self {
            extensions: overlay
                .extensions
                .clone()
                .unwrap_or_else(|| self.extensions.clone()),
            delimiters: overlay
                .delimiters
                .clone()
                .unwrap_or_else(|| self.delimiters.clone()),
            allow_absolute_paths: overlay
                .allow_absolute_paths
                .unwrap_or(self.allow_absolute_paths),
            watch: overlay.watch.unwrap_or(self.watch),
            aliases: overlay
                .aliases
                .clone()
                .unwrap_or_else(|| self.aliases.clone()),
        }
    }

    /// Apply HTMLSTITCH_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> StitchResult<Self> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("HTMLSTITCH")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );
        let env = builder.build().map_err(config_err)?;

        if let Ok(val) = env.get::<Vec<String>>("extensions") {
            settings.extensions = val;
        }
        if let Ok(val) = env.get::<Vec<String>>("delimiters") {
            if val.len() == 2 {
                settings.delimiters = (val[0].clone(), val[1].clone());
            }
        }
        if let Ok(val) = env.get_bool("allow_absolute_paths") {
            settings.allow_absolute_paths = val;
        }
        if let Ok(val) = env.get_bool("watch") {
            settings.watch = val;
        }

        Ok(settings)
    }

    /// Expand shell variables and tilde in alias replacement paths.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax.
    fn expand_paths(&mut self) {
        for alias in &mut self.aliases {
            alias.replacement = expand_env_vars(&alias.replacement);
        }
    }

    /// Load settings with layered precedence.
    ///
    /// A missing `config_file` is not an error; the file layer is skipped.
    pub fn load(config_file: Option<&Path>) -> StitchResult<Self> {
        let mut current = Self::default();

        if let Some(path) = config_file {
            if path.exists() {
                let raw = load_raw_config(path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> StitchResult<String> {
        toml::to_string_pretty(self).map_err(|e| StitchError::Config {
            reason: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# htmlstitch configuration
#
# Layers (by precedence, lowest to highest):
#   File: htmlstitch.toml (path passed by the host)
#   Env:  HTMLSTITCH_* environment variables (explicit overrides)

# Allowed include-target suffixes (string suffix match)
# extensions = [".html", ".svg"]

# Interpolation delimiters, matched literally
# delimiters = ["{{", "}}"]

# Resolve include paths directly against the including document's directory
# instead of forcing them relative first
# allow_absolute_paths = false

# Collect read files for external watch registration
# watch = true

# Path-prefix rewrites; the replacement resolves against the process
# working directory. Supports ~, $VAR and ${VAR}.
# [[aliases]]
# find = "@components"
# replacement = "src/components"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> StitchError {
    StitchError::Config {
        reason: e.to_string(),
    }
}

/// Expand `~`, `$VAR`, and `${VAR}`; input that fails to expand is
/// returned unchanged.
pub fn expand_env_vars(input: &str) -> String {
    shellexpand::full(input)
        .map(|expanded| expanded.into_owned())
        .unwrap_or_else(|_| input.to_string())
}
