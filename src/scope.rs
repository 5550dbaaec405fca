//! Variable scopes and placeholder interpolation
//!
//! Includes pass values to the files they pull in through `$name`
//! attributes. Each include call merges its own variables over the scope it
//! inherited from its caller, and the merged scope is what placeholders in
//! the included markup resolve against. Scopes flow strictly downward; a
//! child never writes back into its caller's scope.
//!
//! Placeholders are `{{ $name }}` or `{{ $name = fallback }}` with
//! configurable delimiters. Resolution order is scope value, then fallback,
//! then empty string.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use regex::{Captures, Regex};
use tracing::instrument;

use crate::config::StitchConfig;
use crate::errors::{StitchError, StitchResult};

/// Attribute prefix marking an include attribute as a variable.
pub const VARIABLE_SIGIL: char = '$';

/// Variables visible to one include call. Ordered for stable logging.
pub type VarScope = BTreeMap<String, String>;

/// Collects `$name` attributes from an include tag into a scope.
///
/// The sigil is stripped and the rest of the attribute name becomes the
/// key, case preserved. A bare `$` yields the empty-string key.
pub fn extract_scope(attrs: &IndexMap<String, String>) -> VarScope {
    attrs
        .iter()
        .filter_map(|(name, value)| {
            name.strip_prefix(VARIABLE_SIGIL)
                .map(|key| (key.to_string(), value.clone()))
        })
        .collect()
}

/// Scope for a nested include call: the caller's scope with the call's own
/// variables layered on top. The inherited scope is left untouched.
pub fn merge_scopes(inherited: &VarScope, local: &VarScope) -> VarScope {
    let mut merged = inherited.clone();
    merged.extend(local.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Substitutes placeholders in text against a scope.
///
/// Built once per expansion from the configured delimiter pair; the
/// delimiters are regex-escaped, so metacharacters like `(*` work.
#[derive(Debug, Clone)]
pub struct Interpolator {
    pattern: Regex,
}

impl Interpolator {
    pub fn new(open: &str, close: &str) -> StitchResult<Self> {
        if open.is_empty() || close.is_empty() {
            return Err(StitchError::InvalidDelimiters {
                reason: "Delimiters must be non-empty".to_string(),
            });
        }
        // `.` stops at newlines, so the name and default never span lines.
        let pattern = format!(
            r"{}\s*\{}(.*?)\s*{}",
            regex::escape(open),
            VARIABLE_SIGIL,
            regex::escape(close)
        );
        let pattern = Regex::new(&pattern).map_err(|err| StitchError::InvalidDelimiters {
            reason: err.to_string(),
        })?;
        Ok(Self { pattern })
    }

    pub fn from_config(config: &StitchConfig) -> StitchResult<Self> {
        Self::new(&config.delimiters.0, &config.delimiters.1)
    }

    /// Replaces every placeholder in `text`. The placeholder body splits on
    /// the first `=` into key and fallback, both trimmed; unknown keys with
    /// no fallback become the empty string.
    #[instrument(level = "trace", skip_all, fields(vars = scope.len()))]
    pub fn apply(&self, text: &str, scope: &VarScope) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures<'_>| {
                let body = &caps[1];
                let (key, fallback) = match body.split_once('=') {
                    Some((key, fallback)) => (key.trim(), Some(fallback.trim())),
                    None => (body.trim(), None),
                };
                scope
                    .get(key)
                    .map(String::as_str)
                    .or(fallback)
                    .unwrap_or("")
                    .to_string()
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn interp() -> Interpolator {
        Interpolator::new("{{", "}}").unwrap()
    }

    fn attrs(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn given_include_attrs_when_extracting_then_only_sigil_attrs_become_variables() {
        // Arrange
        let attrs = attrs(&[("file", "card.html"), ("$title", "Hello"), ("$Mixed", "x")]);

        // Act
        let scope = extract_scope(&attrs);

        // Assert
        assert_eq!(scope.len(), 2);
        assert_eq!(scope.get("title").map(String::as_str), Some("Hello"));
        assert_eq!(scope.get("Mixed").map(String::as_str), Some("x"));
        assert!(!scope.contains_key("file"));
    }

    #[test]
    fn given_bare_sigil_attr_when_extracting_then_empty_key_is_kept() {
        let scope = extract_scope(&attrs(&[("$", "value")]));
        assert_eq!(scope.get("").map(String::as_str), Some("value"));
    }

    #[test]
    fn given_overlapping_scopes_when_merged_then_local_wins_and_inherited_is_unchanged() {
        // Arrange
        let inherited: VarScope = [("a", "1"), ("b", "2")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let local: VarScope = [("b", "override"), ("c", "3")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        // Act
        let merged = merge_scopes(&inherited, &local);

        // Assert
        assert_eq!(merged.get("a").map(String::as_str), Some("1"));
        assert_eq!(merged.get("b").map(String::as_str), Some("override"));
        assert_eq!(merged.get("c").map(String::as_str), Some("3"));
        assert_eq!(inherited.get("b").map(String::as_str), Some("2"));
    }

    #[rstest]
    fn given_scope_value_when_applied_then_placeholder_is_replaced(interp: Interpolator) {
        let scope: VarScope = [("title".to_string(), "Hi".to_string())].into();
        assert_eq!(interp.apply("<h1>{{ $title }}</h1>", &scope), "<h1>Hi</h1>");
        assert_eq!(interp.apply("{{$title}}", &scope), "Hi");
    }

    #[rstest]
    fn given_missing_variable_when_applied_then_fallback_then_empty(interp: Interpolator) {
        let scope = VarScope::new();
        assert_eq!(interp.apply("{{ $name = guest }}", &scope), "guest");
        assert_eq!(interp.apply("{{ $name }}", &scope), "");
    }

    #[rstest]
    fn given_fallback_containing_equals_when_applied_then_split_is_on_first_equals(
        interp: Interpolator,
    ) {
        let scope = VarScope::new();
        assert_eq!(interp.apply("{{ $q = a=b=c }}", &scope), "a=b=c");
    }

    #[rstest]
    fn given_scope_value_when_fallback_present_then_scope_still_wins(interp: Interpolator) {
        let scope: VarScope = [("name".to_string(), "Ada".to_string())].into();
        assert_eq!(interp.apply("{{ $name = guest }}", &scope), "Ada");
    }

    #[test]
    fn given_metacharacter_delimiters_when_applied_then_they_are_escaped() {
        let interp = Interpolator::new("(*", "*)").unwrap();
        let scope: VarScope = [("x".to_string(), "1".to_string())].into();
        assert_eq!(interp.apply("(* $x *)", &scope), "1");
    }

    #[rstest]
    fn given_default_spanning_lines_when_applied_then_it_is_left_verbatim(interp: Interpolator) {
        let scope = VarScope::new();
        let text = "{{ $a = one\ntwo }}";
        assert_eq!(interp.apply(text, &scope), text);
    }

    #[rstest]
    fn given_text_without_sigil_when_applied_then_nothing_changes(interp: Interpolator) {
        let scope: VarScope = [("a".to_string(), "1".to_string())].into();
        assert_eq!(interp.apply("{{ a }}", &scope), "{{ a }}");
    }

    #[test]
    fn given_empty_delimiter_when_constructed_then_it_is_rejected() {
        assert!(matches!(
            Interpolator::new("", "}}"),
            Err(StitchError::InvalidDelimiters { .. })
        ));
        assert!(matches!(
            Interpolator::new("{{", ""),
            Err(StitchError::InvalidDelimiters { .. })
        ));
    }
}
