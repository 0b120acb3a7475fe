//! Include/exclude rules and the predicates that apply them.
//!
//! [`FilterSpec`] is the caller-facing rule set. [`FilterMatcher`] is the
//! compiled form used by the engine: patterns are parsed once per scan and
//! extensions are normalized, so evaluating an entry never allocates a glob
//! and never fails.

use std::path::Path;

use derive_builder::Builder;
use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};

use crate::document::{Candidate, Document};

/// Rule set deciding which files become documents.
///
/// Empty include lists mean "match everything". Exclude rules always win
/// over include rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct FilterSpec {
    /// Extensions to accept, with or without a leading dot.
    pub include_extensions: Vec<String>,
    /// Parent directory name patterns to accept (`*` accepts any).
    pub include_dir_names: Vec<String>,
    /// Extensions that always reject a file.
    pub exclude_extensions: Vec<String>,
    /// Directory name patterns whose whole subtree is skipped.
    pub exclude_dir_names: Vec<String>,
}

impl FilterSpec {
    /// Create an empty spec, which accepts every file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new spec builder.
    pub fn builder() -> FilterSpecBuilder {
        FilterSpecBuilder::default()
    }

    /// The rule set used for markdown document discovery: `.md` files in any
    /// directory, skipping VCS metadata, dependency trees and the trash.
    pub fn default_documents() -> Self {
        Self {
            include_extensions: vec!["md".to_string()],
            include_dir_names: vec!["*".to_string()],
            exclude_extensions: Vec::new(),
            exclude_dir_names: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                ".Trash".to_string(),
            ],
        }
    }

    /// Add an included extension.
    pub fn include_extension(mut self, ext: impl Into<String>) -> Self {
        self.include_extensions.push(ext.into());
        self
    }

    /// Add an included directory pattern.
    pub fn include_dir(mut self, pattern: impl Into<String>) -> Self {
        self.include_dir_names.push(pattern.into());
        self
    }

    /// Add an excluded extension.
    pub fn exclude_extension(mut self, ext: impl Into<String>) -> Self {
        self.exclude_extensions.push(ext.into());
        self
    }

    /// Add an excluded directory pattern.
    pub fn exclude_dir(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_dir_names.push(pattern.into());
        self
    }

    /// True when no rule is set at all.
    pub fn is_empty(&self) -> bool {
        self.include_extensions.is_empty()
            && self.include_dir_names.is_empty()
            && self.exclude_extensions.is_empty()
            && self.exclude_dir_names.is_empty()
    }

    /// Compile this spec for evaluation.
    pub fn compile(&self) -> FilterMatcher {
        FilterMatcher::new(self)
    }
}

/// Normalize an extension for comparison: trims whitespace and leading dots.
/// Case is preserved. Returns `None` for an empty extension, which matches no
/// file.
pub fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_string())
    }
}

/// Match a directory-name pattern against a single name.
///
/// `*` matches anything and a pattern equal to the name always matches.
/// Other patterns use shell-glob semantics confined to one path segment. An
/// empty pattern matches nothing; an unparseable one only matches itself.
pub fn matches_pattern(pattern: &str, name: &str) -> bool {
    DirPattern::compile(pattern).matches(name)
}

#[derive(Debug, Clone)]
enum DirPattern {
    Any,
    Empty,
    Literal(String),
    Glob { raw: String, matcher: GlobMatcher },
}

impl DirPattern {
    fn compile(pattern: &str) -> Self {
        if pattern == "*" {
            return Self::Any;
        }
        if pattern.is_empty() {
            return Self::Empty;
        }
        if !pattern.contains(['*', '?', '[', '{', '\\']) {
            return Self::Literal(pattern.to_string());
        }
        match GlobBuilder::new(pattern).literal_separator(true).build() {
            Ok(glob) => Self::Glob {
                raw: pattern.to_string(),
                matcher: glob.compile_matcher(),
            },
            Err(_) => Self::Literal(pattern.to_string()),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Empty => false,
            Self::Literal(literal) => literal == name,
            Self::Glob { raw, matcher } => raw == name || matcher.is_match(name),
        }
    }
}

/// Compiled, thread-safe form of a [`FilterSpec`].
#[derive(Debug, Clone)]
pub struct FilterMatcher {
    /// `None` when no include rule is set. Empty entries are dropped, so a
    /// rule made only of empty entries accepts nothing.
    include_extensions: Option<Vec<String>>,
    exclude_extensions: Vec<String>,
    include_dirs: Vec<DirPattern>,
    exclude_dirs: Vec<DirPattern>,
}

impl FilterMatcher {
    /// Compile a filter spec.
    pub fn new(spec: &FilterSpec) -> Self {
        let include_extensions = (!spec.include_extensions.is_empty()).then(|| {
            spec.include_extensions
                .iter()
                .filter_map(|e| normalize_extension(e))
                .collect()
        });
        Self {
            include_extensions,
            exclude_extensions: spec
                .exclude_extensions
                .iter()
                .filter_map(|e| normalize_extension(e))
                .collect(),
            include_dirs: spec
                .include_dir_names
                .iter()
                .map(|p| DirPattern::compile(p))
                .collect(),
            exclude_dirs: spec
                .exclude_dir_names
                .iter()
                .map(|p| DirPattern::compile(p))
                .collect(),
        }
    }

    /// True when a directory with this name must not be descended into.
    pub fn prunes_dir(&self, dir_name: &str) -> bool {
        self.exclude_dirs.iter().any(|p| p.matches(dir_name))
    }

    /// Decide whether a file becomes a document.
    ///
    /// Checks run exclude-first and stop at the first disqualifying rule:
    /// excluded extension, excluded parent, then the include rules.
    pub fn accepts_file(&self, file_name: &str, parent_name: &str) -> bool {
        if self
            .exclude_extensions
            .iter()
            .any(|ext| has_extension(file_name, ext))
        {
            return false;
        }

        if self.prunes_dir(parent_name) {
            return false;
        }

        let ext_ok = match &self.include_extensions {
            None => true,
            Some(exts) => exts.iter().any(|ext| has_extension(file_name, ext)),
        };

        let dir_ok = self.include_dirs.is_empty()
            || self.include_dirs.iter().any(|p| p.matches(parent_name));

        ext_ok && dir_ok
    }

    /// Evaluate a traversal candidate, producing a document on accept.
    ///
    /// Directories never become documents.
    pub fn evaluate(&self, candidate: &Candidate, root: &Path) -> Option<Document> {
        if candidate.is_dir {
            return None;
        }
        if !self.accepts_file(&candidate.name, &candidate.parent_name) {
            return None;
        }
        Document::under_root(root, &candidate.path)
    }
}

/// Case-sensitive suffix test: `name` ends with `.` followed by `ext`.
fn has_extension(name: &str, ext: &str) -> bool {
    name.len() > ext.len()
        && name.ends_with(ext)
        && name.as_bytes()[name.len() - ext.len() - 1] == b'.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_matches_everything() {
        assert!(matches_pattern("*", "anything"));
        assert!(matches_pattern("*", ".hidden"));
        assert!(matches_pattern("*", ""));
    }

    #[test]
    fn test_literal_and_glob() {
        assert!(matches_pattern(".git", ".git"));
        assert!(!matches_pattern(".git", ".github"));
        assert!(matches_pattern("node_*", "node_modules"));
        assert!(matches_pattern("build?", "build2"));
        assert!(!matches_pattern("build?", "build"));
    }

    #[test]
    fn test_pattern_equal_to_name_matches() {
        assert!(matches_pattern("[unclosed", "[unclosed"));
        assert!(!matches_pattern("[unclosed", "unclosed"));
        assert!(matches_pattern("[drafts]", "[drafts]"));
        assert!(matches_pattern("[drafts]", "d"));
        assert!(matches_pattern("{old}", "{old}"));
        assert!(!matches_pattern("", "docs"));
        assert!(!matches_pattern("", ""));
    }

    #[test]
    fn test_bracketed_dir_name_is_pruned() {
        let matcher = FilterSpec::new().exclude_dir("[drafts]").compile();
        assert!(matcher.prunes_dir("[drafts]"));
        assert!(!matcher.accepts_file("x.md", "[drafts]"));
    }

    #[test]
    fn test_glob_stays_in_one_segment() {
        assert!(!matches_pattern("a*b", "a/b"));
        assert!(!matches_pattern("docs/*", "docs"));
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("md").as_deref(), Some("md"));
        assert_eq!(normalize_extension(".MD").as_deref(), Some("MD"));
        assert_eq!(normalize_extension("  .tar.gz ").as_deref(), Some("tar.gz"));
        assert_eq!(normalize_extension("."), None);
        assert_eq!(normalize_extension(""), None);
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("readme.md", "md"));
        assert!(has_extension(".md", "md"));
        assert!(has_extension("backup.tar.gz", "tar.gz"));
        assert!(!has_extension("md", "md"));
        assert!(!has_extension("readmemd", "md"));
    }

    #[test]
    fn test_exclude_dominates_include() {
        let matcher = FilterSpec::new()
            .include_extension("md")
            .exclude_extension("md")
            .compile();
        assert!(!matcher.accepts_file("a.md", "docs"));

        let matcher = FilterSpec::new()
            .include_dir("docs")
            .exclude_dir("docs")
            .compile();
        assert!(!matcher.accepts_file("a.md", "docs"));
    }

    #[test]
    fn test_empty_includes_match_all() {
        let matcher = FilterSpec::new().compile();
        assert!(matcher.accepts_file("a.md", "docs"));
        assert!(matcher.accepts_file("Makefile", "root"));
    }

    #[test]
    fn test_include_dir_patterns() {
        let matcher = FilterSpec::new().include_dir("notes").compile();
        assert!(matcher.accepts_file("a.txt", "notes"));
        assert!(!matcher.accepts_file("a.txt", "src"));

        let matcher = FilterSpec::new().include_dir("*").compile();
        assert!(matcher.accepts_file("a.txt", "src"));
    }

    #[test]
    fn test_extension_match_is_case_sensitive() {
        let matcher = FilterSpec::new().include_extension(".md").compile();
        assert!(matcher.accepts_file("README.md", "docs"));
        assert!(!matcher.accepts_file("README.MD", "docs"));
        assert!(!matcher.accepts_file("README.txt", "docs"));

        let matcher = FilterSpec::new().exclude_extension("md").compile();
        assert!(matcher.accepts_file("NOTES.Md", "docs"));
        assert!(!matcher.accepts_file("notes.md", "docs"));
    }

    #[test]
    fn test_empty_include_extension_matches_nothing() {
        let matcher = FilterSpec::new().include_extension("").compile();
        assert!(!matcher.accepts_file("a.txt", "docs"));
        assert!(!matcher.accepts_file("a.md", "docs"));

        let matcher = FilterSpec::new().exclude_extension(" ").compile();
        assert!(matcher.accepts_file("a.txt", "docs"));
    }

    #[test]
    fn test_default_documents_spec() {
        let matcher = FilterSpec::default_documents().compile();
        assert!(matcher.accepts_file("notes.md", "docs"));
        assert!(!matcher.accepts_file("notes.txt", "docs"));
        assert!(!matcher.accepts_file("notes.md", "node_modules"));
        assert!(matcher.prunes_dir(".git"));
        assert!(matcher.prunes_dir(".Trash"));
        assert!(!matcher.prunes_dir("src"));
    }
}
