//! Exclusion pattern matching.
//!
//! Patterns follow the backup tool's shell-style exclude syntax. A pattern
//! that names a directory also excludes everything below it.

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{is_separator, Path};
use tracing::warn;

/// Decides whether a path is covered by a single exclusion pattern
pub trait ExcludeMatcher: Send + Sync {
    fn matches(&self, path: &str, pattern: &str) -> bool;
}

/// Shell-style matcher (`fm:` and `sh:` pattern styles).
///
/// In `fm:` style (the default) `*` also matches path separators. In `sh:`
/// style `*` stops at a separator and `**` crosses it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellPattern;

impl ExcludeMatcher for ShellPattern {
    fn matches(&self, path: &str, pattern: &str) -> bool {
        shell_globs(pattern)
            .iter()
            .any(|glob| glob.compile_matcher().is_match(path))
    }
}

/// Globs for one exclude pattern: the pattern itself and its subtree.
fn shell_globs(pattern: &str) -> Vec<Glob> {
    let (pattern, literal_separator) = match pattern.strip_prefix("sh:") {
        Some(rest) => (rest, true),
        None => (pattern.strip_prefix("fm:").unwrap_or(pattern), false),
    };

    let pattern = trim_trailing_separators(pattern);
    if pattern.is_empty() {
        return Vec::new();
    }

    // Malformed globs such as an unclosed `[` are matched literally
    let base = match Glob::new(pattern) {
        Ok(_) => pattern.to_string(),
        Err(_) => globset::escape(pattern),
    };
    let subtree = if base.ends_with(is_separator) {
        format!("{base}**")
    } else {
        format!("{base}/**")
    };

    [base, subtree]
        .iter()
        .filter_map(|glob| {
            GlobBuilder::new(glob)
                .literal_separator(literal_separator)
                .build()
                .ok()
        })
        .collect()
}

fn trim_trailing_separators(pattern: &str) -> &str {
    let trimmed = pattern.trim_end_matches(is_separator);
    if trimmed.is_empty() && !pattern.is_empty() {
        // "/" stays the filesystem root
        &pattern[..1]
    } else {
        trimmed
    }
}

/// A list of exclusion patterns, compiled once into a [`GlobSet`]
#[derive(Debug, Clone)]
pub struct ExcludeSet {
    patterns: Vec<String>,
    compiled: Option<GlobSet>,
}

impl Default for ExcludeSet {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            compiled: Some(GlobSet::empty()),
        }
    }
}

impl PartialEq for ExcludeSet {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
    }
}

impl Eq for ExcludeSet {}

impl ExcludeSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(Into::into)
            .filter(|p: &String| !p.trim().is_empty())
            .collect();
        let compiled = compile(&patterns);
        Self { patterns, compiled }
    }

    /// Parse an exclude list, one pattern per line. Blank lines and `#`
    /// comments are skipped.
    pub fn parse(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn extend<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.extend(Self::new(patterns).patterns);
        self.compiled = compile(&self.patterns);
    }

    /// Check `path` against the compiled shell-style patterns
    pub fn is_match(&self, path: &Path) -> bool {
        match &self.compiled {
            Some(set) => set.is_match(path),
            None => self.is_excluded(path, &ShellPattern),
        }
    }

    /// Check `path` against every pattern using a custom matcher
    pub fn is_excluded(&self, path: &Path, matcher: &dyn ExcludeMatcher) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let path = path.to_string_lossy();
        self.patterns.iter().any(|pattern| matcher.matches(&path, pattern))
    }
}

fn compile(patterns: &[String]) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        for glob in shell_globs(pattern) {
            builder.add(glob);
        }
    }

    match builder.build() {
        Ok(set) => Some(set),
        Err(e) => {
            warn!("Falling back to per-pattern exclusion matching: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(path: &str, pattern: &str) -> bool {
        ShellPattern.matches(path, pattern)
    }

    #[test]
    fn test_plain_path_excludes_subtree() {
        assert!(matches("/home/user/cache", "/home/user/cache"));
        assert!(matches("/home/user/cache/a/b.txt", "/home/user/cache"));
        assert!(matches("/home/user/cache/a", "/home/user/cache/"));
        assert!(!matches("/home/user/cache2/a", "/home/user/cache"));
        assert!(!matches("/home/user", "/home/user/cache"));
    }

    #[test]
    fn test_fm_star_crosses_separators() {
        assert!(matches("/home/user/a/b/file.tmp", "*.tmp"));
        assert!(matches("/home/user/a/b/file.tmp", "fm:/home/*.tmp"));
        assert!(!matches("/home/user/file.txt", "*.tmp"));
    }

    #[test]
    fn test_sh_star_stops_at_separator() {
        assert!(matches("/home/user/file.tmp", "sh:/home/*/file.tmp"));
        assert!(!matches("/home/user/deep/file.tmp", "sh:/home/*.tmp"));
        assert!(matches("/home/user/deep/file.tmp", "sh:/home/**/*.tmp"));
        assert!(matches("/home/user/.cache/x/y", "sh:/home/*/.cache"));
    }

    #[test]
    fn test_question_mark_and_classes() {
        assert!(matches("/data/log1.txt", "/data/log?.txt"));
        assert!(matches("/data/log7.txt", "/data/log[0-9].txt"));
        assert!(!matches("/data/logx.txt", "/data/log[0-9].txt"));
        assert!(matches("/data/logx.txt", "/data/log[!0-9].txt"));
    }

    #[test]
    fn test_malformed_glob_is_literal() {
        assert!(matches("/data/[odd", "/data/[odd"));
        assert!(matches("/data/[odd/inner", "/data/[odd"));
        assert!(!matches("/data/o", "/data/[odd"));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        assert!(!matches("/anything", ""));
        assert!(!matches("/anything", "fm:"));
    }

    #[test]
    fn test_root_pattern_matches_everything_absolute() {
        assert!(matches("/etc/passwd", "/"));
    }

    #[test]
    fn test_exclude_set_parse() {
        let set = ExcludeSet::parse("# caches\n/home/u/.cache\n\n  *.pyc  \n");
        assert_eq!(set.patterns(), ["/home/u/.cache", "*.pyc"]);
        assert!(set.is_match(Path::new("/home/u/.cache/thumbs")));
        assert!(set.is_match(Path::new("/src/mod.pyc")));
        assert!(!set.is_match(Path::new("/src/mod.py")));
    }

    #[test]
    fn test_compiled_set_agrees_with_matcher() {
        let set = ExcludeSet::new(["sh:/home/*/.cache", "*.log", "/srv/data/"]);
        for path in [
            "/home/u/.cache/x",
            "/home/u/deep/.cache",
            "/var/log/app.log",
            "/srv/data/db",
            "/srv/database",
        ] {
            let path = Path::new(path);
            assert_eq!(set.is_match(path), set.is_excluded(path, &ShellPattern));
        }
    }

    #[test]
    fn test_extend_recompiles() {
        let mut set = ExcludeSet::new(["*.tmp"]);
        assert!(!set.is_match(Path::new("/a/b.bak")));
        set.extend(["*.bak"]);
        assert!(set.is_match(Path::new("/a/b.bak")));
        assert_eq!(set.patterns().len(), 2);
    }

    #[test]
    fn test_empty_set_excludes_nothing() {
        let set = ExcludeSet::new(Vec::<String>::new());
        assert!(set.is_empty());
        assert!(!set.is_match(Path::new("/x")));
        assert!(!ExcludeSet::default().is_match(Path::new("/x")));
    }
}
