//! Path exclusion.
//!
//! An exclusion glob is tested against both the full path of a visited entry
//! and its base name, with shell semantics: `*` never crosses a `/`. A glob
//! like `.git` therefore only matches by base name, while `src/*/generated`
//! matches a full path.
use glob::{MatchOptions, Pattern};
use std::path::Path;

use crate::errors::{SearchError, SearchResult};

/// Version control and tooling directories that are never searched
pub const DEFAULT_EXCLUDES: &[&str] = &[".bzr", "CVS", ".git", ".hg", ".svn", ".idea", ".tox"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled set of exclusion globs, always including [`DEFAULT_EXCLUDES`]
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    patterns: Vec<Pattern>,
}

impl ExclusionSet {
    /// Compiles the default globs followed by `extra`
    pub fn new<S: AsRef<str>>(extra: &[S]) -> SearchResult<Self> {
        let mut patterns = Vec::with_capacity(DEFAULT_EXCLUDES.len() + extra.len());
        for glob in DEFAULT_EXCLUDES
            .iter()
            .copied()
            .chain(extra.iter().map(AsRef::as_ref))
        {
            let pattern =
                Pattern::new(glob).map_err(|e| SearchError::invalid_glob(glob, e.msg))?;
            patterns.push(pattern);
        }
        Ok(Self { patterns })
    }

    /// Number of compiled globs, defaults included
    pub fn glob_count(&self) -> usize {
        self.patterns.len()
    }

    /// Whether `path` matches any glob by full path or by base name
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path = strip_current_dir(path);
        let full = path.to_string_lossy().replace('\\', "/");
        let base = path.file_name().map(|name| name.to_string_lossy());

        self.patterns.iter().any(|pattern| {
            pattern.matches_with(&full, MATCH_OPTIONS)
                || base
                    .as_deref()
                    .is_some_and(|name| pattern.matches_with(name, MATCH_OPTIONS))
        })
    }
}

/// Drops a leading `./`, so a walk rooted at `.` sees `src/gen` rather than
/// `./src/gen`. The root `.` itself is returned as is.
pub fn strip_current_dir(path: &Path) -> &Path {
    match path.strip_prefix(".") {
        Ok(rest) if !rest.as_os_str().is_empty() => rest,
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_excludes_match_by_base_name() {
        let set = ExclusionSet::new::<&str>(&[]).unwrap();
        assert_eq!(set.glob_count(), DEFAULT_EXCLUDES.len());

        assert!(set.is_excluded(Path::new("/repo/.git")));
        assert!(set.is_excluded(Path::new("repo/sub/.svn")));
        assert!(set.is_excluded(Path::new("CVS")));
        assert!(set.is_excluded(Path::new("/work/.tox")));

        assert!(!set.is_excluded(Path::new("/repo/.gitignore")));
        assert!(!set.is_excluded(Path::new("/repo/.git2")));
        assert!(!set.is_excluded(Path::new("/repo/src/main.rs")));
    }

    #[test]
    fn test_user_globs() {
        let set = ExclusionSet::new(&["target", "*.log", "build/*/gen"]).unwrap();

        assert!(set.is_excluded(Path::new("project/target")));
        assert!(set.is_excluded(Path::new("project/debug.log")));
        assert!(set.is_excluded(Path::new("build/x86/gen")));

        assert!(!set.is_excluded(Path::new("project/targets")));
        assert!(!set.is_excluded(Path::new("project/log.txt")));
    }

    #[test]
    fn test_star_does_not_cross_separator() {
        let set = ExclusionSet::new(&["build/*"]).unwrap();
        assert!(set.is_excluded(Path::new("build/out")));
        assert!(!set.is_excluded(Path::new("build/out/deep")));
    }

    #[test]
    fn test_full_path_glob_under_current_dir() {
        let set = ExclusionSet::new(&["src/gen"]).unwrap();
        assert!(set.is_excluded(Path::new("./src/gen")));
        assert!(set.is_excluded(Path::new("src/gen")));
        assert!(!set.is_excluded(Path::new("./src/keep.txt")));
        assert!(!set.is_excluded(Path::new("../src/gen")));
    }

    #[test]
    fn test_strip_current_dir() {
        assert_eq!(strip_current_dir(Path::new("./a.txt")), Path::new("a.txt"));
        assert_eq!(strip_current_dir(Path::new("./src/gen")), Path::new("src/gen"));
        assert_eq!(strip_current_dir(Path::new(".")), Path::new("."));
        assert_eq!(strip_current_dir(Path::new("/tmp/a")), Path::new("/tmp/a"));
        assert_eq!(strip_current_dir(Path::new(".git")), Path::new(".git"));
    }

    #[test]
    fn test_invalid_glob() {
        let err = ExclusionSet::new(&["[unclosed"]).unwrap_err();
        assert!(matches!(err, SearchError::InvalidGlob { .. }));
    }
}
