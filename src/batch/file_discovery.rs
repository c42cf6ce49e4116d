//! Input discovery for batch conversion.

use std::path::{Path, PathBuf};

use crate::error::{RasterError, Result};

/// JPEG 2000 file and codestream patterns matched by default.
pub const DEFAULT_PATTERNS: &[&str] = &["*.jp2", "*.j2k", "*.j2c", "*.jpc", "*.jpx", "*.jpf"];

/// Finds encoded images under a directory.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    recursive: bool,
    /// Case-insensitive `*`/`?` name patterns.
    patterns: Vec<String>,
    max_depth: Option<usize>,
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl FileDiscovery {
    /// Discovery matching [`DEFAULT_PATTERNS`] in the top-level directory only.
    pub fn new() -> Self {
        Self {
            recursive: false,
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            max_depth: None,
        }
    }

    /// Descend into subdirectories.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Limit recursion depth; 0 keeps to the top-level directory.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Replace the name patterns.
    pub fn patterns(mut self, patterns: Vec<String>) -> Self {
        self.patterns = patterns;
        self
    }

    /// List matching files, sorted by path.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(RasterError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {}", dir.display()),
            )));
        }

        let mut files = Vec::new();
        let mut pending = vec![(dir.to_path_buf(), 0usize)];

        while let Some((current, depth)) = pending.pop() {
            for entry in std::fs::read_dir(&current)? {
                let path = entry?.path();
                // symlink_metadata: links are never followed
                let metadata = std::fs::symlink_metadata(&path)?;

                if metadata.is_dir() {
                    let within_depth = self.max_depth.map_or(true, |max| depth < max);
                    if self.recursive && within_depth {
                        pending.push((path, depth + 1));
                    }
                } else if metadata.is_file() && self.matches(&path) {
                    files.push(path);
                }
            }
        }

        files.sort();
        log::debug!("Discovered {} file(s) under {}", files.len(), dir.display());
        Ok(files)
    }

    fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name: Vec<char> = name.to_string_lossy().to_lowercase().chars().collect();

        self.patterns.iter().any(|pattern| {
            let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
            wildcard_match(&name, &pattern)
        })
    }
}

/// `*` matches any run, `?` any single character.
fn wildcard_match(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|skip| wildcard_match(&text[skip..], rest)),
        Some((&p, rest)) => match text.split_first() {
            Some((&t, text_rest)) if p == '?' || p == t => wildcard_match(text_rest, rest),
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_directory() -> TempDir {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("scan.jp2"), "content").unwrap();
        fs::write(dir.path().join("TILE.J2C"), "content").unwrap();
        fs::write(dir.path().join("notes.txt"), "content").unwrap();

        let nested = dir.path().join("a");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("inner.j2k"), "content").unwrap();

        let deeper = nested.join("b");
        fs::create_dir(&deeper).unwrap();
        fs::write(deeper.join("deep.jp2"), "content").unwrap();

        dir
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_top_level_only() {
        let dir = create_test_directory();
        let files = FileDiscovery::new().discover(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_recursive() {
        let dir = create_test_directory();
        let files = FileDiscovery::new().recursive(true).discover(dir.path()).unwrap();
        assert_eq!(files.len(), 4);
        assert!(files.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_max_depth() {
        let dir = create_test_directory();
        let files = FileDiscovery::new()
            .recursive(true)
            .max_depth(1)
            .discover(dir.path())
            .unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_custom_patterns() {
        let dir = create_test_directory();
        let files = FileDiscovery::new()
            .patterns(vec!["*.txt".into()])
            .discover(dir.path())
            .unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_missing_directory() {
        assert!(FileDiscovery::new().discover(Path::new("/nonexistent/path")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_not_followed() {
        let dir = create_test_directory();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("linked.jp2"), "content").unwrap();

        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.jp2"), dir.path().join("dangling.jp2"))
            .unwrap();

        let files = FileDiscovery::new().recursive(true).discover(dir.path()).unwrap();
        assert_eq!(files.len(), 4);
        assert!(files.iter().all(|f| !f.ends_with("linked.jp2")));
    }

    #[test]
    fn test_file_instead_of_directory() {
        let dir = create_test_directory();
        let err = FileDiscovery::new()
            .discover(&dir.path().join("scan.jp2"))
            .unwrap_err();
        assert!(matches!(err, RasterError::Io(_)));
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match(&chars("scan.jp2"), &chars("*.jp2")));
        assert!(wildcard_match(&chars("scan.jp2"), &chars("s?an.*")));
        assert!(wildcard_match(&chars(""), &chars("*")));
        assert!(!wildcard_match(&chars("scan.jp2"), &chars("*.j2k")));
        assert!(!wildcard_match(&chars("scan.jp2"), &chars("scan")));
    }
}
