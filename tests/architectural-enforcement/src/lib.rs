//! Architectural Enforcement Integration Tests
//!
//! Source scans that keep the interaction crates honest:
//! - No `sleep()` calls in production code; gesture timers and stream
//!   sessions wait on deadlines and I/O, never on fixed delays
//! - No blocking HTTP or socket I/O inside the async transport
//!
//! The helpers here walk a crate's `src/` tree and yield production lines
//! only. Everything from the first `#[cfg(test)]` in a file onward is test
//! code and is skipped, matching how the crates place their unit tests.

use std::fs;
use std::path::{Path, PathBuf};

/// Source directories scanned by the enforcement tests, relative to the
/// workspace root
pub const PRODUCTION_DIRS: &[&str] = &["interaction/core/src", "interaction/probe/src"];

/// One line of production code
#[derive(Debug, Clone)]
pub struct SourceLine {
    /// File the line came from
    pub path: PathBuf,
    /// 1-based line number
    pub number: usize,
    /// Full line text
    pub text: String,
}

impl SourceLine {
    /// The line with any trailing `//` comment removed
    #[must_use]
    pub fn code(&self) -> &str {
        self.text.split("//").next().unwrap_or(&self.text)
    }
}

impl std::fmt::Display for SourceLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} - {}",
            self.path.display(),
            self.number,
            self.text.trim()
        )
    }
}

/// Workspace root, two levels above this package
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Every production line of every `.rs` file under `dir`
#[must_use]
pub fn production_lines(dir: &Path) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    if !dir.exists() {
        return lines;
    }

    for entry in walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        lines.extend(production_lines_of(path, &content));
    }
    lines
}

fn production_lines_of(path: &Path, content: &str) -> Vec<SourceLine> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .filter(|(_, line)| {
            let trimmed = line.trim_start();
            !trimmed.starts_with("//") && !trimmed.starts_with("///")
        })
        .map(|(idx, line)| SourceLine {
            path: path.to_path_buf(),
            number: idx + 1,
            text: line.to_string(),
        })
        .collect()
}

/// Production lines across all [`PRODUCTION_DIRS`] whose code matches `predicate`
pub fn find_violations(predicate: impl Fn(&str) -> bool) -> Vec<SourceLine> {
    let root = workspace_root();
    PRODUCTION_DIRS
        .iter()
        .flat_map(|dir| production_lines(&root.join(dir)))
        .filter(|line| predicate(line.code()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_modules_are_skipped() {
        let source = "fn run() {}\n// sleep(1)\n#[cfg(test)]\nmod tests {\n    fn t() { sleep(1) }\n}\n";
        let lines = production_lines_of(Path::new("x.rs"), source);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].number, 1);
    }

    #[test]
    fn test_trailing_comment_is_not_code() {
        let line = SourceLine {
            path: PathBuf::from("x.rs"),
            number: 3,
            text: "let a = 1; // thread::sleep(d)".to_string(),
        };
        assert_eq!(line.code(), "let a = 1; ");
        assert_eq!(line.to_string(), "x.rs:3 - let a = 1; // thread::sleep(d)");
    }

    #[test]
    fn test_production_dirs_exist() {
        let root = workspace_root();
        for dir in PRODUCTION_DIRS {
            assert!(root.join(dir).is_dir(), "missing {dir}");
            assert!(!production_lines(&root.join(dir)).is_empty());
        }
    }
}
