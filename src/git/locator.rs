//! Repository discovery.
//!
//! Walks ancestor directories from a starting point until a `.git` entry
//! is found. One often opens a subdirectory of a checkout but still wants
//! annotations for the whole repository, so the walk continues all the way
//! to the filesystem root before giving up.

use std::path::{Path, PathBuf};

/// Find the work tree root containing `start`. Accepts a file or a
/// directory; returns `None` when no ancestor holds a `.git` entry.
pub fn find_repository_root(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_dir() { start } else { start.parent()? };

    loop {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_root_from_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("repo");
        let nested = root.join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir(root.join(".git")).unwrap();

        assert_eq!(find_repository_root(&nested), Some(root));
    }

    #[test]
    fn finds_root_from_file_path() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("repo");
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        let file = root.join("src").join("main.rs");
        fs::write(&file, "fn main() {}\n").unwrap();

        assert_eq!(find_repository_root(&file), Some(root));
    }

    #[test]
    fn returns_none_outside_any_repository() {
        let tmp = tempfile::tempdir().unwrap();
        let plain = tmp.path().join("not-a-repo");
        fs::create_dir_all(&plain).unwrap();

        let found = find_repository_root(&plain);
        // The walk may only terminate at the filesystem root; nothing
        // under the temp directory should ever match.
        assert!(found.is_none_or(|root| !root.starts_with(tmp.path())));
    }
}
