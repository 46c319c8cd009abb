//! SHA-256 checksum utilities
//!
//! Checksums use the canonical `sha256:<hex>` format. Installed archives are
//! fingerprinted with [`compute_file_checksum`]; extracted trees with
//! [`compute_tree_checksum`].

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of a file, streaming its contents.
pub fn compute_file_checksum(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(encode(hasher))
}

/// Compute a checksum over a directory tree.
///
/// Covers every relative path (with `/` separators, sorted) together with
/// the content of each file, so two trees hash equal only when they have the
/// same entries with the same bytes.
pub fn compute_tree_checksum(root: &Path) -> io::Result<String> {
    let mut entries = Vec::new();
    collect_entries(root, root, &mut entries)?;
    entries.sort();

    let mut hasher = Sha256::new();
    for (relative, path, is_dir) in entries {
        hasher.update(relative.as_bytes());
        hasher.update([0u8]);
        if is_dir {
            hasher.update(b"dir");
        } else {
            let mut file = File::open(&path)?;
            io::copy(&mut file, &mut hasher)?;
        }
        hasher.update([0u8]);
    }
    Ok(encode(hasher))
}

fn encode(hasher: Sha256) -> String {
    format!("{PREFIX}{:x}", hasher.finalize())
}

fn collect_entries(
    root: &Path,
    dir: &Path,
    out: &mut Vec<(String, PathBuf, bool)>,
) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let relative = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        let is_dir = entry.file_type()?.is_dir();
        out.push((relative, path.clone(), is_dir));
        if is_dir {
            collect_entries(root, &path, out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_checksum_known_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.txt");
        std::fs::write(&path, "hello world").unwrap();

        assert_eq!(
            compute_file_checksum(&path).unwrap(),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(compute_file_checksum(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn tree_checksum_sees_renames_and_content() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(a.path().join("assets")).unwrap();
        std::fs::create_dir_all(b.path().join("assets")).unwrap();
        std::fs::write(a.path().join("assets/app.js"), "x").unwrap();
        std::fs::write(b.path().join("assets/app.js"), "x").unwrap();

        assert_eq!(
            compute_tree_checksum(a.path()).unwrap(),
            compute_tree_checksum(b.path()).unwrap()
        );

        std::fs::write(b.path().join("assets/app.js"), "y").unwrap();
        assert_ne!(
            compute_tree_checksum(a.path()).unwrap(),
            compute_tree_checksum(b.path()).unwrap()
        );

        std::fs::rename(b.path().join("assets/app.js"), b.path().join("assets/main.js")).unwrap();
        std::fs::write(b.path().join("assets/main.js"), "x").unwrap();
        assert_ne!(
            compute_tree_checksum(a.path()).unwrap(),
            compute_tree_checksum(b.path()).unwrap()
        );
    }
}
