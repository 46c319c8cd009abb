//! Path containment and file-name validation

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Validate that `name` can be used verbatim as a single file-name stem.
///
/// Spaces and non-ASCII text are fine. Rejects empty or blank names, path
/// separators, names starting with a dot (which covers `.` and `..`) and
/// control characters, so the result can never address a different
/// directory or a hidden file.
pub fn validate_file_stem(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.starts_with('.') {
        return Err(invalid("must not start with '.'"));
    }
    if name.contains(['/', '\\']) {
        return Err(invalid("must not contain a path separator"));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("must not contain control characters"));
    }
    Ok(())
}

/// Resolve a bundle-relative path against `root`, refusing anything that
/// would land outside of it.
///
/// Leading separators are stripped (`/index.html` means `index.html` inside
/// the bundle). `..` components and drive prefixes are rejected. The result
/// is not required to exist.
pub fn resolve_within(root: &Path, relative: &str) -> Result<PathBuf> {
    let trimmed = relative.trim_start_matches(['/', '\\']);
    let normalized = trimmed.replace('\\', "/");
    let escape = || Error::PathEscape {
        path: relative.to_string(),
        root: root.to_path_buf(),
    };

    let mut resolved = root.to_path_buf();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(escape());
            }
        }
    }

    if resolved == root {
        return Err(escape());
    }
    Ok(resolved)
}
