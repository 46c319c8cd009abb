//! Package manifest parsing for `zapp.json` files.
//!
//! Parsing is permissive: every field is optional, unknown fields are
//! ignored and a field of the wrong JSON type is coerced or dropped rather
//! than failing the whole manifest (`"version": 1.1` reads as `"1.1"`,
//! `"width": "1024"` as `1024`). Only text that is not a JSON object is
//! invalid. Callers enforce what they need (`id` for install, `id` and
//! `entry` for launch) through [`PackageManifest::id`] and
//! [`PackageManifest::entry`].
//!
//! # Example
//!
//! ```json
//! {
//!   "id": "com.acme.notes",
//!   "name": "Notes",
//!   "version": "1.1",
//!   "icon": "assets/icon.png",
//!   "entry": "index.html",
//!   "window": { "width": 1024, "height": 768, "resizable": false }
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::MANIFEST_FILENAME;
use crate::error::{Error, Result};

const DEFAULT_WIDTH: u32 = 800;
const DEFAULT_HEIGHT: u32 = 600;
const DEFAULT_TITLE: &str = "Zapp";

/// Manifest as declared by the bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PackageManifest {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form; never compared or ordered.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    #[serde(default, deserialize_with = "lenient_window", skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowHints>,
}

/// Window sizing hints. Missing or zero dimensions fall back to defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WindowHints {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub height: Option<u32>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub resizable: Option<bool>,
}

/// Scalars become their text form; arrays, objects and null are absent.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Non-negative integers, whole floats and numeric strings.
fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_window<'de, D>(deserializer: D) -> std::result::Result<Option<WindowHints>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// Fully resolved window configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            resizable: true,
        }
    }
}

impl PackageManifest {
    /// Parse manifest text. Fails only when `content` is not a JSON object.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        let object: Map<String, Value> = serde_json::from_str(content)?;
        serde_json::from_value(Value::Object(object))
    }

    /// The package id, if present and non-blank.
    pub fn id(&self) -> Option<&str> {
        non_blank(self.id.as_deref())
    }

    /// The entry path, if present and non-blank.
    pub fn entry(&self) -> Option<&str> {
        non_blank(self.entry.as_deref())
    }

    /// The icon path, if present and non-blank.
    pub fn icon(&self) -> Option<&str> {
        non_blank(self.icon.as_deref())
    }

    /// Window title: the display name, or `"Zapp"`.
    pub fn title(&self) -> &str {
        non_blank(self.name.as_deref()).unwrap_or(DEFAULT_TITLE)
    }

    pub fn window(&self) -> WindowSpec {
        let hints = self.window.unwrap_or_default();
        let defaults = WindowSpec::default();
        WindowSpec {
            width: hints.width.filter(|w| *w > 0).unwrap_or(defaults.width),
            height: hints.height.filter(|h| *h > 0).unwrap_or(defaults.height),
            resizable: hints.resizable.unwrap_or(defaults.resizable),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Read the manifest at the root of an extracted bundle.
///
/// Fails with [`Error::ManifestMissing`] when `zapp.json` does not exist and
/// [`Error::ManifestInvalid`] when it is not a JSON object. No further
/// validation happens here.
pub fn read_manifest(dir: &Path) -> Result<PackageManifest> {
    let path = dir.join(MANIFEST_FILENAME);
    if !path.is_file() {
        return Err(Error::ManifestMissing { path });
    }
    let content = std::fs::read_to_string(&path).map_err(|e| Error::ManifestInvalid {
        path: path.clone(),
        message: e.to_string(),
    })?;
    PackageManifest::from_json(&content).map_err(|e| Error::ManifestInvalid {
        path,
        message: e.to_string(),
    })
}

/// Read the manifest straight out of an archive without extracting it.
pub fn read_archive_manifest(archive: &Path) -> Result<PackageManifest> {
    let file = File::open(archive).map_err(|e| Error::ExtractionFailed {
        archive: archive.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| {
        Error::ExtractionFailed {
            archive: archive.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    let manifest_path = archive.join(MANIFEST_FILENAME);
    let mut entry = match zip.by_name(MANIFEST_FILENAME) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(Error::ManifestMissing {
                path: manifest_path,
            });
        }
        Err(e) => {
            return Err(Error::ExtractionFailed {
                archive: archive.to_path_buf(),
                message: e.to_string(),
            });
        }
    };

    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| Error::ManifestInvalid {
            path: manifest_path.clone(),
            message: e.to_string(),
        })?;
    PackageManifest::from_json(&content).map_err(|e| Error::ManifestInvalid {
        path: manifest_path,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use zapps_test_utils::ZappBuilder;

    #[test]
    fn test_parse_full_manifest() {
        let manifest = PackageManifest::from_json(
            &json!({
                "id": "com.acme.notes",
                "name": "Notes",
                "version": "1.1",
                "icon": "assets/icon.png",
                "entry": "index.html",
                "window": { "width": 1024, "height": 768, "resizable": false }
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(manifest.id(), Some("com.acme.notes"));
        assert_eq!(manifest.entry(), Some("index.html"));
        assert_eq!(manifest.icon(), Some("assets/icon.png"));
        assert_eq!(manifest.title(), "Notes");
        assert_eq!(
            manifest.window(),
            WindowSpec {
                width: 1024,
                height: 768,
                resizable: false
            }
        );
    }

    #[test]
    fn test_parse_is_permissive() {
        let manifest =
            PackageManifest::from_json(r#"{"unexpected": [1, 2], "name": "Bare"}"#).unwrap();
        assert_eq!(manifest.id(), None);
        assert_eq!(manifest.entry(), None);
        assert_eq!(manifest.title(), "Bare");
    }

    #[test]
    fn test_scalar_fields_are_coerced() {
        let manifest = PackageManifest::from_json(
            r#"{"id": "com.acme.calc", "entry": "index.html", "version": 1.1, "name": 42}"#,
        )
        .unwrap();
        assert_eq!(manifest.version.as_deref(), Some("1.1"));
        assert_eq!(manifest.title(), "42");
        assert_eq!(manifest.id(), Some("com.acme.calc"));
    }

    #[test]
    fn test_window_hints_accept_strings() {
        let manifest = PackageManifest::from_json(
            r#"{"window": {"width": "1024", "height": 768.0, "resizable": "false"}}"#,
        )
        .unwrap();
        assert_eq!(
            manifest.window(),
            WindowSpec {
                width: 1024,
                height: 768,
                resizable: false
            }
        );
    }

    #[test]
    fn test_mismatched_fields_are_absent() {
        let manifest = PackageManifest::from_json(
            r#"{"id": ["a"], "entry": {"path": "x"}, "window": "large"}"#,
        )
        .unwrap();
        assert_eq!(manifest.id(), None);
        assert_eq!(manifest.entry(), None);
        assert_eq!(manifest.window, None);

        let odd = PackageManifest::from_json(
            r#"{"window": {"width": -5, "height": "tall", "resizable": 1}}"#,
        )
        .unwrap();
        assert_eq!(odd.window(), WindowSpec::default());
    }

    #[test]
    fn test_read_manifest_numeric_version() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILENAME),
            r#"{"id": "a", "entry": "i.html", "version": 1.1}"#,
        )
        .unwrap();
        let manifest = read_manifest(dir.path()).unwrap();
        assert_eq!(manifest.version.as_deref(), Some("1.1"));
    }

    #[test]
    fn test_window_defaults() {
        let manifest = PackageManifest::default();
        assert_eq!(manifest.window(), WindowSpec::default());
        assert_eq!(manifest.title(), "Zapp");

        let partial = PackageManifest::from_json(
            r#"{"window": {"width": 0, "resizable": false}}"#,
        )
        .unwrap();
        assert_eq!(
            partial.window(),
            WindowSpec {
                width: 800,
                height: 600,
                resizable: false
            }
        );
    }

    #[test]
    fn test_blank_fields_treated_as_absent() {
        let manifest =
            PackageManifest::from_json(r#"{"id": "  ", "entry": "", "name": ""}"#).unwrap();
        assert_eq!(manifest.id(), None);
        assert_eq!(manifest.entry(), None);
        assert_eq!(manifest.title(), "Zapp");
    }

    #[test]
    fn test_read_manifest_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_manifest(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ManifestMissing { .. }), "got: {err:?}");
    }

    #[test]
    fn test_read_manifest_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILENAME), "{ id: nope").unwrap();
        let err = read_manifest(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ManifestInvalid { .. }), "got: {err:?}");
    }

    #[test]
    fn test_read_manifest_non_object_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILENAME), "[1, 2, 3]").unwrap();
        let err = read_manifest(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ManifestInvalid { .. }), "got: {err:?}");
    }

    #[test]
    fn test_read_archive_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let archive = ZappBuilder::app("com.acme.notes", "2.0").write_to(&dir.path().join("a.zapp"));

        let manifest = read_archive_manifest(&archive).unwrap();
        assert_eq!(manifest.id(), Some("com.acme.notes"));
        assert_eq!(manifest.version.as_deref(), Some("2.0"));
    }

    #[test]
    fn test_read_archive_manifest_missing() {
        let dir = tempfile::tempdir().unwrap();
        let archive = ZappBuilder::new()
            .file("index.html", "x")
            .write_to(&dir.path().join("a.zapp"));

        let err = read_archive_manifest(&archive).unwrap_err();
        assert!(matches!(err, Error::ManifestMissing { .. }), "got: {err:?}");
    }
}
