use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::{fs, io};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::vault::EncryptedSecret;

/// A saved combination of repository path, remote name and branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub path: String,
    pub remote: String,
    pub branch: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            path: String::new(),
            remote: "origin".to_string(),
            branch: String::new(),
        }
    }
}

/// A failed write. Reads never produce this: a missing or corrupt data file
/// degrades to the empty default instead.
#[derive(Debug)]
pub struct StoreError {
    pub path: PathBuf,
    pub reason: String,
}

impl StoreError {
    fn new(path: &Path, reason: impl fmt::Display) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to write {}: {}", self.path.display(), self.reason)
    }
}

impl std::error::Error for StoreError {}

fn load_json(path: &Path) -> Option<Value> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read data file, using defaults");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "data file is not valid JSON, using defaults");
            None
        }
    }
}

/// Write via a temp file in the destination directory, then rename into
/// place, so a crash mid-write cannot clobber previously-good data.
fn write_json(path: &Path, json: &str) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| StoreError::new(path, e))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::new(path, e))?;
    tmp.write_all(json.as_bytes())
        .map_err(|e| StoreError::new(path, e))?;
    tmp.persist(path).map_err(|e| StoreError::new(path, e))?;
    Ok(())
}

/// Load a list of strings. Missing file, unreadable file, non-list JSON and
/// non-string entries all degrade silently.
pub fn load_list(path: &Path) -> Vec<String> {
    match load_json(path) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Some(_) => {
            warn!(path = %path.display(), "data file does not contain a list, using defaults");
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Save a list of strings, deduplicated (first occurrence wins, order
/// preserved).
pub fn save_list(path: &Path, items: &[String]) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    let mut cleaned = Vec::new();
    for item in items {
        if seen.insert(item.as_str()) {
            cleaned.push(item.clone());
        }
    }
    let json = serde_json::to_string_pretty(&cleaned).map_err(|e| StoreError::new(path, e))?;
    write_json(path, &json)
}

/// Load the profile map. Any structural mismatch degrades to empty.
pub fn load_profiles(path: &Path) -> BTreeMap<String, Profile> {
    let Some(value) = load_json(path) else {
        return BTreeMap::new();
    };
    match serde_json::from_value(value) {
        Ok(profiles) => profiles,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "profile file has unexpected shape, using defaults");
            BTreeMap::new()
        }
    }
}

/// Overwrite the profile map, pretty-printed so the file stays inspectable.
pub fn save_profiles(path: &Path, profiles: &BTreeMap<String, Profile>) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(profiles).map_err(|e| StoreError::new(path, e))?;
    write_json(path, &json)
}

/// Load the encrypted credential payload, if one has been saved.
pub fn load_secret(path: &Path) -> Option<EncryptedSecret> {
    let value = load_json(path)?;
    match serde_json::from_value(value) {
        Ok(secret) => Some(secret),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "credential file has unexpected shape");
            None
        }
    }
}

pub fn save_secret(path: &Path, secret: &EncryptedSecret) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(secret).map_err(|e| StoreError::new(path, e))?;
    write_json(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_list_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        let items = vec![
            "/repos/a".to_string(),
            "/repos/b".to_string(),
            "/repos/a".to_string(),
        ];
        save_list(&path, &items).unwrap();
        assert_eq!(
            load_list(&path),
            vec!["/repos/a".to_string(), "/repos/b".to_string()]
        );
    }

    #[test]
    fn test_load_list_missing_file() {
        let dir = tempdir().unwrap();
        assert!(load_list(&dir.path().join("nope.json")).is_empty());
    }

    #[test]
    fn test_load_list_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_list(&path).is_empty());
    }

    #[test]
    fn test_load_list_drops_non_strings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        fs::write(&path, r#"["a", "b", 1, null, "a"]"#).unwrap();
        // Non-strings are dropped on load; dedup happens on save
        assert_eq!(
            load_list(&path),
            vec!["a".to_string(), "b".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn test_load_list_wrong_top_level_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        fs::write(&path, r#"{"a": 1}"#).unwrap();
        assert!(load_list(&path).is_empty());
    }

    #[test]
    fn test_save_list_preserves_insertion_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        let items: Vec<String> = ["c", "a", "b", "a", "c"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        save_list(&path, &items).unwrap();
        assert_eq!(
            load_list(&path),
            vec!["c".to_string(), "a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_save_list_write_failure_surfaces() {
        // A file where the parent directory should be
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file").unwrap();
        let path = blocker.join("favorites.json");
        assert!(save_list(&path, &["a".to_string()]).is_err());
    }

    #[test]
    fn test_save_and_load_profiles_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "main".to_string(),
            Profile {
                path: "/tmp/repo".to_string(),
                remote: "origin".to_string(),
                branch: "main".to_string(),
            },
        );
        save_profiles(&path, &profiles).unwrap();
        assert_eq!(load_profiles(&path), profiles);
    }

    #[test]
    fn test_profiles_are_pretty_printed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        let mut profiles = BTreeMap::new();
        profiles.insert("work".to_string(), Profile::default());
        save_profiles(&path, &profiles).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains('\n'));
    }

    #[test]
    fn test_load_profiles_wrong_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(&path, r#"["not", "a", "map"]"#).unwrap();
        assert!(load_profiles(&path).is_empty());
    }

    #[test]
    fn test_profile_missing_remote_defaults_to_origin() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(&path, r#"{"main": {"path": "/tmp/repo", "branch": "main"}}"#).unwrap();
        let profiles = load_profiles(&path);
        assert_eq!(profiles["main"].remote, "origin");
    }

    #[test]
    fn test_overwrite_keeps_latest_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        save_list(&path, &["old".to_string()]).unwrap();
        save_list(&path, &["new".to_string()]).unwrap();
        assert_eq!(load_list(&path), vec!["new".to_string()]);
    }

    #[test]
    fn test_secret_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credential.json");
        assert!(load_secret(&path).is_none());
        let secret = crate::vault::encrypt("api-key", "password").unwrap();
        save_secret(&path, &secret).unwrap();
        let restored = load_secret(&path).unwrap();
        assert_eq!(crate::vault::decrypt(&restored, "password").unwrap(), "api-key");
    }
}
