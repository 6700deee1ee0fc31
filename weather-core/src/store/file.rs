use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::error::StoreError;

use super::PreferenceStore;

type Namespace = BTreeMap<String, String>;

/// Preferences stored as one JSON object file per namespace.
///
/// Writes go through a temporary file that is renamed over the target, so a
/// reader never observes a half-written namespace.
#[derive(Debug)]
pub struct FilePreferences {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePreferences {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), write_lock: Mutex::new(()) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{namespace}.json"))
    }

    fn read_namespace(&self, path: &Path) -> Result<Option<Namespace>, StoreError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path: path.to_path_buf(), source }),
        };

        match serde_json::from_str(&text) {
            Ok(map) => Ok(Some(map)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "preference file is corrupt");
                Ok(None)
            }
        }
    }
}

impl PreferenceStore for FilePreferences {
    fn get_string(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.namespace_path(namespace);
        Ok(self.read_namespace(&path)?.and_then(|mut map| map.remove(key)))
    }

    fn put_string(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.put_strings(namespace, &[(key, value)])
    }

    fn put_strings(&self, namespace: &str, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        fs::create_dir_all(&self.dir)
            .map_err(|source| StoreError::Io { path: self.dir.clone(), source })?;

        let path = self.namespace_path(namespace);
        let mut map = self.read_namespace(&path)?.unwrap_or_default();
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }

        let text = serde_json::to_string_pretty(&map)?;
        write_replacing(&path, &text)
    }
}

/// Write `text` next to `path` and rename it into place. The temporary file
/// never outlives a failed write.
fn write_replacing(path: &Path, text: &str) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");

    let result = fs::write(&tmp, text)
        .map_err(|source| StoreError::Io { path: tmp.clone(), source })
        .and_then(|()| {
            fs::rename(&tmp, path)
                .map_err(|source| StoreError::Io { path: path.to_path_buf(), source })
        });

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = FilePreferences::new(dir.path().join("does-not-exist"));

        assert_eq!(prefs.get_string("weather", "k").unwrap(), None);
    }

    #[test]
    fn value_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        FilePreferences::new(dir.path()).put_string("weather", "k", "v").unwrap();
        let reopened = FilePreferences::new(dir.path());

        assert_eq!(reopened.get_string("weather", "k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn put_keeps_other_keys_in_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = FilePreferences::new(dir.path());

        prefs.put_string("weather", "a", "1").unwrap();
        prefs.put_string("weather", "b", "2").unwrap();
        prefs.put_string("weather", "a", "3").unwrap();

        assert_eq!(prefs.get_string("weather", "a").unwrap().as_deref(), Some("3"));
        assert_eq!(prefs.get_string("weather", "b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn put_strings_writes_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = FilePreferences::new(dir.path());

        prefs.put_strings("weather", &[("a", "1"), ("b", "2")]).unwrap();

        let reopened = FilePreferences::new(dir.path());
        assert_eq!(reopened.get_string("weather", "a").unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get_string("weather", "b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn failed_rename_removes_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory cannot be replaced by a file.
        let target = dir.path().join("weather.json");
        fs::create_dir_all(target.join("occupied")).unwrap();

        let err = write_replacing(&target, "{}").unwrap_err();

        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!dir.path().join("weather.json.tmp").exists());
        assert!(target.is_dir());
    }

    #[test]
    fn corrupt_file_is_replaced_on_next_write() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = FilePreferences::new(dir.path());
        fs::write(prefs.namespace_path("weather"), "garbage").unwrap();

        assert_eq!(prefs.get_string("weather", "k").unwrap(), None);

        prefs.put_string("weather", "k", "v").unwrap();
        assert_eq!(prefs.get_string("weather", "k").unwrap().as_deref(), Some("v"));
        assert!(!dir.path().join("weather.json.tmp").exists());
    }
}
