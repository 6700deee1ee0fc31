use std::{collections::HashMap, sync::Mutex};

use crate::error::StoreError;

use super::PreferenceStore;

/// Preferences kept in memory for the lifetime of the value.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<(String, String), String>>,
}

impl PreferenceStore for MemoryPreferences {
    fn get_string(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(&(namespace.to_string(), key.to_string())).cloned())
    }

    fn put_string(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn put_strings(&self, namespace: &str, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        for (key, value) in entries {
            values.insert((namespace.to_string(), key.to_string()), value.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_are_separate() {
        let prefs = MemoryPreferences::default();
        prefs.put_string("a", "k", "1").unwrap();
        prefs.put_string("b", "k", "2").unwrap();

        assert_eq!(prefs.get_string("a", "k").unwrap().as_deref(), Some("1"));
        assert_eq!(prefs.get_string("b", "k").unwrap().as_deref(), Some("2"));
        assert_eq!(prefs.get_string("c", "k").unwrap(), None);
    }
}
