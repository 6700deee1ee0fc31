//! Persistence of the last successfully fetched snapshot.
//!
//! The snapshot lives in a single slot of an injected [`PreferenceStore`].
//! Writing replaces the slot; a missing or unreadable slot loads as empty.

use std::{fmt::Debug, sync::Arc};

use chrono::TimeZone;

use crate::{
    error::StoreError,
    model::WeatherSnapshot,
    present::{DisplayFields, Units, to_display_fields},
};

pub mod file;
pub mod memory;

pub use file::FilePreferences;
pub use memory::MemoryPreferences;

pub const PREFERENCE_NAMESPACE: &str = "weather";
pub const SNAPSHOT_KEY: &str = "last_snapshot";
pub const UNITS_KEY: &str = "last_snapshot_units";

/// String key-value storage grouped into namespaces.
pub trait PreferenceStore: Send + Sync + Debug {
    fn get_string(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError>;

    /// Visible to the next `get_string` once this returns.
    fn put_string(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError>;

    /// Write several keys of one namespace. Backends that can should make
    /// this all-or-nothing.
    fn put_strings(&self, namespace: &str, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.put_string(namespace, key, value)?;
        }
        Ok(())
    }
}

/// A stored snapshot and the units it was requested in.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredWeather {
    pub snapshot: WeatherSnapshot,
    /// `None` for slots written without units.
    pub units: Option<Units>,
}

impl StoredWeather {
    /// Display fields labelled with the stored units, or `fallback` when unknown.
    pub fn display_fields<Tz>(&self, fallback: Units, tz: &Tz) -> DisplayFields
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        to_display_fields(&self.snapshot, self.units.unwrap_or(fallback), tz)
    }
}

#[derive(Debug, Clone)]
pub struct WeatherStore {
    prefs: Arc<dyn PreferenceStore>,
}

impl WeatherStore {
    pub fn new(prefs: Arc<dyn PreferenceStore>) -> Self {
        Self { prefs }
    }

    /// Replace the slot with `snapshot`, fetched in `units`.
    pub fn save(&self, snapshot: &WeatherSnapshot, units: Units) -> Result<(), StoreError> {
        let text = serde_json::to_string(snapshot)?;
        self.prefs.put_strings(
            PREFERENCE_NAMESPACE,
            &[(SNAPSHOT_KEY, &text), (UNITS_KEY, units.as_str())],
        )?;
        tracing::debug!(bytes = text.len(), %units, "stored weather snapshot");
        Ok(())
    }

    /// The stored snapshot together with its units.
    pub fn load_stored(&self) -> Option<StoredWeather> {
        let snapshot = self.load()?;
        let units = match self.prefs.get_string(PREFERENCE_NAMESPACE, UNITS_KEY) {
            Ok(Some(text)) => Units::parse(&text),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored snapshot units");
                None
            }
        };
        Some(StoredWeather { snapshot, units })
    }

    pub fn load(&self) -> Option<WeatherSnapshot> {
        let text = match self.prefs.get_string(PREFERENCE_NAMESPACE, SNAPSHOT_KEY) {
            Ok(Some(text)) if !text.is_empty() => text,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored weather snapshot");
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "stored weather snapshot is corrupt, ignoring it");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::SAMPLE_BODY;

    fn store() -> (Arc<MemoryPreferences>, WeatherStore) {
        let prefs = Arc::new(MemoryPreferences::default());
        let store = WeatherStore::new(prefs.clone());
        (prefs, store)
    }

    fn sample() -> WeatherSnapshot {
        serde_json::from_str(SAMPLE_BODY).unwrap()
    }

    #[test]
    fn load_after_save_returns_equal_snapshot() {
        let (_, store) = store();
        let snapshot = sample();

        store.save(&snapshot, Units::Metric).unwrap();

        assert_eq!(store.load(), Some(snapshot));
    }

    #[test]
    fn units_are_stored_with_snapshot() {
        let (_, store) = store();
        let snapshot = sample();

        store.save(&snapshot, Units::Metric).unwrap();
        store.save(&snapshot, Units::Imperial).unwrap();

        let stored = store.load_stored().unwrap();
        assert_eq!(stored.snapshot, snapshot);
        assert_eq!(stored.units, Some(Units::Imperial));
    }

    #[test]
    fn snapshot_without_units_loads_with_unknown_units() {
        let (prefs, store) = store();
        prefs.put_string(PREFERENCE_NAMESPACE, SNAPSHOT_KEY, SAMPLE_BODY).unwrap();

        let stored = store.load_stored().unwrap();
        assert_eq!(stored.units, None);

        let fields = stored.display_fields(Units::Imperial, &chrono::Utc);
        assert_eq!(fields.temperature, "-1.5F");
    }

    #[test]
    fn stored_units_win_over_fallback_label() {
        let (_, store) = store();
        store.save(&sample(), Units::Metric).unwrap();

        let fields = store.load_stored().unwrap().display_fields(Units::Imperial, &chrono::Utc);
        assert_eq!(fields.temperature, "-1.5°C");
    }

    #[test]
    fn never_written_slot_is_empty() {
        let (_, store) = store();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn corrupt_slot_is_empty() {
        let (prefs, store) = store();
        prefs.put_string(PREFERENCE_NAMESPACE, SNAPSHOT_KEY, "{not json").unwrap();

        assert_eq!(store.load(), None);
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let (_, store) = store();
        let first = sample();
        let mut second = sample();
        second.name = "Modena".into();
        second.weather.clear();

        store.save(&first, Units::Metric).unwrap();
        store.save(&second, Units::Metric).unwrap();

        assert_eq!(store.load(), Some(second));
    }
}
