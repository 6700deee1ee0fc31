//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration handling
//! - Connectivity and location probes
//! - The OpenWeather client behind the `WeatherProvider` trait
//! - Persistence of the last good snapshot
//! - Mapping of a snapshot to display fields
//! - The retrieval workflow tying these together
//!
//! Hosts supply the collaborators in [`platform`] (permission prompt,
//! settings screens, notices, progress, rendering).

pub mod config;
pub mod error;
pub mod model;
pub mod platform;
pub mod present;
pub mod probe;
pub mod provider;
pub mod store;
pub mod workflow;

pub use config::Config;
pub use error::{LocationError, StoreError, WeatherError};
pub use model::{Coordinates, WeatherSnapshot};
pub use present::{DisplayFields, Units, WeatherIcon, to_display_fields, unit_label};
pub use probe::{ConnectivityProbe, LocationProbe};
pub use provider::WeatherProvider;
pub use store::{PreferenceStore, StoredWeather, WeatherStore};
pub use workflow::{Host, RetrievalWorkflow, WorkflowSettings, WorkflowState};
