//! The location-to-weather retrieval workflow.
//!
//! One attempt walks through the states below and ends in `Done`. Whatever
//! the outcome, the last stored snapshot is rendered afterwards, so a failed
//! attempt never blanks out good data.
//!
//! ```text
//! Idle -> CheckingLocationServices -> AwaitingPermission
//!      -> FetchingLocation -> FetchingWeather -> Done(success | failure)
//! ```
//!
//! `refresh` enters at `FetchingLocation`, assuming services and permission
//! were already sorted out by an earlier `start`.

use chrono::Local;
use std::{
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use crate::{
    error::{LocationError, WeatherError},
    model::WeatherSnapshot,
    platform::{
        Notice, Notifier, Permission, PermissionService, Progress, Renderer, SettingsLauncher,
    },
    present::{DisplayFields, Units},
    probe::{ConnectivityProbe, LocationProbe},
    provider::WeatherProvider,
    store::WeatherStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    CheckingLocationServices,
    AwaitingPermission,
    FetchingLocation,
    FetchingWeather,
    Done { success: bool },
}

/// Per-host request parameters.
#[derive(Clone)]
pub struct WorkflowSettings {
    pub api_key: String,
    pub units: Units,
    pub location_timeout: Duration,
}

impl fmt::Debug for WorkflowSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowSettings")
            .field("api_key", &"<redacted>")
            .field("units", &self.units)
            .field("location_timeout", &self.location_timeout)
            .finish()
    }
}

/// Host collaborators the workflow reports to.
#[derive(Debug, Clone)]
pub struct Host {
    pub permissions: Arc<dyn PermissionService>,
    pub settings: Arc<dyn SettingsLauncher>,
    pub notifier: Arc<dyn Notifier>,
    pub progress: Arc<dyn Progress>,
    pub renderer: Arc<dyn Renderer>,
}

#[derive(Debug)]
pub struct RetrievalWorkflow {
    connectivity: Arc<dyn ConnectivityProbe>,
    location: Arc<dyn LocationProbe>,
    provider: Arc<dyn WeatherProvider>,
    store: WeatherStore,
    host: Host,
    settings: WorkflowSettings,
    state: Mutex<WorkflowState>,
    in_flight: AtomicBool,
    progress_shown: AtomicBool,
}

/// Clears the in-flight flag when an attempt ends, including on drop.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RetrievalWorkflow {
    pub fn new(
        connectivity: Arc<dyn ConnectivityProbe>,
        location: Arc<dyn LocationProbe>,
        provider: Arc<dyn WeatherProvider>,
        store: WeatherStore,
        host: Host,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            connectivity,
            location,
            provider,
            store,
            host,
            settings,
            state: Mutex::new(WorkflowState::Idle),
            in_flight: AtomicBool::new(false),
            progress_shown: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> WorkflowState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn store(&self) -> &WeatherStore {
        &self.store
    }

    /// Full attempt: location services, permissions, fix, connectivity, fetch.
    pub async fn start(&self) -> Result<WeatherSnapshot, WeatherError> {
        let _in_flight = self.begin()?;
        let result = self.check_access().await;
        let result = match result {
            Ok(()) => self.fetch_and_store().await,
            Err(e) => Err(e),
        };
        self.finish(result)
    }

    /// Manual refresh: a fresh location fix and fetch, skipping the access checks.
    pub async fn refresh(&self) -> Result<WeatherSnapshot, WeatherError> {
        let _in_flight = self.begin()?;
        let result = self.fetch_and_store().await;
        self.finish(result)
    }

    /// Render the stored snapshot, or nothing if none was ever saved.
    ///
    /// The label follows the units the snapshot was fetched in. Snapshots
    /// saved without units fall back to the current ones.
    pub fn render(&self) -> Option<DisplayFields> {
        let fields = self
            .store
            .load_stored()
            .map(|stored| stored.display_fields(self.settings.units, &Local));
        self.host.renderer.render(fields.as_ref());
        fields
    }

    fn begin(&self) -> Result<InFlight<'_>, WeatherError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("retrieval already in flight, ignoring request");
            return Err(WeatherError::Busy);
        }
        Ok(InFlight(&self.in_flight))
    }

    fn transition(&self, next: WorkflowState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        tracing::debug!(from = ?*state, to = ?next, "workflow transition");
        *state = next;
    }

    async fn check_access(&self) -> Result<(), WeatherError> {
        self.transition(WorkflowState::CheckingLocationServices);
        if !self.location.is_location_enabled() {
            self.host.notifier.notify(Notice::LocationServicesOff);
            self.host.settings.open_location_settings();
            return Err(WeatherError::LocationServicesDisabled);
        }

        self.transition(WorkflowState::AwaitingPermission);
        let report = self.host.permissions.request(&Permission::LOCATION).await;
        tracing::debug!(?report, "permission report");

        // A permanent denial wins over any grant in the same report.
        if report.is_any_permanently_denied() {
            self.host.notifier.notify(Notice::PermissionDenied);
            return Err(WeatherError::PermissionDenied { permanent: true });
        }
        if !report.are_all_granted() {
            self.host.notifier.notify(Notice::PermissionRationale);
            self.host.settings.open_app_details();
            return Err(WeatherError::PermissionDenied { permanent: false });
        }

        Ok(())
    }

    async fn fetch_and_store(&self) -> Result<WeatherSnapshot, WeatherError> {
        self.transition(WorkflowState::FetchingLocation);
        let timeout = self.settings.location_timeout;
        let coords = tokio::time::timeout(timeout, self.location.request_current_location())
            .await
            .map_err(|_| LocationError::Timeout(timeout))??;

        if !self.connectivity.is_available() {
            self.host.notifier.notify(Notice::NoInternet);
            return Err(WeatherError::NoConnectivity);
        }

        self.transition(WorkflowState::FetchingWeather);
        self.progress_shown.store(true, Ordering::Release);
        self.host.progress.show_progress();
        let snapshot = self
            .provider
            .fetch_weather(coords, self.settings.units, &self.settings.api_key)
            .await?;

        self.store.save(&snapshot, self.settings.units)?;
        Ok(snapshot)
    }

    fn finish(
        &self,
        result: Result<WeatherSnapshot, WeatherError>,
    ) -> Result<WeatherSnapshot, WeatherError> {
        if self.progress_shown.swap(false, Ordering::AcqRel) {
            self.host.progress.hide_progress();
        }

        // Notice-backed failures were already shown to the user.
        match &result {
            Ok(snapshot) => tracing::info!(location = %snapshot.name, "weather updated"),
            Err(WeatherError::Http { status, body }) => {
                tracing::error!(status, %body, "{}", WeatherError::classify_status(*status));
            }
            Err(e) if e.is_user_notified() => {
                tracing::debug!(error = %e, "weather retrieval stopped");
            }
            Err(e) => tracing::warn!(error = %e, "weather retrieval failed"),
        }

        self.transition(WorkflowState::Done { success: result.is_ok() });
        self.render();
        result
    }
}
