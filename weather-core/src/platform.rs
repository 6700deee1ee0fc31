//! Host-side collaborators the workflow talks to.
//!
//! A host (terminal, GUI, test harness) implements these to ask for
//! permissions, open settings screens, show transient notices, signal a
//! pending network call and draw the weather fields.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::present::DisplayFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    FineLocation,
    CoarseLocation,
}

impl Permission {
    pub const LOCATION: [Permission; 2] = [Permission::FineLocation, Permission::CoarseLocation];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::FineLocation => "precise location",
            Permission::CoarseLocation => "approximate location",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    /// Denied for now; the user should be told why it is needed.
    Rationale,
    PermanentlyDenied,
}

/// Aggregated answer for one permission request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionReport {
    pub statuses: Vec<(Permission, PermissionStatus)>,
}

impl PermissionReport {
    pub fn new(statuses: Vec<(Permission, PermissionStatus)>) -> Self {
        Self { statuses }
    }

    pub fn all_granted(permissions: &[Permission]) -> Self {
        Self::new(permissions.iter().map(|p| (*p, PermissionStatus::Granted)).collect())
    }

    pub fn are_all_granted(&self) -> bool {
        !self.statuses.is_empty()
            && self.statuses.iter().all(|(_, s)| *s == PermissionStatus::Granted)
    }

    pub fn is_any_permanently_denied(&self) -> bool {
        self.statuses.iter().any(|(_, s)| *s == PermissionStatus::PermanentlyDenied)
    }
}

#[async_trait]
pub trait PermissionService: Send + Sync + Debug {
    async fn request(&self, permissions: &[Permission]) -> PermissionReport;
}

pub trait SettingsLauncher: Send + Sync + Debug {
    fn open_location_settings(&self);
    fn open_app_details(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLength {
    Short,
    Long,
}

/// User-visible notices raised by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    LocationServicesOff,
    PermissionRationale,
    PermissionDenied,
    NoInternet,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::LocationServicesOff => "Your location services are off. Please turn them on.",
            Notice::PermissionRationale => {
                "The location permissions required for this feature are turned off. \
                 They can be enabled under application settings."
            }
            Notice::PermissionDenied => {
                "You have denied location permissions. They are required for the app to work."
            }
            Notice::NoInternet => "No internet connection available.",
        }
    }

    pub fn length(&self) -> NoticeLength {
        match self {
            Notice::PermissionDenied => NoticeLength::Long,
            _ => NoticeLength::Short,
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

pub trait Notifier: Send + Sync + Debug {
    fn notify(&self, notice: Notice);
}

/// Busy indicator around the provider call.
pub trait Progress: Send + Sync + Debug {
    fn show_progress(&self);
    fn hide_progress(&self);
}

pub trait Renderer: Send + Sync + Debug {
    /// `None` means nothing has ever been fetched.
    fn render(&self, fields: Option<&DisplayFields>);
}
