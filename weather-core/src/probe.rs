//! Read-only capability checks: network transport and device location.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::LocationError, model::Coordinates};

pub mod location;
pub mod sysfs;

pub use location::{DeviceLocationProbe, IpLocator};
pub use sysfs::SysfsConnectivityProbe;

pub trait ConnectivityProbe: Send + Sync + Debug {
    /// True if a WiFi, cellular or wired transport is currently active.
    fn is_available(&self) -> bool;
}

#[async_trait]
pub trait LocationProbe: Send + Sync + Debug {
    /// True if any location provider is enabled.
    fn is_location_enabled(&self) -> bool;

    /// Resolve a single current fix. Callers bound the wait themselves.
    async fn request_current_location(&self) -> Result<Coordinates, LocationError>;
}

/// Connectivity probe for hosts where the check is turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl ConnectivityProbe for AlwaysOnline {
    fn is_available(&self) -> bool {
        true
    }
}
