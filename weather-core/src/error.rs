/// Failures of a location fix.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("No location provider is enabled")]
    ProviderDisabled,
    #[error("Location request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("Location lookup failed: {0}")]
    Lookup(String),
}

/// Failures of the preference store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to access preference file {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize preferences: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Terminal failures of one retrieval attempt. None of them triggers a retry.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Location services are turned off")]
    LocationServicesDisabled,
    #[error("Location permission denied{}", permanence(.permanent))]
    PermissionDenied { permanent: bool },
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error("No internet connection available")]
    NoConnectivity,
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Weather request failed with status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Failed to decode weather response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Failed to persist weather snapshot: {0}")]
    Store(#[from] StoreError),
    #[error("A weather retrieval is already in flight")]
    Busy,
}

fn permanence(permanent: &bool) -> &'static str {
    if *permanent { " permanently" } else { "" }
}

impl WeatherError {
    /// Log label for an HTTP status. Only used for logging, never for branching.
    pub fn classify_status(status: u16) -> &'static str {
        match status {
            400 => "Bad request",
            404 => "Not found",
            _ => "Generic error",
        }
    }

    /// Whether the host already showed a notice for this failure.
    pub fn is_user_notified(&self) -> bool {
        matches!(
            self,
            WeatherError::LocationServicesDisabled
                | WeatherError::PermissionDenied { .. }
                | WeatherError::NoConnectivity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_notice_backed_failures_count_as_notified() {
        assert!(WeatherError::LocationServicesDisabled.is_user_notified());
        assert!(WeatherError::PermissionDenied { permanent: true }.is_user_notified());
        assert!(WeatherError::NoConnectivity.is_user_notified());

        assert!(!WeatherError::Http { status: 404, body: String::new() }.is_user_notified());
        assert!(!WeatherError::Location(LocationError::ProviderDisabled).is_user_notified());
        assert!(!WeatherError::Busy.is_user_notified());
    }

    #[test]
    fn permission_message_reflects_permanence() {
        let soft = WeatherError::PermissionDenied { permanent: false }.to_string();
        let hard = WeatherError::PermissionDenied { permanent: true }.to_string();

        assert_eq!(soft, "Location permission denied");
        assert_eq!(hard, "Location permission denied permanently");
    }

    #[test]
    fn known_statuses_are_classified() {
        assert_eq!(WeatherError::classify_status(400), "Bad request");
        assert_eq!(WeatherError::classify_status(404), "Not found");
        assert_eq!(WeatherError::classify_status(500), "Generic error");
    }
}
