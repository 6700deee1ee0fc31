//! Terminal implementations of the host collaborators.

use anyhow::Context;
use async_trait::async_trait;
use inquire::Select;
use std::{
    io::{self, IsTerminal},
    sync::Arc,
};

use weather_core::{
    Config, DisplayFields,
    platform::{
        Notice, NoticeLength, Notifier, Permission, PermissionReport, PermissionService,
        PermissionStatus, Progress, Renderer, SettingsLauncher,
    },
    store::PreferenceStore,
};

const PERMISSION_NAMESPACE: &str = "permissions";
const LOCATION_DECISION_KEY: &str = "location";

const GRANTED: &str = "granted";
const DENIED: &str = "denied";

const ALLOW: &str = "Allow";
const NOT_NOW: &str = "Not now";
const NEVER: &str = "Never";

/// Notices, settings hints, progress and weather output on the terminal.
#[derive(Debug, Default)]
pub struct TerminalHost;

impl Notifier for TerminalHost {
    fn notify(&self, notice: Notice) {
        match notice.length() {
            NoticeLength::Short => eprintln!("! {notice}"),
            NoticeLength::Long => eprintln!("!! {notice}"),
        }
    }
}

impl SettingsLauncher for TerminalHost {
    fn open_location_settings(&self) {
        let path = Config::config_file_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "the config file".to_string());
        eprintln!(
            "  Turn on a location source: pass --lat/--lon, run `weather configure`, \
             or enable `ip_lookup` in {path}"
        );
    }

    fn open_app_details(&self) {
        eprintln!("  Run `weather permissions --reset` to be asked again.");
    }
}

// Only drawn on an interactive stderr.
impl Progress for TerminalHost {
    fn show_progress(&self) {
        if io::stderr().is_terminal() {
            eprint!("Fetching weather...");
        }
    }

    fn hide_progress(&self) {
        if io::stderr().is_terminal() {
            // Carriage return, then erase the line.
            eprint!("\r\x1b[2K");
        }
    }
}

impl Renderer for TerminalHost {
    fn render(&self, fields: Option<&DisplayFields>) {
        let Some(f) = fields else {
            println!("No weather data yet. Run `weather show` to fetch it.");
            return;
        };

        let icon = f.icon.map(|i| format!(" [{i}]")).unwrap_or_default();
        println!("{}, {}{}", f.name, f.country, icon);
        println!("{} ({})", f.main, f.description);
        println!("  {:<12}{}  ({} / {})", "Temperature", f.temperature, f.temp_max, f.temp_min);
        println!("  {:<12}{}", "Humidity", f.humidity);
        println!("  {:<12}{}", "Wind", f.wind_speed);
        println!("  {:<12}{}", "Sunrise", f.sunrise);
        println!("  {:<12}{}", "Sunset", f.sunset);
    }
}

/// Asks for location access once and remembers "Allow" and "Never".
#[derive(Debug)]
pub struct PromptPermissions {
    prefs: Arc<dyn PreferenceStore>,
    auto_grant: bool,
}

impl PromptPermissions {
    pub fn new(prefs: Arc<dyn PreferenceStore>) -> Self {
        Self { prefs, auto_grant: false }
    }

    pub fn auto_grant(mut self, auto_grant: bool) -> Self {
        self.auto_grant = auto_grant;
        self
    }

    pub fn reset(&self) -> anyhow::Result<()> {
        self.prefs
            .put_string(PERMISSION_NAMESPACE, LOCATION_DECISION_KEY, "")
            .context("Failed to clear permission decision")
    }

    pub fn print_status(&self) -> anyhow::Result<()> {
        let status = match self.stored_decision()?.as_deref() {
            Some(GRANTED) => "allowed",
            Some(DENIED) => "denied permanently",
            _ => "not decided, you will be asked",
        };
        println!("Location access: {status}");
        Ok(())
    }

    fn stored_decision(&self) -> anyhow::Result<Option<String>> {
        self.prefs
            .get_string(PERMISSION_NAMESPACE, LOCATION_DECISION_KEY)
            .context("Failed to read permission decision")
    }

    fn remember(&self, decision: &str) {
        if let Err(e) = self.prefs.put_string(PERMISSION_NAMESPACE, LOCATION_DECISION_KEY, decision)
        {
            tracing::warn!(error = %e, "failed to remember permission decision");
        }
    }

    async fn prompt(permissions: &[Permission]) -> PermissionStatus {
        let names: Vec<&str> = permissions.iter().map(Permission::as_str).collect();
        let question = format!("Allow access to your {}?", names.join(" and "));

        let answer = tokio::task::spawn_blocking(move || {
            Select::new(&question, vec![ALLOW, NOT_NOW, NEVER]).prompt()
        })
        .await;

        match answer {
            Ok(Ok(ALLOW)) => PermissionStatus::Granted,
            Ok(Ok(NEVER)) => PermissionStatus::PermanentlyDenied,
            Ok(Ok(_)) => PermissionStatus::Rationale,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "permission prompt unavailable");
                PermissionStatus::Rationale
            }
            Err(e) => {
                tracing::warn!(error = %e, "permission prompt failed");
                PermissionStatus::Rationale
            }
        }
    }
}

#[async_trait]
impl PermissionService for PromptPermissions {
    async fn request(&self, permissions: &[Permission]) -> PermissionReport {
        if self.auto_grant {
            return PermissionReport::all_granted(permissions);
        }

        let stored = self.stored_decision().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring stored permission decision");
            None
        });

        let status = match stored.as_deref() {
            Some(GRANTED) => PermissionStatus::Granted,
            Some(DENIED) => PermissionStatus::PermanentlyDenied,
            _ => {
                let status = Self::prompt(permissions).await;
                match status {
                    PermissionStatus::Granted => self.remember(GRANTED),
                    PermissionStatus::PermanentlyDenied => self.remember(DENIED),
                    PermissionStatus::Rationale => {}
                }
                status
            }
        };

        PermissionReport::new(permissions.iter().map(|p| (*p, status)).collect())
    }
}
