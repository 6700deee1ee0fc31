use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select};
use std::{process::ExitCode, sync::Arc};

use weather_core::{
    Config, Coordinates, Host, RetrievalWorkflow, Units, WeatherError, WeatherSnapshot,
    WeatherStore, WorkflowSettings,
    platform::Renderer,
    probe::{AlwaysOnline, ConnectivityProbe, DeviceLocationProbe, SysfsConnectivityProbe},
    provider::provider_from_config,
    store::{FilePreferences, PREFERENCE_NAMESPACE, PreferenceStore},
};

use crate::ui::{PromptPermissions, TerminalHost};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather for where you are")]
pub struct Cli {
    /// Log workflow steps to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Latitude of the location, overrides the configured one.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude of the location, overrides the configured one.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,
}

impl LocationArgs {
    fn coordinates(&self) -> Option<Coordinates> {
        self.lat.zip(self.lon).map(|(lat, lon)| Coordinates::new(lat, lon))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the API key, units and location sources.
    Configure,

    /// Check location access, fetch the current weather and show it.
    Show {
        #[command(flatten)]
        location: LocationArgs,

        /// Grant location permissions without asking.
        #[arg(long)]
        yes: bool,
    },

    /// Fetch again for a fresh location fix, skipping the permission step.
    Refresh {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Show the last stored weather without touching the network.
    Cached,

    /// Show or reset remembered location permission decisions.
    Permissions {
        #[arg(long)]
        reset: bool,
    },

    /// Print where configuration and stored data live.
    Where,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure => configure(&mut config)?,
            Command::Show { location, yes } => {
                let workflow = build_workflow(&mut config, &location, yes)?;
                return exit_code(workflow.start().await, "Weather retrieval failed");
            }
            Command::Refresh { location } => {
                let workflow = build_workflow(&mut config, &location, false)?;
                return exit_code(workflow.refresh().await, "Weather refresh failed");
            }
            Command::Cached => {
                let store = WeatherStore::new(open_preferences()?);
                let host = TerminalHost::default();
                let fields = store
                    .load_stored()
                    .map(|stored| stored.display_fields(config.effective_units(), &chrono::Local));
                host.render(fields.as_ref());
            }
            Command::Permissions { reset } => {
                let permissions = PromptPermissions::new(open_preferences()?);
                if reset {
                    permissions.reset()?;
                    println!("Location permission decisions cleared.");
                }
                permissions.print_status()?;
            }
            Command::Where => {
                println!("Config file: {}", Config::config_file_path()?.display());
                let prefs = FilePreferences::new(Config::preferences_dir()?);
                println!(
                    "Stored weather: {}",
                    prefs.namespace_path(PREFERENCE_NAMESPACE).display()
                );
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}

/// Failures the user already saw as a notice only set the exit status.
fn exit_code(
    result: Result<WeatherSnapshot, WeatherError>,
    context: &'static str,
) -> anyhow::Result<ExitCode> {
    match result {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) if e.is_user_notified() => Ok(ExitCode::FAILURE),
        Err(e) => Err(e).context(context),
    }
}

fn open_preferences() -> anyhow::Result<Arc<dyn PreferenceStore>> {
    Ok(Arc::new(FilePreferences::new(Config::preferences_dir()?)))
}

fn build_workflow(
    config: &mut Config,
    location: &LocationArgs,
    auto_grant: bool,
) -> anyhow::Result<RetrievalWorkflow> {
    if let Some(coords) = location.coordinates() {
        config.set_fixed_location(Some(coords));
    }

    let settings = WorkflowSettings {
        api_key: config.require_api_key()?.to_string(),
        units: config.effective_units(),
        location_timeout: config.location.timeout(),
    };

    let location_probe = Arc::new(DeviceLocationProbe::from_config(config)?);
    let connectivity: Arc<dyn ConnectivityProbe> = if config.connectivity.check {
        Arc::new(SysfsConnectivityProbe::new(config.connectivity.sysfs_root.clone()))
    } else {
        Arc::new(AlwaysOnline)
    };

    let prefs = open_preferences()?;
    let terminal = Arc::new(TerminalHost::default());
    let host = Host {
        permissions: Arc::new(PromptPermissions::new(prefs.clone()).auto_grant(auto_grant)),
        settings: terminal.clone(),
        notifier: terminal.clone(),
        progress: terminal.clone(),
        renderer: terminal,
    };

    Ok(RetrievalWorkflow::new(
        connectivity,
        location_probe,
        provider_from_config(config)?,
        WeatherStore::new(prefs),
        host,
        settings,
    ))
}

fn configure(config: &mut Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }

    let unit_choices = vec!["auto (from locale)", "metric", "imperial", "standard"];
    let units = Select::new("Units:", unit_choices).prompt()?;
    config.units = match units {
        "metric" => Some(Units::Metric),
        "imperial" => Some(Units::Imperial),
        "standard" => Some(Units::Standard),
        _ => None,
    };

    let fixed = Confirm::new("Use a fixed location?")
        .with_default(config.location.fixed_coordinates().is_some())
        .prompt()?;
    if fixed {
        let lat = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number")
            .prompt()?;
        let lon = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number")
            .prompt()?;
        config.set_fixed_location(Some(Coordinates::new(lat, lon)));
    } else {
        config.set_fixed_location(None);
    }

    config.location.ip_lookup = Confirm::new("Look up the location from your IP address?")
        .with_default(config.location.ip_lookup)
        .prompt()?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}
