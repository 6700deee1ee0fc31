//! Conversion of a snapshot into display-ready text fields.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::model::WeatherSnapshot;

/// Locale region codes that display Fahrenheit.
const FAHRENHEIT_REGIONS: [&str; 3] = ["US", "LR", "MM"];

/// Unit system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    Imperial,
    Standard,
}

impl Units {
    /// Query value understood by the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    /// Inverse of [`Units::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "metric" => Some(Units::Metric),
            "imperial" => Some(Units::Imperial),
            "standard" => Some(Units::Standard),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "F",
            Units::Standard => "K",
        }
    }

    /// Fahrenheit regions get imperial units, everyone else metric.
    pub fn for_locale(locale: &str) -> Self {
        if FAHRENHEIT_REGIONS.iter().any(|region| locale.contains(region)) {
            Units::Imperial
        } else {
            Units::Metric
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Temperature label for a raw locale string such as `en_US`.
pub fn unit_label(locale: &str) -> &'static str {
    Units::for_locale(locale).label()
}

/// Icon categories for provider condition codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherIcon {
    Clear,
    Cloud,
    Rain,
    Storm,
    Snow,
    Mist,
}

impl WeatherIcon {
    /// Map a provider icon code like `13d`. Unknown codes have no icon.
    pub fn from_code(code: &str) -> Option<Self> {
        let icon = match code {
            "01d" => Self::Clear,
            "02d" | "03d" | "04d" | "04n" | "01n" | "02n" | "03n" | "10n" => Self::Cloud,
            "10d" | "09d" | "09n" | "11n" => Self::Rain,
            "11d" => Self::Storm,
            "13d" | "13n" => Self::Snow,
            "50d" | "50n" => Self::Mist,
            _ => return None,
        };
        Some(icon)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Cloud => "cloud",
            Self::Rain => "rain",
            Self::Storm => "storm",
            Self::Snow => "snow",
            Self::Mist => "mist",
        }
    }
}

impl std::fmt::Display for WeatherIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text for every field the UI shows. Recomputed on each render.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFields {
    pub main: String,
    pub description: String,
    pub temperature: String,
    pub sunrise: String,
    pub sunset: String,
    pub humidity: String,
    pub temp_max: String,
    pub temp_min: String,
    pub wind_speed: String,
    pub name: String,
    pub country: String,
    pub icon: Option<WeatherIcon>,
}

/// Build display fields from a snapshot.
///
/// Times are rendered in `tz`. The temperature label comes from `units`,
/// which must be the units the snapshot was fetched in.
pub fn to_display_fields<Tz>(snapshot: &WeatherSnapshot, units: Units, tz: &Tz) -> DisplayFields
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let condition = snapshot.primary_condition();

    DisplayFields {
        main: condition.map(|c| c.main.clone()).unwrap_or_default(),
        description: condition.map(|c| c.description.clone()).unwrap_or_default(),
        temperature: format!("{}{}", format_number(snapshot.main.temp), units.label()),
        sunrise: clock_time(snapshot.sys.sunrise, tz),
        sunset: clock_time(snapshot.sys.sunset, tz),
        humidity: format!("{} per cent", snapshot.main.humidity),
        temp_max: format!("{} max", format_number(snapshot.main.temp_max)),
        temp_min: format!("{} min", format_number(snapshot.main.temp_min)),
        wind_speed: format_number(snapshot.wind.speed),
        name: snapshot.name.clone(),
        country: snapshot.sys.country.clone(),
        icon: condition.and_then(|c| WeatherIcon::from_code(&c.icon)),
    }
}

/// Epoch seconds as `HH:mm` wall-clock time in `tz`.
pub fn clock_time<Tz>(epoch_secs: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match DateTime::from_timestamp(epoch_secs, 0) {
        Some(utc) => utc.with_timezone(tz).format("%H:%M").to_string(),
        None => String::new(),
    }
}

// Whole numbers keep one decimal: 12.0, 12.5, -3.0.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
