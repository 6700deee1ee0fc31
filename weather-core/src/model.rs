use serde::{Deserialize, Serialize};

/// A single location fix. Produced per retrieval attempt and never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// The full current-weather document as returned by the provider.
///
/// Fields the provider may omit are optional and skipped on serialization,
/// so the persisted text keeps the provider's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub coord: Coord,
    pub weather: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    pub main: MainBlock,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<u32>,
    pub wind: Wind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clouds: Option<Clouds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain: Option<Precipitation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snow: Option<Precipitation>,
    pub dt: i64,
    pub sys: Sys,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cod: Option<i32>,
}

impl WeatherSnapshot {
    /// The primary condition. The provider lists it first.
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: i32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainBlock {
    pub temp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,
    pub temp_min: f64,
    pub temp_max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<u32>,
    pub humidity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sea_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grnd_level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deg: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    pub all: u8,
}

/// Rain or snow volume in mm over the last one or three hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Precipitation {
    #[serde(rename = "1h", default, skip_serializing_if = "Option::is_none")]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h", default, skip_serializing_if = "Option::is_none")]
    pub three_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sys {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<f64>,
    #[serde(default)]
    pub country: String,
    pub sunrise: i64,
    pub sunset: i64,
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A current-weather body in the provider's documented shape.
    pub const SAMPLE_BODY: &str = r#"{
        "coord": {"lon": 10.99, "lat": 44.34},
        "weather": [{"id": 601, "main": "Snow", "description": "snow", "icon": "13d"}],
        "base": "stations",
        "main": {"temp": -1.5, "feels_like": -5.2, "temp_min": -3.0, "temp_max": 0.5,
                 "pressure": 1015, "humidity": 93, "sea_level": 1015, "grnd_level": 933},
        "visibility": 4000,
        "wind": {"speed": 3.6, "deg": 350, "gust": 6.1},
        "clouds": {"all": 100},
        "snow": {"1h": 0.42},
        "dt": 1700020000,
        "sys": {"type": 2, "id": 2075663, "country": "IT", "sunrise": 1700000000, "sunset": 1700040000},
        "timezone": 3600,
        "id": 3163858,
        "name": "Zocca",
        "cod": 200
    }"#;
}
