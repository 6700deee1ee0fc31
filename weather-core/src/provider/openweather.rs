use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::DEFAULT_BASE_URL,
    error::WeatherError,
    model::{Coordinates, WeatherSnapshot},
    present::Units,
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn current_weather_url(&self) -> String {
        format!("{}/2.5/weather", self.base_url)
    }
}

impl Default for OpenWeatherProvider {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_weather(
        &self,
        coords: Coordinates,
        units: Units,
        api_key: &str,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let url = self.current_weather_url();
        tracing::debug!(%url, lat = coords.latitude, lon = coords.longitude, %units, "requesting current weather");

        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", units.as_str()),
                ("appid", api_key),
            ])
            .send()
            .await
            .map_err(WeatherError::Network)?;

        let status = res.status();
        let body = res.text().await.map_err(WeatherError::Network)?;

        if !status.is_success() {
            return Err(WeatherError::Http { status: status.as_u16(), body: truncate_body(&body) });
        }

        serde_json::from_str(&body).map_err(WeatherError::Decode)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_in_base_url_is_ignored() {
        let provider = OpenWeatherProvider::new("http://localhost:1234/data/");
        assert_eq!(provider.current_weather_url(), "http://localhost:1234/data/2.5/weather");
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "é".repeat(300);
        let truncated = truncate_body(&body);

        assert_eq!(truncated.chars().count(), 203);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
