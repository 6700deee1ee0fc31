use crate::{
    Config, Coordinates, WeatherSnapshot, error::WeatherError, present::Units,
    provider::openweather::OpenWeatherProvider,
};
use anyhow::Context;
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Issue one request for `coords`. A failure is terminal; nothing is retried.
    async fn fetch_weather(
        &self,
        coords: Coordinates,
        units: Units,
        api_key: &str,
    ) -> Result<WeatherSnapshot, WeatherError>;
}

/// Construct the provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    Ok(Arc::new(OpenWeatherProvider::with_client(config.base_url.clone(), http)))
}
