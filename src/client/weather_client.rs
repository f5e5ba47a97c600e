use std::time::Duration;

use anyhow::Context;

use reqwest::{Client, StatusCode};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use secrecy::Secret;

use url::Url;

use crate::error::Error;

/// WeatherAPI error code for "No matching location found"
const NO_LOCATION_FOUND: i64 = 1006;

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("City not found")]
    NotFound,
    #[error("Weather provider error: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        Self::Upstream(e.without_url().to_string())
    }
}

impl From<WeatherError> for Error {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::NotFound => Self::NotFound(e.to_string()),
            WeatherError::Upstream(_) => {
                tracing::warn!(error.cause_chain = ?e, "Weather provider request failed");
                Self::Upstream("Weather provider unavailable".into())
            }
        }
    }
}

/// Current conditions reduced to what the frontend shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub humidity: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub localtime: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub maxtemp_c: f64,
    pub mintemp_c: f64,
    pub avgtemp_c: f64,
    #[serde(default)]
    pub avghumidity: f64,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub day: DaySummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDays {
    pub forecastday: Vec<ForecastDay>,
}

/// Multi-day forecast in the shape the frontend consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub location: Location,
    pub forecast: ForecastDays,
}

/// A single autocomplete entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp_c: f64,
    humidity: f64,
    condition: Condition,
}

impl From<CurrentResponse> for CurrentWeather {
    fn from(res: CurrentResponse) -> Self {
        Self {
            temperature: res.current.temp_c,
            humidity: res.current.humidity,
            description: res.current.condition.text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
}

/// REST client for a WeatherAPI.com compatible provider.
/// Every call is a fresh round trip, nothing is cached or retried.
#[derive(Debug)]
pub struct WeatherClient {
    client: Client,
    api_base_url: Url,
    api_key: Secret<String>,
}

impl WeatherClient {
    pub fn new(api_base_url: Url, api_key: Secret<String>, api_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        Ok(Self {
            client,
            api_base_url,
            api_key,
        })
    }

    #[tracing::instrument(name = "Fetch current weather", skip(self))]
    pub async fn current(&self, city: &str) -> Result<CurrentWeather, WeatherError> {
        let res: CurrentResponse = self.get("current.json", &[("q", city)]).await?;
        Ok(res.into())
    }

    #[tracing::instrument(name = "Fetch weather forecast", skip(self))]
    pub async fn forecast(&self, city: &str, days: u8, lang: &str) -> Result<Forecast, WeatherError> {
        let days = days.to_string();
        self.get("forecast.json", &[("q", city), ("days", days.as_str()), ("lang", lang)])
            .await
    }

    #[tracing::instrument(name = "Search cities", skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<CitySuggestion>, WeatherError> {
        self.get("search.json", &[("q", query)]).await
    }

    async fn get<T>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T, WeatherError>
    where
        T: DeserializeOwned,
    {
        use secrecy::ExposeSecret;

        let url = self
            .api_base_url
            .join(endpoint)
            .map_err(|e| WeatherError::Upstream(e.to_string()))?;

        let res = self
            .client
            .get(url)
            .query(&[("key", self.api_key.expose_secret().as_str())])
            .query(params)
            .send()
            .await?;

        match res.status() {
            status if status.is_success() => Ok(res.json::<T>().await?),
            StatusCode::NOT_FOUND => Err(WeatherError::NotFound),
            StatusCode::BAD_REQUEST => match res.json::<ApiErrorResponse>().await {
                Ok(body) if body.error.code == NO_LOCATION_FOUND => Err(WeatherError::NotFound),
                _ => Err(WeatherError::Upstream(
                    "Weather provider rejected the request".into(),
                )),
            },
            status => Err(WeatherError::Upstream(format!(
                "Weather provider responded with {}",
                status
            ))),
        }
    }
}
