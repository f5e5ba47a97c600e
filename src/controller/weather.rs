use actix_web::{get, web, HttpResponse, Responder};

use serde::Deserialize;

use crate::client::{CitySuggestion, WeatherClient};
use crate::domain::{sanitize, CityName};
use crate::error::{Error, Result};

/// WeatherAPI serves at most two weeks of forecast
const MAX_FORECAST_DAYS: u8 = 14;
const DEFAULT_FORECAST_DAYS: u8 = 3;
const DEFAULT_LANG: &str = "en";

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    q: Option<String>,
    days: Option<u8>,
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteQuery {
    q: Option<String>,
}

fn required_city(city: Option<String>) -> Result<CityName> {
    let city = city.unwrap_or_default();
    if sanitize::normalize_city(&city).is_empty() {
        return Err(Error::Validation("City is required".into()));
    }

    let city: CityName = city.parse()?;
    if !city.is_well_formed() {
        return Err(Error::Validation(format!("{} is not a valid city name", city)));
    }
    Ok(city)
}

fn forecast_days(days: Option<u8>) -> Result<u8> {
    match days.unwrap_or(DEFAULT_FORECAST_DAYS) {
        days @ 1..=MAX_FORECAST_DAYS => Ok(days),
        days => Err(Error::Validation(format!(
            "Forecast days must be between 1 and {}, got {}",
            MAX_FORECAST_DAYS, days
        ))),
    }
}

fn forecast_lang(lang: Option<String>) -> Result<String> {
    let lang = lang
        .map(|lang| lang.trim().to_lowercase())
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| DEFAULT_LANG.into());

    let well_formed = (2..=7).contains(&lang.len())
        && lang.chars().all(|c| c.is_ascii_lowercase() || c == '_' || c == '-');
    if !well_formed {
        return Err(Error::Validation(format!("{} is not a valid language code", lang)));
    }
    Ok(lang)
}

/// Current conditions for a city
#[tracing::instrument(name = "Get current weather", skip(client))]
#[get("/weather")]
async fn current(
    client: web::Data<WeatherClient>,
    query: web::Query<WeatherQuery>,
) -> Result<impl Responder> {
    let city = required_city(query.into_inner().city)?;
    let weather = client.current(city.as_ref()).await?;

    Ok(HttpResponse::Ok().json(weather))
}

/// Multi-day forecast for a city
#[tracing::instrument(name = "Get weather forecast", skip(client))]
#[get("/forecast")]
async fn forecast(
    client: web::Data<WeatherClient>,
    query: web::Query<ForecastQuery>,
) -> Result<impl Responder> {
    let ForecastQuery { q, days, lang } = query.into_inner();
    let city = required_city(q)?;
    let days = forecast_days(days)?;
    let lang = forecast_lang(lang)?;

    let forecast = client.forecast(city.as_ref(), days, &lang).await?;

    Ok(HttpResponse::Ok().json(forecast))
}

/// City suggestions. Failures fall back to an empty list.
#[tracing::instrument(name = "Autocomplete city", skip(client))]
#[get("/autocomplete")]
async fn autocomplete(
    client: web::Data<WeatherClient>,
    query: web::Query<AutocompleteQuery>,
) -> impl Responder {
    let query = sanitize::normalize_city(query.into_inner().q.as_deref().unwrap_or_default());

    let suggestions: Vec<CitySuggestion> = if query.is_empty() {
        Vec::new()
    } else {
        client.search(&query).await.unwrap_or_else(|error| {
            tracing::warn!(error.cause_chain = ?error, "City search failed");
            Vec::new()
        })
    };

    HttpResponse::Ok().json(suggestions)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(current)
        .service(forecast)
        .service(autocomplete);
}
