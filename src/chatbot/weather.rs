//! Weather lookups through OpenWeatherMap.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::chatbot::services::{WeatherReport, WeatherService};
use crate::error::{BotError, Result};

pub const NO_CITY_REPLY: &str = "Please specify a city.";
pub const CITY_NOT_FOUND_REPLY: &str = "City not found.";

const KELVIN_OFFSET: f64 = 273.15;

static CITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)weather\s*(?:in\s+)?([\p{L}\s]+)").expect("city pattern is valid")
});

pub struct OpenWeatherClient {
    api_key: String,
    url: String,
    client: reqwest::Client,
}

/// Raw response. `cod` is a number on success but a string on errors
/// (`"404"`), so both shapes are accepted.
#[derive(Deserialize, Debug)]
struct ApiResponse {
    cod: Option<StatusCode>,
    main: Option<MainBlock>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum StatusCode {
    Number(u16),
    Text(String),
}

impl StatusCode {
    fn code(&self) -> Option<u16> {
        match self {
            StatusCode::Number(n) => Some(*n),
            StatusCode::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct MainBlock {
    temp: Option<f64>,
}

fn parse_report(body: &str) -> Result<WeatherReport> {
    let parsed: ApiResponse = serde_json::from_str(body)?;
    Ok(WeatherReport {
        status: parsed.cod.as_ref().and_then(StatusCode::code),
        temp_kelvin: parsed.main.and_then(|m| m.temp),
    })
}

impl OpenWeatherClient {
    pub fn new(api_key: String, url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { api_key, url, client })
    }
}

#[async_trait]
impl WeatherService for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<WeatherReport> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", city), ("appid", self.api_key.as_str())])
            .send()
            .await?;

        // Error statuses still carry a JSON body with `cod`.
        let status = response.status();
        let body = response.text().await?;
        debug!("Weather response status: {status}");

        parse_report(&body)
    }
}

/// Pull the city out of a weather request: the letters and spaces after
/// "weather" (and an optional "in"), whitespace collapsed.
pub fn extract_city(text: &str) -> Option<String> {
    let captured = CITY_PATTERN.captures(text)?.get(1)?.as_str();
    let city = captured.split_whitespace().collect::<Vec<_>>().join(" ");
    if city.is_empty() || city.eq_ignore_ascii_case("in") {
        None
    } else {
        Some(city)
    }
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

/// Produce the reply for a weather request. No lookup is made when the
/// text names no city.
pub async fn respond(text: &str, service: &dyn WeatherService) -> Result<String> {
    let Some(city) = extract_city(text) else {
        return Ok(NO_CITY_REPLY.to_string());
    };
    info!("🌤️ Weather city: {}", city);

    let report = service.current(&city).await?;
    match (report.status, report.temp_kelvin) {
        (Some(200), Some(kelvin)) => Ok(format!(
            "Temperature in {}: {:.1}°C",
            city,
            kelvin_to_celsius(kelvin)
        )),
        (Some(200), None) => Err(BotError::Parse(
            "weather response is missing main.temp".to_string(),
        )),
        _ => Ok(CITY_NOT_FOUND_REPLY.to_string()),
    }
}
