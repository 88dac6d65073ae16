//! Client for the weather endpoint (OpenWeather-compatible).
//!
//! The mobile app read device GPS coordinates; server-side, the owner's
//! profile city is geocoded first (`/geo/1.0/direct`), then current
//! conditions come from `/data/2.5/weather` with metric units. A missing
//! temperature leaves the summary unset and downstream advice text empty.

use serde::Deserialize;

/// Current conditions for an owner's city.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub temperature: f64,
    pub condition: String,
}

impl WeatherReport {
    /// One-line summary used in morning notifications: `22.1°C, Clouds`.
    pub fn summary(&self) -> String {
        if self.condition.is_empty() {
            format!("{:.1}°C", self.temperature)
        } else {
            format!("{:.1}°C, {}", self.temperature, self.condition)
        }
    }
}

/// Clothing advice line for a temperature, used by the smart-advice prompt.
pub fn clothing_advice(temperature: f64) -> &'static str {
    if temperature > 25.0 {
        "It's warm today. Light clothes and sunglasses are fine."
    } else if temperature > 10.0 {
        "Wear a light jacket. It's a bit chilly."
    } else {
        "It's cold. Wear warm clothes like coats and scarves."
    }
}

#[derive(Deserialize)]
struct GeocodeEntry {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct WeatherMain {
    temp: Option<f64>,
}

#[derive(Deserialize)]
struct WeatherCondition {
    #[serde(default)]
    main: String,
}

#[derive(Deserialize)]
struct WeatherResponse {
    main: Option<WeatherMain>,
    #[serde(default)]
    weather: Vec<WeatherCondition>,
}

/// Client for geocoding and current-weather lookups.
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Whether the client is usable (an API key is configured).
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Resolve a city name to coordinates. None when the city is unknown.
    pub async fn geocode_city(&self, city: &str) -> Result<Option<(f64, f64)>, String> {
        let url = format!("{}/geo/1.0/direct", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("q", city), ("limit", "1"), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| format!("Geocode request failed: {}", e))?;

        if !resp.status().is_success() {
            return Err(format!("Geocode HTTP {}", resp.status()));
        }

        let entries: Vec<GeocodeEntry> = resp
            .json()
            .await
            .map_err(|e| format!("Bad geocode body: {}", e))?;

        Ok(entries.first().map(|e| (e.lat, e.lon)))
    }

    /// Current conditions at coordinates. None when the response carries no
    /// numeric temperature.
    pub async fn current_weather(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Option<WeatherReport>, String> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| format!("Weather request failed: {}", e))?;

        if !resp.status().is_success() {
            return Err(format!("Weather HTTP {}", resp.status()));
        }

        let body: WeatherResponse = resp
            .json()
            .await
            .map_err(|e| format!("Bad weather body: {}", e))?;

        let Some(temp) = body.main.and_then(|m| m.temp) else {
            return Ok(None);
        };

        let condition = body
            .weather
            .first()
            .map(|w| w.main.clone())
            .unwrap_or_default();

        Ok(Some(WeatherReport {
            temperature: temp,
            condition,
        }))
    }

    /// City name to current conditions, or None when any step comes up empty.
    ///
    /// Errors are logged and flattened to None: weather is decoration on the
    /// morning summary, never a reason to skip it.
    pub async fn report_for_city(&self, city: &str) -> Option<WeatherReport> {
        if !self.is_configured() || city.is_empty() {
            return None;
        }

        let coords = match self.geocode_city(city).await {
            Ok(coords) => coords?,
            Err(e) => {
                log::warn!("Geocoding '{}' failed: {}", city, e);
                return None;
            }
        };

        match self.current_weather(coords.0, coords.1).await {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Weather lookup for '{}' failed: {}", city, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clothing_advice_thresholds() {
        assert_eq!(
            clothing_advice(30.0),
            "It's warm today. Light clothes and sunglasses are fine."
        );
        assert_eq!(clothing_advice(18.0), "Wear a light jacket. It's a bit chilly.");
        assert_eq!(
            clothing_advice(3.0),
            "It's cold. Wear warm clothes like coats and scarves."
        );
        // Boundary values fall to the colder branch
        assert_eq!(clothing_advice(25.0), "Wear a light jacket. It's a bit chilly.");
        assert_eq!(
            clothing_advice(10.0),
            "It's cold. Wear warm clothes like coats and scarves."
        );
    }

    #[test]
    fn test_report_summary() {
        let report = WeatherReport {
            temperature: 22.07,
            condition: "Clouds".to_string(),
        };
        assert_eq!(report.summary(), "22.1°C, Clouds");

        let bare = WeatherReport {
            temperature: -4.0,
            condition: String::new(),
        };
        assert_eq!(bare.summary(), "-4.0°C");
    }

    #[test]
    fn test_weather_response_without_temp_is_none() {
        let body: WeatherResponse =
            serde_json::from_str(r#"{"weather":[{"main":"Rain"}]}"#).unwrap();
        assert!(body.main.and_then(|m| m.temp).is_none());

        let body: WeatherResponse =
            serde_json::from_str(r#"{"main":{"temp":21.5},"weather":[{"main":"Clear"}]}"#).unwrap();
        assert_eq!(body.main.and_then(|m| m.temp), Some(21.5));
    }
}
