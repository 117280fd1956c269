//! Current temperature lookup backed by the Open-Meteo forecast API

use super::http::{failed, get_json, tool_http_client, trim_base_url};
use crate::error::{Result, ToolError};
use crate::impl_tool_factory;
use crate::tools::{Tool, ToolCall, ToolExample, ToolResult};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com/v1";

const NAME: &str = "get_temperature";

/// Tool returning the current 2m air temperature for a coordinate
pub struct GetTemperatureTool {
    client: reqwest::Client,
    base_url: String,
}

impl GetTemperatureTool {
    pub fn new() -> Self {
        Self::with_base_url(OPEN_METEO_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: tool_http_client(),
            base_url: trim_base_url(base_url),
        }
    }
}

impl Default for GetTemperatureTool {
    fn default() -> Self {
        Self::new()
    }
}

fn check_range(name: &str, value: f64, limit: f64) -> Result<()> {
    if !(-limit..=limit).contains(&value) {
        return Err(ToolError::InvalidParameters {
            message: format!("{} must be between -{} and {}, got {}", name, limit, limit, value),
        }
        .into());
    }
    Ok(())
}

#[async_trait]
impl Tool for GetTemperatureTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Get the current temperature in degrees Celsius for a location. \
         Returns a sentence containing the temperature."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "latitude": {
                    "type": "number",
                    "description": "Latitude of the location, positive for N and negative for S"
                },
                "longitude": {
                    "type": "number",
                    "description": "Longitude of the location, positive for E and negative for W"
                }
            },
            "required": ["latitude", "longitude"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let latitude = call.get_number("latitude")?;
        let longitude = call.get_number("longitude")?;
        check_range("latitude", latitude, 90.0)?;
        check_range("longitude", longitude, 180.0)?;

        let url = format!("{}/forecast", self.base_url);
        debug!("Fetching temperature for {}, {}", latitude, longitude);

        let body = get_json(
            &self.client,
            NAME,
            &url,
            &[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", "temperature_2m".to_string()),
            ],
        )
        .await?;

        let temperature = body
            .pointer("/current/temperature_2m")
            .and_then(|t| t.as_f64())
            .ok_or_else(|| failed(NAME, "response has no current temperature"))?;

        let content = format!(
            "The temperature at {}, {} is {}°C",
            latitude, longitude, temperature
        );

        Ok(ToolResult::success(call.id, content).with_data(json!({
            "latitude": latitude,
            "longitude": longitude,
            "temperature_c": temperature,
        })))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Current temperature near Acapulco".to_string(),
            parameters: json!({"latitude": 13.1, "longitude": -97.4}),
            expected_result: "The temperature at 13.1, -97.4 is 29.4°C".to_string(),
        }]
    }
}

impl_tool_factory!(
    GetTemperatureToolFactory,
    GetTemperatureTool::new(),
    "get_temperature",
    "Get the temperature for a location."
);
