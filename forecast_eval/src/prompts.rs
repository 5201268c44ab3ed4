//! Prompt rendering and response parsing for text-driven forecasters
//!
//! A [`ForecastPrompt`] turns a [`ForecastRequest`] into plain text or chat
//! messages, and [`parse_forecast_response`] reads a forecast back out of
//! a model's reply. No network client lives here.

use crate::data::{FeatureSeries, Metadata};
use crate::error::{EvalError, Result};
use crate::models::{ForecastRequest, ForecastResult, Samples};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SYSTEM_PROMPT: &str = "You are a forecasting assistant that returns JSON only.";

const RESPONSE_INSTRUCTIONS: &str =
    "Return JSON with keys: point_forecast (list), quantiles (dict) or samples (list of lists).";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of a chat-style prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Everything a text-driven forecaster is shown
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPrompt {
    pub history: Vec<f64>,
    pub horizon: usize,
    pub context_text: Option<String>,
    pub covariates: Option<FeatureSeries>,
    pub metadata: Option<Metadata>,
}

impl ForecastPrompt {
    pub fn from_request(request: &ForecastRequest) -> Self {
        Self {
            history: request.history.clone(),
            horizon: request.horizon,
            context_text: request.context_text.clone(),
            covariates: request.features.clone(),
            metadata: request.metadata.clone(),
        }
    }

    /// Render as plain text, one labelled line per field.
    ///
    /// Empty covariates, context and metadata are left out.
    pub fn to_text(&self) -> String {
        let mut lines = vec![
            "You are a forecasting model.".to_string(),
            format!("History: {:?}", self.history),
            format!("Horizon: {}", self.horizon),
        ];
        if let Some(covariates) = self.covariates.as_ref().filter(|c| !c.is_empty()) {
            lines.push(format!("Covariates: {:?}", covariates));
        }
        if let Some(context) = self.context_text.as_deref().filter(|c| !c.is_empty()) {
            lines.push(format!("Context: {}", context));
        }
        if let Some(metadata) = self.metadata.as_ref().filter(|m| !m.is_empty()) {
            // Value's Display is compact JSON
            lines.push(format!("Metadata: {}", serde_json::Value::from_iter(metadata.clone())));
        }
        lines.join("\n")
    }

    /// A system message followed by the rendered prompt and the reply format
    pub fn to_chat_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::new(ChatRole::System, SYSTEM_PROMPT),
            ChatMessage::new(
                ChatRole::User,
                format!("{}\n{}", self.to_text(), RESPONSE_INSTRUCTIONS),
            ),
        ]
    }
}

impl From<&ForecastRequest> for ForecastPrompt {
    fn from(request: &ForecastRequest) -> Self {
        Self::from_request(request)
    }
}

#[derive(Debug, Deserialize)]
struct ResponsePayload {
    #[serde(default)]
    point_forecast: Option<Vec<f64>>,
    #[serde(default)]
    point: Option<Vec<f64>>,
    #[serde(default)]
    samples: Option<Samples>,
    #[serde(default)]
    quantiles: Option<BTreeMap<String, Vec<f64>>>,
}

/// Extract the JSON object from a model reply.
///
/// The whole reply is tried first. Failing that, the span from the first
/// `{` to the last `}` is parsed, so prose around the object is ignored.
pub fn extract_json_object(text: &str) -> Result<serde_json::Value> {
    let whole_error = match serde_json::from_str(text) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    let span = text
        .find('{')
        .zip(text.rfind('}'))
        .filter(|(start, end)| start < end)
        .map(|(start, end)| &text[start..=end]);

    match span {
        Some(object) => Ok(serde_json::from_str(object)?),
        None => Err(EvalError::Json(whole_error)),
    }
}

/// Parse a model reply into a forecast.
///
/// `point_forecast` is required; `point` is accepted in its place. The
/// parsed object is kept under the `raw` metadata key.
pub fn parse_forecast_response(text: &str) -> Result<ForecastResult> {
    let raw = extract_json_object(text)?;
    let payload: ResponsePayload = serde_json::from_value(raw.clone())?;

    let point_forecast = payload
        .point_forecast
        .or(payload.point)
        .ok_or_else(|| EvalError::Model("missing point_forecast in response".to_string()))?;

    Ok(ForecastResult {
        point_forecast,
        samples: payload.samples,
        quantiles: payload.quantiles,
        metadata: Some(Metadata::from([("raw".to_string(), raw)])),
    })
}
