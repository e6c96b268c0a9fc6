//! Model client: one request/response round trip against the Google
//! Gemini `generateContent` endpoint.

use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::AppError;
use crate::intake::ImagePayload;

/// Instruction sent with every request. The numbered-list format is a
/// request to the model, not a guarantee; the response is displayed as
/// opaque text either way.
pub const INSTRUCTION: &str = "\
You are a nutritionist AI. Analyze the image of food items provided.
Identify each food item and calculate the total calories. Provide a
detailed breakdown of each item with its calorie count. Format the
output as a numbered list, like this:
1. [Food Item]: [Calories]";

fn endpoint(config: &Config) -> String {
    format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
        config.model, config.api_key
    )
}

fn request_body(payload: &ImagePayload) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "text": INSTRUCTION },
                {
                    "inline_data": {
                        "mime_type": payload.mime,
                        "data": general_purpose::STANDARD.encode(&payload.bytes),
                    }
                }
            ]
        }]
    })
}

fn extract_text(body: &Value) -> Result<String, AppError> {
    body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| AppError::ModelCall("no text in model response".into()))
}

/// Submit the instruction plus image and await the text response.
///
/// Every remote failure (transport, auth, quota, malformed response)
/// surfaces as `ModelCall` with the underlying message; nothing is
/// retried.
pub async fn analyze(
    client: &reqwest::Client,
    config: &Config,
    payload: &ImagePayload,
) -> Result<String, AppError> {
    let response = client
        .post(endpoint(config))
        .json(&request_body(payload))
        .send()
        .await
        .map_err(|e| AppError::ModelCall(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| AppError::ModelCall(e.to_string()))?;
    debug!(%status, body_len = text.len(), "gemini response received");

    if !status.is_success() {
        return Err(AppError::ModelCall(format!("API error {status}: {text}")));
    }

    let body: Value =
        serde_json::from_str(&text).map_err(|e| AppError::ModelCall(e.to_string()))?;
    extract_text(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ImagePayload {
        ImagePayload {
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
            mime: "image/png",
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn request_carries_instruction_and_inline_data() {
        let body = request_body(&payload());
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], INSTRUCTION);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(
            parts[1]["inline_data"]["data"],
            general_purpose::STANDARD.encode([0x89, 0x50, 0x4e, 0x47])
        );
    }

    #[test]
    fn instruction_requests_numbered_list() {
        assert!(INSTRUCTION.starts_with("You are a nutritionist AI."));
        assert!(INSTRUCTION.contains("1. [Food Item]: [Calories]"));
    }

    #[test]
    fn extracts_text_from_candidate_shape() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "1. Apple: 95 calories" }] }
            }]
        });
        assert_eq!(extract_text(&body).unwrap(), "1. Apple: 95 calories");
    }

    #[test]
    fn empty_candidates_is_model_call_error() {
        let body = json!({ "candidates": [] });
        let err = extract_text(&body).unwrap_err();
        assert!(matches!(err, AppError::ModelCall(_)));
    }

    #[test]
    fn blocked_response_without_text_is_model_call_error() {
        let body = json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        });
        assert!(extract_text(&body).is_err());
    }

    #[test]
    fn endpoint_includes_model_and_key() {
        let config = Config {
            api_key: "k123".into(),
            model: "gemini-2.5-flash".into(),
            bind_addr: "0.0.0.0:3000".into(),
        };
        let url = endpoint(&config);
        assert!(url.contains("/models/gemini-2.5-flash:generateContent"));
        assert!(url.ends_with("key=k123"));
    }
}
