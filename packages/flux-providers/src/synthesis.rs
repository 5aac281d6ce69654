use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use flux_config::SynthesisProviderConfig;

use crate::{Error, Result, retry::with_retry, status_error};

/// Generates answer text for `prompt`. An empty candidate list is a failure
/// distinct from any HTTP error: the upstream responded but produced no
/// answer.
pub async fn generate(cfg: &SynthesisProviderConfig, prompt: &str) -> Result<String> {
	let prompt = prompt.trim();

	if prompt.is_empty() {
		return Err(Error::InvalidRequest {
			message: "Synthesis prompt must not be empty.".to_string(),
		});
	}

	let api_key = crate::configured_key(cfg.api_key.as_deref(), "synthesis")?;
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	// Key travels as a query parameter on this upstream, not a header.
	let url = format!("{}{}?key={}", cfg.api_base, cfg.path, api_key);
	let body = serde_json::json!({
		"contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
		"generationConfig": {
			"maxOutputTokens": cfg.max_output_tokens,
			"temperature": cfg.temperature,
		},
	});
	let json = with_retry(|| async {
		let res = client.post(&url).json(&body).send().await?;

		if !res.status().is_success() {
			return Err(status_error(res).await);
		}

		Ok(res.json::<Value>().await?)
	})
	.await?;

	parse_generate_response(&json)
}

fn parse_generate_response(json: &Value) -> Result<String> {
	let text = json
		.get("candidates")
		.and_then(Value::as_array)
		.and_then(|candidates| candidates.first())
		.and_then(|candidate| candidate.get("content"))
		.and_then(|content| content.get("parts"))
		.and_then(Value::as_array)
		.and_then(|parts| parts.first())
		.and_then(|part| part.get("text"))
		.and_then(Value::as_str)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Synthesis returned no candidates.".to_string(),
		})?;

	Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extracts_candidate_text() {
		let json = serde_json::json!({
			"candidates": [
				{ "content": { "parts": [{ "text": "  An answer. [1]  " }] } }
			]
		});

		assert_eq!(parse_generate_response(&json).expect("parse failed"), "An answer. [1]");
	}

	#[test]
	fn empty_candidates_is_invalid_response() {
		let json = serde_json::json!({ "candidates": [] });
		let err = parse_generate_response(&json).expect_err("empty candidates must fail");

		assert!(matches!(err, Error::InvalidResponse { .. }));
		assert!(err.status().is_none());
	}

	#[test]
	fn missing_parts_is_invalid_response() {
		let json = serde_json::json!({
			"candidates": [{ "content": { "parts": [] } }]
		});

		assert!(parse_generate_response(&json).is_err());
	}
}
