use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use flux_config::RetrievalProviderConfig;
use flux_domain::ranking::{RetrievalHit, truncate_snippet};

use crate::{Result, retry::with_retry, status_error};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RetrievalRequest {
	pub query: String,
	pub max_results: u32,
	pub topic: String,
	/// Recency filter as a day count; bucketed into the provider's
	/// day/week/month/year ranges.
	pub days: Option<u32>,
}

pub async fn search(
	cfg: &RetrievalProviderConfig,
	req: &RetrievalRequest,
	snippet_max_chars: usize,
) -> Result<Vec<RetrievalHit>> {
	let api_key = crate::configured_key(cfg.api_key.as_deref(), "retrieval")?;
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut body = serde_json::json!({
		"api_key": api_key,
		"query": req.query,
		"max_results": req.max_results,
		"topic": req.topic,
		"search_depth": "basic",
	});

	if let Some(range) = req.days.and_then(time_range) {
		body["time_range"] = Value::String(range.to_string());
	}

	let json = with_retry(|| async {
		let res = client.post(&url).json(&body).send().await?;

		if !res.status().is_success() {
			return Err(status_error(res).await);
		}

		Ok(res.json::<Value>().await?)
	})
	.await?;

	Ok(parse_search_response(&json, snippet_max_chars))
}

fn time_range(days: u32) -> Option<&'static str> {
	match days {
		0 => None,
		1 => Some("day"),
		2..=7 => Some("week"),
		8..=31 => Some("month"),
		_ => Some("year"),
	}
}

/// Malformed hits degrade field by field; a missing url becomes an empty
/// string rather than dropping the hit or failing the batch.
fn parse_search_response(json: &Value, snippet_max_chars: usize) -> Vec<RetrievalHit> {
	let Some(results) = json.get("results").and_then(Value::as_array) else {
		return Vec::new();
	};

	results
		.iter()
		.map(|item| {
			let field = |name: &str| {
				item.get(name).and_then(Value::as_str).unwrap_or_default().to_string()
			};

			RetrievalHit {
				url: field("url"),
				title: field("title"),
				snippet: truncate_snippet(&field("content"), snippet_max_chars),
				provider_score: item
					.get("score")
					.and_then(Value::as_f64)
					.unwrap_or_default() as f32,
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn buckets_days_into_time_ranges() {
		assert_eq!(time_range(0), None);
		assert_eq!(time_range(1), Some("day"));
		assert_eq!(time_range(7), Some("week"));
		assert_eq!(time_range(31), Some("month"));
		assert_eq!(time_range(400), Some("year"));
	}

	#[test]
	fn retrieval_request_serializes_with_wire_field_names() {
		let req = RetrievalRequest {
			query: "rust".to_string(),
			max_results: 20,
			topic: "general".to_string(),
			days: Some(3),
		};
		let json = serde_json::to_value(&req).expect("request must serialize");

		assert_eq!(json["query"], "rust");
		assert_eq!(json["max_results"], 20);
		assert_eq!(json["topic"], "general");
		assert_eq!(json["days"], 3);
	}

	#[test]
	fn parses_hits_with_defaults_for_missing_fields() {
		let json = serde_json::json!({
			"results": [
				{ "url": "https://a", "title": "A", "content": "alpha", "score": 0.7 },
				{ "title": "no url" }
			]
		});
		let hits = parse_search_response(&json, 300);

		assert_eq!(hits.len(), 2);
		assert_eq!(hits[0].url, "https://a");
		assert!((hits[0].provider_score - 0.7).abs() < 1e-6);
		assert_eq!(hits[1].url, "");
		assert_eq!(hits[1].snippet, "");
	}

	#[test]
	fn truncates_content_at_parse_time() {
		let json = serde_json::json!({
			"results": [{ "url": "https://a", "title": "A", "content": "x".repeat(600) }]
		});
		let hits = parse_search_response(&json, 300);

		assert_eq!(hits[0].snippet.chars().count(), 300);
	}

	#[test]
	fn missing_results_array_is_empty_batch() {
		let hits = parse_search_response(&serde_json::json!({}), 300);

		assert!(hits.is_empty());
	}
}
