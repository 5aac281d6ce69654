use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use flux_config::RerankProviderConfig;

use crate::{Error, Result, retry::with_retry, status_error};

/// Scores `docs` against `query`. Returns the reranked order as
/// (original-index, relevance-score) pairs; the position of a pair is its
/// new rank.
pub async fn rerank(
	cfg: &RerankProviderConfig,
	query: &str,
	docs: &[String],
	top_n: usize,
) -> Result<Vec<(usize, f32)>> {
	if docs.is_empty() {
		return Ok(Vec::new());
	}

	let api_key = crate::configured_key(cfg.api_key.as_deref(), "rerank")?;
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"query": query,
		"documents": docs,
		"top_n": top_n,
	});
	let headers = crate::auth_headers(api_key)?;
	let json = with_retry(|| async {
		let res = client.post(&url).headers(headers.clone()).json(&body).send().await?;

		if !res.status().is_success() {
			return Err(status_error(res).await);
		}

		Ok(res.json::<Value>().await?)
	})
	.await?;

	parse_rerank_response(&json, docs.len())
}

fn parse_rerank_response(json: &Value, doc_count: usize) -> Result<Vec<(usize, f32)>> {
	let results = json
		.get("results")
		.and_then(Value::as_array)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Rerank response is missing results array.".to_string(),
		})?;
	let mut pairs = Vec::with_capacity(results.len());

	for item in results {
		let index = item.get("index").and_then(Value::as_u64).ok_or_else(|| {
			Error::InvalidResponse { message: "Rerank result missing index.".to_string() }
		})? as usize;
		let score = item.get("relevance_score").and_then(Value::as_f64).ok_or_else(|| {
			Error::InvalidResponse { message: "Rerank result missing score.".to_string() }
		})? as f32;

		if index >= doc_count {
			// Protocol violation from the upstream; the merge drops it too.
			warn!(index, doc_count, "Rerank result index out of range; dropping.");

			continue;
		}

		pairs.push((index, score));
	}

	Ok(pairs)
}
