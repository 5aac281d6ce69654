use tracing::warn;

use flux_domain::ranking::{RankedResult, RerankOutcome, build_unranked, merge_ranked};
use flux_providers::retrieval::RetrievalRequest;

use crate::{Error, Result, Service};

pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchRequest {
	pub query: String,
	pub limit: Option<u32>,
	pub topic: Option<String>,
	pub days: Option<u32>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResponse {
	pub query: String,
	pub results: Vec<RankedResult>,
	pub total: u32,
	/// False whenever the batch is degraded: rerank unconfigured or failed.
	pub reranked: bool,
}

pub(crate) struct SearchFlow {
	pub(crate) results: Vec<RankedResult>,
	pub(crate) outcome: RerankOutcome,
}

impl Service {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest {
				message: "query must not be empty.".to_string(),
			});
		}

		let limit = req.limit.unwrap_or(DEFAULT_LIMIT) as usize;
		let topic = req.topic.as_deref().unwrap_or("general");
		let flow = self.run_search(query, limit, topic, req.days, None).await?;

		if flow.results.is_empty() {
			return Err(Error::NoResults);
		}

		Ok(SearchResponse {
			query: query.to_string(),
			total: flow.results.len() as u32,
			reranked: flow.outcome.reranked(),
			results: flow.results,
		})
	}

	/// Retrieval then best-effort rerank. Retrieval failures propagate (there
	/// is no fallback source of results); any rerank failure degrades to the
	/// retrieval order and never reaches the caller. The merged list is
	/// truncated to `limit` only after ranking so the reranker always sees
	/// the full candidate pool.
	pub(crate) async fn run_search(
		&self,
		query: &str,
		limit: usize,
		topic: &str,
		days: Option<u32>,
		override_retrieval_query: Option<&str>,
	) -> Result<SearchFlow> {
		let retrieval_cfg = &self.cfg.providers.retrieval;

		if !retrieval_cfg.is_configured() {
			return Err(Error::NotConfigured { provider: "retrieval" });
		}

		let snippet_max_chars = self.cfg.search.snippet_max_chars as usize;
		let retrieval_req = RetrievalRequest {
			query: override_retrieval_query.unwrap_or(query).to_string(),
			max_results: self.cfg.search.raw_hit_limit,
			topic: topic.to_string(),
			days,
		};
		let hits = self
			.providers
			.retrieval
			.search(retrieval_cfg, &retrieval_req, snippet_max_chars)
			.await
			.map_err(|err| Error::Retrieval { message: err.to_string() })?;

		let rerank_cfg = &self.cfg.providers.rerank;
		let mut flow = if rerank_cfg.is_configured() {
			// Rerank scores the current-turn query even when retrieval ran a
			// context-widened one.
			let docs = hits
				.iter()
				.map(|hit| format!("{}\n{}", hit.title, hit.snippet))
				.collect::<Vec<_>>();

			match self
				.providers
				.rerank
				.rerank(rerank_cfg, query, &docs, docs.len())
				.await
			{
				Ok(pairs) => SearchFlow {
					results: merge_ranked(&hits, &pairs, snippet_max_chars),
					outcome: RerankOutcome::Reranked,
				},
				Err(err) => {
					warn!(error = %err, "Rerank failed; preserving retrieval order.");

					SearchFlow {
						results: build_unranked(&hits, snippet_max_chars),
						outcome: RerankOutcome::Degraded,
					}
				},
			}
		} else {
			SearchFlow {
				results: build_unranked(&hits, snippet_max_chars),
				outcome: RerankOutcome::Degraded,
			}
		};

		flow.results.truncate(limit);

		Ok(flow)
	}
}
