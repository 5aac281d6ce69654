//! Scripted provider doubles for exercising the pipeline without upstreams.

use std::sync::{
	Arc, Mutex, PoisonError,
	atomic::{AtomicUsize, Ordering},
};

use flux_config::{
	Config, Providers, RerankProviderConfig, RetrievalProviderConfig, Search, Store,
	SynthesisProviderConfig,
};
use flux_domain::ranking::RetrievalHit;
use flux_providers::{Error, Result, retrieval::RetrievalRequest};
use flux_service::{BoxFuture, RerankProvider, RetrievalProvider, SynthesisProvider};

/// Config with every provider configured and default tuning. Tests unset
/// individual `api_key`s to exercise the unconfigured branches.
pub fn test_config() -> Config {
	Config {
		providers: Providers {
			retrieval: RetrievalProviderConfig {
				api_base: "https://retrieval.test".to_string(),
				api_key: Some("retrieval-key".to_string()),
				path: "/search".to_string(),
				timeout_ms: 1_000,
			},
			rerank: RerankProviderConfig {
				api_base: "https://rerank.test".to_string(),
				api_key: Some("rerank-key".to_string()),
				path: "/rerank".to_string(),
				model: "rerank-test".to_string(),
				timeout_ms: 1_000,
			},
			synthesis: SynthesisProviderConfig {
				api_base: "https://synthesis.test".to_string(),
				api_key: Some("synthesis-key".to_string()),
				path: "/generate".to_string(),
				model: "generate-test".to_string(),
				temperature: 0.3,
				max_output_tokens: 512,
				timeout_ms: 1_000,
			},
		},
		search: Search::default(),
		store: Store::default(),
	}
}

pub fn sample_hits(count: usize) -> Vec<RetrievalHit> {
	(0..count)
		.map(|index| RetrievalHit {
			url: format!("https://example.com/{index}"),
			title: format!("Result {index}"),
			snippet: format!("Snippet {index}"),
			provider_score: 0.0,
		})
		.collect()
}

/// Returns canned hits and records every retrieval query it receives.
pub struct SpyRetrieval {
	pub hits: Vec<RetrievalHit>,
	pub queries: Arc<Mutex<Vec<String>>>,
	pub calls: Arc<AtomicUsize>,
}
impl SpyRetrieval {
	pub fn new(hits: Vec<RetrievalHit>) -> Self {
		Self {
			hits,
			queries: Arc::new(Mutex::new(Vec::new())),
			calls: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn recorded_queries(&self) -> Vec<String> {
		self.queries.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}
}
impl RetrievalProvider for SpyRetrieval {
	fn search<'a>(
		&'a self,
		_cfg: &'a RetrievalProviderConfig,
		req: &'a RetrievalRequest,
		_snippet_max_chars: usize,
	) -> BoxFuture<'a, Result<Vec<RetrievalHit>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.queries
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(req.query.clone());

		let hits = self.hits.clone();

		Box::pin(async move { Ok(hits) })
	}
}

/// Always fails retrieval with the given status.
pub struct FailingRetrieval {
	pub code: u16,
}
impl RetrievalProvider for FailingRetrieval {
	fn search<'a>(
		&'a self,
		_cfg: &'a RetrievalProviderConfig,
		_req: &'a RetrievalRequest,
		_snippet_max_chars: usize,
	) -> BoxFuture<'a, Result<Vec<RetrievalHit>>> {
		let code = self.code;

		Box::pin(async move {
			Err(Error::Status { code, message: "scripted retrieval failure".to_string() })
		})
	}
}

/// Deterministic reranker: reverses the document order, scoring each new
/// rank `1 / rank`, and records the query it scored against.
pub struct SpyRerank {
	pub queries: Arc<Mutex<Vec<String>>>,
	pub calls: Arc<AtomicUsize>,
}
impl SpyRerank {
	pub fn new() -> Self {
		Self {
			queries: Arc::new(Mutex::new(Vec::new())),
			calls: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn recorded_queries(&self) -> Vec<String> {
		self.queries.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}
}
impl Default for SpyRerank {
	fn default() -> Self {
		Self::new()
	}
}
impl RerankProvider for SpyRerank {
	fn rerank<'a>(
		&'a self,
		_cfg: &'a RerankProviderConfig,
		query: &'a str,
		docs: &'a [String],
		_top_n: usize,
	) -> BoxFuture<'a, Result<Vec<(usize, f32)>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.queries
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(query.to_string());

		let pairs = (0..docs.len())
			.rev()
			.enumerate()
			.map(|(rank, index)| (index, 1.0 / (rank + 1) as f32))
			.collect::<Vec<_>>();

		Box::pin(async move { Ok(pairs) })
	}
}

/// Always fails with the given status; drives the degrade path.
pub struct FailingRerank {
	pub code: u16,
	pub calls: Arc<AtomicUsize>,
}
impl FailingRerank {
	pub fn new(code: u16) -> Self {
		Self { code, calls: Arc::new(AtomicUsize::new(0)) }
	}
}
impl RerankProvider for FailingRerank {
	fn rerank<'a>(
		&'a self,
		_cfg: &'a RerankProviderConfig,
		_query: &'a str,
		_docs: &'a [String],
		_top_n: usize,
	) -> BoxFuture<'a, Result<Vec<(usize, f32)>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let code = self.code;

		Box::pin(async move {
			Err(Error::Status { code, message: "scripted rerank failure".to_string() })
		})
	}
}

/// Returns a fixed answer and records every prompt.
pub struct SpySynthesis {
	pub answer: String,
	pub prompts: Arc<Mutex<Vec<String>>>,
}
impl SpySynthesis {
	pub fn new(answer: impl Into<String>) -> Self {
		Self { answer: answer.into(), prompts: Arc::new(Mutex::new(Vec::new())) }
	}

	pub fn recorded_prompts(&self) -> Vec<String> {
		self.prompts.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}
}
impl SynthesisProvider for SpySynthesis {
	fn generate<'a>(
		&'a self,
		_cfg: &'a SynthesisProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, Result<String>> {
		self.prompts
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(prompt.to_string());

		let answer = self.answer.clone();

		Box::pin(async move { Ok(answer) })
	}
}

/// Synthesis double that responds but never produces an answer.
pub struct EmptySynthesis;
impl SynthesisProvider for EmptySynthesis {
	fn generate<'a>(
		&'a self,
		_cfg: &'a SynthesisProviderConfig,
		_prompt: &'a str,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move {
			Err(Error::InvalidResponse {
				message: "Synthesis returned no candidates.".to_string(),
			})
		})
	}
}
