use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub store: Store,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub retrieval: RetrievalProviderConfig,
	pub rerank: RerankProviderConfig,
	pub synthesis: SynthesisProviderConfig,
}

/// Web-search upstream. Authenticates with the key inside the request body.
#[derive(Debug, Deserialize)]
pub struct RetrievalProviderConfig {
	pub api_base: String,
	pub api_key: Option<String>,
	pub path: String,
	pub timeout_ms: u64,
}

/// Rerank upstream. Bearer-authenticated cross-encoder scoring.
#[derive(Debug, Deserialize)]
pub struct RerankProviderConfig {
	pub api_base: String,
	pub api_key: Option<String>,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
}

/// Answer-synthesis upstream. Authenticates with the key as a query parameter.
#[derive(Debug, Deserialize)]
pub struct SynthesisProviderConfig {
	pub api_base: String,
	pub api_key: Option<String>,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_output_tokens: u32,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Raw hits requested from retrieval regardless of the caller's limit, so
	/// the reranker sees a full candidate pool.
	pub raw_hit_limit: u32,
	pub snippet_max_chars: u32,
	/// Top-ranked results fed into the synthesis prompt and cited back.
	pub answer_source_count: u32,
	/// Previous conversation turns folded into the retrieval query.
	pub context_window: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self { raw_hit_limit: 20, snippet_max_chars: 300, answer_source_count: 5, context_window: 3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Store {
	pub max_conversations: u32,
	pub max_messages_per_conversation: u32,
}
impl Default for Store {
	fn default() -> Self {
		Self { max_conversations: 5_000, max_messages_per_conversation: 100 }
	}
}

impl RetrievalProviderConfig {
	pub fn is_configured(&self) -> bool {
		self.api_key.is_some()
	}
}

impl RerankProviderConfig {
	pub fn is_configured(&self) -> bool {
		self.api_key.is_some()
	}
}

impl SynthesisProviderConfig {
	pub fn is_configured(&self) -> bool {
		self.api_key.is_some()
	}
}
