pub mod answer;
pub mod boundary;
pub mod conversations;
mod error;
pub mod search;
pub mod store;

use std::{future::Future, pin::Pin, sync::Arc};

pub use answer::{AnswerRequest, AnswerResponse, Citation};
pub use boundary::ErrorBody;
pub use conversations::{
	AddMessageRequest, Conversation, ConversationListResponse, ConversationSummary, Message,
};
pub use error::{Error, Result};
pub use search::{SearchRequest, SearchResponse};
pub use store::{ConversationStore, StoredConversation};

use flux_config::{
	Config, RerankProviderConfig, RetrievalProviderConfig, SynthesisProviderConfig,
};
use flux_domain::ranking::RetrievalHit;
use flux_providers::retrieval::RetrievalRequest;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait RetrievalProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a RetrievalProviderConfig,
		req: &'a RetrievalRequest,
		snippet_max_chars: usize,
	) -> BoxFuture<'a, flux_providers::Result<Vec<RetrievalHit>>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a RerankProviderConfig,
		query: &'a str,
		docs: &'a [String],
		top_n: usize,
	) -> BoxFuture<'a, flux_providers::Result<Vec<(usize, f32)>>>;
}

pub trait SynthesisProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a SynthesisProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, flux_providers::Result<String>>;
}

struct DefaultProviders;

impl RetrievalProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a RetrievalProviderConfig,
		req: &'a RetrievalRequest,
		snippet_max_chars: usize,
	) -> BoxFuture<'a, flux_providers::Result<Vec<RetrievalHit>>> {
		Box::pin(flux_providers::retrieval::search(cfg, req, snippet_max_chars))
	}
}

impl RerankProvider for DefaultProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a RerankProviderConfig,
		query: &'a str,
		docs: &'a [String],
		top_n: usize,
	) -> BoxFuture<'a, flux_providers::Result<Vec<(usize, f32)>>> {
		Box::pin(flux_providers::rerank::rerank(cfg, query, docs, top_n))
	}
}

impl SynthesisProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a SynthesisProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, flux_providers::Result<String>> {
		Box::pin(flux_providers::synthesis::generate(cfg, prompt))
	}
}

#[derive(Clone)]
pub struct Providers {
	pub retrieval: Arc<dyn RetrievalProvider>,
	pub rerank: Arc<dyn RerankProvider>,
	pub synthesis: Arc<dyn SynthesisProvider>,
}

impl Providers {
	pub fn new(
		retrieval: Arc<dyn RetrievalProvider>,
		rerank: Arc<dyn RerankProvider>,
		synthesis: Arc<dyn SynthesisProvider>,
	) -> Self {
		Self { retrieval, rerank, synthesis }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { retrieval: provider.clone(), rerank: provider.clone(), synthesis: provider }
	}
}

pub struct Service {
	pub cfg: Config,
	pub providers: Providers,
	pub store: ConversationStore,
}

impl Service {
	pub fn new(cfg: Config) -> Self {
		Self::with_providers(cfg, Providers::default())
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		let store = ConversationStore::new(
			cfg.store.max_conversations as usize,
			cfg.store.max_messages_per_conversation as usize,
		);

		Self { cfg, providers, store }
	}
}
