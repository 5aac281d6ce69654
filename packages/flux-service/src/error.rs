pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider {provider} is not configured.")]
	NotConfigured { provider: &'static str },
	#[error("Retrieval failed: {message}")]
	Retrieval { message: String },
	#[error("Synthesis failed: {message}")]
	Synthesis { message: String },
	#[error("No results found.")]
	NoResults,
	#[error("Conversation not found.")]
	ConversationNotFound,
	#[error("Conversation message limit ({limit}) reached.")]
	MessageLimitReached { limit: u32 },
}
