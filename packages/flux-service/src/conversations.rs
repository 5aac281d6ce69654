use time::OffsetDateTime;
use uuid::Uuid;

use flux_domain::{context::build_context_query, ranking::RankedResult};

use crate::{
	Error, Result, Service,
	answer::{Citation, citations_for},
	search::DEFAULT_LIMIT,
	store::StoredConversation,
};

const SYSTEM_INSTRUCTION: &str = "Reply to the user naturally. Use the sources below only when \
	the user's question actually needs them. For greetings, small talk, or simple questions that \
	don't need web results, respond briefly and naturally and do not cite the sources.";

/// One turn of a conversation. Immutable once created.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Message {
	pub id: Uuid,
	pub query: String,
	pub answer: String,
	pub citations: Vec<Citation>,
	pub results: Vec<RankedResult>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Conversation {
	pub id: Uuid,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	pub message_count: u32,
	pub messages: Vec<Message>,
}
impl From<StoredConversation> for Conversation {
	fn from(stored: StoredConversation) -> Self {
		Self {
			id: stored.id,
			created_at: stored.created_at,
			message_count: stored.messages.len() as u32,
			messages: stored.messages,
		}
	}
}

/// List entry with messages omitted.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConversationSummary {
	pub id: Uuid,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	pub message_count: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConversationListResponse {
	pub conversations: Vec<ConversationSummary>,
	pub total: u32,
	pub page: u32,
	pub page_size: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AddMessageRequest {
	pub query: String,
}

impl Service {
	pub fn create_conversation(&self) -> Conversation {
		self.store.create(Uuid::new_v4(), OffsetDateTime::now_utc()).into()
	}

	pub fn get_conversation(&self, id: Uuid) -> Result<Conversation> {
		self.store.get(&id).map(Conversation::from).ok_or(Error::ConversationNotFound)
	}

	pub fn list_conversations(&self, page: u32, page_size: u32) -> ConversationListResponse {
		let (items, total) = self.store.list(page as usize, page_size as usize);

		ConversationListResponse {
			conversations: items
				.into_iter()
				.map(|stored| ConversationSummary {
					id: stored.id,
					created_at: stored.created_at,
					message_count: stored.messages.len() as u32,
				})
				.collect(),
			total: total as u32,
			page,
			page_size,
		}
	}

	pub fn delete_conversation(&self, id: Uuid) -> Result<()> {
		if self.store.delete(&id) { Ok(()) } else { Err(Error::ConversationNotFound) }
	}

	/// One multi-turn turn: context-widened retrieval, rerank against the
	/// current query only, synthesis over prior Q/A history plus fresh
	/// sources, then append to the conversation.
	pub async fn add_message(&self, id: Uuid, req: AddMessageRequest) -> Result<Message> {
		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest {
				message: "query must not be empty.".to_string(),
			});
		}
		if !self.cfg.providers.synthesis.is_configured() {
			return Err(Error::NotConfigured { provider: "synthesis" });
		}

		let conversation = self.store.get(&id).ok_or(Error::ConversationNotFound)?;
		let limit = self.cfg.store.max_messages_per_conversation;

		// Primary cap enforcement; the store's truncation-on-append only
		// covers appends racing past this check.
		if conversation.messages.len() as u32 >= limit {
			return Err(Error::MessageLimitReached { limit });
		}

		let previous_queries = conversation
			.messages
			.iter()
			.map(|message| message.query.clone())
			.collect::<Vec<_>>();
		let context_query = build_context_query(
			query,
			&previous_queries,
			self.cfg.search.context_window as usize,
		);
		let flow = self
			.run_search(query, DEFAULT_LIMIT as usize, "general", None, Some(&context_query))
			.await?;

		if flow.results.is_empty() {
			return Err(Error::NoResults);
		}

		let source_count = self.cfg.search.answer_source_count as usize;
		let top = &flow.results[..flow.results.len().min(source_count)];
		let history = conversation
			.messages
			.iter()
			.map(|message| (message.query.as_str(), message.answer.as_str()))
			.collect::<Vec<_>>();
		let prompt = build_message_prompt(query, &history, top);
		let answer = self
			.providers
			.synthesis
			.generate(&self.cfg.providers.synthesis, &prompt)
			.await
			.map_err(|err| Error::Synthesis { message: err.to_string() })?;
		let message = Message {
			id: Uuid::new_v4(),
			query: query.to_string(),
			answer,
			citations: citations_for(top),
			results: top.to_vec(),
			created_at: OffsetDateTime::now_utc(),
		};

		if !self.store.append_message(&id, message.clone()) {
			// Deleted between the read above and the append.
			return Err(Error::ConversationNotFound);
		}

		Ok(message)
	}
}

fn build_message_prompt(
	current_query: &str,
	history: &[(&str, &str)],
	sources: &[RankedResult],
) -> String {
	let mut parts = vec![
		SYSTEM_INSTRUCTION.to_string(),
		String::new(),
		"When you do use the sources, cite them by number [1], [2], etc. Be concise.".to_string(),
		"You have context from previous turns in this conversation.".to_string(),
		String::new(),
	];

	if !history.is_empty() {
		parts.push("Previous conversation:".to_string());

		for (query, answer) in history {
			parts.push(format!("Q: {query}"));
			parts.push(format!("A: {answer}"));
			parts.push(String::new());
		}
	}

	parts.push(format!("Question: {current_query}"));
	parts.push(String::new());
	parts.push("Sources:".to_string());

	for (number, source) in sources.iter().enumerate() {
		parts.push(format!("[{}] {}\n{}", number + 1, source.title, source.snippet));
		parts.push(String::new());
	}

	parts.join("\n").trim().to_string()
}
