use std::{
	collections::HashMap,
	sync::{Mutex, MutexGuard, PoisonError},
};

use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::conversations::Message;

/// Conversation state as the store owns it. `Conversation` responses are
/// built from clones of this; nothing outside the store mutates it.
#[derive(Debug, Clone)]
pub struct StoredConversation {
	pub id: Uuid,
	pub created_at: OffsetDateTime,
	pub messages: Vec<Message>,
}

/// Bounded in-memory conversation store. The single mutex is the process's
/// only mutable shared state; every read and write goes through these
/// operations. Nothing survives a restart.
pub struct ConversationStore {
	max_conversations: usize,
	max_messages_per_conversation: usize,
	inner: Mutex<HashMap<Uuid, StoredConversation>>,
}

impl ConversationStore {
	pub fn new(max_conversations: usize, max_messages_per_conversation: usize) -> Self {
		Self {
			max_conversations,
			max_messages_per_conversation,
			inner: Mutex::new(HashMap::new()),
		}
	}

	/// Inserts a new empty conversation, first evicting the globally-oldest
	/// entries until the cap leaves room. Ties on `created_at` break on id so
	/// eviction order is deterministic.
	pub fn create(&self, id: Uuid, created_at: OffsetDateTime) -> StoredConversation {
		let mut inner = self.lock();

		while inner.len() >= self.max_conversations {
			let Some(oldest) = inner
				.values()
				.map(|conversation| (conversation.created_at, conversation.id))
				.min()
			else {
				break;
			};

			inner.remove(&oldest.1);

			debug!(id = %oldest.1, created_at = %oldest.0, "Evicted oldest conversation at capacity.");
		}

		let conversation = StoredConversation { id, created_at, messages: Vec::new() };

		inner.insert(id, conversation.clone());

		conversation
	}

	pub fn get(&self, id: &Uuid) -> Option<StoredConversation> {
		self.lock().get(id).cloned()
	}

	/// Newest-first page of conversations plus the total count across the
	/// whole store. `page` is 1-indexed.
	pub fn list(&self, page: usize, page_size: usize) -> (Vec<StoredConversation>, usize) {
		let inner = self.lock();
		let mut all = inner.values().cloned().collect::<Vec<_>>();

		all.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

		let total = all.len();
		let start = page.saturating_sub(1).saturating_mul(page_size).min(total);
		let end = start.saturating_add(page_size).min(total);

		(all[start..end].to_vec(), total)
	}

	/// Appends one message, then trims to the most recent cap as a safety net
	/// against concurrent appends racing past the caller's limit check.
	/// Returns false when the conversation does not exist.
	pub fn append_message(&self, id: &Uuid, message: Message) -> bool {
		let mut inner = self.lock();
		let Some(conversation) = inner.get_mut(id) else {
			return false;
		};

		conversation.messages.push(message);

		let excess =
			conversation.messages.len().saturating_sub(self.max_messages_per_conversation);

		if excess > 0 {
			conversation.messages.drain(..excess);
		}

		true
	}

	pub fn delete(&self, id: &Uuid) -> bool {
		self.lock().remove(id).is_some()
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, StoredConversation>> {
		self.inner.lock().unwrap_or_else(PoisonError::into_inner)
	}
}
