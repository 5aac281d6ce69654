use std::sync::Arc;

use uuid::Uuid;

use flux_service::{AddMessageRequest, Error, Providers, Service};
use flux_testkit::{SpyRerank, SpyRetrieval, SpySynthesis, sample_hits, test_config};

struct Doubles {
	retrieval: Arc<SpyRetrieval>,
	rerank: Arc<SpyRerank>,
	synthesis: Arc<SpySynthesis>,
}

fn service(cfg: flux_config::Config) -> (Service, Doubles) {
	let doubles = Doubles {
		retrieval: Arc::new(SpyRetrieval::new(sample_hits(8))),
		rerank: Arc::new(SpyRerank::new()),
		synthesis: Arc::new(SpySynthesis::new("A grounded answer. [1]")),
	};
	let providers = Providers::new(
		doubles.retrieval.clone(),
		doubles.rerank.clone(),
		doubles.synthesis.clone(),
	);

	(Service::with_providers(cfg, providers), doubles)
}

fn add(query: &str) -> AddMessageRequest {
	AddMessageRequest { query: query.to_string() }
}

#[tokio::test]
async fn create_and_get_roundtrip() {
	let (service, _) = service(test_config());
	let created = service.create_conversation();

	assert_eq!(created.message_count, 0);
	assert!(created.messages.is_empty());

	let fetched = service.get_conversation(created.id).expect("conversation must exist");

	assert_eq!(fetched.id, created.id);
	assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn get_unknown_conversation_is_not_found() {
	let (service, _) = service(test_config());

	assert!(matches!(
		service.get_conversation(Uuid::new_v4()),
		Err(Error::ConversationNotFound)
	));
}

#[tokio::test]
async fn add_message_appends_one_turn() {
	let (service, _) = service(test_config());
	let conversation = service.create_conversation();
	let message = service
		.add_message(conversation.id, add("what is rust?"))
		.await
		.expect("turn must succeed");

	assert_eq!(message.query, "what is rust?");
	assert_eq!(message.answer, "A grounded answer. [1]");
	assert_eq!(message.citations.len(), 5);
	assert_eq!(message.results.len(), 5);

	let fetched = service.get_conversation(conversation.id).expect("conversation must exist");

	assert_eq!(fetched.message_count, 1);
	assert_eq!(fetched.messages[0].id, message.id);
}

#[tokio::test]
async fn retrieval_sees_context_while_rerank_sees_the_current_query() {
	let (service, doubles) = service(test_config());
	let conversation = service.create_conversation();

	for query in ["q1", "q2", "q3", "q4"] {
		service.add_message(conversation.id, add(query)).await.expect("turn must succeed");
	}

	let retrieval_queries = doubles.retrieval.recorded_queries();
	let rerank_queries = doubles.rerank.recorded_queries();

	// First turn has no history; the window keeps the last three thereafter.
	assert_eq!(retrieval_queries, vec!["q1", "q1 q2", "q1 q2 q3", "q1 q2 q3 q4"]);
	assert_eq!(rerank_queries, vec!["q1", "q2", "q3", "q4"]);
}

#[tokio::test]
async fn context_window_drops_the_oldest_turns() {
	let (service, doubles) = service(test_config());
	let conversation = service.create_conversation();

	for query in ["q1", "q2", "q3", "q4", "q5"] {
		service.add_message(conversation.id, add(query)).await.expect("turn must succeed");
	}

	let retrieval_queries = doubles.retrieval.recorded_queries();

	assert_eq!(retrieval_queries.last().map(String::as_str), Some("q2 q3 q4 q5"));
}

#[tokio::test]
async fn synthesis_prompt_carries_prior_turns() {
	let (service, doubles) = service(test_config());
	let conversation = service.create_conversation();

	service.add_message(conversation.id, add("first question")).await.expect("turn one");
	service.add_message(conversation.id, add("second question")).await.expect("turn two");

	let prompts = doubles.synthesis.recorded_prompts();

	assert!(!prompts[0].contains("Previous conversation:"));
	assert!(prompts[1].contains("Previous conversation:"));
	assert!(prompts[1].contains("Q: first question"));
	assert!(prompts[1].contains("A: A grounded answer. [1]"));
	assert!(prompts[1].contains("Question: second question"));
}

#[tokio::test]
async fn message_limit_rejects_rather_than_truncates() {
	let mut cfg = test_config();

	cfg.store.max_messages_per_conversation = 2;

	let (service, _) = service(cfg);
	let conversation = service.create_conversation();

	service.add_message(conversation.id, add("q1")).await.expect("turn one");
	service.add_message(conversation.id, add("q2")).await.expect("turn two");

	let err = service
		.add_message(conversation.id, add("q3"))
		.await
		.expect_err("turn past the cap must be rejected");

	assert!(matches!(err, Error::MessageLimitReached { limit: 2 }));

	let fetched = service.get_conversation(conversation.id).expect("conversation must exist");

	assert_eq!(fetched.message_count, 2);
}

#[tokio::test]
async fn add_message_to_unknown_conversation_is_not_found() {
	let (service, doubles) = service(test_config());
	let err = service
		.add_message(Uuid::new_v4(), add("q"))
		.await
		.expect_err("unknown conversation must be rejected");

	assert!(matches!(err, Error::ConversationNotFound));
	assert!(doubles.retrieval.recorded_queries().is_empty());
}

#[tokio::test]
async fn list_returns_summaries_with_totals() {
	let (service, _) = service(test_config());

	for _ in 0..5 {
		service.create_conversation();
	}

	let listed = service.list_conversations(2, 2);

	assert_eq!(listed.total, 5);
	assert_eq!(listed.conversations.len(), 2);
	assert_eq!(listed.page, 2);
	assert_eq!(listed.page_size, 2);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
	let (service, _) = service(test_config());
	let conversation = service.create_conversation();

	service.delete_conversation(conversation.id).expect("delete must succeed");

	assert!(matches!(
		service.get_conversation(conversation.id),
		Err(Error::ConversationNotFound)
	));
	assert!(matches!(
		service.delete_conversation(conversation.id),
		Err(Error::ConversationNotFound)
	));
}
