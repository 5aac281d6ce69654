use flux_domain::ranking::RankedResult;

use crate::{Error, Result, Service, search::DEFAULT_LIMIT};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnswerRequest {
	pub query: String,
	pub topic: Option<String>,
	pub days: Option<u32>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Citation {
	pub title: String,
	pub url: String,
	pub score: f32,
	/// Final rank of the cited result within its batch, 1-indexed.
	pub rank: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnswerResponse {
	pub query: String,
	pub answer: String,
	pub citations: Vec<Citation>,
}

impl Service {
	/// Single-turn answering: search, take the top sources, synthesize a
	/// cited answer.
	pub async fn answer(&self, req: AnswerRequest) -> Result<AnswerResponse> {
		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest {
				message: "query must not be empty.".to_string(),
			});
		}
		if !self.cfg.providers.synthesis.is_configured() {
			return Err(Error::NotConfigured { provider: "synthesis" });
		}

		let topic = req.topic.as_deref().unwrap_or("general");
		let flow = self.run_search(query, DEFAULT_LIMIT as usize, topic, req.days, None).await?;

		if flow.results.is_empty() {
			return Err(Error::NoResults);
		}

		let source_count = self.cfg.search.answer_source_count as usize;
		let top = &flow.results[..flow.results.len().min(source_count)];
		let prompt = build_answer_prompt(query, top);
		let answer = self
			.providers
			.synthesis
			.generate(&self.cfg.providers.synthesis, &prompt)
			.await
			.map_err(|err| Error::Synthesis { message: err.to_string() })?;

		Ok(AnswerResponse {
			query: query.to_string(),
			answer,
			citations: citations_for(top),
		})
	}
}

pub(crate) fn citations_for(results: &[RankedResult]) -> Vec<Citation> {
	results
		.iter()
		.map(|result| Citation {
			title: result.title.clone(),
			url: result.url.clone(),
			score: result.relevance_score,
			rank: result.rank_final,
		})
		.collect()
}

fn build_answer_prompt(query: &str, sources: &[RankedResult]) -> String {
	let mut parts = vec![
		"Answer the following question using only the sources provided.".to_string(),
		"Be concise. Cite sources by number [1], [2], etc.".to_string(),
		String::new(),
		format!("Question: {query}"),
		String::new(),
		"Sources:".to_string(),
	];

	for (number, source) in sources.iter().enumerate() {
		parts.push(format!("[{}] {}\n{}", number + 1, source.title, source.snippet));
		parts.push(String::new());
	}

	parts.join("\n")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn result(title: &str) -> RankedResult {
		RankedResult {
			id: "0123456789abcdef".to_string(),
			url: format!("https://example.com/{title}"),
			title: title.to_string(),
			snippet: format!("About {title}."),
			relevance_score: 0.9,
			rank_original: 1,
			rank_final: 1,
		}
	}

	#[test]
	fn prompt_numbers_sources_in_order() {
		let sources = vec![result("alpha"), result("beta")];
		let prompt = build_answer_prompt("what is alpha?", &sources);

		assert!(prompt.contains("Question: what is alpha?"));
		assert!(prompt.contains("[1] alpha\nAbout alpha."));
		assert!(prompt.contains("[2] beta\nAbout beta."));
	}

	#[test]
	fn citations_carry_final_rank_and_score() {
		let mut second = result("beta");

		second.rank_final = 2;
		second.relevance_score = 0.5;

		let citations = citations_for(&[result("alpha"), second]);

		assert_eq!(citations.len(), 2);
		assert_eq!(citations[1].rank, 2);
		assert!((citations[1].score - 0.5).abs() < 1e-6);
	}
}
