use serde::{Deserialize, Serialize};

/// Hex characters of the blake3 url digest kept as the result id.
const RESULT_ID_LEN: usize = 16;

/// One raw hit from the retrieval upstream, as parsed at the provider
/// boundary. Lives only within a single pipeline invocation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalHit {
	pub url: String,
	pub title: String,
	pub snippet: String,
	/// Provider-native relevance. Opaque; never compared across providers.
	pub provider_score: f32,
}

/// Canonical pipeline output unit.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RankedResult {
	/// Deterministic hash of `url`; stable across repeated queries.
	pub id: String,
	pub url: String,
	pub title: String,
	pub snippet: String,
	/// Normalized 0.0-1.0, rounded to four decimals. 0.0 when no rerank
	/// signal exists.
	pub relevance_score: f32,
	/// 1-indexed position before reranking.
	pub rank_original: u32,
	/// 1-indexed position after reranking. Equals `rank_original` when
	/// reranking did not occur.
	pub rank_final: u32,
}

/// Whether a batch carries rerank scores or preserves retrieval order.
/// `Degraded` is a valid terminal state, not an error.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RerankOutcome {
	Reranked,
	Degraded,
}
impl RerankOutcome {
	pub fn reranked(self) -> bool {
		matches!(self, Self::Reranked)
	}
}

pub fn result_id(url: &str) -> String {
	let mut id = blake3::hash(url.as_bytes()).to_hex().to_string();

	id.truncate(RESULT_ID_LEN);

	id
}

/// Truncates on a char boundary so multi-byte content never splits.
pub fn truncate_snippet(snippet: &str, max_chars: usize) -> String {
	match snippet.char_indices().nth(max_chars) {
		Some((offset, _)) => snippet[..offset].to_string(),
		None => snippet.to_string(),
	}
}

/// Builds the batch when no rerank signal exists: identity permutation,
/// zero scores.
pub fn build_unranked(hits: &[RetrievalHit], snippet_max_chars: usize) -> Vec<RankedResult> {
	hits.iter()
		.enumerate()
		.map(|(index, hit)| {
			let rank = index as u32 + 1;

			RankedResult {
				id: result_id(&hit.url),
				url: hit.url.clone(),
				title: hit.title.clone(),
				snippet: truncate_snippet(&hit.snippet, snippet_max_chars),
				relevance_score: 0.0,
				rank_original: rank,
				rank_final: rank,
			}
		})
		.collect()
}

/// Merges retrieval hits with rerank scores. `pairs` is the reranked order as
/// returned by the rerank upstream: position is the new rank, the paired
/// index points back into `hits`. Pairs whose index falls outside `hits` are
/// skipped so ranks stay contiguous; the provider layer logs that case when
/// the response is parsed.
pub fn merge_ranked(
	hits: &[RetrievalHit],
	pairs: &[(usize, f32)],
	snippet_max_chars: usize,
) -> Vec<RankedResult> {
	let mut out = Vec::with_capacity(pairs.len().min(hits.len()));

	for &(index, score) in pairs {
		let Some(hit) = hits.get(index) else {
			continue;
		};

		out.push(RankedResult {
			id: result_id(&hit.url),
			url: hit.url.clone(),
			title: hit.title.clone(),
			snippet: truncate_snippet(&hit.snippet, snippet_max_chars),
			relevance_score: round_score(score),
			rank_original: index as u32 + 1,
			rank_final: out.len() as u32 + 1,
		});
	}

	out
}

fn round_score(score: f32) -> f32 {
	(score * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hit(url: &str) -> RetrievalHit {
		RetrievalHit {
			url: url.to_string(),
			title: format!("Title for {url}"),
			snippet: format!("Snippet for {url}"),
			provider_score: 0.0,
		}
	}

	#[test]
	fn result_id_is_stable_and_fixed_length() {
		let first = result_id("https://example.com/a");
		let second = result_id("https://example.com/a");

		assert_eq!(first, second);
		assert_eq!(first.len(), 16);
		assert_ne!(first, result_id("https://example.com/b"));
	}

	#[test]
	fn rounds_scores_to_four_decimals() {
		assert_eq!(round_score(0.123_456), 0.123_5);
		assert_eq!(round_score(1.0), 1.0);
	}

	#[test]
	fn truncates_on_char_boundary() {
		assert_eq!(truncate_snippet("abcdef", 3), "abc");
		assert_eq!(truncate_snippet("ab", 3), "ab");
		assert_eq!(truncate_snippet("\u{e9}\u{e9}\u{e9}", 2), "\u{e9}\u{e9}");
	}

	#[test]
	fn merge_skips_out_of_range_indices_without_gaps() {
		let hits = vec![hit("https://a"), hit("https://b")];
		let pairs = vec![(1, 0.9), (7, 0.8), (0, 0.5)];
		let merged = merge_ranked(&hits, &pairs, 300);

		assert_eq!(merged.len(), 2);
		assert_eq!(merged[0].rank_original, 2);
		assert_eq!(merged[0].rank_final, 1);
		assert_eq!(merged[1].rank_original, 1);
		assert_eq!(merged[1].rank_final, 2);
	}
}
