/// Folds the last `max_previous` prior queries into one retrieval query,
/// oldest first, with the current query appended last. Retrieval benefits
/// from the topical breadth; reranking still scores against the current
/// query alone.
pub fn build_context_query(
	current_query: &str,
	previous_queries: &[String],
	max_previous: usize,
) -> String {
	let start = previous_queries.len().saturating_sub(max_previous);
	let mut parts =
		previous_queries[start..].iter().map(String::as_str).collect::<Vec<_>>();

	parts.push(current_query);

	parts.join(" ").trim().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keeps_last_three_previous_queries_in_order() {
		let previous = ["a", "b", "c", "d"].map(String::from);

		assert_eq!(build_context_query("x", &previous, 3), "b c d x");
	}

	#[test]
	fn handles_empty_history() {
		assert_eq!(build_context_query("x", &[], 3), "x");
	}

	#[test]
	fn trims_the_joined_query() {
		let previous = ["".to_string()];

		assert_eq!(build_context_query("x", &previous, 3), "x");
	}
}
