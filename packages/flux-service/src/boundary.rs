//! Outermost error surface. The core's failure values stay fully
//! informative; only here is upstream text redacted and shaped into the
//! `{error, code}` body a client may see.

use regex::Regex;

use crate::Error;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
	pub error: String,
	pub code: String,
}

pub fn error_body(err: &Error) -> ErrorBody {
	ErrorBody { error: redact_message(&err.to_string()), code: error_code(err).to_string() }
}

/// Stable machine-readable token per failure class. An unconfigured provider
/// surfaces as the same code as that provider failing.
pub fn error_code(err: &Error) -> &'static str {
	match err {
		Error::InvalidRequest { .. } => "MISSING_QUERY",
		Error::NotConfigured { provider: "synthesis" } | Error::Synthesis { .. } =>
			"ANSWER_FAILED",
		Error::NotConfigured { .. } | Error::Retrieval { .. } => "RETRIEVAL_ERROR",
		Error::NoResults => "NO_RESULTS",
		Error::ConversationNotFound => "CONVERSATION_NOT_FOUND",
		Error::MessageLimitReached { .. } => "MESSAGE_LIMIT_REACHED",
	}
}

/// Strips credentials that upstream error text can echo back: keys in URL
/// query strings, bearer tokens, and `api_key=` style assignments.
pub fn redact_message(text: &str) -> String {
	let patterns = [
		r"(?i)([?&]key=)[^&\s'\x22]+",
		r"(?i)(bearer\s+)\S+",
		r#"(?i)(api[_-]?key['\x22]?\s*[:=]\s*['\x22]?)[^'\x22\s]+"#,
	];
	let mut redacted = text.to_string();

	for pattern in patterns {
		if let Ok(re) = Regex::new(pattern) {
			redacted = re.replace_all(&redacted, "${1}<redacted>").into_owned();
		}
	}

	redacted
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn redacts_url_key_parameter() {
		let text = "POST https://api.example/v1?key=sk-abc123&x=1 failed";

		assert_eq!(
			redact_message(text),
			"POST https://api.example/v1?key=<redacted>&x=1 failed"
		);
	}

	#[test]
	fn redacts_bearer_token() {
		assert_eq!(
			redact_message("Authorization: Bearer sk-abc123 rejected"),
			"Authorization: Bearer <redacted> rejected"
		);
	}

	#[test]
	fn redacts_api_key_assignment() {
		assert_eq!(redact_message("api_key=sk-abc123"), "api_key=<redacted>");
	}

	#[test]
	fn leaves_plain_text_alone() {
		assert_eq!(redact_message("connection refused"), "connection refused");
	}

	#[test]
	fn maps_errors_to_stable_codes() {
		assert_eq!(error_code(&Error::NoResults), "NO_RESULTS");
		assert_eq!(
			error_code(&Error::NotConfigured { provider: "retrieval" }),
			"RETRIEVAL_ERROR"
		);
		assert_eq!(
			error_code(&Error::NotConfigured { provider: "synthesis" }),
			"ANSWER_FAILED"
		);
		assert_eq!(error_code(&Error::MessageLimitReached { limit: 100 }), "MESSAGE_LIMIT_REACHED");
	}

	#[test]
	fn body_is_redacted() {
		let err = Error::Retrieval {
			message: "401 from https://api.example/search?key=sk-abc".to_string(),
		};
		let body = error_body(&err);

		assert_eq!(body.code, "RETRIEVAL_ERROR");
		assert!(!body.error.contains("sk-abc"));
		assert!(body.error.contains("<redacted>"));
	}
}
