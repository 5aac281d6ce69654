mod error;

pub mod rerank;
pub mod retrieval;
pub mod retry;
pub mod synthesis;

pub use error::{Error, Result};

use reqwest::header::{AUTHORIZATION, HeaderMap};

pub fn auth_headers(api_key: &str) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	Ok(headers)
}

pub(crate) fn configured_key<'a>(api_key: Option<&'a str>, provider: &str) -> Result<&'a str> {
	api_key.ok_or_else(|| Error::InvalidConfig {
		message: format!("Provider {provider} api_key is not configured."),
	})
}

/// Reads a failed response into a classifiable error, keeping a bounded
/// excerpt of the upstream body. The boundary layer redacts it before
/// anything client-visible is produced.
pub(crate) async fn status_error(res: reqwest::Response) -> Error {
	let code = res.status().as_u16();
	let message = match res.text().await {
		Ok(body) => body.chars().take(500).collect(),
		Err(_) => String::new(),
	};

	Error::Status { code, message }
}
