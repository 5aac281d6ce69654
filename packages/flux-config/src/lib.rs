mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Providers, RerankProviderConfig, RetrievalProviderConfig, Search, Store,
	SynthesisProviderConfig,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, api_base, path, timeout_ms) in [
		(
			"retrieval",
			&cfg.providers.retrieval.api_base,
			&cfg.providers.retrieval.path,
			cfg.providers.retrieval.timeout_ms,
		),
		(
			"rerank",
			&cfg.providers.rerank.api_base,
			&cfg.providers.rerank.path,
			cfg.providers.rerank.timeout_ms,
		),
		(
			"synthesis",
			&cfg.providers.synthesis.api_base,
			&cfg.providers.synthesis.path,
			cfg.providers.synthesis.timeout_ms,
		),
	] {
		if api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_base must be non-empty."),
			});
		}
		if path.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} path must be non-empty."),
			});
		}
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}

	if cfg.providers.rerank.model.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider rerank model must be non-empty.".to_string(),
		});
	}
	if cfg.providers.synthesis.model.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider synthesis model must be non-empty.".to_string(),
		});
	}
	if !cfg.providers.synthesis.temperature.is_finite()
		|| cfg.providers.synthesis.temperature < 0.0
	{
		return Err(Error::Validation {
			message: "Provider synthesis temperature must be zero or greater.".to_string(),
		});
	}
	if cfg.providers.synthesis.max_output_tokens == 0 {
		return Err(Error::Validation {
			message: "Provider synthesis max_output_tokens must be greater than zero.".to_string(),
		});
	}

	if cfg.search.raw_hit_limit == 0 {
		return Err(Error::Validation {
			message: "search.raw_hit_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.snippet_max_chars == 0 {
		return Err(Error::Validation {
			message: "search.snippet_max_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.search.answer_source_count == 0 {
		return Err(Error::Validation {
			message: "search.answer_source_count must be greater than zero.".to_string(),
		});
	}
	if cfg.search.context_window == 0 {
		return Err(Error::Validation {
			message: "search.context_window must be greater than zero.".to_string(),
		});
	}

	if cfg.store.max_conversations == 0 {
		return Err(Error::Validation {
			message: "store.max_conversations must be greater than zero.".to_string(),
		});
	}
	if cfg.store.max_messages_per_conversation == 0
		|| cfg.store.max_messages_per_conversation > 500
	{
		return Err(Error::Validation {
			message: "store.max_messages_per_conversation must be between 1 and 500.".to_string(),
		});
	}

	Ok(())
}

/// Blank or whitespace-only credentials mean the provider is unconfigured.
fn normalize(cfg: &mut Config) {
	for key in [
		&mut cfg.providers.retrieval.api_key,
		&mut cfg.providers.rerank.api_key,
		&mut cfg.providers.synthesis.api_key,
	] {
		*key = key
			.take()
			.map(|value| value.trim().to_string())
			.filter(|value| !value.is_empty());
	}
}
