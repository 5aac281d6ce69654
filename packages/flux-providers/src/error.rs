pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidRequest { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("Upstream returned status {code}: {message}")]
	Status { code: u16, message: String },
}
impl Error {
	/// HTTP status carried by the failure, when there is one. Timeouts and
	/// transport errors have none and are never retried.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Reqwest(err) => err.status().map(|status| status.as_u16()),
			Self::Status { code, .. } => Some(*code),
			_ => None,
		}
	}
}
