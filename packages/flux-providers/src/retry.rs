use std::{future::Future, time::Duration};

use tokio::time::sleep;

use crate::{Error, Result};

const RATE_LIMIT_STATUS: u16 = 429;
const TRANSIENT_STATUSES: [u16; 2] = [500, 503];
// Rate limits get a single retry after a long pause so a degraded upstream
// window is respected instead of hammered.
const RATE_LIMIT_MAX_ATTEMPTS: u32 = 2;
const TRANSIENT_MAX_ATTEMPTS: u32 = 3;
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(20);

/// Runs `op`, retrying by failure class:
/// 429 once after [`RATE_LIMIT_BACKOFF`]; 500/503 up to twice with 1 s then
/// 2 s backoff. Any other failure, or an exhausted budget, propagates the
/// original error unchanged.
pub async fn with_retry<T, F, Fut>(mut op: F) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let mut attempt = 0_u32;

	loop {
		let err = match op().await {
			Ok(value) => return Ok(value),
			Err(err) => err,
		};
		let Some(code) = err.status() else {
			return Err(err);
		};
		let max_attempts = if code == RATE_LIMIT_STATUS {
			RATE_LIMIT_MAX_ATTEMPTS
		} else if TRANSIENT_STATUSES.contains(&code) {
			TRANSIENT_MAX_ATTEMPTS
		} else {
			return Err(err);
		};

		if attempt + 1 >= max_attempts {
			return Err(err);
		}
		if code == RATE_LIMIT_STATUS {
			sleep(RATE_LIMIT_BACKOFF).await;
		} else {
			sleep(Duration::from_secs(1_u64 << attempt)).await;
		}

		attempt += 1;
	}
}
