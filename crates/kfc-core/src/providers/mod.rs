//! Provider adapters.
//!
//! Every adapter holds an `Arc<dyn HttpClient>` and the [`RateLimiter`] of its
//! provider family. All outbound calls go through [`dispatch`], which acquires
//! a token, sends the request and rejects non-2xx statuses before any body
//! parsing happens.

pub mod krx;
pub mod naver;
pub mod opendart;

pub use krx::KrxAdapter;
pub use naver::NaverAdapter;
pub use opendart::OpenDartAdapter;

use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest};
use crate::rate_limit::RateLimiter;
use crate::KfcError;

/// Rate-limited send. Returns the raw body of a 2xx response.
pub(crate) async fn dispatch(
    http_client: &dyn HttpClient,
    rate_limiter: &RateLimiter,
    request: HttpRequest,
) -> Result<Vec<u8>, KfcError> {
    let provider = rate_limiter.provider_id();
    rate_limiter.acquire().await;

    // the query string may carry the API key
    let endpoint = request
        .url
        .split_once('?')
        .map_or(request.url.as_str(), |(path, _)| path)
        .to_owned();
    debug!(provider = %provider, method = ?request.method, endpoint = %endpoint, "dispatching request");

    let response = http_client
        .execute(request)
        .await
        .map_err(|source| KfcError::NetworkFailure { provider, source })?;

    if !response.is_success() {
        debug!(provider = %provider, endpoint = %endpoint, status = response.status, "non-success status");
        return Err(KfcError::HttpErrorResponse {
            provider,
            status: response.status,
        });
    }

    Ok(response.body)
}
