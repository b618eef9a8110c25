//! KRX market data (`data.krx.co.kr`).
//!
//! KRX exposes one POST endpoint; the `bld` form field selects the report.
//! Operations are split by asset class:
//!
//! | File | Operations |
//! |------|------------|
//! | `stock.rs` | `stock_list`, `sector_classifications` |
//! | `index.rs` | `index_list`, `index_ohlcv_by_date`, `index_ohlcv_by_ticker` |
//! | `future.rs` | `future_products`, `future_ohlcv` |
//! | `bond.rs` | `bond_yields_by_date`, `bond_yields_by_period` |
//! | `fund.rs` | `fund_list`, `fund_ohlcv`, `fund_investor_trading`, `fund_investor_trading_by_period` |
//! | `short_selling.rs` | `fund_short_selling`, `fund_short_balance` |

mod bond;
mod fund;
mod future;
mod index;
mod short_selling;
mod stock;

use std::sync::Arc;

use time::Date;

use crate::coercion::{DateFormat, RawRecord};
use crate::envelope::{check_krx_result, decode_json, extract_records};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::providers::dispatch;
use crate::rate_limit::RateLimiter;
use crate::{KfcError, ProviderId, ValidationError};

pub const KRX_DATA_URL: &str = "http://data.krx.co.kr/comm/bldAttendant/getJsonData.cmd";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const REFERER: &str = "http://data.krx.co.kr/";
const ORIGIN: &str = "http://data.krx.co.kr";

/// Adapter for every KRX report.
#[derive(Clone)]
pub struct KrxAdapter {
    http_client: Arc<dyn HttpClient>,
    rate_limiter: RateLimiter,
}

impl Default for KrxAdapter {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
            rate_limiter: RateLimiter::for_provider(ProviderId::Krx),
        }
    }
}

impl KrxAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, rate_limiter: RateLimiter) -> Self {
        Self {
            http_client,
            rate_limiter,
        }
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            ..Self::default()
        }
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Posts one report request and returns the rows under `record_key`.
    async fn fetch_records(
        &self,
        bld: &str,
        params: &[(&str, String)],
        record_key: &str,
    ) -> Result<Vec<RawRecord>, KfcError> {
        let mut form = Vec::with_capacity(params.len() + 1);
        form.push(("bld", bld.to_owned()));
        form.extend(params.iter().map(|(name, value)| (*name, value.clone())));

        let request = HttpRequest::post(KRX_DATA_URL)
            .with_header("user-agent", USER_AGENT)
            .with_header("accept", "application/json, text/plain, */*")
            .with_header("referer", REFERER)
            .with_header("origin", ORIGIN)
            .with_form(&form);

        let body = dispatch(self.http_client.as_ref(), &self.rate_limiter, request).await?;
        let json = decode_json(ProviderId::Krx, &body)?;
        check_krx_result(&json)?;
        extract_records(ProviderId::Krx, &json, &[record_key])
    }
}

fn krx_date(date: Date) -> String {
    DateFormat::Compact.format(date)
}

fn ensure_ordered(from: Date, to: Date) -> Result<(), ValidationError> {
    if from > to {
        return Err(ValidationError::ReversedDateRange { from, to });
    }
    Ok(())
}

fn required_param(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyValue { field });
    }
    Ok(trimmed.to_owned())
}
