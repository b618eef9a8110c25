//! Naver finance chart endpoint (`fchart.stock.naver.com`).
//!
//! The endpoint returns the most recent `count` trading days as XML; there is
//! no date range parameter, so the adapter over-fetches and filters locally.

use std::str::FromStr;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};
use tracing::{debug, warn};

use crate::coercion::DateFormat;
use crate::domain::AdjustedOhlcv;
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::providers::dispatch;
use crate::rate_limit::RateLimiter;
use crate::{KfcError, ProviderId, ValidationError};

pub const NAVER_CHART_URL: &str = "https://fchart.stock.naver.com/sise.nhn";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const REFERER: &str = "https://finance.naver.com/";
const MAX_CHART_ROWS: i64 = 500;
const ITEM_ELEMENT: &[u8] = b"item";

#[derive(Clone)]
pub struct NaverAdapter {
    http_client: Arc<dyn HttpClient>,
    rate_limiter: RateLimiter,
}

impl Default for NaverAdapter {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
            rate_limiter: RateLimiter::for_provider(ProviderId::Naver),
        }
    }
}

impl NaverAdapter {
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

    /// Dividend- and split-adjusted daily bars in `[from, to]`, oldest first.
    ///
    /// A reversed range is not an error: it logs a warning and returns an
    /// empty list without contacting Naver.
    pub async fn adjusted_ohlcv(
        &self,
        ticker: &str,
        from: Date,
        to: Date,
    ) -> Result<Vec<AdjustedOhlcv>, KfcError> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(ValidationError::EmptyValue { field: "ticker" }.into());
        }
        if from > to {
            warn!(ticker, %from, %to, "reversed date range, returning no bars");
            return Ok(Vec::new());
        }

        let count = chart_row_count(from, to, OffsetDateTime::now_utc().date());
        let request = HttpRequest::get(NAVER_CHART_URL)
            .with_query(&[
                ("symbol", ticker.to_owned()),
                ("timeframe", String::from("day")),
                ("count", count.to_string()),
                ("requestType", String::from("0")),
            ])
            .with_header("user-agent", USER_AGENT)
            .with_header("referer", REFERER);

        let body = dispatch(self.http_client.as_ref(), &self.rate_limiter, request).await?;

        let mut bars = parse_chart_document(&body)?
            .into_iter()
            .filter(|bar| (from..=to).contains(&bar.date))
            .collect::<Vec<_>>();
        bars.sort_by_key(|bar| bar.date);

        debug!(ticker, %from, %to, count, bars = bars.len(), "fetched adjusted ohlcv");
        Ok(bars)
    }
}

/// Number of trailing rows to request so that `from` is covered.
///
/// Calendar days back to `from` plus the range length, padded by half for
/// weekends and holidays, capped at 500.
pub fn chart_row_count(from: Date, to: Date, today: Date) -> u32 {
    let days_from_today = (today - from).whole_days();
    let days_in_range = (to - from).whole_days() + 1;
    let padded = (days_from_today + days_in_range) * 3 / 2;
    u32::try_from(padded.clamp(1, MAX_CHART_ROWS)).unwrap_or(1)
}

/// Parses every `<item data="yyyyMMdd|open|high|low|close|volume"/>` element.
///
/// The document is declared EUC-KR and carries the security name in that
/// encoding. Only `item` data attributes are decoded, and those are ASCII.
pub fn parse_chart_document(document: &[u8]) -> Result<Vec<AdjustedOhlcv>, KfcError> {
    let mut reader = Reader::from_reader(document.trim_ascii_start());
    let mut buf = Vec::new();
    let mut bars = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(chart_error)?;
        match event {
            Event::Start(element) | Event::Empty(element)
                if element.name().as_ref() == ITEM_ELEMENT =>
            {
                match item_data(&element)? {
                    Some(data) => bars.push(parse_item(&data)?),
                    None => warn!("skipping chart item without data"),
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(bars)
}

fn item_data(element: &BytesStart<'_>) -> Result<Option<String>, KfcError> {
    let Some(attribute) = element.try_get_attribute("data").map_err(chart_error)? else {
        return Ok(None);
    };
    let value = attribute.unescape_value().map_err(chart_error)?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_owned()))
}

fn parse_item(data: &str) -> Result<AdjustedOhlcv, KfcError> {
    let fields = data.split('|').map(str::trim).collect::<Vec<_>>();
    let [date, open, high, low, close, volume, ..] = *fields.as_slice() else {
        return Err(KfcError::decode(
            ProviderId::Naver,
            format!("chart item '{data}' has {} fields, expected 6", fields.len()),
        ));
    };

    let price = |raw: &str| {
        Decimal::from_str(raw).map_err(|error| {
            KfcError::decode_with(ProviderId::Naver, format!("invalid price '{raw}'"), error)
        })
    };

    Ok(AdjustedOhlcv {
        date: DateFormat::Compact.parse(date).map_err(|error| {
            KfcError::decode_with(ProviderId::Naver, format!("invalid date '{date}'"), error)
        })?,
        open: price(open)?,
        high: price(high)?,
        low: price(low)?,
        close: price(close)?,
        volume: volume.parse::<i64>().map_err(|error| {
            KfcError::decode_with(ProviderId::Naver, format!("invalid volume '{volume}'"), error)
        })?,
    })
}

fn chart_error<E>(error: E) -> KfcError
where
    E: std::error::Error + Send + Sync + 'static,
{
    KfcError::decode_with(ProviderId::Naver, "chart XML could not be parsed", error)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::config::RateLimitConfig;
    use crate::http_client::{HttpResponse, ScriptedHttpClient};
    use crate::ErrorKind;

    const CHART: &str = r#"
        <?xml version="1.0" encoding="EUC-KR" ?>
        <protocol>
          <chartdata symbol="069500" name="KODEX 200" count="5" timeframe="day" precision="0" origintime="20021014">
            <item data="20240105|35380|35500|35155|35295|5123456" />
            <item data="20231228|35800|36000|35650|35930|6012345" />
            <item data="20240102|36005|36270|35855|36200|4512345" />
            <item data="" />
            <item data="20240103|35930|36000|35415|35490|7012345" />
          </chartdata>
        </protocol>"#;

    fn adapter(client: ScriptedHttpClient) -> (NaverAdapter, Arc<ScriptedHttpClient>) {
        let client = Arc::new(client);
        let adapter = NaverAdapter::new(
            client.clone(),
            RateLimiter::new(ProviderId::Naver, RateLimitConfig::disabled()),
        );
        (adapter, client)
    }

    #[test]
    fn row_count_pads_and_caps() {
        let today = date!(2024 - 01 - 31);

        assert_eq!(chart_row_count(date!(2024 - 01 - 01), date!(2024 - 01 - 10), today), 60);
        assert_eq!(chart_row_count(date!(2020 - 01 - 01), date!(2020 - 12 - 31), today), 500);
        assert_eq!(chart_row_count(today, today, today), 1);
    }

    #[test]
    fn chart_items_parse_and_blank_items_are_skipped() {
        let bars = parse_chart_document(CHART.as_bytes()).expect("chart");

        assert_eq!(bars.len(), 4);
        assert_eq!(bars[0].date, date!(2024 - 01 - 05));
        assert_eq!(bars[0].close, Decimal::from(35295));
        assert_eq!(bars[0].volume, 5_123_456);
    }

    #[test]
    fn short_item_is_a_decode_failure() {
        let error = parse_chart_document(br#"<chartdata><item data="20240102|1|2|3"/></chartdata>"#)
            .expect_err("four fields");

        assert_eq!(error.kind(), ErrorKind::DecodeFailure);
    }

    #[tokio::test]
    async fn bars_are_filtered_to_range_and_sorted() {
        let (naver, client) = adapter(ScriptedHttpClient::new().respond_json(CHART));

        let bars = naver
            .adjusted_ohlcv("069500", date!(2024 - 01 - 02), date!(2024 - 01 - 04))
            .await
            .expect("bars");

        let request = &client.requests()[0];
        assert_eq!(request.param("symbol").as_deref(), Some("069500"));
        assert_eq!(request.param("timeframe").as_deref(), Some("day"));
        assert_eq!(request.headers.get("referer").map(String::as_str), Some(REFERER));
        let dates = bars.iter().map(|bar| bar.date).collect::<Vec<_>>();
        assert_eq!(dates, vec![date!(2024 - 01 - 02), date!(2024 - 01 - 03)]);
    }

    #[tokio::test]
    async fn euc_kr_security_name_does_not_break_parsing() {
        // "삼성전자" in EUC-KR
        let name: &[u8] = &[0xBB, 0xEF, 0xBC, 0xBA, 0xC0, 0xFC, 0xC0, 0xDA];
        let mut body = br#"<?xml version="1.0" encoding="EUC-KR" ?><protocol><chartdata symbol="005930" name=""#.to_vec();
        body.extend_from_slice(name);
        body.extend_from_slice(
            br#"" count="1" timeframe="day"><item data="20240102|78200|79800|78200|79600|17142847" /></chartdata></protocol>"#,
        );
        let (naver, _) = adapter(ScriptedHttpClient::new().respond(Ok(HttpResponse::ok_bytes(body))));

        let bars = naver
            .adjusted_ohlcv("005930", date!(2024 - 01 - 02), date!(2024 - 01 - 02))
            .await
            .expect("non UTF-8 name is ignored");

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, Decimal::from(79600));
        assert_eq!(bars[0].volume, 17_142_847);
    }

    #[tokio::test]
    async fn reversed_range_sends_nothing() {
        let (naver, client) = adapter(ScriptedHttpClient::new());

        let bars = naver
            .adjusted_ohlcv("069500", date!(2024 - 01 - 10), date!(2024 - 01 - 01))
            .await
            .expect("empty");

        assert!(bars.is_empty());
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn http_errors_propagate() {
        let (naver, _) = adapter(
            ScriptedHttpClient::new().respond(Ok(HttpResponse::with_status(404, "not found"))),
        );

        let error = naver
            .adjusted_ohlcv("069500", date!(2024 - 01 - 02), date!(2024 - 01 - 04))
            .await
            .expect_err("404");

        assert_eq!(error.kind(), ErrorKind::HttpErrorResponse);
        assert_eq!(error.provider(), Some(ProviderId::Naver));
    }
}
