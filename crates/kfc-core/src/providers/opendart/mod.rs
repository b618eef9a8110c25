//! OPENDART disclosure portal (`opendart.fss.or.kr`).
//!
//! Every call carries the API key as `crtfc_key`. JSON resources report
//! failures through `status`; `013` means "no data" and yields an empty list.
//! Financial statements live in `financials.rs`.

mod financials;

use std::sync::Arc;

use time::{Date, OffsetDateTime};
use tracing::debug;

use crate::bulk::parse_corp_code_archive;
use crate::coercion::{DateFormat, FieldPolicy, PolicyTable, RawRecord};
use crate::domain::{CorpCode, Disclosure, Dividend, ReportCode, StockSplit};
use crate::envelope::{check_opendart_status, decode_json, extract_records, OpenDartStatus};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::providers::dispatch;
use crate::rate_limit::RateLimiter;
use crate::{KfcError, ProviderId, ValidationError};

pub const OPENDART_BASE_URL: &str = "https://opendart.fss.or.kr/api";

const MIN_BUSINESS_YEAR: i32 = 1900;
const MAX_PAGE_COUNT: u32 = 100;

const DIVIDENDS: PolicyTable = PolicyTable::new(
    ProviderId::OpenDart,
    "alotMatter",
    &[
        ("rcept_no", FieldPolicy::text()),
        ("corp_code", FieldPolicy::text()),
        ("corp_name", FieldPolicy::text()),
        ("se", FieldPolicy::text()),
        ("stock_knd", FieldPolicy::text().or_zero()),
        ("thstrm", FieldPolicy::decimal()),
        ("frmtrm", FieldPolicy::decimal()),
        ("lwfr", FieldPolicy::decimal()),
        ("stlm_dt", FieldPolicy::date(DateFormat::Dashed)),
    ],
);

const STOCK_SPLITS: PolicyTable = PolicyTable::new(
    ProviderId::OpenDart,
    "irdsSttus",
    &[
        ("rcept_no", FieldPolicy::text()),
        ("corp_code", FieldPolicy::text()),
        ("corp_name", FieldPolicy::text()),
        ("isu_dcrs_de", FieldPolicy::date(DateFormat::Dashed)),
        ("isu_dcrs_stle", FieldPolicy::text()),
        ("isu_dcrs_stock_knd", FieldPolicy::text().or_zero()),
        ("isu_dcrs_qy", FieldPolicy::count()),
        ("isu_dcrs_mstvdv_fval_amount", FieldPolicy::count()),
        ("isu_dcrs_mstvdv_amount", FieldPolicy::count()),
    ],
);

const DISCLOSURES: PolicyTable = PolicyTable::new(
    ProviderId::OpenDart,
    "list",
    &[
        ("corp_code", FieldPolicy::text()),
        ("corp_name", FieldPolicy::text()),
        ("stock_code", FieldPolicy::text()),
        ("corp_cls", FieldPolicy::text()),
        ("report_nm", FieldPolicy::text()),
        ("rcept_no", FieldPolicy::text()),
        ("flr_nm", FieldPolicy::text()),
        ("rcept_dt", FieldPolicy::date(DateFormat::Compact)),
        ("rm", FieldPolicy::text()),
    ],
);

/// Page selection for [`OpenDartAdapter::disclosures`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            size: 10,
        }
    }
}

#[derive(Clone)]
pub struct OpenDartAdapter {
    http_client: Arc<dyn HttpClient>,
    rate_limiter: RateLimiter,
    api_key: Option<String>,
}

impl Default for OpenDartAdapter {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
            rate_limiter: RateLimiter::for_provider(ProviderId::OpenDart),
            api_key: None,
        }
    }
}

impl OpenDartAdapter {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        rate_limiter: RateLimiter,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http_client,
            rate_limiter,
            api_key,
        }
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Downloads and parses the full corporation code archive.
    pub async fn corp_codes(&self) -> Result<Vec<CorpCode>, KfcError> {
        let request = self.request("corpCode.xml", &[])?;
        let archive = dispatch(self.http_client.as_ref(), &self.rate_limiter, request).await?;

        // the archive holds every listed and unlisted filer
        tokio::task::spawn_blocking(move || parse_corp_code_archive(&archive))
            .await
            .map_err(|error| KfcError::bulk_with("archive parsing task failed", error))?
    }

    pub async fn dividends(
        &self,
        corp_code: &str,
        year: i32,
        report: ReportCode,
    ) -> Result<Vec<Dividend>, KfcError> {
        let params = periodic_report_params(corp_code, year, report)?;

        let rows = self.fetch_list("alotMatter.json", &params).await?;
        let dividends = rows
            .iter()
            .map(|row| {
                let reader = DIVIDENDS.reader(row);
                Ok(Dividend {
                    receipt_no: reader.required_text("rcept_no")?,
                    corp_code: reader.required_text("corp_code")?,
                    corp_name: reader.required_text("corp_name")?,
                    category: reader.required_text("se")?,
                    stock_kind: reader.text("stock_knd")?.unwrap_or_default(),
                    current_term: reader.decimal("thstrm")?,
                    previous_term: reader.decimal("frmtrm")?,
                    two_terms_ago: reader.decimal("lwfr")?,
                    settlement_date: reader.date("stlm_dt")?,
                })
            })
            .collect::<Result<Vec<_>, KfcError>>()?;

        debug!(corp_code, year, %report, count = dividends.len(), "fetched dividends");
        Ok(dividends)
    }

    /// Share issuance and retirement events. Rows without an event date or
    /// event type are skipped.
    pub async fn stock_splits(
        &self,
        corp_code: &str,
        year: i32,
        report: ReportCode,
    ) -> Result<Vec<StockSplit>, KfcError> {
        let params = periodic_report_params(corp_code, year, report)?;

        let rows = self.fetch_list("irdsSttus.json", &params).await?;
        let mut splits = Vec::with_capacity(rows.len());
        for row in &rows {
            let reader = STOCK_SPLITS.reader(row);
            let (Some(event_date), Some(event_type)) =
                (reader.date("isu_dcrs_de")?, reader.text("isu_dcrs_stle")?)
            else {
                continue;
            };
            splits.push(StockSplit {
                receipt_no: reader.required_text("rcept_no")?,
                corp_code: reader.required_text("corp_code")?,
                corp_name: reader.required_text("corp_name")?,
                event_date,
                event_type,
                stock_kind: reader.text("isu_dcrs_stock_knd")?.unwrap_or_default(),
                quantity: reader.required_int("isu_dcrs_qy")?,
                par_value_per_share: reader.required_int("isu_dcrs_mstvdv_fval_amount")?,
                total_amount: reader.required_int("isu_dcrs_mstvdv_amount")?,
            });
        }

        debug!(corp_code, year, %report, count = splits.len(), skipped = rows.len() - splits.len(), "fetched stock splits");
        Ok(splits)
    }

    /// One page of the disclosure search, optionally narrowed to one filer.
    pub async fn disclosures(
        &self,
        corp_code: Option<&str>,
        from: Date,
        to: Date,
        page: Page,
    ) -> Result<Vec<Disclosure>, KfcError> {
        if from > to {
            return Err(ValidationError::ReversedDateRange { from, to }.into());
        }
        if page.number == 0 {
            return Err(invalid("page_no", page.number).into());
        }
        if page.size == 0 || page.size > MAX_PAGE_COUNT {
            return Err(invalid("page_count", page.size).into());
        }

        let mut params = vec![
            ("bgn_de", DateFormat::Compact.format(from)),
            ("end_de", DateFormat::Compact.format(to)),
            ("page_no", page.number.to_string()),
            ("page_count", page.size.to_string()),
        ];
        if let Some(corp_code) = corp_code {
            params.push(("corp_code", validate_corp_code(corp_code)?));
        }

        let rows = self.fetch_list("list.json", &params).await?;
        let disclosures = rows
            .iter()
            .map(|row| {
                let reader = DISCLOSURES.reader(row);
                Ok(Disclosure {
                    corp_code: reader.required_text("corp_code")?,
                    corp_name: reader.required_text("corp_name")?,
                    stock_code: reader.text("stock_code")?,
                    corp_class: reader.text("corp_cls")?.unwrap_or_default(),
                    report_name: reader.required_text("report_nm")?,
                    receipt_no: reader.required_text("rcept_no")?,
                    filer_name: reader.text("flr_nm")?.unwrap_or_default(),
                    receipt_date: reader.required_date("rcept_dt")?,
                    remark: reader.text("rm")?,
                })
            })
            .collect::<Result<Vec<_>, KfcError>>()?;

        debug!(?corp_code, %from, %to, page = page.number, count = disclosures.len(), "fetched disclosures");
        Ok(disclosures)
    }

    fn request(&self, resource: &str, params: &[(&str, String)]) -> Result<HttpRequest, KfcError> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ValidationError::EmptyValue {
                field: "OPENDART API key",
            })?;

        let mut query = Vec::with_capacity(params.len() + 1);
        query.push(("crtfc_key", api_key.to_owned()));
        query.extend(params.iter().map(|(name, value)| (*name, value.clone())));

        Ok(HttpRequest::get(format!("{OPENDART_BASE_URL}/{resource}")).with_query(&query))
    }

    async fn fetch_list(
        &self,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<RawRecord>, KfcError> {
        let request = self.request(resource, params)?;
        let body = dispatch(self.http_client.as_ref(), &self.rate_limiter, request).await?;
        let json = decode_json(ProviderId::OpenDart, &body)?;

        match check_opendart_status(&json)? {
            OpenDartStatus::NoData => {
                debug!(resource, "no data for query");
                Ok(Vec::new())
            }
            OpenDartStatus::Success => extract_records(ProviderId::OpenDart, &json, &["list"]),
        }
    }
}

fn periodic_report_params(
    corp_code: &str,
    year: i32,
    report: ReportCode,
) -> Result<[(&'static str, String); 3], ValidationError> {
    report_params(corp_code, year, MIN_BUSINESS_YEAR, report)
}

fn report_params(
    corp_code: &str,
    year: i32,
    min_year: i32,
    report: ReportCode,
) -> Result<[(&'static str, String); 3], ValidationError> {
    let corp_code = validate_corp_code(corp_code)?;
    let current_year = OffsetDateTime::now_utc().year();
    if !(min_year..=current_year).contains(&year) {
        return Err(invalid("bsns_year", year));
    }
    Ok([
        ("corp_code", corp_code),
        ("bsns_year", year.to_string()),
        ("reprt_code", report.code().to_owned()),
    ])
}

/// Corporation codes are exactly eight ASCII digits.
fn validate_corp_code(corp_code: &str) -> Result<String, ValidationError> {
    let trimmed = corp_code.trim();
    if trimmed.len() != 8 || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid("corp_code", trimmed));
    }
    Ok(trimmed.to_owned())
}

fn invalid(field: &'static str, value: impl ToString) -> ValidationError {
    ValidationError::InvalidValue {
        field,
        value: value.to_string(),
    }
}
