//! # KFC Core
//!
//! Retrieval and normalization layer for Korean market data: KRX market
//! statistics, OPENDART corporate disclosures and Naver adjusted prices.
//!
//! ## Overview
//!
//! - **Per-provider rate limiting** with one token bucket per provider family
//! - **Field coercion** of string-typed provider values through per-endpoint policy tables
//! - **Envelope validation** of embedded status codes and record-key probing
//! - **Bulk ingestion** of the OPENDART corporation code ZIP/XML archive
//! - **Partition fan-out** for "all markets" queries and long date ranges
//! - **Alternative-date resolution** for days that return no rows
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bulk`] | Corporation code archive parsing |
//! | [`category`] | Results that report dropped, unmapped labels |
//! | [`client`] | [`KfcClient`] facade |
//! | [`coercion`] | Sentinel handling and typed field readers |
//! | [`config`] | Rate-limit and API-key configuration |
//! | [`domain`] | Typed records and request code enums |
//! | [`envelope`] | Status checks and record extraction |
//! | [`error`] | [`KfcError`] and [`ValidationError`] |
//! | [`fallback`] | Alternative-date search |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`partition`] | Ordered partition fan-out and date-range splitting |
//! | [`providers`] | KRX, OPENDART and Naver adapters |
//! | [`rate_limit`] | Token bucket limiter |
//! | [`source`] | Provider identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kfc_core::{KfcClient, StockMarket, ListingStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = KfcClient::from_env()?;
//!     let stocks = client
//!         .krx()
//!         .stock_list(StockMarket::Kospi, ListingStatus::Listed)
//!         .await?;
//!     println!("{} KOSPI listings", stocks.len());
//!     Ok(())
//! }
//! ```

pub mod bulk;
pub mod category;
pub mod client;
pub mod coercion;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod fallback;
pub mod http_client;
pub mod partition;
pub mod providers;
pub mod rate_limit;
pub mod source;

pub use category::Categorized;
pub use client::KfcClient;
pub use coercion::{DateFormat, FieldPolicy, PolicyTable, PriceDirection};
pub use config::{ClientConfig, RateLimitConfig, RateLimitingSettings};
pub use domain::{
    AdjustedOhlcv, BondType, BondYield, CorpCode, Disclosure, Dividend, FinancialLineItem,
    FinancialPeriod, FinancialStatement, FinancialStatements, FundListing, FundOhlcv, FundType,
    FutureOhlcv, FutureProduct, IndexInfo, IndexMarket, IndexOhlcv, IndexSnapshot,
    InvestorNetBuy, InvestorTrading, ListingStatus, ReportCode, SectorClassification,
    ShortBalance, ShortSelling, StatementKind, StatementScope, StockListing, StockMarket,
    StockSplit,
};
pub use error::{ErrorKind, KfcError, ValidationError};
pub use fallback::{DateFallbackQuery, Resolved, SearchDirection};
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient, ScriptedHttpClient,
};
pub use partition::{PartitionSet, RangeSplitter};
pub use providers::opendart::Page;
pub use providers::{KrxAdapter, NaverAdapter, OpenDartAdapter};
pub use rate_limit::RateLimiter;
pub use source::ProviderId;
