//! # Domain Models
//!
//! Typed records produced by the provider adapters, plus the code enums used
//! to build requests.
//!
//! | Type | Source |
//! |------|--------|
//! | [`StockListing`], [`SectorClassification`] | KRX stock finder / MDCSTAT03901 |
//! | [`IndexInfo`], [`IndexSnapshot`], [`IndexOhlcv`] | KRX MDCSTAT00401 / 00101 / 00301 |
//! | [`FutureProduct`], [`FutureOhlcv`] | KRX derivatives |
//! | [`BondYield`] | KRX MDCSTAT04301 / 04302 |
//! | [`FundListing`], [`FundOhlcv`], [`InvestorTrading`], [`InvestorNetBuy`] | KRX ETP statistics |
//! | [`ShortSelling`], [`ShortBalance`] | KRX short selling statistics |
//! | [`CorpCode`], [`Dividend`], [`StockSplit`], [`Disclosure`] | OPENDART |
//! | [`FinancialStatements`], [`FinancialStatement`] | OPENDART `fnlttSinglAcntAll` |
//! | [`AdjustedOhlcv`] | Naver chart |
//!
//! Prices and rates are [`rust_decimal::Decimal`] and serialize as strings.
//! Dates serialize as `yyyy-MM-dd`.

mod market;
mod models;

pub use market::{
    BondType, FundType, IndexMarket, ListingStatus, ReportCode, StatementKind, StatementScope,
    StockMarket,
};
pub use models::{
    AdjustedOhlcv, BondYield, CorpCode, Disclosure, Dividend, FinancialLineItem, FinancialPeriod,
    FinancialStatement, FinancialStatements, FundListing, FundOhlcv, FutureOhlcv, FutureProduct,
    IndexInfo, IndexOhlcv, IndexSnapshot, InvestorNetBuy, InvestorTrading, SectorClassification,
    ShortBalance, ShortSelling, StockListing, StockSplit,
};
