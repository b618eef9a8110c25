use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::coercion::PriceDirection;
use crate::domain::{
    BondType, FundType, IndexMarket, ListingStatus, ReportCode, StatementKind, StatementScope,
    StockMarket,
};

/// Listed or delisted equity from the KRX finder endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockListing {
    pub ticker: String,
    pub name: String,
    pub isin: String,
    pub market: StockMarket,
    pub status: ListingStatus,
}

/// One equity's industry classification on a trading day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorClassification {
    pub ticker: String,
    pub name: String,
    pub market: StockMarket,
    pub industry: String,
    pub close_price: Option<i64>,
    pub market_cap: Option<i64>,
    pub direction: Option<PriceDirection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Index type code followed by the index code, e.g. `1001`.
    pub ticker: String,
    pub name: String,
    pub market: IndexMarket,
    pub base_date: Option<Date>,
    pub announcement_date: Option<Date>,
    pub base_index: Option<Decimal>,
    pub constituent_count: Option<i64>,
}

/// Every index of one family on a single trading day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub name: String,
    pub market: IndexMarket,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: i64,
    pub trading_value: Option<i64>,
}

/// Daily bar of one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOhlcv {
    pub date: Date,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: i64,
    pub trading_value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FutureProduct {
    pub product_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FutureOhlcv {
    pub date: Date,
    pub product_id: String,
    pub ticker: String,
    pub name: String,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub change: Option<Decimal>,
    pub direction: Option<PriceDirection>,
    pub volume: i64,
    pub trading_value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondYield {
    pub date: Date,
    pub bond_type: BondType,
    /// Percent, e.g. `3.245`.
    pub yield_rate: Decimal,
    pub change: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundListing {
    pub isin: String,
    pub ticker: String,
    pub name: String,
    pub full_name: String,
    pub english_name: Option<String>,
    pub fund_type: FundType,
    pub listing_date: Option<Date>,
    pub benchmark_index: Option<String>,
    pub index_provider: Option<String>,
    pub leverage_type: Option<String>,
    pub replication_method: Option<String>,
    pub market_type: Option<String>,
    pub asset_class: Option<String>,
    pub listed_shares: i64,
    pub asset_manager: Option<String>,
    pub creation_unit: i64,
    pub total_expense_ratio: Option<Decimal>,
    pub tax_type: Option<String>,
}

/// Buy/sell totals of one investor category on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorTrading {
    pub date: Date,
    pub investor: String,
    pub ask_volume: i64,
    pub ask_value: i64,
    pub bid_volume: i64,
    pub bid_value: i64,
    pub net_buy_volume: i64,
    pub net_buy_value: i64,
}

/// Net buy value of one investor category on one day of a period query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorNetBuy {
    pub date: Date,
    pub investor: String,
    pub net_buy_value: i64,
}

/// Daily bar of one exchange-traded product, with NAV and the tracked index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundOhlcv {
    pub date: Date,
    pub open: Option<i64>,
    pub high: Option<i64>,
    pub low: Option<i64>,
    pub close: Option<i64>,
    pub volume: i64,
    pub trading_value: i64,
    pub nav: Option<Decimal>,
    pub change: Option<i64>,
    pub change_rate: Option<Decimal>,
    pub direction: Option<PriceDirection>,
    pub market_cap: i64,
    pub net_asset: i64,
    pub listed_shares: i64,
    pub index_name: Option<String>,
    pub index_value: Option<Decimal>,
    pub index_change: Option<Decimal>,
    pub index_change_rate: Option<Decimal>,
    pub index_direction: Option<PriceDirection>,
}

/// Short selling volume of one product on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortSelling {
    pub date: Date,
    pub ticker: String,
    pub short_volume: i64,
    pub short_value: i64,
    pub total_volume: i64,
    pub total_value: i64,
    /// Percent of total volume.
    pub volume_ratio: Option<Decimal>,
    /// Percent of total value.
    pub value_ratio: Option<Decimal>,
}

/// Reported net short position of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortBalance {
    /// Date the reporting obligation arose.
    pub date: Date,
    pub ticker: String,
    pub balance_shares: i64,
    pub balance_value: i64,
    pub listed_shares: i64,
    pub balance_ratio: Option<Decimal>,
}

/// One entry of the OPENDART corporation code registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpCode {
    pub corp_code: String,
    pub corp_name: String,
    pub corp_eng_name: String,
    /// `None` for unlisted companies.
    pub stock_code: Option<String>,
    pub modify_date: Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dividend {
    pub receipt_no: String,
    pub corp_code: String,
    pub corp_name: String,
    /// Row label, e.g. `주당 현금배당금(원)`.
    pub category: String,
    pub stock_kind: String,
    pub current_term: Option<Decimal>,
    pub previous_term: Option<Decimal>,
    pub two_terms_ago: Option<Decimal>,
    pub settlement_date: Option<Date>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSplit {
    pub receipt_no: String,
    pub corp_code: String,
    pub corp_name: String,
    pub event_date: Date,
    pub event_type: String,
    pub stock_kind: String,
    pub quantity: i64,
    pub par_value_per_share: i64,
    pub total_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disclosure {
    pub corp_code: String,
    pub corp_name: String,
    pub stock_code: Option<String>,
    pub corp_class: String,
    pub report_name: String,
    pub receipt_no: String,
    pub filer_name: String,
    pub receipt_date: Date,
    pub remark: Option<String>,
}

/// Adjusted daily bar from the Naver chart endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedOhlcv {
    pub date: Date,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

/// Fiscal period label as printed in the filing, e.g. `제 55 기`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialPeriod {
    pub name: String,
    pub fiscal_year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialLineItem {
    pub account_id: String,
    pub account_name: String,
    pub account_detail: Option<String>,
    pub current_amount: Decimal,
    pub previous_amount: Option<Decimal>,
    pub two_periods_ago_amount: Option<Decimal>,
    pub order: i64,
}

/// One statement (income, balance sheet or cash flow) of a periodic report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub kind: StatementKind,
    pub corp_code: String,
    pub fiscal_year: i32,
    pub report: ReportCode,
    pub scope: StatementScope,
    pub current_period: FinancialPeriod,
    pub previous_period: Option<FinancialPeriod>,
    pub line_items: Vec<FinancialLineItem>,
}

impl FinancialStatement {
    /// Current-period amount of the first line item whose account name
    /// contains `keyword`, e.g. `자산총계`.
    pub fn current_amount_of(&self, keyword: &str) -> Option<Decimal> {
        self.line_items
            .iter()
            .find(|item| item.account_name.contains(keyword))
            .map(|item| item.current_amount)
    }
}

/// Every statement found in one periodic report. A statement the filing
/// does not carry is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialStatements {
    pub corp_code: String,
    pub fiscal_year: i32,
    pub report: ReportCode,
    pub scope: StatementScope,
    pub income_statement: Option<FinancialStatement>,
    pub balance_sheet: Option<FinancialStatement>,
    pub cash_flow: Option<FinancialStatement>,
}
