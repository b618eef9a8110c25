//! CLI argument definitions for kfc.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `krx` | KRX stocks, indices, futures, bonds and exchange-traded funds |
//! | `dart` | OPENDART corporation codes, periodic report sections, financial statements, disclosures |
//! | `naver` | Naver adjusted daily prices |
//!
//! Dates are accepted as `yyyy-MM-dd` or `yyyyMMdd`. Every command prints one
//! JSON document to stdout; logs go to stderr and are filtered by `KFC_LOG`.
//!
//! # Examples
//!
//! ```bash
//! kfc krx stocks --market kospi
//! kfc krx future-ohlcv 2024-01-06 KRDRVFUK2I --fallback backward --pretty
//! kfc krx fund-ohlcv KR7069500007 2020-01-01 2024-06-30
//! kfc dart dividends 00126380 2023 --report annual
//! kfc dart financials 00126380 2023 --scope separate --kind balance
//! kfc naver adjusted-ohlcv 069500 2024-01-01 2024-01-31
//! ```

use clap::{Args, Parser, Subcommand};
use kfc_core::{
    BondType, DateFormat, FundType, IndexMarket, ListingStatus, ReportCode, SearchDirection,
    StatementKind, StatementScope, StockMarket,
};
use time::Date;

#[derive(Debug, Parser)]
#[command(
    name = "kfc",
    version,
    about = "Korean market data from KRX, OPENDART and Naver as JSON"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// OPENDART API key. Overrides the environment.
    #[arg(long, global = true, env = "KFC_OPENDART_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Disable client-side rate limiting for every provider.
    #[arg(long, global = true, default_value_t = false)]
    pub no_rate_limit: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// KRX market statistics.
    #[command(subcommand)]
    Krx(KrxCommand),

    /// OPENDART disclosure portal.
    #[command(subcommand)]
    Dart(DartCommand),

    /// Naver finance chart data.
    #[command(subcommand)]
    Naver(NaverCommand),
}

#[derive(Debug, Subcommand)]
pub enum KrxCommand {
    /// List equities of a market.
    Stocks {
        #[arg(long, default_value = "all")]
        market: StockMarket,
        #[arg(long, default_value = "listed")]
        status: ListingStatus,
    },

    /// Industry classification of every stock on a date.
    Sectors {
        #[arg(value_parser = parse_date)]
        date: Date,
        #[arg(long, default_value = "kospi")]
        market: StockMarket,
    },

    /// List indices of a market group.
    Indices {
        #[arg(long, default_value = "all")]
        market: IndexMarket,
    },

    /// Index prices of every index in a market group on one date.
    IndexOhlcv {
        #[arg(value_parser = parse_date)]
        date: Date,
        #[arg(long, default_value = "all")]
        market: IndexMarket,
    },

    /// Daily prices of one index over a range.
    IndexHistory(IndexHistoryArgs),

    /// List derivative products.
    Futures,

    /// Daily prices of every contract of a product.
    FutureOhlcv(FutureOhlcvArgs),

    /// Benchmark yields on one date.
    Bonds {
        #[arg(value_parser = parse_date)]
        date: Date,
    },

    /// Daily yields of one benchmark over a range.
    BondHistory {
        bond_type: BondType,
        #[command(flatten)]
        range: DateRange,
    },

    /// List exchange-traded products; all groups unless `--fund-type` is set.
    Funds {
        #[arg(long)]
        fund_type: Option<FundType>,
    },

    /// Trading by investor category across all ETFs on one date.
    FundInvestors {
        #[arg(value_parser = parse_date)]
        date: Date,
    },

    /// Daily net buying by investor category over a range.
    FundInvestorHistory {
        #[command(flatten)]
        range: DateRange,
        /// Restrict to one fund by ISIN.
        #[arg(long)]
        isin: Option<String>,
    },

    /// Daily prices and NAV of one fund. Long ranges are fetched in chunks.
    FundOhlcv {
        isin: String,
        #[command(flatten)]
        range: DateRange,
    },

    /// Daily short selling of one exchange-traded product.
    FundShortSelling(FundShortArgs),

    /// Reported short balances of one exchange-traded product.
    FundShortBalance(FundShortArgs),
}

#[derive(Debug, Args)]
pub struct FundShortArgs {
    pub isin: String,
    #[command(flatten)]
    pub range: DateRange,
    #[arg(long, default_value = "etf")]
    pub fund_type: FundType,
}

#[derive(Debug, Args)]
pub struct IndexHistoryArgs {
    /// Index ticker, e.g. `1001` for KOSPI.
    pub ticker: String,
    #[command(flatten)]
    pub range: DateRange,
}

#[derive(Debug, Args)]
pub struct FutureOhlcvArgs {
    #[arg(value_parser = parse_date)]
    pub date: Date,
    pub product_id: String,
    /// Search nearby dates when the requested date has no rows.
    #[arg(long)]
    pub fallback: Option<SearchDirection>,
}

#[derive(Debug, Subcommand)]
pub enum DartCommand {
    /// Download the full corporation code list.
    CorpCodes,

    /// Dividend details from a periodic report.
    Dividends(PeriodicReportArgs),

    /// Share issuance and retirement events from a periodic report.
    StockSplits(PeriodicReportArgs),

    /// Income statement, balance sheet and cash flow of a periodic report.
    Financials {
        #[command(flatten)]
        report: PeriodicReportArgs,
        #[arg(long, default_value = "consolidated")]
        scope: StatementScope,
        /// Only this statement.
        #[arg(long)]
        kind: Option<StatementKind>,
    },

    /// Search filed disclosures.
    Disclosures {
        #[command(flatten)]
        range: DateRange,
        #[arg(long)]
        corp_code: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        page_size: u32,
    },
}

#[derive(Debug, Args)]
pub struct PeriodicReportArgs {
    /// Eight-digit OPENDART corporation code.
    pub corp_code: String,
    pub year: i32,
    #[arg(long, default_value = "annual")]
    pub report: ReportCode,
}

#[derive(Debug, Subcommand)]
pub enum NaverCommand {
    /// Adjusted daily bars of one ticker.
    AdjustedOhlcv {
        ticker: String,
        #[command(flatten)]
        range: DateRange,
    },
}

#[derive(Debug, Clone, Copy, Args)]
pub struct DateRange {
    #[arg(value_parser = parse_date)]
    pub from: Date,
    #[arg(value_parser = parse_date)]
    pub to: Date,
}

fn parse_date(raw: &str) -> Result<Date, String> {
    let raw = raw.trim();
    let format = if raw.contains('-') {
        DateFormat::Dashed
    } else {
        DateFormat::Compact
    };
    format
        .parse(raw)
        .map_err(|_| format!("'{raw}' is not a date (expected yyyy-MM-dd or yyyyMMdd)"))
}
