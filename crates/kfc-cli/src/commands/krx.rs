use kfc_core::KrxAdapter;

use crate::cli::KrxCommand;
use crate::error::CliError;
use crate::output::CommandOutput;

const PROVIDER: &str = "krx";

pub async fn run(command: &KrxCommand, krx: &KrxAdapter) -> Result<CommandOutput, CliError> {
    let output = match command {
        KrxCommand::Stocks { market, status } => {
            let listings = krx.stock_list(*market, *status).await?;
            CommandOutput::records(PROVIDER, "stock_list", &listings.records)?
                .with_unmapped(listings.unmapped)
        }
        KrxCommand::Sectors { date, market } => {
            let sectors = krx.sector_classifications(*date, *market).await?;
            CommandOutput::records(PROVIDER, "sector_classifications", &sectors)?
        }
        KrxCommand::Indices { market } => {
            let indices = krx.index_list(*market).await?;
            CommandOutput::records(PROVIDER, "index_list", &indices)?
        }
        KrxCommand::IndexOhlcv { date, market } => {
            let snapshots = krx.index_ohlcv_by_date(*date, *market).await?;
            CommandOutput::records(PROVIDER, "index_ohlcv_by_date", &snapshots)?
        }
        KrxCommand::IndexHistory(args) => {
            let bars = krx
                .index_ohlcv_by_ticker(&args.ticker, args.range.from, args.range.to)
                .await?;
            CommandOutput::records(PROVIDER, "index_ohlcv_by_ticker", &bars)?
        }
        KrxCommand::Futures => {
            let products = krx.future_products().await?;
            CommandOutput::records(PROVIDER, "future_products", &products)?
        }
        KrxCommand::FutureOhlcv(args) => {
            let resolved = krx
                .future_ohlcv(args.date, &args.product_id, args.fallback)
                .await?;
            let output = CommandOutput::records(PROVIDER, "future_ohlcv", &resolved.records)?;
            if resolved.is_substituted() {
                output.with_resolved_date(resolved.date)
            } else {
                output
            }
        }
        KrxCommand::Bonds { date } => {
            let yields = krx.bond_yields_by_date(*date).await?;
            CommandOutput::records(PROVIDER, "bond_yields_by_date", &yields.records)?
                .with_unmapped(yields.unmapped)
        }
        KrxCommand::BondHistory { bond_type, range } => {
            let yields = krx
                .bond_yields_by_period(*bond_type, range.from, range.to)
                .await?;
            CommandOutput::records(PROVIDER, "bond_yields_by_period", &yields)?
        }
        KrxCommand::Funds { fund_type } => {
            let funds = krx.fund_list(*fund_type).await?;
            CommandOutput::records(PROVIDER, "fund_list", &funds)?
        }
        KrxCommand::FundInvestors { date } => {
            let trading = krx.fund_investor_trading(*date).await?;
            CommandOutput::records(PROVIDER, "fund_investor_trading", &trading)?
        }
        KrxCommand::FundInvestorHistory { range, isin } => {
            let flows = krx
                .fund_investor_trading_by_period(range.from, range.to, isin.as_deref())
                .await?;
            CommandOutput::records(PROVIDER, "fund_investor_trading_by_period", &flows)?
        }
        KrxCommand::FundOhlcv { isin, range } => {
            let bars = krx.fund_ohlcv(isin, range.from, range.to).await?;
            CommandOutput::records(PROVIDER, "fund_ohlcv", &bars)?
        }
        KrxCommand::FundShortSelling(args) => {
            let records = krx
                .fund_short_selling(&args.isin, args.fund_type, args.range.from, args.range.to)
                .await?;
            CommandOutput::records(PROVIDER, "fund_short_selling", &records)?
        }
        KrxCommand::FundShortBalance(args) => {
            let balances = krx
                .fund_short_balance(&args.isin, args.fund_type, args.range.from, args.range.to)
                .await?;
            CommandOutput::records(PROVIDER, "fund_short_balance", &balances)?
        }
    };

    Ok(output)
}
