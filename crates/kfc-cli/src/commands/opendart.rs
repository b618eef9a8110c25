use kfc_core::{OpenDartAdapter, Page};

use crate::cli::DartCommand;
use crate::error::CliError;
use crate::output::CommandOutput;

const PROVIDER: &str = "opendart";

pub async fn run(command: &DartCommand, dart: &OpenDartAdapter) -> Result<CommandOutput, CliError> {
    let output = match command {
        DartCommand::CorpCodes => {
            let corp_codes = dart.corp_codes().await?;
            CommandOutput::records(PROVIDER, "corp_codes", &corp_codes)?
        }
        DartCommand::Dividends(args) => {
            let dividends = dart.dividends(&args.corp_code, args.year, args.report).await?;
            CommandOutput::records(PROVIDER, "dividends", &dividends)?
        }
        DartCommand::StockSplits(args) => {
            let splits = dart
                .stock_splits(&args.corp_code, args.year, args.report)
                .await?;
            CommandOutput::records(PROVIDER, "stock_splits", &splits)?
        }
        DartCommand::Financials {
            report: args,
            scope,
            kind,
        } => {
            let statements = match kind {
                Some(kind) => dart
                    .financial_statement(&args.corp_code, args.year, args.report, *scope, *kind)
                    .await?
                    .into_iter()
                    .collect::<Vec<_>>(),
                None => {
                    let all = dart
                        .financial_statements(&args.corp_code, args.year, args.report, *scope)
                        .await?;
                    [all.income_statement, all.balance_sheet, all.cash_flow]
                        .into_iter()
                        .flatten()
                        .collect()
                }
            };
            CommandOutput::records(PROVIDER, "financial_statements", &statements)?
        }
        DartCommand::Disclosures {
            range,
            corp_code,
            page,
            page_size,
        } => {
            let page = Page {
                number: *page,
                size: *page_size,
            };
            let disclosures = dart
                .disclosures(corp_code.as_deref(), range.from, range.to, page)
                .await?;
            CommandOutput::records(PROVIDER, "disclosures", &disclosures)?
        }
    };

    Ok(output)
}
