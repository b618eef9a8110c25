use kfc_core::NaverAdapter;

use crate::cli::NaverCommand;
use crate::error::CliError;
use crate::output::CommandOutput;

pub async fn run(command: &NaverCommand, naver: &NaverAdapter) -> Result<CommandOutput, CliError> {
    match command {
        NaverCommand::AdjustedOhlcv { ticker, range } => {
            let bars = naver.adjusted_ohlcv(ticker, range.from, range.to).await?;
            CommandOutput::records("naver", "adjusted_ohlcv", &bars)
        }
    }
}
