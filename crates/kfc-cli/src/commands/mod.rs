mod krx;
mod naver;
mod opendart;

use kfc_core::{ClientConfig, KfcClient, RateLimitingSettings};

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::CommandOutput;

pub async fn run(cli: &Cli) -> Result<CommandOutput, CliError> {
    let client = KfcClient::with_config(client_config(cli)?)?;

    match &cli.command {
        Command::Krx(command) => krx::run(command, client.krx()).await,
        Command::Dart(command) => opendart::run(command, client.opendart()).await,
        Command::Naver(command) => naver::run(command, client.naver()).await,
    }
}

fn client_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_key) = &cli.api_key {
        config = config.with_opendart_api_key(api_key.clone());
    }
    if cli.no_rate_limit {
        config = config.with_rate_limits(RateLimitingSettings::unlimited());
    }
    Ok(config)
}
