use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

/// JSON document printed by every command.
#[derive(Debug, Serialize)]
pub struct CommandOutput {
    pub provider: &'static str,
    pub operation: &'static str,
    pub count: usize,
    /// Date that answered a fallback query, when it differs from the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmapped: Vec<String>,
    pub data: Value,
}

impl CommandOutput {
    pub fn records<T: Serialize>(
        provider: &'static str,
        operation: &'static str,
        records: &[T],
    ) -> Result<Self, CliError> {
        Ok(Self {
            provider,
            operation,
            count: records.len(),
            resolved_date: None,
            unmapped: Vec::new(),
            data: serde_json::to_value(records)?,
        })
    }

    pub fn with_unmapped(mut self, unmapped: Vec<String>) -> Self {
        self.unmapped = unmapped;
        self
    }

    pub fn with_resolved_date(mut self, resolved_date: impl ToString) -> Self {
        self.resolved_date = Some(resolved_date.to_string());
        self
    }
}

pub fn render(output: &CommandOutput, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{payload}")?;
    Ok(())
}
