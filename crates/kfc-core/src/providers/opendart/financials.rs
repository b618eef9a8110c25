use tracing::debug;

use super::{report_params, OpenDartAdapter};
use crate::coercion::{FieldPolicy, PolicyTable, RawRecord};
use crate::domain::{
    FinancialLineItem, FinancialPeriod, FinancialStatement, FinancialStatements, ReportCode,
    StatementKind, StatementScope,
};
use crate::{KfcError, ProviderId};

/// `fnlttSinglAcntAll` only covers filings from 2015 on.
const MIN_FINANCIALS_YEAR: i32 = 2015;

const FULL_STATEMENTS: PolicyTable = PolicyTable::new(
    ProviderId::OpenDart,
    "fnlttSinglAcntAll",
    &[
        ("sj_div", FieldPolicy::text()),
        ("account_id", FieldPolicy::text()),
        ("account_nm", FieldPolicy::text()),
        ("account_detail", FieldPolicy::text()),
        ("thstrm_nm", FieldPolicy::text()),
        ("thstrm_amount", FieldPolicy::decimal().or_zero()),
        ("frmtrm_nm", FieldPolicy::text()),
        ("frmtrm_amount", FieldPolicy::decimal()),
        ("bfefrmtrm_amount", FieldPolicy::decimal()),
        ("ord", FieldPolicy::count()),
    ],
);

/// One decoded line together with the statement it belongs to and the
/// period labels printed next to it.
struct StatementLine {
    kind: StatementKind,
    current_period: Option<String>,
    previous_period: Option<String>,
    item: FinancialLineItem,
}

impl OpenDartAdapter {
    /// Income statement, balance sheet and cash flow statement of one
    /// periodic report. Lines of other divisions (comprehensive income,
    /// changes in equity) are not kept.
    pub async fn financial_statements(
        &self,
        corp_code: &str,
        year: i32,
        report: ReportCode,
        scope: StatementScope,
    ) -> Result<FinancialStatements, KfcError> {
        let (corp_code, lines) = self.statement_lines(corp_code, year, report, scope).await?;
        let mut statements = FinancialStatements {
            corp_code: corp_code.clone(),
            fiscal_year: year,
            report,
            scope,
            income_statement: None,
            balance_sheet: None,
            cash_flow: None,
        };

        for kind in StatementKind::ALL.iter().copied() {
            let statement = assemble(&lines, kind, &corp_code, year, report, scope);
            match kind {
                StatementKind::IncomeStatement => statements.income_statement = statement,
                StatementKind::BalanceSheet => statements.balance_sheet = statement,
                StatementKind::CashFlow => statements.cash_flow = statement,
            }
        }

        Ok(statements)
    }

    /// A single statement of one periodic report, or `None` when the filing
    /// does not carry it.
    pub async fn financial_statement(
        &self,
        corp_code: &str,
        year: i32,
        report: ReportCode,
        scope: StatementScope,
        kind: StatementKind,
    ) -> Result<Option<FinancialStatement>, KfcError> {
        let (corp_code, lines) = self.statement_lines(corp_code, year, report, scope).await?;
        Ok(assemble(&lines, kind, &corp_code, year, report, scope))
    }

    async fn statement_lines(
        &self,
        corp_code: &str,
        year: i32,
        report: ReportCode,
        scope: StatementScope,
    ) -> Result<(String, Vec<StatementLine>), KfcError> {
        let [corp, bsns_year, reprt_code] =
            report_params(corp_code, year, MIN_FINANCIALS_YEAR, report)?;
        let corp_code = corp.1.clone();
        let params = [corp, bsns_year, reprt_code, ("fs_div", scope.code().to_owned())];

        let rows = self.fetch_list("fnlttSinglAcntAll.json", &params).await?;
        let mut lines = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(line) = statement_line(row)? {
                lines.push(line);
            }
        }

        debug!(
            %corp_code,
            year,
            %report,
            scope = scope.code(),
            rows = rows.len(),
            kept = lines.len(),
            "fetched financial statement lines"
        );
        Ok((corp_code, lines))
    }
}

fn statement_line(row: &RawRecord) -> Result<Option<StatementLine>, KfcError> {
    let reader = FULL_STATEMENTS.reader(row);
    let division = reader.required_text("sj_div")?;
    let Some(kind) = StatementKind::from_code(&division) else {
        return Ok(None);
    };

    Ok(Some(StatementLine {
        kind,
        current_period: reader.text("thstrm_nm")?,
        previous_period: reader.text("frmtrm_nm")?,
        item: FinancialLineItem {
            account_id: reader.required_text("account_id")?,
            account_name: reader.required_text("account_nm")?,
            account_detail: reader.text("account_detail")?,
            current_amount: reader.required_decimal("thstrm_amount")?,
            previous_amount: reader.decimal("frmtrm_amount")?,
            two_periods_ago_amount: reader.decimal("bfefrmtrm_amount")?,
            order: reader.required_int("ord")?,
        },
    }))
}

/// Builds one statement from the lines of its kind, in response order.
/// Period labels come from the first line.
fn assemble(
    lines: &[StatementLine],
    kind: StatementKind,
    corp_code: &str,
    year: i32,
    report: ReportCode,
    scope: StatementScope,
) -> Option<FinancialStatement> {
    let mut selected = lines.iter().filter(|line| line.kind == kind).peekable();
    let first = selected.peek()?;

    let current_period = FinancialPeriod {
        name: first.current_period.clone().unwrap_or_default(),
        fiscal_year: year,
    };
    let previous_period = first.previous_period.clone().map(|name| FinancialPeriod {
        name,
        fiscal_year: year - 1,
    });

    Some(FinancialStatement {
        kind,
        corp_code: corp_code.to_owned(),
        fiscal_year: year,
        report,
        scope,
        current_period,
        previous_period,
        line_items: selected.map(|line| line.item.clone()).collect(),
    })
}
