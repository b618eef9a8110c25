use time::Date;
use tracing::debug;

use super::{ensure_ordered, krx_date, required_param, KrxAdapter};
use crate::coercion::{DateFormat, FieldPolicy, PolicyTable};
use crate::domain::{FundType, ShortBalance, ShortSelling};
use crate::{KfcError, ProviderId};

const BLD_SHORT_SELLING: &str = "dbms/MDC/STAT/srt/MDCSTAT30102";
const BLD_SHORT_BALANCE: &str = "dbms/MDC/STAT/srt/MDCSTAT30502";

const SHORT_SELLING: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "MDCSTAT30102",
    &[
        ("TRD_DD", FieldPolicy::date(DateFormat::Slashed)),
        ("CVSRTSELL_TRDVOL", FieldPolicy::count()),
        ("CVSRTSELL_TRDVAL", FieldPolicy::count()),
        ("ACC_TRDVOL", FieldPolicy::count()),
        ("ACC_TRDVAL", FieldPolicy::count()),
        ("TRDVOL_WT", FieldPolicy::price()),
        ("TRDVAL_WT", FieldPolicy::price()),
    ],
);

const SHORT_BALANCE: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "MDCSTAT30502",
    &[
        ("RPT_DUTY_OCCR_DD", FieldPolicy::date(DateFormat::Slashed)),
        ("BAL_QTY", FieldPolicy::count()),
        ("BAL_AMT", FieldPolicy::count()),
        ("LIST_SHRS", FieldPolicy::count()),
        ("BAL_RTO", FieldPolicy::price()),
    ],
);

impl KrxAdapter {
    /// Daily short selling of one product, oldest first. Rows without a
    /// trading date are skipped.
    pub async fn fund_short_selling(
        &self,
        isin: &str,
        fund_type: FundType,
        from: Date,
        to: Date,
    ) -> Result<Vec<ShortSelling>, KfcError> {
        ensure_ordered(from, to)?;
        let isin = required_param("isin", isin)?;
        let params = [
            ("searchType", String::from("2")),
            ("mktId", String::from("STK")),
            ("secugrpId", fund_type.security_group_id().to_owned()),
            ("inqCond", fund_type.inquiry_condition().to_owned()),
            ("isuCd", isin.clone()),
            ("strtDd", krx_date(from)),
            ("endDd", krx_date(to)),
            ("share", String::from("1")),
            ("money", String::from("1")),
        ];

        let rows = self
            .fetch_records(BLD_SHORT_SELLING, &params, "OutBlock_1")
            .await?;
        let ticker = ticker_of(&isin);
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let reader = SHORT_SELLING.reader(row);
            let Some(date) = reader.date("TRD_DD")? else {
                continue;
            };
            records.push(ShortSelling {
                date,
                ticker: ticker.clone(),
                short_volume: reader.required_int("CVSRTSELL_TRDVOL")?,
                short_value: reader.required_int("CVSRTSELL_TRDVAL")?,
                total_volume: reader.required_int("ACC_TRDVOL")?,
                total_value: reader.required_int("ACC_TRDVAL")?,
                volume_ratio: reader.decimal("TRDVOL_WT")?,
                value_ratio: reader.decimal("TRDVAL_WT")?,
            });
        }
        records.sort_by_key(|record| record.date);

        debug!(%isin, ?fund_type, count = records.len(), "fetched short selling");
        Ok(records)
    }

    /// Reported short balances of one product, oldest first.
    pub async fn fund_short_balance(
        &self,
        isin: &str,
        fund_type: FundType,
        from: Date,
        to: Date,
    ) -> Result<Vec<ShortBalance>, KfcError> {
        ensure_ordered(from, to)?;
        let isin = required_param("isin", isin)?;
        let params = [
            ("searchType", String::from("2")),
            ("mktTpCd", fund_type.market_type_code().to_owned()),
            ("isuCd", isin.clone()),
            ("strtDd", krx_date(from)),
            ("endDd", krx_date(to)),
            ("share", String::from("1")),
            ("money", String::from("1")),
        ];

        let rows = self
            .fetch_records(BLD_SHORT_BALANCE, &params, "OutBlock_1")
            .await?;
        let ticker = ticker_of(&isin);
        let mut balances = Vec::with_capacity(rows.len());
        for row in &rows {
            let reader = SHORT_BALANCE.reader(row);
            let Some(date) = reader.date("RPT_DUTY_OCCR_DD")? else {
                continue;
            };
            balances.push(ShortBalance {
                date,
                ticker: ticker.clone(),
                balance_shares: reader.required_int("BAL_QTY")?,
                balance_value: reader.required_int("BAL_AMT")?,
                listed_shares: reader.required_int("LIST_SHRS")?,
                balance_ratio: reader.decimal("BAL_RTO")?,
            });
        }
        balances.sort_by_key(|balance| balance.date);

        debug!(%isin, ?fund_type, count = balances.len(), "fetched short balance");
        Ok(balances)
    }
}

/// Short code embedded in a Korean ISIN (`KR7069500007` -> `069500`).
fn ticker_of(isin: &str) -> String {
    isin.get(3..9).unwrap_or(isin).to_owned()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use super::super::test_support::adapter;
    use super::*;
    use crate::http_client::ScriptedHttpClient;

    #[test]
    fn ticker_is_cut_from_the_isin() {
        assert_eq!(ticker_of("KR7069500007"), "069500");
        assert_eq!(ticker_of("069500"), "069500");
    }

    #[tokio::test]
    async fn short_selling_rows_are_sorted_and_undated_rows_skipped() {
        let (krx, client) = adapter(ScriptedHttpClient::new().respond_json(
            r#"{"OutBlock_1":[
                {"TRD_DD":"2024/01/03","CVSRTSELL_TRDVOL":"1,200","CVSRTSELL_TRDVAL":"42,000,000",
                 "ACC_TRDVOL":"5,000,000","ACC_TRDVAL":"175,000,000,000","TRDVOL_WT":"0.02","TRDVAL_WT":"0.02"},
                {"TRD_DD":"-","CVSRTSELL_TRDVOL":"-","CVSRTSELL_TRDVAL":"-",
                 "ACC_TRDVOL":"-","ACC_TRDVAL":"-","TRDVOL_WT":"-","TRDVAL_WT":"-"},
                {"TRD_DD":"2024/01/02","CVSRTSELL_TRDVOL":"-","CVSRTSELL_TRDVAL":"-",
                 "ACC_TRDVOL":"4,512,345","ACC_TRDVAL":"160,000,000,000","TRDVOL_WT":"-","TRDVAL_WT":"-"}
            ]}"#,
        ));

        let records = krx
            .fund_short_selling(
                "KR7069500007",
                FundType::Etf,
                date!(2024 - 01 - 01),
                date!(2024 - 01 - 05),
            )
            .await
            .expect("short selling");

        let request = &client.requests()[0];
        assert_eq!(request.param("bld").as_deref(), Some(BLD_SHORT_SELLING));
        assert_eq!(request.param("inqCond").as_deref(), Some("EF"));
        assert_eq!(request.param("searchType").as_deref(), Some("2"));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date!(2024 - 01 - 02));
        assert_eq!(records[0].short_volume, 0);
        assert_eq!(records[0].volume_ratio, None);
        assert_eq!(records[1].short_value, 42_000_000);
        assert_eq!(records[1].ticker, "069500");
    }

    #[tokio::test]
    async fn short_balance_uses_the_market_type_of_the_fund() {
        let (krx, client) = adapter(ScriptedHttpClient::new().respond_json(
            r#"{"OutBlock_1":[{"RPT_DUTY_OCCR_DD":"2024/01/02","BAL_QTY":"15,000",
                "BAL_AMT":"530,000,000","LIST_SHRS":"173,450,000","BAL_RTO":"0.01"}]}"#,
        ));

        let balances = krx
            .fund_short_balance(
                "KRG500000001",
                FundType::Etn,
                date!(2024 - 01 - 01),
                date!(2024 - 01 - 05),
            )
            .await
            .expect("short balance");

        let request = &client.requests()[0];
        assert_eq!(request.param("mktTpCd").as_deref(), Some("4"));
        assert_eq!(balances[0].balance_shares, 15_000);
        assert_eq!(balances[0].balance_ratio, Some(Decimal::new(1, 2)));
    }

    #[tokio::test]
    async fn reversed_range_is_rejected_before_sending() {
        let (krx, client) = adapter(ScriptedHttpClient::new());

        let error = krx
            .fund_short_balance(
                "KR7069500007",
                FundType::Etf,
                date!(2024 - 02 - 01),
                date!(2024 - 01 - 01),
            )
            .await
            .expect_err("reversed");

        assert_eq!(error.code(), 5002);
        assert_eq!(client.request_count(), 0);
    }
}
