use time::Date;
use tracing::debug;

use super::{ensure_ordered, krx_date, required_param, KrxAdapter};
use crate::coercion::{DateFormat, FieldPolicy, PolicyTable};
use crate::domain::{FundListing, FundOhlcv, FundType, InvestorNetBuy, InvestorTrading};
use crate::partition::{PartitionSet, RangeSplitter};
use crate::{KfcError, ProviderId};

const BLD_LIST: &str = "dbms/MDC/STAT/standard/MDCSTAT04601";
const BLD_OHLCV: &str = "dbms/MDC/STAT/standard/MDCSTAT04501";
const BLD_INVESTORS_DAILY: &str = "dbms/MDC/STAT/standard/MDCSTAT04801";
const BLD_INVESTORS_PERIOD_ALL: &str = "dbms/MDC/STAT/standard/MDCSTAT04802";
const BLD_INVESTORS_PERIOD_ONE: &str = "dbms/MDC/STAT/standard/MDCSTAT04902";

const FUND_TYPES: PartitionSet<FundType> = PartitionSet::new(FundType::ALL);

/// KRX rejects daily price queries spanning more than two years.
const OHLCV_SPANS: RangeSplitter = RangeSplitter::new(730);

/// Investor category and the column holding its net buy value in period queries.
const NET_BUY_COLUMNS: &[(&str, &str)] = &[
    ("기관", "NUM_ITM_VAL21"),
    ("기타법인", "NUM_ITM_VAL22"),
    ("개인", "NUM_ITM_VAL23"),
    ("외국인", "NUM_ITM_VAL24"),
];

const LIST: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "MDCSTAT04601",
    &[
        ("ISU_CD", FieldPolicy::text()),
        ("ISU_SRT_CD", FieldPolicy::text()),
        ("ISU_ABBRV", FieldPolicy::text()),
        ("ISU_NM", FieldPolicy::text()),
        ("ISU_ENG_NM", FieldPolicy::text()),
        ("LIST_DD", FieldPolicy::date(DateFormat::Slashed)),
        ("TRACE_IDX_NM", FieldPolicy::text()),
        ("IDX_CALC_INST_NM1", FieldPolicy::text()),
        ("IDX_CALC_INST_NM2", FieldPolicy::text()),
        ("ETF_REPLICA_METHD_TP_CD", FieldPolicy::text()),
        ("IDX_MKT_CLSS_NM", FieldPolicy::text()),
        ("IDX_ASST_CLSS_NM", FieldPolicy::text()),
        ("LIST_SHRS", FieldPolicy::count()),
        ("COM_ABBRV", FieldPolicy::text()),
        ("CU_QTY", FieldPolicy::count()),
        ("ETF_TOT_FEE", FieldPolicy::rate()),
        ("TAX_TP_CD", FieldPolicy::text()),
    ],
);

const OHLCV: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "MDCSTAT04501",
    &[
        ("TRD_DD", FieldPolicy::date(DateFormat::Slashed)),
        ("TDD_OPNPRC", FieldPolicy::integer()),
        ("TDD_HGPRC", FieldPolicy::integer()),
        ("TDD_LWPRC", FieldPolicy::integer()),
        ("TDD_CLSPRC", FieldPolicy::integer()),
        ("ACC_TRDVOL", FieldPolicy::count()),
        ("ACC_TRDVAL", FieldPolicy::count()),
        ("LST_NAV", FieldPolicy::price()),
        ("CMPPREVDD_PRC", FieldPolicy::integer()),
        ("FLUC_RT", FieldPolicy::price()),
        ("FLUC_TP_CD", FieldPolicy::direction()),
        ("MKTCAP", FieldPolicy::count()),
        ("INVSTASST_NETASST_TOTAMT", FieldPolicy::count()),
        ("LIST_SHRS", FieldPolicy::count()),
        ("IDX_IND_NM", FieldPolicy::text()),
        ("OBJ_STKPRC_IDX", FieldPolicy::price()),
        ("CMPPREVDD_IDX", FieldPolicy::price()),
        ("IDX_FLUC_RT", FieldPolicy::price()),
        ("FLUC_TP_CD1", FieldPolicy::direction()),
    ],
);

const INVESTORS_DAILY: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "MDCSTAT04801",
    &[
        ("INVST_NM", FieldPolicy::text()),
        ("ASK_TRDVOL", FieldPolicy::count()),
        ("ASK_TRDVAL", FieldPolicy::count()),
        ("BID_TRDVOL", FieldPolicy::count()),
        ("BID_TRDVAL", FieldPolicy::count()),
        ("NETBID_TRDVOL", FieldPolicy::count()),
        ("NETBID_TRDVAL", FieldPolicy::count()),
    ],
);

const INVESTORS_PERIOD: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "MDCSTAT04802",
    &[
        ("TRD_DD", FieldPolicy::date(DateFormat::Slashed)),
        ("NUM_ITM_VAL21", FieldPolicy::count()),
        ("NUM_ITM_VAL22", FieldPolicy::count()),
        ("NUM_ITM_VAL23", FieldPolicy::count()),
        ("NUM_ITM_VAL24", FieldPolicy::count()),
    ],
);

impl KrxAdapter {
    /// Lists exchange-traded products. `None` fans out over ETF, REIT, ETN
    /// and ELW in that order.
    pub async fn fund_list(&self, fund_type: Option<FundType>) -> Result<Vec<FundListing>, KfcError> {
        match fund_type {
            Some(fund_type) => self.fund_list_partition(fund_type).await,
            None => FUND_TYPES.collect(|partition| self.fund_list_partition(partition)).await,
        }
    }

    /// Daily bars of one product, oldest first. Ranges longer than two years
    /// are fetched as consecutive sub-ranges and merged.
    pub async fn fund_ohlcv(
        &self,
        isin: &str,
        from: Date,
        to: Date,
    ) -> Result<Vec<FundOhlcv>, KfcError> {
        ensure_ordered(from, to)?;
        let isin = required_param("isin", isin)?;

        let mut bars = OHLCV_SPANS
            .collect(from, to, |start, end| self.fund_ohlcv_span(&isin, start, end))
            .await?;
        bars.sort_by_key(|bar| bar.date);

        debug!(%isin, %from, %to, count = bars.len(), "fetched fund ohlcv");
        Ok(bars)
    }

    /// Buy/sell totals per investor category across all ETFs on `date`.
    pub async fn fund_investor_trading(&self, date: Date) -> Result<Vec<InvestorTrading>, KfcError> {
        let params = [("strtDd", krx_date(date)), ("endDd", krx_date(date))];

        let rows = self
            .fetch_records(BLD_INVESTORS_DAILY, &params, "output")
            .await?;
        let trading = rows
            .iter()
            .map(|row| {
                let reader = INVESTORS_DAILY.reader(row);
                Ok(InvestorTrading {
                    date,
                    investor: reader.required_text("INVST_NM")?,
                    ask_volume: reader.required_int("ASK_TRDVOL")?,
                    ask_value: reader.required_int("ASK_TRDVAL")?,
                    bid_volume: reader.required_int("BID_TRDVOL")?,
                    bid_value: reader.required_int("BID_TRDVAL")?,
                    net_buy_volume: reader.required_int("NETBID_TRDVOL")?,
                    net_buy_value: reader.required_int("NETBID_TRDVAL")?,
                })
            })
            .collect::<Result<Vec<_>, KfcError>>()?;

        debug!(%date, count = trading.len(), "fetched investor trading");
        Ok(trading)
    }

    /// Daily net buy value per investor category, for all ETFs or for one ISIN.
    /// Each response row expands into one record per category.
    pub async fn fund_investor_trading_by_period(
        &self,
        from: Date,
        to: Date,
        isin: Option<&str>,
    ) -> Result<Vec<InvestorNetBuy>, KfcError> {
        ensure_ordered(from, to)?;
        let mut params = vec![
            ("strtDd", krx_date(from)),
            ("endDd", krx_date(to)),
            ("inqCondTpCd1", String::from("1")),
            ("inqCondTpCd2", String::from("1")),
        ];
        let bld = match isin {
            Some(isin) => {
                params.push(("isuCd", required_param("isin", isin)?));
                BLD_INVESTORS_PERIOD_ONE
            }
            None => BLD_INVESTORS_PERIOD_ALL,
        };

        let rows = self.fetch_records(bld, &params, "output").await?;
        let mut flows = Vec::with_capacity(rows.len() * NET_BUY_COLUMNS.len());
        for row in &rows {
            let reader = INVESTORS_PERIOD.reader(row);
            let date = reader.required_date("TRD_DD")?;
            for (investor, column) in NET_BUY_COLUMNS {
                flows.push(InvestorNetBuy {
                    date,
                    investor: (*investor).to_owned(),
                    net_buy_value: reader.required_int(column)?,
                });
            }
        }

        debug!(%from, %to, ?isin, count = flows.len(), "fetched investor net buy history");
        Ok(flows)
    }

    async fn fund_ohlcv_span(
        &self,
        isin: &str,
        from: Date,
        to: Date,
    ) -> Result<Vec<FundOhlcv>, KfcError> {
        let params = [
            ("strtDd", krx_date(from)),
            ("endDd", krx_date(to)),
            ("isuCd", isin.to_owned()),
        ];

        let rows = self.fetch_records(BLD_OHLCV, &params, "output").await?;
        rows.iter()
            .map(|row| {
                let reader = OHLCV.reader(row);
                Ok(FundOhlcv {
                    date: reader.required_date("TRD_DD")?,
                    open: reader.int("TDD_OPNPRC")?,
                    high: reader.int("TDD_HGPRC")?,
                    low: reader.int("TDD_LWPRC")?,
                    close: reader.int("TDD_CLSPRC")?,
                    volume: reader.required_int("ACC_TRDVOL")?,
                    trading_value: reader.required_int("ACC_TRDVAL")?,
                    nav: reader.decimal("LST_NAV")?,
                    change: reader.int("CMPPREVDD_PRC")?,
                    change_rate: reader.decimal("FLUC_RT")?,
                    direction: reader.direction("FLUC_TP_CD")?,
                    market_cap: reader.required_int("MKTCAP")?,
                    net_asset: reader.required_int("INVSTASST_NETASST_TOTAMT")?,
                    listed_shares: reader.required_int("LIST_SHRS")?,
                    index_name: reader.text("IDX_IND_NM")?,
                    index_value: reader.decimal("OBJ_STKPRC_IDX")?,
                    index_change: reader.decimal("CMPPREVDD_IDX")?,
                    index_change_rate: reader.decimal("IDX_FLUC_RT")?,
                    index_direction: reader.direction("FLUC_TP_CD1")?,
                })
            })
            .collect::<Result<Vec<_>, KfcError>>()
    }

    async fn fund_list_partition(&self, fund_type: FundType) -> Result<Vec<FundListing>, KfcError> {
        let params = [("secugrpId", fund_type.security_group_id().to_owned())];

        let rows = self.fetch_records(BLD_LIST, &params, "output").await?;
        let funds = rows
            .iter()
            .map(|row| {
                let reader = LIST.reader(row);
                Ok(FundListing {
                    isin: reader.required_text("ISU_CD")?,
                    ticker: reader.required_text("ISU_SRT_CD")?,
                    name: reader.required_text("ISU_ABBRV")?,
                    full_name: reader.required_text("ISU_NM")?,
                    english_name: reader.text("ISU_ENG_NM")?,
                    fund_type,
                    listing_date: reader.date("LIST_DD")?,
                    benchmark_index: reader.text("TRACE_IDX_NM")?,
                    index_provider: reader.text("IDX_CALC_INST_NM1")?,
                    leverage_type: reader.text("IDX_CALC_INST_NM2")?,
                    replication_method: reader.text("ETF_REPLICA_METHD_TP_CD")?,
                    market_type: reader.text("IDX_MKT_CLSS_NM")?,
                    asset_class: reader.text("IDX_ASST_CLSS_NM")?,
                    listed_shares: reader.required_int("LIST_SHRS")?,
                    asset_manager: reader.text("COM_ABBRV")?,
                    creation_unit: reader.required_int("CU_QTY")?,
                    total_expense_ratio: reader.decimal("ETF_TOT_FEE")?,
                    tax_type: reader.text("TAX_TP_CD")?,
                })
            })
            .collect::<Result<Vec<_>, KfcError>>()?;

        debug!(?fund_type, count = funds.len(), "fetched fund list");
        Ok(funds)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::super::test_support::adapter;
    use super::*;
    use crate::http_client::ScriptedHttpClient;

    fn fund_row(isin: &str, ticker: &str) -> String {
        format!(
            r#"{{"ISU_CD":"{isin}","ISU_SRT_CD":"{ticker}","ISU_ABBRV":"KODEX 200","ISU_NM":"KODEX 200증권상장지수투자신탁(주식)",
                "ISU_ENG_NM":"Samsung KODEX 200","LIST_DD":"2002/10/14","TRACE_IDX_NM":"코스피 200",
                "IDX_CALC_INST_NM1":"KRX","IDX_CALC_INST_NM2":"일반","ETF_REPLICA_METHD_TP_CD":"실물",
                "IDX_MKT_CLSS_NM":"국내","IDX_ASST_CLSS_NM":"주식","LIST_SHRS":"107,150,000",
                "COM_ABBRV":"삼성자산운용","CU_QTY":"50,000","ETF_TOT_FEE":"0.150","TAX_TP_CD":"비과세"}}"#
        )
    }

    #[tokio::test]
    async fn no_fund_type_fans_out_over_every_group() {
        let client = ScriptedHttpClient::new()
            .respond_json(format!(r#"{{"output":[{}]}}"#, fund_row("KR7069500007", "069500")))
            .respond_json(r#"{"output":[]}"#)
            .respond_json(format!(r#"{{"output":[{}]}}"#, fund_row("KRG500000001", "500001")))
            .respond_json(r#"{"output":[]}"#);
        let (krx, client) = adapter(client);

        let funds = krx.fund_list(None).await.expect("all fund types");

        let groups = client
            .requests()
            .iter()
            .map(|request| request.param("secugrpId").unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(groups, vec!["EF", "BC", "EN", "EW"]);
        assert_eq!(funds.len(), 2);
        assert_eq!(funds[0].fund_type, FundType::Etf);
        assert_eq!(funds[1].fund_type, FundType::Etn);
        assert_eq!(funds[0].listing_date, Some(date!(2002 - 10 - 14)));
        assert_eq!(funds[0].listed_shares, 107_150_000);
    }

    #[tokio::test]
    async fn failing_partition_aborts_the_fan_out() {
        let client = ScriptedHttpClient::new()
            .respond_json(r#"{"output":[]}"#)
            .respond(Ok(crate::http_client::HttpResponse::with_status(500, "")));
        let (krx, client) = adapter(client);

        let error = krx.fund_list(None).await.expect_err("second partition fails");

        assert_eq!(error.code(), 1004);
        assert_eq!(client.request_count(), 2);
    }

    fn ohlcv_row(date: &str, close: &str) -> String {
        format!(
            r#"{{"TRD_DD":"{date}","TDD_OPNPRC":"35,100","TDD_HGPRC":"35,600","TDD_LWPRC":"35,050",
                "TDD_CLSPRC":"{close}","ACC_TRDVOL":"4,512,345","ACC_TRDVAL":"160,123,456,789",
                "LST_NAV":"35,312.45","CMPPREVDD_PRC":"-120","FLUC_RT":"-0.34","FLUC_TP_CD":"2",
                "MKTCAP":"6,123,000,000,000","INVSTASST_NETASST_TOTAMT":"6,120,000,000,000",
                "LIST_SHRS":"173,450,000","IDX_IND_NM":"코스피 200","OBJ_STKPRC_IDX":"352.11",
                "CMPPREVDD_IDX":"-1.25","IDX_FLUC_RT":"-0.35","FLUC_TP_CD1":"2"}}"#
        )
    }

    #[tokio::test]
    async fn long_ohlcv_range_is_split_and_merged_in_date_order() {
        let client = ScriptedHttpClient::new()
            .respond_json(format!(
                r#"{{"output":[{},{}]}}"#,
                ohlcv_row("2022/03/02", "31,000"),
                ohlcv_row("2021/06/01", "30,000")
            ))
            .respond_json(format!(r#"{{"output":[{}]}}"#, ohlcv_row("2024/01/02", "35,295")));
        let (krx, client) = adapter(client);

        let bars = krx
            .fund_ohlcv("KR7069500007", date!(2021 - 01 - 01), date!(2024 - 06 - 30))
            .await
            .expect("split ohlcv");

        let spans = client
            .requests()
            .iter()
            .map(|request| {
                (
                    request.param("strtDd").unwrap_or_default(),
                    request.param("endDd").unwrap_or_default(),
                )
            })
            .collect::<Vec<_>>();
        assert_eq!(
            spans,
            vec![
                (String::from("20210101"), String::from("20230101")),
                (String::from("20230102"), String::from("20240630")),
            ]
        );
        let dates = bars.iter().map(|bar| bar.date).collect::<Vec<_>>();
        assert_eq!(
            dates,
            vec![date!(2021 - 06 - 01), date!(2022 - 03 - 02), date!(2024 - 01 - 02)]
        );
    }

    #[tokio::test]
    async fn short_ohlcv_range_is_one_request() {
        let (krx, client) = adapter(ScriptedHttpClient::new().respond_json(format!(
            r#"{{"output":[{},{}]}}"#,
            ohlcv_row("2024/01/03", "35,490"),
            ohlcv_row("2024/01/02", "36,200")
        )));

        let bars = krx
            .fund_ohlcv("KR7069500007", date!(2024 - 01 - 01), date!(2024 - 01 - 05))
            .await
            .expect("ohlcv");

        let request = &client.requests()[0];
        assert_eq!(client.request_count(), 1);
        assert_eq!(request.param("bld").as_deref(), Some(BLD_OHLCV));
        assert_eq!(request.param("isuCd").as_deref(), Some("KR7069500007"));
        assert_eq!(bars[0].date, date!(2024 - 01 - 02));
        assert_eq!(bars[0].close, Some(36_200));
        assert_eq!(bars[0].nav, Some(rust_decimal::Decimal::new(3_531_245, 2)));
        assert_eq!(bars[0].direction, Some(crate::coercion::PriceDirection::Down));
        assert_eq!(bars[0].trading_value, 160_123_456_789);
    }

    #[tokio::test]
    async fn daily_investor_rows_use_zero_for_dashes() {
        let (krx, client) = adapter(ScriptedHttpClient::new().respond_json(
            r#"{"output":[{"INVST_NM":"개인","ASK_TRDVOL":"1,000","ASK_TRDVAL":"-","BID_TRDVOL":"900",
                "BID_TRDVAL":"45,000","NETBID_TRDVOL":"-100","NETBID_TRDVAL":"-"}]}"#,
        ));

        let trading = krx
            .fund_investor_trading(date!(2024 - 01 - 02))
            .await
            .expect("investor trading");

        let request = &client.requests()[0];
        assert_eq!(request.param("strtDd"), request.param("endDd"));
        assert_eq!(trading[0].ask_value, 0);
        assert_eq!(trading[0].net_buy_volume, -100);
        assert_eq!(trading[0].date, date!(2024 - 01 - 02));
    }

    #[tokio::test]
    async fn period_rows_expand_into_one_record_per_category() {
        let (krx, client) = adapter(ScriptedHttpClient::new().respond_json(
            r#"{"output":[{"TRD_DD":"2024/01/03","NUM_ITM_VAL21":"1,500","NUM_ITM_VAL22":"-20",
                "NUM_ITM_VAL23":"-1,480","NUM_ITM_VAL24":"-"}]}"#,
        ));

        let flows = krx
            .fund_investor_trading_by_period(
                date!(2024 - 01 - 01),
                date!(2024 - 01 - 05),
                Some("KR7069500007"),
            )
            .await
            .expect("period flows");

        let request = &client.requests()[0];
        assert_eq!(request.param("bld").as_deref(), Some(BLD_INVESTORS_PERIOD_ONE));
        assert_eq!(request.param("isuCd").as_deref(), Some("KR7069500007"));
        assert_eq!(request.param("inqCondTpCd2").as_deref(), Some("1"));
        let investors = flows.iter().map(|flow| flow.investor.as_str()).collect::<Vec<_>>();
        assert_eq!(investors, vec!["기관", "기타법인", "개인", "외국인"]);
        assert_eq!(flows[0].net_buy_value, 1500);
        assert_eq!(flows[3].net_buy_value, 0);
    }
}
