use time::Date;
use tracing::debug;

use super::{krx_date, required_param, KrxAdapter};
use crate::coercion::{FieldPolicy, PolicyTable};
use crate::domain::{FutureOhlcv, FutureProduct};
use crate::fallback::{DateFallbackQuery, Resolved, SearchDirection};
use crate::{KfcError, ProviderId};

const BLD_PRODUCTS: &str = "dbms/comm/component/drv_prod_clss";
const BLD_OHLCV: &str = "dbms/MDC/STAT/standard/MDCSTAT12501";

const PRODUCTS: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "drv_prod_clss",
    &[("value", FieldPolicy::text()), ("name", FieldPolicy::text())],
);

const OHLCV: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "MDCSTAT12501",
    &[
        ("ISU_SRT_CD", FieldPolicy::text()),
        ("ISU_NM", FieldPolicy::text()),
        ("TDD_OPNPRC", FieldPolicy::price()),
        ("TDD_HGPRC", FieldPolicy::price()),
        ("TDD_LWPRC", FieldPolicy::price()),
        ("TDD_CLSPRC", FieldPolicy::price()),
        ("CMPPREVDD_PRC", FieldPolicy::price()),
        ("FLUC_TP_CD", FieldPolicy::direction()),
        ("ACC_TRDVOL", FieldPolicy::count()),
        ("ACC_TRDVAL", FieldPolicy::integer()),
    ],
);

impl KrxAdapter {
    pub async fn future_products(&self) -> Result<Vec<FutureProduct>, KfcError> {
        let params = [("secugrpId", String::from("ALL"))];

        let rows = self.fetch_records(BLD_PRODUCTS, &params, "output").await?;
        let products = rows
            .iter()
            .map(|row| {
                let reader = PRODUCTS.reader(row);
                Ok(FutureProduct {
                    product_id: reader.required_text("value")?,
                    name: reader.required_text("name")?,
                })
            })
            .collect::<Result<Vec<_>, KfcError>>()?;

        debug!(count = products.len(), "fetched future products");
        Ok(products)
    }

    /// Daily bars of every contract of `product_id`.
    ///
    /// With `fallback` set, an empty day is retried on up to seven nearby
    /// days in that direction; the day that answered is in `date`.
    pub async fn future_ohlcv(
        &self,
        date: Date,
        product_id: &str,
        fallback: Option<SearchDirection>,
    ) -> Result<Resolved<FutureOhlcv>, KfcError> {
        let product_id = required_param("product id", product_id)?;

        let Some(direction) = fallback else {
            let records = self.future_ohlcv_on(date, &product_id).await?;
            return Ok(Resolved {
                requested: date,
                date,
                records,
            });
        };

        DateFallbackQuery::new(date, direction)
            .resolve(|day| self.future_ohlcv_on(day, &product_id))
            .await
    }

    async fn future_ohlcv_on(&self, date: Date, product_id: &str) -> Result<Vec<FutureOhlcv>, KfcError> {
        let params = [
            ("trdDd", krx_date(date)),
            ("prodId", product_id.to_owned()),
            ("mktTpCd", String::from("T")),
            ("rghtTpCd", String::from("T")),
        ];

        let rows = self.fetch_records(BLD_OHLCV, &params, "output").await?;
        let bars = rows
            .iter()
            .map(|row| {
                let reader = OHLCV.reader(row);
                Ok(FutureOhlcv {
                    date,
                    product_id: product_id.to_owned(),
                    ticker: reader.required_text("ISU_SRT_CD")?,
                    name: reader.required_text("ISU_NM")?,
                    open: reader.decimal("TDD_OPNPRC")?,
                    high: reader.decimal("TDD_HGPRC")?,
                    low: reader.decimal("TDD_LWPRC")?,
                    close: reader.decimal("TDD_CLSPRC")?,
                    change: reader.decimal("CMPPREVDD_PRC")?,
                    direction: reader.direction("FLUC_TP_CD")?,
                    volume: reader.required_int("ACC_TRDVOL")?,
                    trading_value: reader.int("ACC_TRDVAL")?,
                })
            })
            .collect::<Result<Vec<_>, KfcError>>()?;

        debug!(%date, product_id, count = bars.len(), "fetched future ohlcv");
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::super::test_support::adapter;
    use super::*;
    use crate::coercion::PriceDirection;
    use crate::http_client::ScriptedHttpClient;

    const BAR: &str = r#"{"output":[{"ISU_SRT_CD":"A0166000","ISU_NM":"코스피200 F 202403",
        "TDD_OPNPRC":"355.10","TDD_HGPRC":"357.00","TDD_LWPRC":"354.20","TDD_CLSPRC":"356.45",
        "CMPPREVDD_PRC":"-1.05","FLUC_TP_CD":"2","ACC_TRDVOL":"215,000","ACC_TRDVAL":"-"}]}"#;

    #[tokio::test]
    async fn products_map_value_and_name() {
        let (krx, client) = adapter(ScriptedHttpClient::new().respond_json(
            r#"{"output":[{"value":"KRDRVFUK2I","name":"코스피200 선물"}]}"#,
        ));

        let products = krx.future_products().await.expect("products");

        assert_eq!(client.requests()[0].param("secugrpId").as_deref(), Some("ALL"));
        assert_eq!(products[0].product_id, "KRDRVFUK2I");
    }

    #[tokio::test]
    async fn without_fallback_an_empty_day_stays_empty() {
        let (krx, client) = adapter(ScriptedHttpClient::new().respond_json(r#"{"output":[]}"#));

        let resolved = krx
            .future_ohlcv(date!(2024 - 01 - 06), "KRDRVFUK2I", None)
            .await
            .expect("empty day");

        assert!(resolved.records.is_empty());
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn backward_fallback_returns_first_day_with_data() {
        // anchor and two earlier days are empty, the third earlier day has data
        let client = ScriptedHttpClient::new()
            .respond_json(r#"{"output":[]}"#)
            .respond_json(r#"{"output":[]}"#)
            .respond_json(r#"{"output":[]}"#)
            .respond_json(BAR);
        let (krx, client) = adapter(client);

        let resolved = krx
            .future_ohlcv(date!(2024 - 01 - 07), "KRDRVFUK2I", Some(SearchDirection::Backward))
            .await
            .expect("resolved");

        let dates = client
            .requests()
            .iter()
            .map(|request| request.param("trdDd").unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(dates, vec!["20240107", "20240106", "20240105", "20240104"]);
        assert_eq!(resolved.date, date!(2024 - 01 - 04));
        assert_eq!(resolved.records.len(), 1);
        assert_eq!(resolved.records[0].date, date!(2024 - 01 - 04));
        assert_eq!(resolved.records[0].direction, Some(PriceDirection::Down));
        assert_eq!(resolved.records[0].trading_value, None);
    }

    #[tokio::test]
    async fn fallback_is_bounded_to_seven_days() {
        let (krx, client) = adapter(ScriptedHttpClient::new().with_fallback(Ok(
            crate::http_client::HttpResponse::ok_json(r#"{"output":[]}"#),
        )));

        let resolved = krx
            .future_ohlcv(date!(2024 - 01 - 01), "KRDRVFUK2I", Some(SearchDirection::Forward))
            .await
            .expect("exhausted");

        assert_eq!(client.request_count(), 8);
        assert_eq!(resolved.date, date!(2024 - 01 - 01));
        assert!(resolved.records.is_empty());
    }
}
