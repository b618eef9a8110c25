use rust_decimal::Decimal;
use time::Date;
use tracing::debug;

use super::{ensure_ordered, krx_date, required_param, KrxAdapter};
use crate::coercion::{DateFormat, FieldPolicy, FieldReader, PolicyTable};
use crate::domain::{IndexInfo, IndexMarket, IndexOhlcv, IndexSnapshot};
use crate::partition::PartitionSet;
use crate::{KfcError, ProviderId, ValidationError};

const BLD_INDEX_LIST: &str = "dbms/MDC/STAT/standard/MDCSTAT00401";
const BLD_OHLCV_BY_DATE: &str = "dbms/MDC/STAT/standard/MDCSTAT00101";
const BLD_OHLCV_BY_TICKER: &str = "dbms/MDC/STAT/standard/MDCSTAT00301";

const INDEX_MARKETS: PartitionSet<IndexMarket> = PartitionSet::new(IndexMarket::PARTITIONS);

const INDEX_LIST: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "MDCSTAT00401",
    &[
        ("IND_TP_CD", FieldPolicy::text()),
        ("IDX_IND_CD", FieldPolicy::text()),
        ("IDX_NM", FieldPolicy::text()),
        ("BAS_TM_CONTN", FieldPolicy::text()),
        ("ANNC_TM_CONTN", FieldPolicy::text()),
        ("BAS_IDX_CONTN", FieldPolicy::price()),
        ("COMPST_ISU_CNT", FieldPolicy::integer()),
    ],
);

const OHLCV_BY_DATE: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "MDCSTAT00101",
    &[
        ("IDX_NM", FieldPolicy::text()),
        ("OPNPRC_IDX", FieldPolicy::price()),
        ("HGPRC_IDX", FieldPolicy::price()),
        ("LWPRC_IDX", FieldPolicy::price()),
        ("CLSPRC_IDX", FieldPolicy::price()),
        ("TDD_OPNPRC", FieldPolicy::price()),
        ("TDD_HGPRC", FieldPolicy::price()),
        ("TDD_LWPRC", FieldPolicy::price()),
        ("TDD_CLSPRC", FieldPolicy::price()),
        ("ACC_TRDVOL", FieldPolicy::count()),
        ("ACC_TRDVAL", FieldPolicy::integer()),
    ],
);

const OHLCV_BY_TICKER: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "MDCSTAT00301",
    &[
        ("TRD_DD", FieldPolicy::date(DateFormat::Slashed)),
        ("OPNPRC_IDX", FieldPolicy::price()),
        ("HGPRC_IDX", FieldPolicy::price()),
        ("LWPRC_IDX", FieldPolicy::price()),
        ("CLSPRC_IDX", FieldPolicy::price()),
        ("ACC_TRDVOL", FieldPolicy::count()),
        ("ACC_TRDVAL", FieldPolicy::integer()),
    ],
);

impl KrxAdapter {
    /// Lists indices of one family; [`IndexMarket::All`] fans out over
    /// KOSPI, KOSDAQ and derivatives in that order.
    pub async fn index_list(&self, market: IndexMarket) -> Result<Vec<IndexInfo>, KfcError> {
        match market.code() {
            Some(code) => self.index_list_partition(market, code).await,
            None => {
                INDEX_MARKETS
                    .collect(|partition| self.index_list_partition(partition, partition_code(partition)))
                    .await
            }
        }
    }

    /// All indices of one family on `date`.
    pub async fn index_ohlcv_by_date(
        &self,
        date: Date,
        market: IndexMarket,
    ) -> Result<Vec<IndexSnapshot>, KfcError> {
        match market.code() {
            Some(code) => self.index_snapshot_partition(date, market, code).await,
            None => {
                INDEX_MARKETS
                    .collect(|partition| {
                        self.index_snapshot_partition(date, partition, partition_code(partition))
                    })
                    .await
            }
        }
    }

    /// Daily bars of one index. `ticker` is the type code plus index code, e.g. `1001`.
    pub async fn index_ohlcv_by_ticker(
        &self,
        ticker: &str,
        from: Date,
        to: Date,
    ) -> Result<Vec<IndexOhlcv>, KfcError> {
        ensure_ordered(from, to)?;
        let ticker = required_param("index ticker", ticker)?;
        let (group, code) = split_index_ticker(&ticker)?;
        let params = [
            ("strtDd", krx_date(from)),
            ("endDd", krx_date(to)),
            ("indIdx", group.to_owned()),
            ("indIdx2", code.to_owned()),
        ];

        let rows = self
            .fetch_records(BLD_OHLCV_BY_TICKER, &params, "output")
            .await?;
        let bars = rows
            .iter()
            .map(|row| {
                let reader = OHLCV_BY_TICKER.reader(row);
                Ok(IndexOhlcv {
                    date: reader.required_date("TRD_DD")?,
                    open: reader.decimal("OPNPRC_IDX")?,
                    high: reader.decimal("HGPRC_IDX")?,
                    low: reader.decimal("LWPRC_IDX")?,
                    close: reader.decimal("CLSPRC_IDX")?,
                    volume: reader.required_int("ACC_TRDVOL")?,
                    trading_value: reader.int("ACC_TRDVAL")?,
                })
            })
            .collect::<Result<Vec<_>, KfcError>>()?;

        debug!(%ticker, %from, %to, count = bars.len(), "fetched index ohlcv");
        Ok(bars)
    }

    async fn index_list_partition(
        &self,
        market: IndexMarket,
        code: &str,
    ) -> Result<Vec<IndexInfo>, KfcError> {
        let params = [("idxIndMidclssCd", code.to_owned())];

        let rows = self.fetch_records(BLD_INDEX_LIST, &params, "output").await?;
        rows.iter()
            .map(|row| {
                let reader = INDEX_LIST.reader(row);
                Ok(IndexInfo {
                    ticker: format!(
                        "{}{}",
                        reader.required_text("IND_TP_CD")?,
                        reader.required_text("IDX_IND_CD")?
                    ),
                    name: reader.required_text("IDX_NM")?,
                    market,
                    base_date: dotted_date(&reader, "BAS_TM_CONTN")?,
                    announcement_date: dotted_date(&reader, "ANNC_TM_CONTN")?,
                    base_index: reader.decimal("BAS_IDX_CONTN")?,
                    constituent_count: reader.int("COMPST_ISU_CNT")?,
                })
            })
            .collect::<Result<Vec<_>, KfcError>>()
    }

    async fn index_snapshot_partition(
        &self,
        date: Date,
        market: IndexMarket,
        code: &str,
    ) -> Result<Vec<IndexSnapshot>, KfcError> {
        let params = [("trdDd", krx_date(date)), ("idxIndMidclssCd", code.to_owned())];

        let rows = self
            .fetch_records(BLD_OHLCV_BY_DATE, &params, "output")
            .await?;
        rows.iter()
            .map(|row| {
                let reader = OHLCV_BY_DATE.reader(row);
                Ok(IndexSnapshot {
                    name: reader.required_text("IDX_NM")?,
                    market,
                    open: first_decimal(&reader, "OPNPRC_IDX", "TDD_OPNPRC")?,
                    high: first_decimal(&reader, "HGPRC_IDX", "TDD_HGPRC")?,
                    low: first_decimal(&reader, "LWPRC_IDX", "TDD_LWPRC")?,
                    close: first_decimal(&reader, "CLSPRC_IDX", "TDD_CLSPRC")?,
                    volume: reader.required_int("ACC_TRDVOL")?,
                    trading_value: reader.int("ACC_TRDVAL")?,
                })
            })
            .collect::<Result<Vec<_>, KfcError>>()
    }
}

fn partition_code(market: IndexMarket) -> &'static str {
    market.code().unwrap_or_default()
}

fn split_index_ticker(ticker: &str) -> Result<(&str, &str), ValidationError> {
    let invalid = || ValidationError::InvalidValue {
        field: "index ticker",
        value: ticker.to_owned(),
    };
    if ticker.len() < 2 || !ticker.is_ascii() {
        return Err(invalid());
    }
    Ok(ticker.split_at(1))
}

/// Reads fields like `1980.01.04`.
fn dotted_date(reader: &FieldReader<'_>, field: &str) -> Result<Option<Date>, KfcError> {
    let Some(raw) = reader.text(field)? else {
        return Ok(None);
    };
    DateFormat::Slashed
        .parse(&raw.replace('.', "/"))
        .map(Some)
        .map_err(|error| {
            KfcError::decode_with(ProviderId::Krx, format!("MDCSTAT00401.{field}"), error)
        })
}

/// Some index families report prices under the `TDD_*` names instead.
fn first_decimal(
    reader: &FieldReader<'_>,
    primary: &str,
    alternate: &str,
) -> Result<Option<Decimal>, KfcError> {
    match reader.decimal(primary)? {
        Some(value) => Ok(Some(value)),
        None => reader.decimal(alternate),
    }
}
