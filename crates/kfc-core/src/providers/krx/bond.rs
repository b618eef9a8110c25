use time::Date;
use tracing::debug;

use super::{ensure_ordered, krx_date, KrxAdapter};
use crate::category::Categorized;
use crate::coercion::{DateFormat, FieldPolicy, PolicyTable};
use crate::domain::{BondType, BondYield};
use crate::{KfcError, ProviderId};

const BLD_BY_DATE: &str = "dbms/MDC/STAT/standard/MDCSTAT04301";
const BLD_BY_PERIOD: &str = "dbms/MDC/STAT/standard/MDCSTAT04302";
const RECORD_KEY: &str = "OutBlock_1";

const BY_DATE: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "MDCSTAT04301",
    &[
        ("ITM_TP_NM", FieldPolicy::text()),
        ("LST_ORD_BAS_YD", FieldPolicy::decimal()),
        ("CMP_YD", FieldPolicy::decimal()),
    ],
);

const BY_PERIOD: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "MDCSTAT04302",
    &[
        ("DISCLS_DD", FieldPolicy::date(DateFormat::Slashed)),
        ("LST_ORD_BAS_YD", FieldPolicy::decimal()),
        ("CMP_YD", FieldPolicy::decimal()),
    ],
);

impl KrxAdapter {
    /// Yields of every benchmark on `date`. Rows with an unknown benchmark
    /// label are dropped and listed in `unmapped`.
    pub async fn bond_yields_by_date(&self, date: Date) -> Result<Categorized<BondYield>, KfcError> {
        let params = [("trdDd", krx_date(date))];

        let rows = self.fetch_records(BLD_BY_DATE, &params, RECORD_KEY).await?;
        let mut yields = Categorized::default();
        for row in &rows {
            let reader = BY_DATE.reader(row);
            let label = reader.text("ITM_TP_NM")?.unwrap_or_default();
            let Some(bond_type) = BondType::from_label(&label) else {
                yields.drop_unmapped(ProviderId::Krx, BY_DATE.endpoint, label);
                continue;
            };
            yields.push(BondYield {
                date,
                bond_type,
                yield_rate: reader.required_decimal("LST_ORD_BAS_YD")?,
                change: reader.decimal("CMP_YD")?,
            });
        }

        debug!(%date, count = yields.len(), unmapped = yields.unmapped.len(), "fetched bond yields");
        Ok(yields)
    }

    pub async fn bond_yields_by_period(
        &self,
        bond_type: BondType,
        from: Date,
        to: Date,
    ) -> Result<Vec<BondYield>, KfcError> {
        ensure_ordered(from, to)?;
        let params = [
            ("strtDd", krx_date(from)),
            ("endDd", krx_date(to)),
            ("bndKindTpCd", bond_type.code().to_owned()),
        ];

        let rows = self.fetch_records(BLD_BY_PERIOD, &params, RECORD_KEY).await?;
        let yields = rows
            .iter()
            .map(|row| {
                let reader = BY_PERIOD.reader(row);
                Ok(BondYield {
                    date: reader.required_date("DISCLS_DD")?,
                    bond_type,
                    yield_rate: reader.required_decimal("LST_ORD_BAS_YD")?,
                    change: reader.decimal("CMP_YD")?,
                })
            })
            .collect::<Result<Vec<_>, KfcError>>()?;

        debug!(?bond_type, %from, %to, count = yields.len(), "fetched bond yield history");
        Ok(yields)
    }
}
