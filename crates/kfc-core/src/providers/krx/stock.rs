use time::Date;
use tracing::debug;

use super::{krx_date, KrxAdapter};
use crate::category::Categorized;
use crate::coercion::{FieldPolicy, PolicyTable};
use crate::domain::{ListingStatus, SectorClassification, StockListing, StockMarket};
use crate::{KfcError, ProviderId};

const BLD_LISTED: &str = "dbms/comm/finder/finder_stkisu";
const BLD_DELISTED: &str = "dbms/comm/finder/finder_listdelisu";
const BLD_SECTORS: &str = "dbms/MDC/STAT/standard/MDCSTAT03901";

const STOCK_FINDER: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "finder_stkisu",
    &[
        ("full_code", FieldPolicy::text()),
        ("short_code", FieldPolicy::text()),
        ("codeName", FieldPolicy::text()),
        ("marketCode", FieldPolicy::text()),
    ],
);

const SECTORS: PolicyTable = PolicyTable::new(
    ProviderId::Krx,
    "MDCSTAT03901",
    &[
        ("ISU_SRT_CD", FieldPolicy::text()),
        ("ISU_ABBRV", FieldPolicy::text()),
        ("IDX_IND_NM", FieldPolicy::text()),
        ("TDD_CLSPRC", FieldPolicy::integer()),
        ("MKTCAP", FieldPolicy::integer()),
        ("FLUC_TP_CD", FieldPolicy::direction()),
    ],
);

impl KrxAdapter {
    /// Lists equities. Rows whose market code is not a concrete market are
    /// dropped and reported in `unmapped`.
    pub async fn stock_list(
        &self,
        market: StockMarket,
        status: ListingStatus,
    ) -> Result<Categorized<StockListing>, KfcError> {
        let bld = match status {
            ListingStatus::Listed => BLD_LISTED,
            ListingStatus::Delisted => BLD_DELISTED,
        };
        let params = [
            ("mktsel", market.code().to_owned()),
            ("searchText", String::new()),
            ("typeNo", String::from("0")),
        ];

        let rows = self.fetch_records(bld, &params, "block1").await?;
        let mut listings = Categorized::default();
        for row in &rows {
            let reader = STOCK_FINDER.reader(row);
            let market_code = reader.text("marketCode")?.unwrap_or_default();
            let Some(record_market) = StockMarket::from_code(&market_code) else {
                listings.drop_unmapped(ProviderId::Krx, STOCK_FINDER.endpoint, market_code);
                continue;
            };
            listings.push(StockListing {
                ticker: reader.required_text("short_code")?,
                name: reader.required_text("codeName")?,
                isin: reader.required_text("full_code")?,
                market: record_market,
                status,
            });
        }

        debug!(?market, ?status, count = listings.len(), "fetched stock list");
        Ok(listings)
    }

    pub async fn sector_classifications(
        &self,
        date: Date,
        market: StockMarket,
    ) -> Result<Vec<SectorClassification>, KfcError> {
        let params = [("trdDd", krx_date(date)), ("mktId", market.code().to_owned())];

        let rows = self.fetch_records(BLD_SECTORS, &params, "block1").await?;
        let sectors = rows
            .iter()
            .map(|row| {
                let reader = SECTORS.reader(row);
                Ok(SectorClassification {
                    ticker: reader.required_text("ISU_SRT_CD")?,
                    name: reader.required_text("ISU_ABBRV")?,
                    market,
                    industry: reader.text("IDX_IND_NM")?.unwrap_or_default(),
                    close_price: reader.int("TDD_CLSPRC")?,
                    market_cap: reader.int("MKTCAP")?,
                    direction: reader.direction("FLUC_TP_CD")?,
                })
            })
            .collect::<Result<Vec<_>, KfcError>>()?;

        debug!(%date, ?market, count = sectors.len(), "fetched sector classifications");
        Ok(sectors)
    }
}
