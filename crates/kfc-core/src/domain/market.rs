use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// KRX equity market (`mktsel` / `mktId` / `marketCode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockMarket {
    Kospi,
    Kosdaq,
    Konex,
    All,
}

impl StockMarket {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Kospi => "STK",
            Self::Kosdaq => "KSQ",
            Self::Konex => "KNX",
            Self::All => "ALL",
        }
    }

    /// Maps a concrete market code. `ALL` is a query scope, never a record value.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "STK" => Some(Self::Kospi),
            "KSQ" => Some(Self::Kosdaq),
            "KNX" => Some(Self::Konex),
            _ => None,
        }
    }
}

impl FromStr for StockMarket {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "kospi" | "stk" => Ok(Self::Kospi),
            "kosdaq" | "ksq" => Ok(Self::Kosdaq),
            "konex" | "knx" => Ok(Self::Konex),
            "all" => Ok(Self::All),
            _ => Err(ValidationError::InvalidValue {
                field: "market",
                value: value.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Listed,
    Delisted,
}

impl FromStr for ListingStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "listed" => Ok(Self::Listed),
            "delisted" => Ok(Self::Delisted),
            _ => Err(ValidationError::InvalidValue {
                field: "status",
                value: value.to_owned(),
            }),
        }
    }
}

/// Index family (`idxIndMidclssCd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMarket {
    Kospi,
    Kosdaq,
    Derivatives,
    All,
}

impl IndexMarket {
    /// Concrete partitions of [`IndexMarket::All`], in merge order.
    pub const PARTITIONS: &'static [IndexMarket] = &[Self::Kospi, Self::Kosdaq, Self::Derivatives];

    /// `None` for [`IndexMarket::All`], which has no code of its own.
    pub const fn code(self) -> Option<&'static str> {
        match self {
            Self::Kospi => Some("02"),
            Self::Kosdaq => Some("03"),
            Self::Derivatives => Some("04"),
            Self::All => None,
        }
    }
}

impl FromStr for IndexMarket {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "kospi" => Ok(Self::Kospi),
            "kosdaq" => Ok(Self::Kosdaq),
            "derivatives" => Ok(Self::Derivatives),
            "all" => Ok(Self::All),
            _ => Err(ValidationError::InvalidValue {
                field: "index market",
                value: value.to_owned(),
            }),
        }
    }
}

/// Exchange-traded product group (`secugrpId`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundType {
    Etf,
    Reit,
    Etn,
    Elw,
}

impl FundType {
    /// Partition order used when no fund type is given.
    pub const ALL: &'static [FundType] = &[Self::Etf, Self::Reit, Self::Etn, Self::Elw];

    pub const fn security_group_id(self) -> &'static str {
        match self {
            Self::Etf => "EF",
            Self::Reit => "BC",
            Self::Etn => "EN",
            Self::Elw => "EW",
        }
    }

    /// `inqCond` on the short selling report. Same codes as `secugrpId`.
    pub const fn inquiry_condition(self) -> &'static str {
        self.security_group_id()
    }

    /// `mktTpCd` on the short balance report.
    pub const fn market_type_code(self) -> &'static str {
        match self {
            Self::Etf => "2",
            Self::Reit => "3",
            Self::Etn => "4",
            Self::Elw => "5",
        }
    }
}

impl FromStr for FundType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "etf" => Ok(Self::Etf),
            "reit" => Ok(Self::Reit),
            "etn" => Ok(Self::Etn),
            "elw" => Ok(Self::Elw),
            _ => Err(ValidationError::InvalidValue {
                field: "fund type",
                value: value.to_owned(),
            }),
        }
    }
}

/// Bond benchmark published by the KRX bond market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondType {
    Treasury1Y,
    Treasury2Y,
    Treasury3Y,
    Treasury5Y,
    Treasury10Y,
    Treasury20Y,
    Treasury30Y,
    NationalHousing5Y,
    CorporateAaMinus,
    CorporateBbbMinus,
    Cd91,
}

impl BondType {
    pub const ALL: &'static [BondType] = &[
        Self::Treasury1Y,
        Self::Treasury2Y,
        Self::Treasury3Y,
        Self::Treasury5Y,
        Self::Treasury10Y,
        Self::Treasury20Y,
        Self::Treasury30Y,
        Self::NationalHousing5Y,
        Self::CorporateAaMinus,
        Self::CorporateBbbMinus,
        Self::Cd91,
    ];

    /// Request code (`bndKindTpCd`).
    pub const fn code(self) -> &'static str {
        match self {
            Self::Treasury1Y => "국고채1년",
            Self::Treasury2Y => "국고채2년",
            Self::Treasury3Y => "국고채3년",
            Self::Treasury5Y => "국고채5년",
            Self::Treasury10Y => "국고채10년",
            Self::Treasury20Y => "국고채20년",
            Self::Treasury30Y => "국고채30년",
            Self::NationalHousing5Y => "국민주택1종5년",
            Self::CorporateAaMinus => "회사채AA",
            Self::CorporateBbbMinus => "회사채BBB",
            Self::Cd91 => "CD",
        }
    }

    /// Label used in response `ITM_TP_NM` fields.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Treasury1Y => "국고채 1년",
            Self::Treasury2Y => "국고채 2년",
            Self::Treasury3Y => "국고채 3년",
            Self::Treasury5Y => "국고채 5년",
            Self::Treasury10Y => "국고채 10년",
            Self::Treasury20Y => "국고채 20년",
            Self::Treasury30Y => "국고채 30년",
            Self::NationalHousing5Y => "국민주택 1종 5년",
            Self::CorporateAaMinus => "회사채 AA-(무보증 3년)",
            Self::CorporateBbbMinus => "회사채 BBB- (무보증 3년)",
            Self::Cd91 => "CD(91일)",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.iter().copied().find(|kind| kind.label() == label)
    }
}

impl FromStr for BondType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let by_alias = match trimmed.to_ascii_lowercase().as_str() {
            "ktb1y" => Some(Self::Treasury1Y),
            "ktb2y" => Some(Self::Treasury2Y),
            "ktb3y" => Some(Self::Treasury3Y),
            "ktb5y" => Some(Self::Treasury5Y),
            "ktb10y" => Some(Self::Treasury10Y),
            "ktb20y" => Some(Self::Treasury20Y),
            "ktb30y" => Some(Self::Treasury30Y),
            "housing5y" => Some(Self::NationalHousing5Y),
            "corp-aa" => Some(Self::CorporateAaMinus),
            "corp-bbb" => Some(Self::CorporateBbbMinus),
            "cd91" | "cd" => Some(Self::Cd91),
            _ => None,
        };
        by_alias
            .or_else(|| Self::ALL.iter().copied().find(|kind| kind.code() == trimmed))
            .or_else(|| Self::from_label(trimmed))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "bond type",
                value: value.to_owned(),
            })
    }
}

/// OPENDART periodic report (`reprt_code`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCode {
    Annual,
    HalfYear,
    FirstQuarter,
    ThirdQuarter,
}

impl ReportCode {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Annual => "11011",
            Self::HalfYear => "11012",
            Self::FirstQuarter => "11013",
            Self::ThirdQuarter => "11014",
        }
    }
}

impl Display for ReportCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ReportCode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "annual" | "11011" => Ok(Self::Annual),
            "half" | "half-year" | "11012" => Ok(Self::HalfYear),
            "q1" | "11013" => Ok(Self::FirstQuarter),
            "q3" | "11014" => Ok(Self::ThirdQuarter),
            _ => Err(ValidationError::InvalidValue {
                field: "report code",
                value: value.to_owned(),
            }),
        }
    }
}

/// Consolidated or separate statements (`fs_div`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementScope {
    Consolidated,
    Separate,
}

impl StatementScope {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Consolidated => "CFS",
            Self::Separate => "OFS",
        }
    }
}

impl FromStr for StatementScope {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "consolidated" | "cfs" => Ok(Self::Consolidated),
            "separate" | "ofs" => Ok(Self::Separate),
            _ => Err(ValidationError::InvalidValue {
                field: "statement scope",
                value: value.to_owned(),
            }),
        }
    }
}

/// Statement a financial line belongs to (`sj_div`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    IncomeStatement,
    BalanceSheet,
    CashFlow,
}

impl StatementKind {
    pub const ALL: &'static [StatementKind] =
        &[Self::IncomeStatement, Self::BalanceSheet, Self::CashFlow];

    pub const fn code(self) -> &'static str {
        match self {
            Self::IncomeStatement => "IS",
            Self::BalanceSheet => "BS",
            Self::CashFlow => "CF",
        }
    }

    /// Other divisions (`CIS`, `SCE`) have no kind.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code.trim())
    }
}

impl FromStr for StatementKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" | "is" => Ok(Self::IncomeStatement),
            "balance" | "bs" => Ok(Self::BalanceSheet),
            "cash-flow" | "cf" => Ok(Self::CashFlow),
            _ => Err(ValidationError::InvalidValue {
                field: "statement kind",
                value: value.to_owned(),
            }),
        }
    }
}
