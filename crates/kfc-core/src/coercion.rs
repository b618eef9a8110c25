//! Field-level coercion from loosely typed provider values to typed values.
//!
//! Every endpoint declares a [`PolicyTable`] that maps each response field it
//! reads to a [`FieldPolicy`]. The policy decides three things: which raw
//! strings count as "no value" (the sentinel set), whether "no value" becomes
//! `null` or zero, and how a present value is parsed. Call sites never choose
//! a default inline; they read through a [`FieldReader`] bound to the table.
//!
//! | Policy | Parsed as | Sentinel result |
//! |--------|-----------|-----------------|
//! | [`FieldPolicy::price`] | decimal, scale 2 | `null` |
//! | [`FieldPolicy::rate`] | decimal, scale 4 | `null` |
//! | [`FieldPolicy::decimal`] | decimal, raw scale | `null` |
//! | [`FieldPolicy::amount`] | decimal, scale 0 | `0` |
//! | [`FieldPolicy::count`] | integer | `0` |
//! | [`FieldPolicy::integer`] | integer | `null` |
//! | [`FieldPolicy::date`] | date in the given format | `null` |
//! | [`FieldPolicy::text`] | trimmed string | `null` |
//! | [`FieldPolicy::direction`] | up/down/unchanged code | `null` |

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use time::macros::format_description;
use time::Date;

use crate::{KfcError, ProviderId};

/// One decoded provider row before coercion.
pub type RawRecord = serde_json::Map<String, Value>;

/// Dash, empty string and a single space.
pub const DASH_OR_BLANK: &[&str] = &["-", "", " "];

/// Literal date layouts used on the provider boundary. Never auto-detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateFormat {
    /// `yyyyMMdd`
    Compact,
    /// `yyyy/MM/dd`
    Slashed,
    /// `yyyy-MM-dd`
    Dashed,
}

impl DateFormat {
    pub fn parse(self, value: &str) -> Result<Date, time::error::Parse> {
        match self {
            Self::Compact => Date::parse(value, &format_description!("[year][month][day]")),
            Self::Slashed => Date::parse(value, &format_description!("[year]/[month]/[day]")),
            Self::Dashed => Date::parse(value, &format_description!("[year]-[month]-[day]")),
        }
    }

    pub fn format(self, date: Date) -> String {
        let (separator, year, month, day) = match self {
            Self::Compact => ("", date.year(), u8::from(date.month()), date.day()),
            Self::Slashed => ("/", date.year(), u8::from(date.month()), date.day()),
            Self::Dashed => ("-", date.year(), u8::from(date.month()), date.day()),
        };
        format!("{year:04}{separator}{month:02}{separator}{day:02}")
    }

    pub const fn pattern(self) -> &'static str {
        match self {
            Self::Compact => "yyyyMMdd",
            Self::Slashed => "yyyy/MM/dd",
            Self::Dashed => "yyyy-MM-dd",
        }
    }
}

/// Price movement code carried by KRX `FLUC_TP_CD` style fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceDirection {
    Up,
    Down,
    Unchanged,
}

impl PriceDirection {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "1" => Some(Self::Up),
            "2" => Some(Self::Down),
            "3" => Some(Self::Unchanged),
            _ => None,
        }
    }
}

/// What a sentinel match (or a missing key) turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absent {
    Null,
    /// Numeric zero; empty string for text. Dates and directions stay null.
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Decimal { scale: Option<u32> },
    Integer,
    Date(DateFormat),
    Direction,
}

impl FieldKind {
    const fn describe(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Decimal { .. } => "decimal",
            Self::Integer => "integer",
            Self::Date(_) => "date",
            Self::Direction => "direction code",
        }
    }
}

/// Coercion rule for one (endpoint, field) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    pub kind: FieldKind,
    pub sentinels: &'static [&'static str],
    pub absent: Absent,
}

impl FieldPolicy {
    pub const fn new(kind: FieldKind, absent: Absent) -> Self {
        Self {
            kind,
            sentinels: DASH_OR_BLANK,
            absent,
        }
    }

    pub const fn text() -> Self {
        Self::new(FieldKind::Text, Absent::Null)
    }

    pub const fn price() -> Self {
        Self::new(FieldKind::Decimal { scale: Some(2) }, Absent::Null)
    }

    pub const fn rate() -> Self {
        Self::new(FieldKind::Decimal { scale: Some(4) }, Absent::Null)
    }

    pub const fn decimal() -> Self {
        Self::new(FieldKind::Decimal { scale: None }, Absent::Null)
    }

    pub const fn amount() -> Self {
        Self::new(FieldKind::Decimal { scale: Some(0) }, Absent::Zero)
    }

    pub const fn count() -> Self {
        Self::new(FieldKind::Integer, Absent::Zero)
    }

    pub const fn integer() -> Self {
        Self::new(FieldKind::Integer, Absent::Null)
    }

    pub const fn date(format: DateFormat) -> Self {
        Self::new(FieldKind::Date(format), Absent::Null)
    }

    pub const fn direction() -> Self {
        Self::new(FieldKind::Direction, Absent::Null)
    }

    pub const fn or_zero(mut self) -> Self {
        self.absent = Absent::Zero;
        self
    }

    pub const fn with_sentinels(mut self, sentinels: &'static [&'static str]) -> Self {
        self.sentinels = sentinels;
        self
    }

    fn is_sentinel(&self, raw: &str) -> bool {
        self.sentinels.contains(&raw) || self.sentinels.contains(&raw.trim())
    }

    fn absent_value(&self) -> FieldValue {
        match (self.absent, self.kind) {
            (Absent::Null, _) => FieldValue::Null,
            (Absent::Zero, FieldKind::Text) => FieldValue::Text(String::new()),
            (Absent::Zero, FieldKind::Decimal { .. }) => FieldValue::Decimal(Decimal::ZERO),
            (Absent::Zero, FieldKind::Integer) => FieldValue::Integer(0),
            (Absent::Zero, FieldKind::Date(_) | FieldKind::Direction) => FieldValue::Null,
        }
    }
}

/// Result of coercing one raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Text(String),
    Decimal(Decimal),
    Integer(i64),
    Date(Date),
    Direction(PriceDirection),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot read '{value}' as {expected}")]
pub struct CoercionError {
    pub value: String,
    pub expected: &'static str,
}

/// Coerces one raw value. A missing key or JSON `null` counts as a sentinel match.
pub fn coerce(raw: Option<&Value>, policy: &FieldPolicy) -> Result<FieldValue, CoercionError> {
    let text = match raw {
        None | Some(Value::Null) => return Ok(policy.absent_value()),
        Some(Value::String(value)) => value.clone(),
        Some(Value::Number(value)) => value.to_string(),
        Some(Value::Bool(value)) => value.to_string(),
        Some(other) => {
            return Err(CoercionError {
                value: other.to_string(),
                expected: policy.kind.describe(),
            })
        }
    };

    if policy.is_sentinel(&text) {
        return Ok(policy.absent_value());
    }

    coerce_str(&text, policy.kind)
}

fn coerce_str(raw: &str, kind: FieldKind) -> Result<FieldValue, CoercionError> {
    let invalid = || CoercionError {
        value: raw.to_owned(),
        expected: kind.describe(),
    };

    match kind {
        FieldKind::Text => Ok(FieldValue::Text(raw.trim().to_owned())),
        FieldKind::Decimal { scale } => {
            let value = parse_decimal(raw).ok_or_else(invalid)?;
            Ok(FieldValue::Decimal(match scale {
                Some(scale) => with_scale(value, scale),
                None => value,
            }))
        }
        FieldKind::Integer => {
            let cleaned = strip_separators(raw);
            if let Ok(value) = cleaned.parse::<i64>() {
                return Ok(FieldValue::Integer(value));
            }
            // integral values occasionally arrive as "1200.00"
            parse_decimal(raw)
                .filter(|value| value.fract().is_zero())
                .and_then(|value| i64::try_from(value).ok())
                .map(FieldValue::Integer)
                .ok_or_else(invalid)
        }
        FieldKind::Date(format) => format
            .parse(raw.trim())
            .map(FieldValue::Date)
            .map_err(|_| invalid()),
        FieldKind::Direction => Ok(PriceDirection::from_code(raw)
            .map(FieldValue::Direction)
            .unwrap_or(FieldValue::Null)),
    }
}

fn strip_separators(raw: &str) -> String {
    raw.replace(',', "").trim().to_owned()
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&strip_separators(raw)).ok()
}

fn with_scale(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    rounded
}

/// Per-endpoint declaration of every field the endpoint reads.
#[derive(Debug, Clone, Copy)]
pub struct PolicyTable {
    pub provider: ProviderId,
    pub endpoint: &'static str,
    fields: &'static [(&'static str, FieldPolicy)],
}

impl PolicyTable {
    pub const fn new(
        provider: ProviderId,
        endpoint: &'static str,
        fields: &'static [(&'static str, FieldPolicy)],
    ) -> Self {
        Self {
            provider,
            endpoint,
            fields,
        }
    }

    pub fn policy(&self, field: &str) -> Option<&FieldPolicy> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, policy)| policy)
    }

    pub fn reader<'a>(&'a self, record: &'a RawRecord) -> FieldReader<'a> {
        FieldReader {
            record,
            table: self,
        }
    }
}

impl Display for PolicyTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider, self.endpoint)
    }
}

/// Typed view of one [`RawRecord`] through its endpoint's [`PolicyTable`].
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    record: &'a RawRecord,
    table: &'a PolicyTable,
}

impl<'a> FieldReader<'a> {
    pub fn value(&self, field: &str) -> Result<FieldValue, KfcError> {
        let policy = self.table.policy(field).ok_or_else(|| {
            KfcError::decode(
                self.table.provider,
                format!("no field policy declared for {}.{field}", self.table.endpoint),
            )
        })?;
        coerce(self.record.get(field), policy).map_err(|error| {
            KfcError::decode_with(
                self.table.provider,
                format!("{}.{field}", self.table.endpoint),
                error,
            )
        })
    }

    pub fn text(&self, field: &str) -> Result<Option<String>, KfcError> {
        match self.value(field)? {
            FieldValue::Null => Ok(None),
            FieldValue::Text(value) => Ok(Some(value)),
            other => Err(self.mismatch(field, "text", &other)),
        }
    }

    pub fn decimal(&self, field: &str) -> Result<Option<Decimal>, KfcError> {
        match self.value(field)? {
            FieldValue::Null => Ok(None),
            FieldValue::Decimal(value) => Ok(Some(value)),
            FieldValue::Integer(value) => Ok(Some(Decimal::from(value))),
            other => Err(self.mismatch(field, "decimal", &other)),
        }
    }

    pub fn int(&self, field: &str) -> Result<Option<i64>, KfcError> {
        match self.value(field)? {
            FieldValue::Null => Ok(None),
            FieldValue::Integer(value) => Ok(Some(value)),
            other => Err(self.mismatch(field, "integer", &other)),
        }
    }

    pub fn date(&self, field: &str) -> Result<Option<Date>, KfcError> {
        match self.value(field)? {
            FieldValue::Null => Ok(None),
            FieldValue::Date(value) => Ok(Some(value)),
            other => Err(self.mismatch(field, "date", &other)),
        }
    }

    pub fn direction(&self, field: &str) -> Result<Option<PriceDirection>, KfcError> {
        match self.value(field)? {
            FieldValue::Null => Ok(None),
            FieldValue::Direction(value) => Ok(Some(value)),
            other => Err(self.mismatch(field, "direction code", &other)),
        }
    }

    pub fn required_text(&self, field: &str) -> Result<String, KfcError> {
        self.text(field)?.ok_or_else(|| self.missing(field))
    }

    pub fn required_decimal(&self, field: &str) -> Result<Decimal, KfcError> {
        self.decimal(field)?.ok_or_else(|| self.missing(field))
    }

    pub fn required_int(&self, field: &str) -> Result<i64, KfcError> {
        self.int(field)?.ok_or_else(|| self.missing(field))
    }

    pub fn required_date(&self, field: &str) -> Result<Date, KfcError> {
        self.date(field)?.ok_or_else(|| self.missing(field))
    }

    fn missing(&self, field: &str) -> KfcError {
        KfcError::decode(
            self.table.provider,
            format!("{}.{field} has no value", self.table.endpoint),
        )
    }

    fn mismatch(&self, field: &str, requested: &str, actual: &FieldValue) -> KfcError {
        KfcError::decode(
            self.table.provider,
            format!(
                "{}.{field} read as {requested} but its policy yields {actual:?}",
                self.table.endpoint
            ),
        )
    }
}
