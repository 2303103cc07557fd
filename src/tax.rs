//! The tax adjustment applied to every income or expense entry.
//!
//! [calculate_total] is the only place the tax-adjusted total is derived.
//! The server calls it before every insert and update, and clients can link
//! against it to preview a total, so both always agree on the same inputs.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

/// How the tax amount of an entry is applied to its amount.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxType {
    /// The tax amount is added to the amount as is.
    #[default]
    Flat,
    /// The tax amount is a percentage of the amount.
    Percentage,
}

impl TaxType {
    /// The name used for the tax type in the database and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxType::Flat => "flat",
            TaxType::Percentage => "percentage",
        }
    }
}

impl Display for TaxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaxType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "flat" => Ok(TaxType::Flat),
            "percentage" => Ok(TaxType::Percentage),
            other => Err(format!("invalid tax type \"{other}\"")),
        }
    }
}

impl ToSql for TaxType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TaxType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        TaxType::try_from(value.as_str()?).map_err(|error| FromSqlError::Other(error.into()))
    }
}

/// Calculate the total of `amount` after applying `tax_amount` as `tax_type`.
///
/// - Flat: `amount + tax_amount`
/// - Percentage: `amount + amount * tax_amount / 100`
///
/// The result is not rounded. Use [round_for_display] when presenting it.
///
/// # Examples
///
/// ```
/// use expense_tracker::{TaxType, calculate_total};
///
/// assert_eq!(calculate_total(10.0, TaxType::Flat, 2.5), 12.5);
/// assert_eq!(calculate_total(200.0, TaxType::Percentage, 15.0), 230.0);
/// ```
pub fn calculate_total(amount: f64, tax_type: TaxType, tax_amount: f64) -> f64 {
    match tax_type {
        TaxType::Flat => amount + tax_amount,
        TaxType::Percentage => amount + amount * tax_amount / 100.0,
    }
}

/// Round `value` to two decimal places for presentation.
///
/// Stored totals are never rounded.
pub fn round_for_display(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
