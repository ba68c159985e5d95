//! Request payload helpers shared by the transaction routes.
//!
//! Amounts arrive as raw JSON values so that a fractional or non-numeric
//! point amount is reported as `INVALID_AMOUNT` rather than a generic
//! deserialization failure. Money is read from the number's text, never
//! through a float.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use stellar_core::LedgerError;
use stellar_core::ledger::{AmountOperator, TransactionFilter, TransactionKind};
use stellar_shared::types::{PageRequest, PromotionId};

use crate::error::ApiError;

/// Reads a required integer point amount.
pub fn points(value: Option<&Value>, field: &str) -> Result<i64, ApiError> {
    match value {
        None | Some(Value::Null) => Err(ApiError::validation(format!("{field} is required"))),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| {
            LedgerError::InvalidAmount(format!("{field} must be an integer, got {n}")).into()
        }),
        Some(other) => Err(LedgerError::InvalidAmount(format!(
            "{field} must be an integer, got {other}"
        ))
        .into()),
    }
}

/// Reads a required money amount from a JSON number or numeric string.
pub fn money(value: Option<&Value>, field: &str) -> Result<Decimal, ApiError> {
    let text = match value {
        None | Some(Value::Null) => {
            return Err(ApiError::validation(format!("{field} is required")));
        }
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    };
    Decimal::from_str(&text)
        .map_err(|_| LedgerError::InvalidAmount(format!("{field} must be a number, got {text}")).into())
}

/// Query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    /// Owner handle or name contains.
    pub name: Option<String>,
    /// Creator handle.
    pub created_by: Option<String>,
    /// Suspicious flag.
    pub suspicious: Option<bool>,
    /// Applied promotion.
    pub promotion_id: Option<i64>,
    /// Kind.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Cross-reference.
    pub related_id: Option<i64>,
    /// Amount bound.
    pub amount: Option<i64>,
    /// `gte` or `lte`; required with `amount`.
    pub operator: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (default: 10, max: 100).
    pub limit: Option<u32>,
}

impl ListTransactionsQuery {
    /// Converts the query into a ledger filter and page window.
    pub fn into_filter(self) -> Result<(TransactionFilter, PageRequest), ApiError> {
        let kind = self
            .kind
            .as_deref()
            .map(|raw| {
                TransactionKind::parse(raw)
                    .ok_or_else(|| ApiError::validation(format!("unknown transaction type {raw}")))
            })
            .transpose()?;

        let operator = match (self.amount, self.operator.as_deref()) {
            (Some(_), None) => {
                return Err(ApiError::validation("operator is required with amount"));
            }
            (_, Some(raw)) => AmountOperator::parse(raw)
                .ok_or_else(|| ApiError::validation(format!("operator must be gte or lte, got {raw}")))?,
            (None, None) => AmountOperator::default(),
        };

        let filter = TransactionFilter {
            name: self.name.filter(|n| !n.trim().is_empty()),
            created_by: self.created_by.filter(|c| !c.trim().is_empty()),
            suspicious: self.suspicious,
            kind,
            related_id: self.related_id,
            promotion_id: self.promotion_id.map(PromotionId::new),
            amount: self.amount,
            operator,
        };
        Ok((filter, PageRequest::from_query(self.page, self.limit)))
    }
}
