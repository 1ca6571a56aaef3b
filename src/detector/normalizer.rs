use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::Transaction;

/// A raw ledger row as supplied by the upstream statement export.
/// Inflow columns are ignored; only outflows feed detection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub description: String,
    pub money_out: Option<Decimal>,
}

/// Convert raw ledger rows into canonical transactions.
///
/// Rows without a positive outflow are dropped. Statement descriptions
/// often carry a trailing transaction-date fragment ("NETFLIX.COM 14/02 ...")
/// that varies per occurrence and would break exact-key grouping, so
/// everything from the first ` DD/MM` onwards is stripped.
pub fn normalize_rows(rows: Vec<LedgerRow>) -> Vec<Transaction> {
    let trailing_date = Regex::new(r"\s\d{2}/\d{2}.*$").expect("static pattern");

    let transactions: Vec<Transaction> = rows
        .into_iter()
        .filter_map(|row| {
            let amount = row.money_out?;
            if amount <= Decimal::ZERO {
                return None;
            }
            let description = trailing_date.replace(&row.description, "").into_owned();
            Some(Transaction {
                description,
                amount,
                date: row.date,
            })
        })
        .collect();

    debug!("Normalized {} ledger rows", transactions.len());
    transactions
}
