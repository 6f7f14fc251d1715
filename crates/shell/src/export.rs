//! Spreadsheet export of the transaction list.

use std::path::Path;

use csv::Writer;
use ledger::Transaction;
use serde::Serialize;

use crate::Result;

#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    amount: f64,
    currency: &'a str,
    description: &'a str,
    id: &'a str,
}

pub(crate) fn write_csv(transactions: &[Transaction], path: &Path) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    for tx in transactions {
        writer.serialize(ExportRow {
            kind: tx.kind.as_str(),
            amount: tx.amount,
            currency: tx.currency.as_str(),
            description: &tx.description,
            id: &tx.id,
        })?;
    }
    writer.flush()?;
    Ok(())
}
