//! Transaction primitives.
//!
//! A `Transaction` is a single recorded incoming or outgoing amount in a
//! given currency. Transactions are immutable once created; the only bulk
//! mutation is wholesale replacement from a cloud pull.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CurrencyCode, LedgerError, ResultLedger};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Incoming,
    Outgoing,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incoming => "INCOMING",
            Self::Outgoing => "OUTGOING",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "INCOMING" => Ok(Self::Incoming),
            "OUTGOING" => Ok(Self::Outgoing),
            other => Err(LedgerError::InvalidKind(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Opaque locally-unique id (uuid v4).
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub currency: CurrencyCode,
    pub description: String,
}

/// A transaction the extractor produced before an id is assigned.
#[derive(Clone, Debug, PartialEq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: f64,
    pub currency: CurrencyCode,
    pub description: String,
}

impl NewTransaction {
    pub fn new(
        kind: TransactionKind,
        amount: f64,
        currency: CurrencyCode,
        description: String,
    ) -> ResultLedger<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(LedgerError::InvalidAmount(format!(
                "amount must be a non-negative number, got {amount}"
            )));
        }
        Ok(Self {
            kind,
            amount,
            currency,
            description,
        })
    }

    /// Promotes the draft into a stored transaction with a fresh id.
    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: Uuid::new_v4().to_string(),
            kind: self.kind,
            amount: self.amount,
            currency: self.currency,
            description: self.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrips_through_wire_names() {
        assert_eq!(
            TransactionKind::try_from("incoming").unwrap(),
            TransactionKind::Incoming
        );
        assert_eq!(TransactionKind::Outgoing.as_str(), "OUTGOING");
        assert!(TransactionKind::try_from("sideways").is_err());
    }

    #[test]
    fn draft_rejects_negative_and_non_finite_amounts() {
        let usd = CurrencyCode::usd();
        assert!(
            NewTransaction::new(TransactionKind::Incoming, -1.0, usd.clone(), String::new())
                .is_err()
        );
        assert!(
            NewTransaction::new(TransactionKind::Incoming, f64::NAN, usd.clone(), String::new())
                .is_err()
        );
        assert!(
            NewTransaction::new(TransactionKind::Incoming, 0.0, usd, String::new()).is_ok()
        );
    }

    #[test]
    fn transaction_serializes_with_wire_field_names() {
        let tx = NewTransaction::new(
            TransactionKind::Incoming,
            100.0,
            CurrencyCode::usd(),
            "salary".to_string(),
        )
        .unwrap()
        .into_transaction();

        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "INCOMING");
        assert_eq!(value["currency"], "USD");
        assert_eq!(value["amount"], 100.0);
    }
}
