use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum TransactionKind {
        Incoming,
        Outgoing,
    }

    /// A transaction as it appears on the wire.
    ///
    /// The kind is serialized under the legacy field name `type`.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct TransactionDto {
        pub id: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub amount: f64,
        pub currency: String,
        pub description: String,
    }
}

pub mod sync {
    use super::*;
    use crate::transaction::TransactionDto;

    /// Rates travel as a plain JSON object `{code: units-per-USD}`.
    pub type RatesDto = BTreeMap<String, f64>;

    /// Body of `POST /api/transactions/sync`.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SyncRequest {
        pub user_id: String,
        pub transactions: Vec<TransactionDto>,
    }

    /// Body of `POST /api/rates/update`.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RatesUpdate {
        pub user_id: String,
        pub rates: RatesDto,
    }

    /// Response of `GET /api/user-data/{userId}`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserData {
        pub transactions: Vec<TransactionDto>,
        pub rates: RatesDto,
    }
}

#[cfg(test)]
mod tests {
    use super::sync::SyncRequest;
    use super::transaction::{TransactionDto, TransactionKind};

    #[test]
    fn sync_request_uses_camel_case_and_legacy_type_field() {
        let request = SyncRequest {
            user_id: "user-1".to_string(),
            transactions: vec![TransactionDto {
                id: "t1".to_string(),
                kind: TransactionKind::Incoming,
                amount: 100.0,
                currency: "USD".to_string(),
                description: "salary".to_string(),
            }],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("userId").is_some());
        assert_eq!(value["transactions"][0]["type"], "INCOMING");
    }
}
