//! Cloud sync adapter.
//!
//! Best-effort push/pull against the sync REST API. Every method swallows
//! transport and protocol failures into `false`/`None` so the caller can
//! degrade to an error status without ever blocking the user. Nothing is
//! retried.

use api_types::sync::{RatesUpdate, SyncRequest, UserData};
use api_types::transaction::{TransactionDto, TransactionKind as ApiKind};
use ledger::{CurrencyCode, ExchangeRates, LedgerError, Transaction, TransactionKind};

fn map_kind(kind: TransactionKind) -> ApiKind {
    match kind {
        TransactionKind::Incoming => ApiKind::Incoming,
        TransactionKind::Outgoing => ApiKind::Outgoing,
    }
}

fn map_api_kind(kind: ApiKind) -> TransactionKind {
    match kind {
        ApiKind::Incoming => TransactionKind::Incoming,
        ApiKind::Outgoing => TransactionKind::Outgoing,
    }
}

fn to_dto(tx: &Transaction) -> TransactionDto {
    TransactionDto {
        id: tx.id.clone(),
        kind: map_kind(tx.kind),
        amount: tx.amount,
        currency: tx.currency.as_str().to_string(),
        description: tx.description.clone(),
    }
}

fn from_dto(dto: TransactionDto) -> Result<Transaction, LedgerError> {
    Ok(Transaction {
        id: dto.id,
        kind: map_api_kind(dto.kind),
        amount: dto.amount,
        currency: CurrencyCode::try_from(dto.currency.as_str())?,
        description: dto.description,
    })
}

fn decode_user_data(data: UserData) -> Result<(Vec<Transaction>, ExchangeRates), LedgerError> {
    let transactions = data
        .transactions
        .into_iter()
        .map(from_dto)
        .collect::<Result<Vec<_>, _>>()?;
    let rates = data
        .rates
        .into_iter()
        .map(|(code, rate)| Ok((CurrencyCode::try_from(code.as_str())?, rate)))
        .collect::<Result<ExchangeRates, LedgerError>>()?;
    Ok((transactions, rates))
}

#[derive(Debug, Clone)]
pub struct CloudClient {
    http: reqwest::Client,
    base_url: String,
}

impl CloudClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Pushes the whole transaction list. `false` on any failure.
    pub async fn sync(&self, user_id: &str, transactions: &[Transaction]) -> bool {
        let payload = SyncRequest {
            user_id: user_id.to_string(),
            transactions: transactions.iter().map(to_dto).collect(),
        };

        match self
            .http
            .post(self.url("/api/transactions/sync"))
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!("cloud sync rejected: {}", response.status());
                false
            }
            Err(err) => {
                tracing::warn!("cloud sync failed: {err}");
                false
            }
        }
    }

    /// Pulls the remote copy. `None` on any failure; a successful pull is
    /// meant to replace local state wholesale (last-fetch-wins).
    pub async fn fetch(&self, user_id: &str) -> Option<(Vec<Transaction>, ExchangeRates)> {
        let response = match self
            .http
            .get(self.url(&format!("/api/user-data/{user_id}")))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!("cloud fetch rejected: {}", response.status());
                return None;
            }
            Err(err) => {
                tracing::warn!("cloud fetch failed: {err}");
                return None;
            }
        };

        let data = match response.json::<UserData>().await {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!("cloud fetch returned malformed payload: {err}");
                return None;
            }
        };

        match decode_user_data(data) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                tracing::warn!("cloud fetch returned invalid data: {err}");
                None
            }
        }
    }

    /// Pushes the whole rate table. `false` on any failure.
    pub async fn update_rates(&self, user_id: &str, rates: &ExchangeRates) -> bool {
        let payload = RatesUpdate {
            user_id: user_id.to_string(),
            rates: rates
                .iter()
                .map(|(code, rate)| (code.as_str().to_string(), rate))
                .collect(),
        };

        match self
            .http
            .post(self.url("/api/rates/update"))
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!("rates update rejected: {}", response.status());
                false
            }
            Err(err) => {
                tracing::warn!("rates update failed: {err}");
                false
            }
        }
    }
}
