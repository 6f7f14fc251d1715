//! The `user_data` table and the three sync endpoints.
//!
//! One row per user. The transaction list and rate table are stored as
//! JSON blobs and overwritten wholesale on every write: the sync contract
//! is last-writer-wins with no merge or versioning. `updated_at` exists
//! for observability only.

use api_types::sync::{RatesUpdate, SyncRequest, UserData};
use api_types::transaction::TransactionDto;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use ledger::{CurrencyCode, ExchangeRates};
use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{ServerError, server::ServerState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_data")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub transactions: String,
    pub rates: String,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn validate_transactions(transactions: &[TransactionDto]) -> Result<(), ServerError> {
    for tx in transactions {
        CurrencyCode::try_from(tx.currency.as_str())
            .map_err(|err| ServerError::Generic(err.to_string()))?;
        if !tx.amount.is_finite() || tx.amount < 0.0 {
            return Err(ServerError::Generic(format!(
                "amount must be a non-negative number, got {}",
                tx.amount
            )));
        }
    }
    Ok(())
}

fn validate_rates(rates: &api_types::sync::RatesDto) -> Result<(), ServerError> {
    let mut table = ExchangeRates::default();
    for (code, rate) in rates {
        let code = CurrencyCode::try_from(code.as_str())
            .map_err(|err| ServerError::Generic(err.to_string()))?;
        table
            .set(code, *rate)
            .map_err(|err| ServerError::Generic(err.to_string()))?;
    }
    Ok(())
}

fn seed_rates_blob() -> Result<String, ServerError> {
    serde_json::to_string(&ExchangeRates::seed())
        .map_err(|err| ServerError::Internal(err.to_string()))
}

/// `POST /api/transactions/sync`: overwrite the stored transaction blob.
pub async fn sync(
    State(state): State<ServerState>,
    Json(payload): Json<SyncRequest>,
) -> Result<StatusCode, ServerError> {
    validate_transactions(&payload.transactions)?;
    let blob = serde_json::to_string(&payload.transactions)
        .map_err(|err| ServerError::Internal(err.to_string()))?;

    match Entity::find_by_id(payload.user_id.as_str())
        .one(&state.db)
        .await?
    {
        Some(model) => {
            let mut model: ActiveModel = model.into();
            model.transactions = ActiveValue::Set(blob);
            model.updated_at = ActiveValue::Set(Utc::now());
            model.update(&state.db).await?;
        }
        None => {
            let model = ActiveModel {
                user_id: ActiveValue::Set(payload.user_id),
                transactions: ActiveValue::Set(blob),
                rates: ActiveValue::Set(seed_rates_blob()?),
                updated_at: ActiveValue::Set(Utc::now()),
            };
            model.insert(&state.db).await?;
        }
    }

    Ok(StatusCode::OK)
}

/// `GET /api/user-data/{user_id}`: the stored blobs, or 404 for a user
/// that has never synced.
pub async fn fetch(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserData>, ServerError> {
    let model = Entity::find_by_id(user_id.as_str())
        .one(&state.db)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("user data for \"{user_id}\"")))?;

    let transactions = serde_json::from_str(&model.transactions)
        .map_err(|err| ServerError::Internal(format!("corrupt transactions blob: {err}")))?;
    let rates = serde_json::from_str(&model.rates)
        .map_err(|err| ServerError::Internal(format!("corrupt rates blob: {err}")))?;

    Ok(Json(UserData {
        transactions,
        rates,
    }))
}

/// `POST /api/rates/update`: overwrite the stored rate table.
pub async fn update_rates(
    State(state): State<ServerState>,
    Json(payload): Json<RatesUpdate>,
) -> Result<StatusCode, ServerError> {
    validate_rates(&payload.rates)?;
    let blob = serde_json::to_string(&payload.rates)
        .map_err(|err| ServerError::Internal(err.to_string()))?;

    match Entity::find_by_id(payload.user_id.as_str())
        .one(&state.db)
        .await?
    {
        Some(model) => {
            let mut model: ActiveModel = model.into();
            model.rates = ActiveValue::Set(blob);
            model.updated_at = ActiveValue::Set(Utc::now());
            model.update(&state.db).await?;
        }
        None => {
            let model = ActiveModel {
                user_id: ActiveValue::Set(payload.user_id),
                transactions: ActiveValue::Set("[]".to_string()),
                rates: ActiveValue::Set(blob),
                updated_at: ActiveValue::Set(Utc::now()),
            };
            model.insert(&state.db).await?;
        }
    }

    Ok(StatusCode::OK)
}
