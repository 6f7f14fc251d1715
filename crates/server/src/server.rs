use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;

use crate::user_data;

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
}

/// The sync API carries no authentication: identity is the `userId` in the
/// body/path, exactly as the consuming client expects.
pub(crate) fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/transactions/sync", post(user_data::sync))
        .route("/api/user-data/{user_id}", get(user_data::fetch))
        .route("/api/rates/update", post(user_data::update_rates))
        .with_state(state)
}

pub async fn run(db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Sync server listening on {}", addr);

    let state = ServerState { db };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::sync::{RatesUpdate, SyncRequest, UserData};
    use api_types::transaction::{TransactionDto, TransactionKind};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::Database;
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        router(ServerState { db })
    }

    fn post_json<T: serde::Serialize>(uri: &str, body: &T) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn sample_transactions() -> Vec<TransactionDto> {
        vec![
            TransactionDto {
                id: "t1".to_string(),
                kind: TransactionKind::Incoming,
                amount: 100.0,
                currency: "USD".to_string(),
                description: "salary".to_string(),
            },
            TransactionDto {
                id: "t2".to_string(),
                kind: TransactionKind::Outgoing,
                amount: 30.0,
                currency: "USD".to_string(),
                description: "groceries".to_string(),
            },
        ]
    }

    async fn body_json<T: for<'de> serde::Deserialize<'de>>(
        response: axum::response::Response,
    ) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn sync_then_fetch_returns_the_stored_blob() {
        let app = test_router().await;

        let request = SyncRequest {
            user_id: "user-1".to_string(),
            transactions: sample_transactions(),
        };
        let response = app
            .clone()
            .oneshot(post_json("/api/transactions/sync", &request))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(get_request("/api/user-data/user-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let data: UserData = body_json(response).await;
        assert_eq!(data.transactions, sample_transactions());
        // A user that never pushed rates gets the seed table.
        assert_eq!(data.rates.get("USD"), Some(&1.0));
    }

    #[tokio::test]
    async fn fetch_unknown_user_is_404() {
        let app = test_router().await;

        let response = app
            .oneshot(get_request("/api/user-data/nobody"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sync_overwrites_the_previous_blob() {
        let app = test_router().await;

        let first = SyncRequest {
            user_id: "user-1".to_string(),
            transactions: sample_transactions(),
        };
        app.clone()
            .oneshot(post_json("/api/transactions/sync", &first))
            .await
            .unwrap();

        // Last writer wins: the second push fully replaces the first.
        let second = SyncRequest {
            user_id: "user-1".to_string(),
            transactions: vec![],
        };
        let response = app
            .clone()
            .oneshot(post_json("/api/transactions/sync", &second))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(get_request("/api/user-data/user-1"))
            .await
            .unwrap();
        let data: UserData = body_json(response).await;
        assert!(data.transactions.is_empty());
    }

    #[tokio::test]
    async fn rates_update_overwrites_rates_only() {
        let app = test_router().await;

        let request = SyncRequest {
            user_id: "user-1".to_string(),
            transactions: sample_transactions(),
        };
        app.clone()
            .oneshot(post_json("/api/transactions/sync", &request))
            .await
            .unwrap();

        let rates = RatesUpdate {
            user_id: "user-1".to_string(),
            rates: [("USD".to_string(), 1.0), ("EUR".to_string(), 0.92)]
                .into_iter()
                .collect(),
        };
        let response = app
            .clone()
            .oneshot(post_json("/api/rates/update", &rates))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(get_request("/api/user-data/user-1"))
            .await
            .unwrap();
        let data: UserData = body_json(response).await;
        assert_eq!(data.rates.len(), 2);
        assert_eq!(data.rates.get("EUR"), Some(&0.92));
        assert_eq!(data.transactions, sample_transactions());
    }

    #[tokio::test]
    async fn non_positive_rates_are_rejected() {
        let app = test_router().await;

        let rates = RatesUpdate {
            user_id: "user-1".to_string(),
            rates: [("USD".to_string(), 0.0)].into_iter().collect(),
        };
        let response = app
            .oneshot(post_json("/api/rates/update", &rates))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_currency_code_is_rejected() {
        let app = test_router().await;

        let request = SyncRequest {
            user_id: "user-1".to_string(),
            transactions: vec![TransactionDto {
                id: "t1".to_string(),
                kind: TransactionKind::Incoming,
                amount: 10.0,
                currency: "US$".to_string(),
                description: String::new(),
            }],
        };
        let response = app
            .oneshot(post_json("/api/transactions/sync", &request))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
