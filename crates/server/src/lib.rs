use axum::{Json, http::StatusCode, response::IntoResponse};

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod server;
mod user_data;

pub enum ServerError {
    Database(sea_orm::DbErr),
    NotFound(String),
    Internal(String),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_error(err: &ServerError) -> StatusCode {
    match err {
        ServerError::Database(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ServerError::NotFound(_) => StatusCode::NOT_FOUND,
        ServerError::Generic(_) => StatusCode::BAD_REQUEST,
    }
}

fn message_for_error(err: ServerError) -> String {
    match err {
        ServerError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        ServerError::Internal(message) => {
            tracing::error!("internal error: {message}");
            "internal server error".to_string()
        }
        ServerError::NotFound(what) => format!("{what} not found"),
        ServerError::Generic(message) => message,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = (status_for_error(&self), message_for_error(self));

        (status, Json(Error { error })).into_response()
    }
}

impl From<sea_orm::DbErr> for ServerError {
    fn from(value: sea_orm::DbErr) -> Self {
        Self::Database(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let res = ServerError::NotFound("user".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_maps_to_500() {
        let res = ServerError::Internal("corrupt blob".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
