use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use stockroom_core::{PlacementError, ServiceError};

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    InsufficientStock(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::InsufficientStock(msg) => (StatusCode::BAD_REQUEST, "insufficient_stock", msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::ValidationError(msg),
            ServiceError::NotFound => Self::NotFoundError("product not found".to_string()),
            ServiceError::Placement(PlacementError::ProductNotFound(id)) => {
                Self::NotFoundError(format!("product not found: {id}"))
            }
            ServiceError::Placement(PlacementError::InsufficientStock(e)) => Self::InsufficientStock(e.to_string()),
            ServiceError::Placement(PlacementError::TotalOverflow(e)) => Self::ValidationError(e.to_string()),
            ServiceError::Placement(e @ (PlacementError::StorageFailure(_) | PlacementError::Cancelled)) => {
                Self::InternalServerError(format!("error creating order: {e}"))
            }
            ServiceError::Storage(e) => Self::InternalServerError(e.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::ValidationError(format!("error reading body: {}", rejection.body_text()))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::InternalServerError(format!("error generating token: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use stockroom_catalog::{InsufficientStock, ProductId, TotalOverflow};
    use stockroom_core::StoreError;

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_service_errors_map_to_status_codes() {
        assert_eq!(status_of(ServiceError::Validation("bad".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(ServiceError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(PlacementError::ProductNotFound(ProductId::new("p")).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(PlacementError::InsufficientStock(InsufficientStock { requested: 2, available: 1 }).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(PlacementError::StorageFailure(StoreError::backend("down")).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(PlacementError::TotalOverflow(TotalOverflow { unit_price: Decimal::MAX, quantity: 2 }).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(PlacementError::Cancelled.into()), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_of(ServiceError::Storage(StoreError::backend("down"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
