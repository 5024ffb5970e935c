//! HTTP error type. Every failure leaves the server as the standard JSON
//! envelope with `success: false` and a Vietnamese message; technical detail
//! goes to the server log only.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::response::ApiResponse;
use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Db(db) => match db {
                DbError::NotFound(_) => StatusCode::NOT_FOUND,
                DbError::Validation(_) | DbError::Constraint(_) => StatusCode::BAD_REQUEST,
                DbError::Sqlite(_) if db.is_unique_violation() => StatusCode::BAD_REQUEST,
                DbError::Sqlite(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        if let ApiError::Db(db) = self {
            if db.is_unique_violation() {
                return "Dữ liệu đã tồn tại".into();
            }
        }
        if self.status().is_server_error() {
            "Lỗi hệ thống, vui lòng thử lại sau".into()
        } else {
            self.to_string()
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        if self.status().is_server_error() {
            log::error!("request failed: {self}");
        }
        HttpResponse::build(self.status()).json(ApiResponse::error(self.public_message()))
    }
}

impl From<rust_xlsxwriter::XlsxError> for ApiError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ApiError::Internal(format!("workbook generation failed: {err}"))
    }
}
