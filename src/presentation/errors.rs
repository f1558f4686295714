// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::domain::models::roast::DomainError;
use crate::domain::repositories::roast_repository::RepositoryError;
use crate::utils::errors::RoastError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口。
/// 响应体统一为 `{ "error": message }`
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    /// 直接以状态码构造错误
    pub fn status(status: StatusCode, message: impl Into<String>) -> Response {
        (status, Json(json!({ "error": message.into() }))).into_response()
    }

    fn status_code(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<RoastError>() {
            return roast_status(err);
        }
        if let Some(err) = self.0.downcast_ref::<RepositoryError>() {
            return repository_status(err);
        }
        if self.0.downcast_ref::<DomainError>().is_some() {
            return StatusCode::CONFLICT;
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn roast_status(err: &RoastError) -> StatusCode {
    match err {
        RoastError::Validation(_) => StatusCode::BAD_REQUEST,
        RoastError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        RoastError::Forbidden(_) => StatusCode::FORBIDDEN,
        RoastError::NotFound(_) => StatusCode::NOT_FOUND,
        RoastError::Conflict(_) | RoastError::Domain(_) => StatusCode::CONFLICT,
        RoastError::CaptureFailure { .. } | RoastError::Payment(_) => StatusCode::BAD_GATEWAY,
        RoastError::AnalysisFailure(_) => StatusCode::BAD_GATEWAY,
        RoastError::Configuration(_) | RoastError::StorageUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        RoastError::Repository(e) => repository_status(e),
        RoastError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::InvalidRecord(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed with {}: {:#}", status, self.0);
        }
        AppError::status(status, self.0.to_string())
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: RoastError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_roast_errors_map_to_status_codes() {
        assert_eq!(
            status_of(RoastError::Validation("bad url".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RoastError::Unauthorized("no token".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(RoastError::Forbidden("not yours".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(RoastError::NotFound("Roast".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RoastError::Conflict("already running".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(RoastError::Configuration("no key".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(RoastError::CaptureFailure {
                status: Some(500),
                message: "upstream".into()
            }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_wrapped_repository_errors_keep_their_status() {
        assert_eq!(
            status_of(RoastError::Repository(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(RepositoryError::Conflict("dup".into()))
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(anyhow::anyhow!("boom")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
