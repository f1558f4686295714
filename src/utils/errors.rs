// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::domain::models::analysis::ResultShapeError;
use crate::domain::models::roast::DomainError;
use crate::domain::repositories::roast_repository::RepositoryError;
use crate::domain::repositories::storage_repository::StorageError;
use crate::domain::services::payment_service::PaymentError;

/// 业务流程错误类型
///
/// 用例和分析流程统一返回该类型，表现层据此映射HTTP状态码
#[derive(Error, Debug)]
pub enum RoastError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Screenshot capture failed: {message}")]
    CaptureFailure {
        status: Option<u16>,
        message: String,
    },

    #[error("Analysis failed: {0}")]
    AnalysisFailure(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payment provider error: {0}")]
    Payment(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<ResultShapeError> for RoastError {
    fn from(err: ResultShapeError) -> Self {
        RoastError::AnalysisFailure(err.to_string())
    }
}


impl From<PaymentError> for RoastError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotConfigured(msg) => RoastError::Configuration(msg),
            PaymentError::InvalidSignature(_) | PaymentError::InvalidPayload(_) => {
                RoastError::Validation(err.to_string())
            }
            PaymentError::Provider(msg) => RoastError::Payment(msg),
        }
    }
}
