use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bigdecimal::BigDecimal;
use serde::Serialize;
use sqlx::error::ErrorKind;

/// 计费服务错误
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// 上游数据源读取失败, 原样传递, 调用方可重试
    #[error("data unavailable: {0}")]
    DataUnavailable(#[source] sqlx::Error),

    /// 写入违反外键/唯一约束, 重试无意义
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid input: {0}")]
    Validation(String),

    /// 报表明细合计与毛收入不一致
    #[error("report breakdown total {breakdown} does not match gross amount {gross}")]
    ReportMismatch {
        breakdown: BigDecimal,
        gross: BigDecimal,
    },

    #[error("export failed: {0}")]
    Export(String),
}

pub type BillingResult<T> = Result<T, BillingError>;

impl BillingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) | Self::ReportMismatch { .. } => StatusCode::CONFLICT,
            Self::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 只有上游读取失败值得重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DataUnavailable(_))
    }
}

impl From<sqlx::Error> for BillingError {
    fn from(e: sqlx::Error) -> Self {
        let rejected = match &e {
            sqlx::Error::Database(db) => {
                let constraint = db.constraint().unwrap_or("unnamed");
                match db.kind() {
                    ErrorKind::ForeignKeyViolation => Some(Self::Conflict(format!(
                        "record is referenced elsewhere or refers to a missing record ({})",
                        constraint
                    ))),
                    ErrorKind::UniqueViolation => {
                        Some(Self::Conflict(format!("duplicate record ({})", constraint)))
                    }
                    ErrorKind::NotNullViolation | ErrorKind::CheckViolation => Some(
                        Self::Validation(format!("{} ({})", db.message(), constraint)),
                    ),
                    _ => None,
                }
            }
            _ => None,
        };
        rejected.unwrap_or_else(|| Self::DataUnavailable(e))
    }
}

impl From<csv::Error> for BillingError {
    fn from(e: csv::Error) -> Self {
        Self::Export(e.to_string())
    }
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub retryable: bool,
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        let body = ErrorResponse {
            success: false,
            message: self.to_string(),
            retryable: self.is_retryable(),
        };
        (status, Json(body)).into_response()
    }
}
