//! `GET /v1/comment_list`: one page of an article's comment tree.
//!
//! Query parameters:
//!
//! - `article_id`               (required)
//! - `primary_comment_offset`   (required)
//! - `primary_comment_count`    (required)
//! - `sub_comment_count`        (optional, defaults to `pagination.default_sub_comment_count`)
//!
//! Every response carries `error_code`, `error_hint` and `error_msg`.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use spiro_core::comment::{ArticleId, CommentPageResult};
use spiro_core::error::{Error, ErrorCode};
use spiro_core::page::PageRequest;

use crate::SharedState;

/// Decoded query string.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentListParams {
    pub article_id: ArticleId,
    pub primary_comment_offset: i64,
    pub primary_comment_count: i64,
    #[serde(default)]
    pub sub_comment_count: Option<i64>,
}

impl CommentListParams {
    pub fn to_request(&self, default_sub_comment_count: i64) -> PageRequest {
        PageRequest::new(
            self.article_id,
            self.primary_comment_offset,
            self.primary_comment_count,
            self.sub_comment_count.unwrap_or(default_sub_comment_count),
        )
    }
}

/// Successful response: the page plus a zeroed error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentListResponse {
    #[serde(flatten)]
    pub page: CommentPageResult,
    pub error_code: ErrorCode,
    pub error_hint: serde_json::Value,
    pub error_msg: String,
}

impl From<CommentPageResult> for CommentListResponse {
    fn from(page: CommentPageResult) -> Self {
        Self {
            page,
            error_code: ErrorCode::Success,
            error_hint: serde_json::Value::String(String::new()),
            error_msg: String::new(),
        }
    }
}

/// Failure response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error_code: ErrorCode,
    pub error_hint: serde_json::Value,
    pub error_msg: String,
}

/// A domain error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            Error::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            Error::Store(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Comment list request failed");
        } else {
            warn!(error = %self.0, "Comment list request rejected");
        }

        let body = ErrorEnvelope {
            error_code: self.0.code(),
            error_hint: self.0.hint(),
            error_msg: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub(crate) async fn comment_list_handler(
    State(state): State<SharedState>,
    params: Result<Query<CommentListParams>, QueryRejection>,
) -> Result<Json<CommentListResponse>, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        Error::invalid_argument("query", rejection.body_text())
    })?;

    let request = params.to_request(state.config.pagination.default_sub_comment_count);
    let page = state.comments.get_comment_list(&request).await?;

    Ok(Json(page.into()))
}
