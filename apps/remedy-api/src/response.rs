//! # Command Responses
//!
//! Every successful command answers with its payload flattened next to a
//! status flag and a message:
//!
//! ```json
//! { "status": true, "msg": "Sale recorded", "sale": { ... }, "totalProfitCents": 310 }
//! ```

use serde::Serialize;

use crate::error::ApiError;

/// Result type returned by every command.
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Successful command response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    pub msg: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(msg: impl Into<String>, data: T) -> Self {
        ApiResponse {
            status: true,
            msg: msg.into(),
            data,
        }
    }
}

/// A page of results under a caller-chosen key (`medicines`, `sales`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    #[serde(flatten)]
    pub items: T,
    pub page: u32,
    pub total_pages: i64,
    pub total: i64,
}
