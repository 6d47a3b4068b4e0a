use crate::providers::Page;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ExchangeParams {
    pub code: Option<String>,
}

/// Wire shape of a successful exchange. `pages_error`/`error_details` are
/// present if and only if the pages call itself failed; an empty `pages`
/// list with neither field means the call succeeded and found nothing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResponse {
    pub access_token: String,
    pub expires_in: u64,
    pub pages: Vec<Page>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}
