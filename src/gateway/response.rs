use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::utils::{ApiError, ApiResult};

/// Successful outcome of a gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome {
    /// Decoded JSON body
    Json(Value),
    /// 2xx response with no JSON body (204, or some other content type)
    Empty { status: u16 },
}

impl ApiOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, ApiOutcome::Empty { .. })
    }

    /// Decode the JSON body into `T`
    ///
    /// An empty outcome is an error here: the caller asked for data.
    pub fn into_json<T: DeserializeOwned>(self) -> ApiResult<T> {
        match self {
            ApiOutcome::Json(value) => Ok(serde_json::from_value(value)?),
            ApiOutcome::Empty { status } => Err(ApiError::UnexpectedEmpty { status }),
        }
    }

    /// Like [`into_json`](Self::into_json) but an empty outcome is `Ok(None)`
    pub fn into_optional_json<T: DeserializeOwned>(self) -> ApiResult<Option<T>> {
        match self {
            ApiOutcome::Json(value) => Ok(Some(serde_json::from_value(value)?)),
            ApiOutcome::Empty { .. } => Ok(None),
        }
    }
}
