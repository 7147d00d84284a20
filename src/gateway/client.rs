use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::observer::AuthObserver;
use super::request::ApiRequest;
use super::response::ApiOutcome;
use crate::app::ApiConfig;
use crate::constants::{JSON_CONTENT_TYPE, TOKEN_REFRESH_PATH};
use crate::session::Session;
use crate::utils::{log_debug, log_error, log_warn, ApiError, ApiResult};

/// Where a logical call is in its single-retry lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Initial,
    Retried,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Authenticated request gateway
///
/// Attaches the stored bearer token to every request, refreshes an expired
/// access token once per call, and folds the response into an [`ApiOutcome`]
/// or an [`ApiError`]. `Ok(None)` means the session is gone: the refresh
/// failed and the [`AuthObserver`] has been told.
#[derive(Clone)]
pub struct Gateway {
    client: Client,
    base_url: String,
    session: Session,
    observer: Arc<dyn AuthObserver>,
}

impl Gateway {
    /// Create a gateway for `base_url`; `timeout` of `None` waits forever
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
        session: Session,
        observer: Arc<dyn AuthObserver>,
    ) -> ApiResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            observer,
        })
    }

    pub fn from_config(
        config: &ApiConfig,
        session: Session,
        observer: Arc<dyn AuthObserver>,
    ) -> ApiResult<Self> {
        let timeout = (config.request_timeout_secs > 0)
            .then(|| Duration::from_secs(config.request_timeout_secs));
        Self::new(config.base_url.clone(), timeout, session, observer)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Issue `request` and normalize the response
    pub async fn send(&self, request: &ApiRequest) -> ApiResult<Option<ApiOutcome>> {
        let result = self.dispatch(request).await;
        if let Err(e) = &result {
            log_error(
                "❌",
                format!("API error on {} {}: {}", request.method, request.path, e),
            );
        }
        result
    }

    async fn dispatch(&self, request: &ApiRequest) -> ApiResult<Option<ApiOutcome>> {
        let mut attempt = Attempt::Initial;

        loop {
            let response = self.build(request)?.send().await?;

            if response.status() == StatusCode::UNAUTHORIZED
                && attempt == Attempt::Initial
                && !request.skip_refresh
            {
                if self.refresh_access_token().await {
                    log_debug(format!(
                        "Retrying {} {} with refreshed token",
                        request.method, request.path
                    ));
                    attempt = Attempt::Retried;
                    continue;
                }

                log_warn("🔒", "Session expired and could not be refreshed");
                self.observer.on_auth_required();
                return Ok(None);
            }

            return read_outcome(response).await.map(Some);
        }
    }

    fn build(&self, request: &ApiRequest) -> ApiResult<RequestBuilder> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::Invalid(format!("Invalid header name {:?}: {}", name, e)))?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                ApiError::Invalid(format!("Invalid value for header {}: {}", name, e))
            })?;
            headers.insert(name, value);
        }

        if !request.skip_auth {
            if let Some(token) = self.session.access_token() {
                let mut value =
                    HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                        ApiError::Invalid("Stored access token is not a valid header value".into())
                    })?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
        }

        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path))
            .headers(headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        Ok(builder)
    }

    /// Exchange the stored refresh token for a new access token
    ///
    /// Uses a bare request so a failing refresh can never trigger another
    /// refresh. Only the access token is written back.
    pub async fn refresh_access_token(&self) -> bool {
        let Some(refresh) = self.session.refresh_token() else {
            log_debug("No refresh token stored, skipping refresh");
            return false;
        };

        let response = match self
            .client
            .post(self.url(TOKEN_REFRESH_PATH))
            .json(&RefreshRequest { refresh: &refresh })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log_error("❌", format!("Token refresh error: {}", e));
                return false;
            }
        };

        if !response.status().is_success() {
            log_debug(format!("Token refresh rejected with status {}", response.status()));
            return false;
        }

        let tokens = match response.json::<RefreshResponse>().await {
            Ok(tokens) => tokens,
            Err(e) => {
                log_error("❌", format!("Token refresh returned an unreadable body: {}", e));
                return false;
            }
        };

        if let Err(e) = self.session.set_access_token(&tokens.access) {
            log_error("❌", format!("Could not store refreshed token: {}", e));
            return false;
        }

        true
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish()
    }
}

/// Fold a final response into an outcome
async fn read_outcome(response: Response) -> ApiResult<ApiOutcome> {
    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains(JSON_CONTENT_TYPE));

    if status == StatusCode::NO_CONTENT || !is_json {
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16() });
        }
        return Ok(ApiOutcome::Empty { status: status.as_u16() });
    }

    let bytes = response.bytes().await?;
    let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
        ApiError::Decode(format!("Malformed JSON body (status {}): {}", status.as_u16(), e))
    })?;

    if !status.is_success() {
        return Err(ApiError::Rejected { status: status.as_u16(), body });
    }

    Ok(ApiOutcome::Json(body))
}
