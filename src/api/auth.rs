use super::types::{
    expect_json, ChangePasswordRequest, LoginRequest, MessageResponse, ProfileUpdate,
    RegisterRequest, RegisterResponse, TokenPair, UserProfile,
};
use crate::constants::{CHANGE_PASSWORD_PATH, LOGIN_PATH, PROFILE_PATH, REGISTER_PATH};
use crate::gateway::{ApiRequest, Gateway};
use crate::utils::{log_info, log_warn, ApiResult};

/// Account endpoints: login, registration and profile
#[derive(Debug, Clone)]
pub struct AuthApi {
    gateway: Gateway,
}

impl AuthApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Exchange credentials for a token pair
    ///
    /// Login and registration never attempt a refresh: a 401 here means bad
    /// credentials, not an expired session.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<Option<TokenPair>> {
        let request = ApiRequest::post(LOGIN_PATH)
            .json(&LoginRequest { username, password })?
            .skip_auth()
            .skip_refresh();
        expect_json(self.gateway.send(&request).await?)
    }

    pub async fn register(&self, user: &RegisterRequest) -> ApiResult<Option<RegisterResponse>> {
        user.validate()?;
        let request = ApiRequest::post(REGISTER_PATH)
            .json(user)?
            .skip_auth()
            .skip_refresh();
        expect_json(self.gateway.send(&request).await?)
    }

    pub async fn profile(&self) -> ApiResult<Option<UserProfile>> {
        expect_json(self.gateway.send(&ApiRequest::get(PROFILE_PATH)).await?)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<Option<UserProfile>> {
        let request = ApiRequest::patch(PROFILE_PATH).json(update)?;
        expect_json(self.gateway.send(&request).await?)
    }

    pub async fn change_password(
        &self,
        passwords: &ChangePasswordRequest,
    ) -> ApiResult<Option<MessageResponse>> {
        passwords.validate()?;
        let request = ApiRequest::post(CHANGE_PASSWORD_PATH).json(passwords)?;
        let outcome = self.gateway.send(&request).await?;
        Ok(match outcome {
            Some(outcome) => Some(outcome.into_optional_json()?.unwrap_or_default()),
            None => None,
        })
    }

    /// Log in, persist both tokens, then fetch and cache the profile
    ///
    /// A failed profile fetch doesn't undo the login; the tokens are already valid.
    pub async fn sign_in(&self, username: &str, password: &str) -> ApiResult<Option<UserProfile>> {
        let Some(tokens) = self.login(username, password).await? else {
            return Ok(None);
        };

        let session = self.gateway.session();
        session.set_tokens(&tokens.access, Some(tokens.refresh.as_str()))?;
        log_info("🔑", format!("Logged in as {}", username));

        self.refresh_cached_user().await
    }

    /// Register, persist the issued tokens and cache the new account
    pub async fn sign_up(&self, user: &RegisterRequest) -> ApiResult<Option<UserProfile>> {
        let Some(response) = self.register(user).await? else {
            return Ok(None);
        };

        let session = self.gateway.session();
        session.set_tokens(&response.tokens.access, Some(response.tokens.refresh.as_str()))?;
        session.cache_user(&response.user)?;
        log_info("🆕", format!("Registered {}", response.user.username));
        Ok(Some(response.user))
    }

    /// Fetch the profile and store it as the cached user
    pub async fn refresh_cached_user(&self) -> ApiResult<Option<UserProfile>> {
        match self.profile().await {
            Ok(Some(user)) => {
                self.gateway.session().cache_user(&user)?;
                Ok(Some(user))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                log_warn("⚠️", format!("Error loading user: {}", e));
                Err(e)
            }
        }
    }

    /// Forget every stored credential
    pub fn sign_out(&self) -> ApiResult<()> {
        self.gateway.session().clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::LogOnlyObserver;
    use crate::session::{MemoryTokenStore, Session};
    use crate::utils::ApiError;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn api_for(url: String) -> (AuthApi, Session) {
        let session = Session::new(Arc::new(MemoryTokenStore::new()));
        let gateway = Gateway::new(url, None, session.clone(), Arc::new(LogOnlyObserver)).unwrap();
        (AuthApi::new(gateway), session)
    }

    #[tokio::test]
    async fn test_sign_in_persists_tokens_and_caches_user() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", LOGIN_PATH)
            .match_body(Matcher::Json(json!({"username": "ada", "password": "pw"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access":"a1","refresh":"r1"}"#)
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", PROFILE_PATH)
            .match_header("authorization", "Bearer a1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":1,"username":"ada","email":"ada@example.com","is_staff":false}"#)
            .expect(1)
            .create_async()
            .await;

        let (api, session) = api_for(server.url());
        let user = api.sign_in("ada", "pw").await.unwrap().unwrap();

        assert_eq!(user.username, "ada");
        assert_eq!(user.extra.get("is_staff"), Some(&json!(false)));
        assert_eq!(session.access_token().as_deref(), Some("a1"));
        assert_eq!(session.refresh_token().as_deref(), Some("r1"));
        assert_eq!(session.cached_user::<UserProfile>(), Some(user));
    }

    #[tokio::test]
    async fn test_bad_credentials_are_rejected_without_refresh() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", LOGIN_PATH)
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"No active account found with the given credentials"}"#)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", crate::constants::TOKEN_REFRESH_PATH)
            .expect(0)
            .create_async()
            .await;

        let (api, session) = api_for(server.url());
        session.set_tokens("stale", Some("r0")).unwrap();

        let err = api.sign_in("ada", "wrong").await.unwrap_err();
        refresh.assert_async().await;
        assert_eq!(err.status(), Some(401));
        assert_eq!(session.access_token().as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn test_register_mismatch_makes_no_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", REGISTER_PATH)
            .expect(0)
            .create_async()
            .await;

        let (api, _) = api_for(server.url());
        let request = RegisterRequest {
            username: "ada".into(),
            email: "ada@example.com".into(),
            password: "one".into(),
            password2: "two".into(),
            ..Default::default()
        };

        let err = api.sign_up(&request).await.unwrap_err();
        mock.assert_async().await;
        assert!(matches!(err, ApiError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_sign_up_uses_nested_tokens() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", REGISTER_PATH)
            .match_header("authorization", Matcher::Missing)
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "user": {"id": 7, "username": "grace", "email": "grace@example.com"},
                    "tokens": {"access": "a7", "refresh": "r7"},
                    "message": "User registered successfully"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let (api, session) = api_for(server.url());
        let request = RegisterRequest {
            username: "grace".into(),
            email: "grace@example.com".into(),
            password: "s3cret!!".into(),
            password2: "s3cret!!".into(),
            ..Default::default()
        };

        let user = api.sign_up(&request).await.unwrap().unwrap();
        assert_eq!(user.id, Some(7));
        assert_eq!(session.access_token().as_deref(), Some("a7"));
        assert_eq!(session.refresh_token().as_deref(), Some("r7"));
    }

    #[tokio::test]
    async fn test_update_profile_patches() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", PROFILE_PATH)
            .match_body(Matcher::Json(json!({"phone": "555-0100"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"username":"ada","email":"ada@example.com","phone":"555-0100"}"#)
            .expect(1)
            .create_async()
            .await;

        let (api, session) = api_for(server.url());
        session.set_tokens("a1", None).unwrap();

        let update = ProfileUpdate {
            phone: Some("555-0100".into()),
            ..Default::default()
        };
        let user = api.update_profile(&update).await.unwrap().unwrap();

        mock.assert_async().await;
        assert_eq!(user.phone.as_deref(), Some("555-0100"));
    }

    #[tokio::test]
    async fn test_change_password_field_errors() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", CHANGE_PASSWORD_PATH)
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"old_password":["Old password is not correct"]}"#)
            .create_async()
            .await;

        let (api, session) = api_for(server.url());
        session.set_tokens("a1", None).unwrap();

        let passwords = ChangePasswordRequest {
            old_password: "nope".into(),
            new_password: "n3w-pass".into(),
            new_password2: "n3w-pass".into(),
        };
        let err = api.change_password(&passwords).await.unwrap_err();
        assert_eq!(
            err.body(),
            Some(&json!({"old_password": ["Old password is not correct"]}))
        );
    }

    #[test]
    fn test_sign_out_clears_session() {
        let (api, session) = api_for("http://localhost:8000".into());
        session.set_tokens("a1", Some("r1")).unwrap();
        api.sign_out().unwrap();
        assert!(!session.is_authenticated());
        assert!(session.refresh_token().is_none());
    }
}
