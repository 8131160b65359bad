//! OAuth2 authorization-code flow for Strava, plus the cached-token policy

use async_trait::async_trait;
use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenType,
};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken,
    ExtraTokenFields, RedirectUrl, RefreshToken, RequestTokenError, Scope,
    StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use super::{StoredToken, TokenStore, SCOPES};
use crate::config::StravaConfig;
use crate::error::AuthError;

/// Strava returns the absolute expiry alongside `expires_in`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StravaTokenFields {
    pub expires_at: Option<i64>,
}

impl ExtraTokenFields for StravaTokenFields {}

type StravaTokenResponse = StandardTokenResponse<StravaTokenFields, BasicTokenType>;

type OAuthClient = Client<
    BasicErrorResponse,
    StravaTokenResponse,
    BasicTokenType,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
>;

/// Exchanges grants for tokens at the provider's token endpoint.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// URL the user visits to approve access.
    fn authorize_url(&self) -> String;
    async fn exchange_code(&self, code: &str) -> Result<StoredToken, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<StoredToken, AuthError>;
}

/// Supplies the one-time authorization code after the user approves access.
pub trait AuthorizationCodeProvider {
    fn authorization_code(&self, authorize_url: &str) -> Result<String, AuthError>;
}

/// Strava token endpoint via the oauth2 crate.
pub struct StravaOAuth {
    client: OAuthClient,
}

impl StravaOAuth {
    /// Build the OAuth2 client from the Strava config
    pub fn new(config: &StravaConfig) -> Result<Self, AuthError> {
        let base = config.oauth_base.trim_end_matches('/');
        let auth_url = AuthUrl::new(format!("{}/authorize", base))?;
        let token_url = TokenUrl::new(format!("{}/token", base))?;

        let client = OAuthClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        // Strava wants client credentials as form fields, not basic auth
        .set_auth_type(AuthType::RequestBody)
        .set_redirect_uri(RedirectUrl::new(config.redirect_uri.clone())?);

        Ok(Self { client })
    }
}

#[async_trait]
impl TokenExchange for StravaOAuth {
    fn authorize_url(&self) -> String {
        let (url, _csrf) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(SCOPES.to_string()))
            .add_extra_param("approval_prompt", "force")
            .url();
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<StoredToken, AuthError> {
        tracing::info!("Exchanging authorization code for token...");
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| exchange_error("authorization_code", e))?;

        to_stored(&response, None)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<StoredToken, AuthError> {
        tracing::info!("Refreshing access token...");
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| exchange_error("refresh_token", e))?;

        to_stored(&response, Some(refresh_token))
    }
}

/// Convert a token response, keeping `previous_refresh` if none was issued.
fn to_stored(
    response: &StravaTokenResponse,
    previous_refresh: Option<&str>,
) -> Result<StoredToken, AuthError> {
    let refresh_token = response
        .refresh_token()
        .map(|rt| rt.secret().to_string())
        .or_else(|| previous_refresh.map(String::from))
        .ok_or_else(|| AuthError::Exchange {
            grant: "authorization_code",
            message: "response did not include a refresh token".to_string(),
        })?;

    let now = chrono::Utc::now().timestamp();
    let expires_at = response.extra_fields().expires_at.unwrap_or_else(|| {
        let secs = response.expires_in().map_or(0, |d| d.as_secs());
        now + i64::try_from(secs).unwrap_or(i64::MAX - now)
    });

    Ok(StoredToken {
        access_token: response.access_token().secret().to_string(),
        refresh_token,
        expires_at,
    })
}

fn exchange_error<RE>(
    grant: &'static str,
    err: RequestTokenError<RE, BasicErrorResponse>,
) -> AuthError
where
    RE: std::error::Error + 'static,
{
    let message = match err {
        RequestTokenError::ServerResponse(resp) => resp.to_string(),
        // Strava's error bodies are not RFC 6749 shaped; keep the raw body
        RequestTokenError::Parse(_, body) => String::from_utf8_lossy(&body).into_owned(),
        other => other.to_string(),
    };
    tracing::error!("Token endpoint error ({}): {}", grant, message);
    AuthError::Exchange { grant, message }
}

/// Prompts on the terminal and reads the code from stdin.
#[derive(Debug, Default)]
pub struct StdinCodeProvider;

impl AuthorizationCodeProvider for StdinCodeProvider {
    fn authorization_code(&self, authorize_url: &str) -> Result<String, AuthError> {
        println!();
        println!("To authorize, visit: {}", authorize_url);
        println!("Approve access, then paste the `code` from the redirected URL");
        println!("(or the whole URL).");
        print!("Authorization code: ");
        io::stdout().flush().map_err(AuthError::Prompt)?;

        let mut line = String::new();
        io::stdin().read_line(&mut line).map_err(AuthError::Prompt)?;
        Ok(line)
    }
}

/// Accept either a bare code or the full redirect URL carrying `?code=`.
fn extract_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    match url::Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty()),
        Err(_) => Some(input.to_string()),
    }
}

/// Hands out a usable access token, authorizing or refreshing as needed.
pub struct CredentialManager<E, S, P> {
    exchange: E,
    store: S,
    codes: P,
}

impl<E, S, P> CredentialManager<E, S, P>
where
    E: TokenExchange,
    S: TokenStore,
    P: AuthorizationCodeProvider,
{
    pub fn new(exchange: E, store: S, codes: P) -> Self {
        Self {
            exchange,
            store,
            codes,
        }
    }

    /// Run the interactive flow once and cache the result.
    pub async fn obtain_initial_token(&self) -> Result<StoredToken, AuthError> {
        let url = self.exchange.authorize_url();
        let input = self.codes.authorization_code(&url)?;
        let code = extract_code(&input).ok_or(AuthError::EmptyCode)?;

        let token = self.exchange.exchange_code(&code).await?;
        self.store.save(&token)?;
        println!("Authorization successful.");
        Ok(token)
    }

    /// Cached token, refreshed and re-saved first if it has expired.
    pub async fn valid_token(&self) -> Result<StoredToken, AuthError> {
        let token = if self.store.exists() {
            self.store.load()?
        } else {
            tracing::info!("No cached token, starting authorization flow");
            self.obtain_initial_token().await?
        };

        if !token.is_expired() {
            return Ok(token);
        }

        tracing::info!("Access token expired at {}, refreshing", token.expires_at);
        let fresh = self.exchange.refresh(&token.refresh_token).await?;
        self.store.save(&fresh)?;
        Ok(fresh)
    }
}

/// Display current auth status
pub fn status(store: &impl TokenStore) -> Result<(), AuthError> {
    if !store.exists() {
        println!("Access token: none");
        println!("\nRun without arguments to authorize.");
        return Ok(());
    }

    let token = store.load()?;
    let expiry = chrono::DateTime::from_timestamp(token.expires_at, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| token.expires_at.to_string());
    if token.is_expired() {
        println!("Access token: expired (will refresh on next run)");
    } else {
        println!("Access token: valid");
    }
    println!("  expires_at: {}", expiry);
    println!(
        "Refresh tok: {}",
        if token.refresh_token.is_empty() {
            "none"
        } else {
            "present"
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const FAR_FUTURE: i64 = 4_000_000_000;

    fn token(access: &str, refresh: &str, expires_at: i64) -> StoredToken {
        StoredToken {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            expires_at,
        }
    }

    #[derive(Default)]
    struct FakeExchange {
        codes: Mutex<Vec<String>>,
        refreshed_with: Mutex<Vec<String>>,
        refreshes: AtomicUsize,
        fail_refresh: bool,
    }

    #[async_trait]
    impl TokenExchange for FakeExchange {
        fn authorize_url(&self) -> String {
            "https://example.test/oauth/authorize?client_id=1".to_string()
        }

        async fn exchange_code(&self, code: &str) -> Result<StoredToken, AuthError> {
            self.codes.lock().unwrap().push(code.to_string());
            Ok(token("initial", "initial-refresh", FAR_FUTURE))
        }

        async fn refresh(&self, refresh_token: &str) -> Result<StoredToken, AuthError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            self.refreshed_with
                .lock()
                .unwrap()
                .push(refresh_token.to_string());
            if self.fail_refresh {
                return Err(AuthError::Exchange {
                    grant: "refresh_token",
                    message: "invalid refresh token".to_string(),
                });
            }
            Ok(token("refreshed", "next-refresh", FAR_FUTURE))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        token: Mutex<Option<StoredToken>>,
        saves: AtomicUsize,
    }

    impl MemoryStore {
        fn with(token: StoredToken) -> Self {
            Self {
                token: Mutex::new(Some(token)),
                saves: AtomicUsize::new(0),
            }
        }

        fn current(&self) -> Option<StoredToken> {
            self.token.lock().unwrap().clone()
        }
    }

    impl TokenStore for MemoryStore {
        fn exists(&self) -> bool {
            self.token.lock().unwrap().is_some()
        }

        fn load(&self) -> Result<StoredToken, AuthError> {
            self.current()
                .ok_or_else(|| AuthError::NotFound("memory".into()))
        }

        fn save(&self, token: &StoredToken) -> Result<(), AuthError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.token.lock().unwrap() = Some(token.clone());
            Ok(())
        }
    }

    struct FixedCode(&'static str);

    impl AuthorizationCodeProvider for FixedCode {
        fn authorization_code(&self, _authorize_url: &str) -> Result<String, AuthError> {
            Ok(self.0.to_string())
        }
    }

    struct NoPrompt;

    impl AuthorizationCodeProvider for NoPrompt {
        fn authorization_code(&self, _authorize_url: &str) -> Result<String, AuthError> {
            panic!("prompted for a code with a cached token");
        }
    }

    #[tokio::test]
    async fn test_first_run_authorizes_and_caches() {
        let manager = CredentialManager::new(
            FakeExchange::default(),
            MemoryStore::default(),
            FixedCode("abc123\n"),
        );

        let got = manager.valid_token().await.unwrap();

        assert_eq!(got.access_token, "initial");
        assert_eq!(*manager.exchange.codes.lock().unwrap(), vec!["abc123"]);
        assert_eq!(manager.exchange.refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(manager.store.current(), Some(got));
    }

    #[tokio::test]
    async fn test_valid_cached_token_is_used_as_is() {
        let cached = token("cached", "cached-refresh", FAR_FUTURE);
        let manager = CredentialManager::new(
            FakeExchange::default(),
            MemoryStore::with(cached.clone()),
            NoPrompt,
        );

        assert_eq!(manager.valid_token().await.unwrap(), cached);
        assert_eq!(manager.exchange.refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(manager.store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_exactly_once() {
        for expires_at in [0, 1_600_000_000, chrono::Utc::now().timestamp() - 1] {
            let manager = CredentialManager::new(
                FakeExchange::default(),
                MemoryStore::with(token("stale", "stale-refresh", expires_at)),
                NoPrompt,
            );

            let got = manager.valid_token().await.unwrap();

            assert_eq!(got.access_token, "refreshed");
            assert!(!got.is_expired());
            assert_eq!(manager.exchange.refreshes.load(Ordering::SeqCst), 1);
            assert_eq!(
                *manager.exchange.refreshed_with.lock().unwrap(),
                vec!["stale-refresh"]
            );
            assert_eq!(manager.store.current(), Some(got));
        }
    }

    #[tokio::test]
    async fn test_refresh_failure_is_fatal_and_keeps_cache() {
        let stale = token("stale", "stale-refresh", 0);
        let exchange = FakeExchange {
            fail_refresh: true,
            ..Default::default()
        };
        let manager = CredentialManager::new(exchange, MemoryStore::with(stale.clone()), NoPrompt);

        let err = manager.valid_token().await.unwrap_err();

        assert!(matches!(err, AuthError::Exchange { .. }));
        assert_eq!(manager.store.current(), Some(stale));
        assert_eq!(manager.store.saves.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_code_rejected() {
        let manager = CredentialManager::new(
            FakeExchange::default(),
            MemoryStore::default(),
            FixedCode("   \n"),
        );

        let err = tokio_test::block_on(manager.obtain_initial_token()).unwrap_err();

        assert!(matches!(err, AuthError::EmptyCode));
        assert!(manager.exchange.codes.lock().unwrap().is_empty());
        assert!(!manager.store.exists());
    }

    #[test]
    fn test_extract_code_from_redirect_url() {
        assert_eq!(
            extract_code("http://localhost/?state=x&code=f00d&scope=read,activity:read_all"),
            Some("f00d".to_string())
        );
        assert_eq!(extract_code("  f00d  "), Some("f00d".to_string()));
        assert_eq!(extract_code("http://localhost/?error=access_denied"), None);
        assert_eq!(extract_code(""), None);
    }

    #[test]
    fn test_authorize_url_contents() {
        let config = StravaConfig {
            client_id: "4242".to_string(),
            client_secret: "secret".to_string(),
            ..Default::default()
        };
        let oauth = StravaOAuth::new(&config).unwrap();
        let url = url::Url::parse(&oauth.authorize_url()).unwrap();

        assert_eq!(
            url.as_str().split('?').next(),
            Some("https://www.strava.com/oauth/authorize")
        );
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("client_id"), Some("4242"));
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("redirect_uri"), Some("http://localhost/"));
        assert_eq!(get("scope"), Some(SCOPES));
        assert_eq!(get("approval_prompt"), Some("force"));
    }

    #[test]
    fn test_token_response_conversion() {
        let response: StravaTokenResponse = serde_json::from_str(
            r#"{
                "token_type": "Bearer",
                "access_token": "a9b7",
                "expires_at": 1568775134,
                "expires_in": 20566,
                "refresh_token": "12345"
            }"#,
        )
        .unwrap();

        let stored = to_stored(&response, None).unwrap();
        assert_eq!(stored, token("a9b7", "12345", 1_568_775_134));
    }

    #[test]
    fn test_refresh_response_without_refresh_token_keeps_old() {
        let response: StravaTokenResponse = serde_json::from_str(
            r#"{"token_type": "Bearer", "access_token": "new", "expires_in": 3600}"#,
        )
        .unwrap();

        let before = chrono::Utc::now().timestamp();
        let stored = to_stored(&response, Some("old-refresh")).unwrap();
        assert_eq!(stored.refresh_token, "old-refresh");
        assert!(stored.expires_at >= before + 3600);
        assert!(to_stored(&response, None).is_err());
    }
}
