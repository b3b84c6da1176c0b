// ABOUTME: HTTP client for the carrier identity endpoints
// ABOUTME: Implements TokenExchange against CIAM and ProfileService against the subscriber API

use async_trait::async_trait;
use dorxl_config::{
    constants::{
        DORXL_API_BASE_URL, DORXL_API_KEY, DORXL_APP_VERSION, DORXL_CIAM_BASE_URL,
        DORXL_CIAM_BASIC_AUTH, DORXL_HTTP_TIMEOUT_SECS,
    },
    env_or, env_string,
};
use dorxl_core::SubscriptionType;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use crate::{
    error::{AuthError, AuthResult},
    session::{
        provider::{ProfileService, TokenExchange},
        types::{SubscriberProfile, TokenGrant, TokenSet},
    },
};

pub const DEFAULT_CIAM_BASE_URL: &str = "https://gede.ciam.xlaxiata.co.id";
pub const DEFAULT_API_BASE_URL: &str = "https://api.myxl.xlaxiata.co.id";
pub const DEFAULT_APP_VERSION: &str = "8.9.0";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
/// Lifetime assumed when the exchange response does not declare one
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;
/// Declared lifetimes are clamped to `0..=MAX_EXPIRES_IN_SECS`
pub const MAX_EXPIRES_IN_SECS: i64 = i32::MAX as i64;

const TOKEN_PATH: &str = "realms/xl-ciam/protocol/openid-connect/token";
const PROFILE_PATH: &str = "api/v8/profile";

/// Endpoint and credential settings for [`HttpIdentityClient`]
#[derive(Debug, Clone)]
pub struct IdentityClientConfig {
    pub ciam_base_url: String,
    /// Pre-encoded `client_id:secret` for the Basic authorization header
    pub ciam_basic_auth: String,
    pub api_base_url: String,
    pub api_key: String,
    pub app_version: String,
    pub timeout: Duration,
}

impl Default for IdentityClientConfig {
    fn default() -> Self {
        Self {
            ciam_base_url: DEFAULT_CIAM_BASE_URL.to_string(),
            ciam_basic_auth: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: String::new(),
            app_version: DEFAULT_APP_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl IdentityClientConfig {
    /// Settings from the environment; the API key falls back to `~/.dorxl/api.key`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_key = env_string(DORXL_API_KEY)
            .or_else(read_api_key_file)
            .unwrap_or_default();
        if api_key.is_empty() {
            warn!("No API key configured; profile lookups will likely be rejected");
        }

        Self {
            ciam_base_url: env_string(DORXL_CIAM_BASE_URL).unwrap_or(defaults.ciam_base_url),
            ciam_basic_auth: env_string(DORXL_CIAM_BASIC_AUTH).unwrap_or_default(),
            api_base_url: env_string(DORXL_API_BASE_URL).unwrap_or(defaults.api_base_url),
            api_key,
            app_version: env_string(DORXL_APP_VERSION).unwrap_or(defaults.app_version),
            timeout: Duration::from_secs(env_or(
                DORXL_HTTP_TIMEOUT_SECS,
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
        }
    }
}

fn read_api_key_file() -> Option<String> {
    let path = dorxl_core::api_key_file();
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let key = content.trim().to_string();
            (!key.is_empty()).then_some(key)
        }
        Err(_) => None,
    }
}

/// reqwest-backed identity client
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    client: Client,
    token_url: Url,
    profile_url: Url,
    config: IdentityClientConfig,
}

impl HttpIdentityClient {
    pub fn new(config: IdentityClientConfig) -> AuthResult<Self> {
        let token_url = join_url(&config.ciam_base_url, TOKEN_PATH)?;
        let profile_url = join_url(&config.api_base_url, PROFILE_PATH)?;
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            token_url,
            profile_url,
            config,
        })
    }

    pub fn from_env() -> AuthResult<Self> {
        Self::new(IdentityClientConfig::from_env())
    }

    pub fn config(&self) -> &IdentityClientConfig {
        &self.config
    }
}

fn join_url(base: &str, path: &str) -> AuthResult<Url> {
    let base = format!("{}/", base.trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|url| url.join(path))
        .map_err(|e| AuthError::Configuration(format!("Invalid base URL {}: {}", base, e)))
}

#[derive(Debug, Serialize)]
struct RefreshForm<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(
        default = "default_expires_in",
        alias = "expiresIn",
        deserialize_with = "lenient_seconds"
    )]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    DEFAULT_EXPIRES_IN_SECS
}

/// Accepts `3600`, `3600.0`, `"3600"` or null
fn lenient_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let secs = match Option::<Seconds>::deserialize(deserializer)? {
        Some(Seconds::Int(secs)) => secs,
        Some(Seconds::Float(secs)) if secs.is_finite() => secs as i64,
        Some(Seconds::Float(_)) => DEFAULT_EXPIRES_IN_SECS,
        Some(Seconds::Text(text)) => text.trim().parse().unwrap_or(DEFAULT_EXPIRES_IN_SECS),
        None => DEFAULT_EXPIRES_IN_SECS,
    };
    Ok(secs.clamp(0, MAX_EXPIRES_IN_SECS))
}

impl From<TokenResponse> for TokenGrant {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
        }
    }
}

#[derive(Debug, Serialize)]
struct ProfileRequest<'a> {
    access_token: &'a str,
    app_version: &'a str,
    is_enterprise: bool,
    lang: &'static str,
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    #[serde(default)]
    data: Option<ProfileBody>,
    #[serde(default)]
    profile: Option<ProfilePayload>,
}

#[derive(Debug, Deserialize)]
struct ProfileBody {
    profile: Option<ProfilePayload>,
}

#[derive(Debug, Deserialize)]
struct ProfilePayload {
    subscriber_id: String,
    #[serde(default)]
    subscription_type: SubscriptionType,
}

impl ProfileEnvelope {
    fn into_profile(self) -> Option<ProfilePayload> {
        self.data.and_then(|data| data.profile).or(self.profile)
    }
}

#[async_trait]
impl TokenExchange for HttpIdentityClient {
    async fn exchange(
        &self,
        refresh_token: &str,
        subscriber_hint: &str,
    ) -> AuthResult<TokenGrant> {
        let mut request = self
            .client
            .post(self.token_url.clone())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Basic {}", self.config.ciam_basic_auth),
            )
            .form(&RefreshForm {
                grant_type: "refresh_token",
                refresh_token,
            });
        if !subscriber_hint.is_empty() {
            request = request.header("Ax-Subscriber-Id", subscriber_hint);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange(format!("Failed to reach token service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            // Body may echo credentials, only the status is logged
            error!("Token exchange failed with status {}", status);
            return Err(AuthError::TokenExchange(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            AuthError::TokenExchange(format!("Failed to parse token response: {}", e))
        })?;
        if token_response.access_token.is_empty() {
            return Err(AuthError::TokenExchange(
                "Token response carried no access token".to_string(),
            ));
        }

        debug!("Token exchange succeeded");
        Ok(token_response.into())
    }
}

#[async_trait]
impl ProfileService for HttpIdentityClient {
    async fn fetch_profile(&self, tokens: &TokenSet) -> AuthResult<SubscriberProfile> {
        let response = self
            .client
            .post(self.profile_url.clone())
            .bearer_auth(&tokens.id_token)
            .header("x-api-key", &self.config.api_key)
            .json(&ProfileRequest {
                access_token: &tokens.access_token,
                app_version: &self.config.app_version,
                is_enterprise: false,
                lang: "en",
            })
            .send()
            .await
            .map_err(|e| AuthError::ProfileFetch(format!("Failed to reach profile service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            error!("Profile lookup failed with status {}", status);
            return Err(AuthError::ProfileFetch(format!(
                "Profile lookup failed with status {}",
                status
            )));
        }

        let envelope: ProfileEnvelope = response.json().await.map_err(|e| {
            AuthError::ProfileFetch(format!("Failed to parse profile response: {}", e))
        })?;
        let payload = envelope.into_profile().ok_or_else(|| {
            AuthError::ProfileFetch("Profile response carried no profile".to_string())
        })?;

        Ok(SubscriberProfile {
            subscriber_id: payload.subscriber_id,
            subscription_type: payload.subscription_type,
        })
    }
}
