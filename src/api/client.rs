//! Authenticated HTTP client for the Strava API

use chrono::Utc;

use crate::auth::StoredToken;
use crate::config::StravaConfig;
use crate::error::FetchError;
use crate::models::Activity;

/// Strava REST client. Every request carries the caller's bearer token.
pub struct StravaClient {
    http: reqwest::Client,
    api_base: String,
    lookback_secs: i64,
}

impl StravaClient {
    pub fn new(config: &StravaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            lookback_secs: i64::from(config.lookback_hours) * 3600,
        }
    }

    /// Most recent activity started within the lookback window.
    pub async fn latest_activity(
        &self,
        token: &StoredToken,
    ) -> Result<Option<Activity>, FetchError> {
        if token.is_expired() {
            return Err(FetchError::ExpiredToken(token.expires_at));
        }

        let after = Utc::now().timestamp() - self.lookback_secs;
        let url = format!("{}/athlete/activities", self.api_base);
        tracing::debug!("Strava GET {} (after={})", url, after);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&token.access_token)
            .query(&[("after", after), ("per_page", 1)])
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        let resp = check_response(resp, &url).await?;
        let activities: Vec<Activity> = resp.json().await.map_err(FetchError::Parse)?;
        tracing::debug!("Strava returned {} activities", activities.len());

        Ok(activities.into_iter().next())
    }
}

/// Check HTTP response status code and keep the body on failure.
async fn check_response(
    resp: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response, FetchError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        });
    }
    Ok(resp)
}
