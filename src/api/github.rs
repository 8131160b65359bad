//! GitHub repository contents API
//!
//! Files are read and written whole. Writes carry the blob SHA that was read,
//! so GitHub rejects them if the file changed in between.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;

use crate::config::GithubConfig;
use crate::error::PublishError;
use crate::site::{DocumentStore, RemoteDocument};

const USER_AGENT: &str = concat!("strava-sitelog/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Token-authenticated client for one repository.
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    repository: String,
    branch: Option<String>,
    token: String,
}

impl GithubClient {
    pub fn new(config: &GithubConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repository: config.repository.clone(),
            branch: config.branch.clone(),
            token: config.token.clone(),
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base,
            self.repository,
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, ACCEPT)
    }
}

#[async_trait]
impl DocumentStore for GithubClient {
    async fn read(&self, path: &str) -> Result<RemoteDocument, PublishError> {
        let url = self.contents_url(path);
        tracing::debug!("GitHub GET {}", url);

        let mut req = self.request(reqwest::Method::GET, &url);
        if let Some(ref branch) = self.branch {
            req = req.query(&[("ref", branch)]);
        }
        let resp = req.send().await.map_err(|source| PublishError::Request {
            url: url.clone(),
            source,
        })?;

        let resp = check_response(resp, &url, path, None).await?;
        let contents: ContentsResponse = resp.json().await.map_err(|e| PublishError::Content {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        decode_contents(path, contents)
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: &str,
    ) -> Result<(), PublishError> {
        let url = self.contents_url(path);
        tracing::debug!("GitHub PUT {} (sha {})", url, sha);

        let body = write_body(content, message, sha, self.branch.as_deref());
        let resp = self
            .request(reqwest::Method::PUT, &url)
            .json(&body)
            .send()
            .await
            .map_err(|source| PublishError::Request {
                url: url.clone(),
                source,
            })?;

        check_response(resp, &url, path, Some(sha)).await?;
        Ok(())
    }
}

fn decode_contents(
    path: &str,
    contents: ContentsResponse,
) -> Result<RemoteDocument, PublishError> {
    let content_error = |message: String| PublishError::Content {
        path: path.to_string(),
        message,
    };

    // Files over 1 MB come back without inline content
    if contents.encoding.as_deref() != Some("base64") {
        return Err(content_error(format!(
            "unsupported encoding {:?}",
            contents.encoding
        )));
    }

    // GitHub wraps the base64 payload at 60 columns
    let packed: String = contents
        .content
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(packed)
        .map_err(|e| content_error(e.to_string()))?;
    let content = String::from_utf8(bytes).map_err(|e| content_error(e.to_string()))?;

    Ok(RemoteDocument {
        content,
        sha: contents.sha,
    })
}

fn write_body(
    content: &str,
    message: &str,
    sha: &str,
    branch: Option<&str>,
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "message": message,
        "content": base64::engine::general_purpose::STANDARD.encode(content),
        "sha": sha,
    });
    if let Some(branch) = branch {
        body["branch"] = serde_json::Value::String(branch.to_string());
    }
    body
}

/// Check HTTP response status code; a rejected conditional write is a conflict.
async fn check_response(
    resp: reqwest::Response,
    url: &str,
    path: &str,
    sha: Option<&str>,
) -> Result<reqwest::Response, PublishError> {
    let status = resp.status();
    if let Some(sha) = sha {
        if status == reqwest::StatusCode::CONFLICT
            || status == reqwest::StatusCode::PRECONDITION_FAILED
        {
            return Err(PublishError::Conflict {
                path: path.to_string(),
                sha: sha.to_string(),
            });
        }
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(PublishError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        });
    }
    Ok(resp)
}
