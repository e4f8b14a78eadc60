pub mod context;
pub mod error;
pub mod jira_link;
pub mod pagination;
pub mod transport;

pub use context::CallContext;
pub use error::{ApiError, ErrorKind, Result};
pub use jira_link::{JiraLink, JiraLinkApi, JiraLinkListOptions, JiraLinkPages, JiraLinks};
pub use pagination::{Page, PageOptions};
pub use reqwest::Method;
pub use transport::Transport;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub enum AuthMethod {
    /// Basic auth with `{email}/token` as the username.
    ApiToken { email: String, token: String },
    Password { email: String, password: String },
    /// OAuth access token.
    Bearer { token: String },
}

/// HTTP transport for the Zendesk Support REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    auth: Option<AuthMethod>,
}

impl ApiClient {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let mut url = Url::parse(base_url.as_ref()).map_err(ApiError::InvalidUrl)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            client: Self::build_client(DEFAULT_TIMEOUT)?,
            base_url: url,
            auth: None,
        })
    }

    /// Client for `https://{subdomain}.zendesk.com/api/v2/`.
    pub fn for_subdomain(subdomain: &str) -> Result<Self> {
        Self::new(format!("https://{subdomain}.zendesk.com/api/v2/"))
    }

    fn build_client(timeout: Duration) -> Result<Client> {
        Client::builder()
            .user_agent(format!("zendesk-cli/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(ApiError::RequestFailed)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Self::build_client(timeout)?;
        Ok(self)
    }

    pub fn with_api_token(mut self, email: impl Into<String>, token: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::ApiToken {
            email: email.into(),
            token: token.into(),
        });
        self
    }

    pub fn with_password(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::Password {
            email: email.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::Bearer {
            token: token.into(),
        });
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn jira_links(&self) -> JiraLinks<'_, Self> {
        JiraLinks::new(self)
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.strip_prefix('/').unwrap_or(path))
            .map_err(ApiError::InvalidUrl)
    }

    async fn execute(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Vec<u8>> {
        debug!(method = %method, url = %url, "Sending request");

        let mut req = self
            .client
            .request(method, url.clone())
            .header(reqwest::header::ACCEPT, "application/json");
        req = self.apply_auth(req);

        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(ApiError::RequestFailed)?;
        let status = response.status();
        debug!(status = %status, "Received response");

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::AuthenticationFailed {
                message: "Invalid or expired credentials".to_string(),
            }),
            StatusCode::FORBIDDEN => Err(ApiError::Forbidden {
                resource: url.path().to_string(),
            }),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound {
                resource: url.path().to_string(),
            }),
            StatusCode::BAD_REQUEST => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Bad request".to_string());
                Err(ApiError::BadRequest { message })
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unprocessable entity".to_string());
                Err(ApiError::UnprocessableEntity { message })
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60);
                Err(ApiError::RateLimitExceeded { retry_after })
            }
            status if status.is_success() => {
                let bytes = response.bytes().await.map_err(ApiError::RequestFailed)?;
                Ok(bytes.to_vec())
            }
            _ => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| format!("Unexpected status: {}", status));
                Err(ApiError::ServerError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(AuthMethod::ApiToken { email, token }) => {
                request.basic_auth(format!("{email}/token"), Some(token))
            }
            Some(AuthMethod::Password { email, password }) => {
                request.basic_auth(email, Some(password))
            }
            Some(AuthMethod::Bearer { token }) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn send(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Vec<u8>> {
        let url = self.url_for(path)?;
        ctx.run(self.execute(method, url, body)).await
    }
}
