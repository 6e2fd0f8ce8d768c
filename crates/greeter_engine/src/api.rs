use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use greeter_core::{JobDetails, QuotaStatus};
use run_logging::run_debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not logged in: no auth token stored")]
    MissingToken,
    #[error("invalid API url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("request timed out")]
    Timeout,
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Body of a submission-tracking call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
    pub greeting: String,
    pub platform_link: String,
    pub timestamp: String,
}

impl Submission {
    pub fn new(
        job: JobDetails,
        greeting: impl Into<String>,
        platform_link: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_title: job.job_title,
            company_name: job.company_name,
            job_description: job.job_description,
            greeting: greeting.into(),
            platform_link: platform_link.into(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[async_trait]
pub trait GreetingService: Send + Sync {
    async fn generate_greeting(&self, job: &JobDetails) -> Result<String, ApiError>;
}

#[async_trait]
pub trait SubmissionTracker: Send + Sync {
    async fn track(&self, submission: &Submission) -> Result<(), ApiError>;
}

#[async_trait]
pub trait QuotaSource: Send + Sync {
    async fn quota(&self) -> Result<QuotaStatus, ApiError>;
}

#[derive(Debug, Deserialize)]
struct GreetingReply {
    greeting: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: Option<String>,
    message: Option<String>,
}

/// Client for the greeting backend. Every call carries the bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    settings: ApiSettings,
    token: Option<String>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(settings: ApiSettings, token: Option<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self {
            settings,
            token: token.filter(|token| !token.trim().is_empty()),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url, ApiError> {
        let raw = format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path);
        reqwest::Url::parse(&raw).map_err(|err| ApiError::InvalidUrl {
            url: raw,
            message: err.to_string(),
        })
    }

    fn token(&self) -> Result<&str, ApiError> {
        self.token.as_deref().ok_or(ApiError::MissingToken)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request
            .bearer_auth(self.token()?)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorReply>(&body)
            .ok()
            .and_then(|reply| reply.error.or(reply.message))
            .unwrap_or_else(|| status.to_string());
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl GreetingService for ApiClient {
    async fn generate_greeting(&self, job: &JobDetails) -> Result<String, ApiError> {
        let url = self.endpoint("generate-greeting")?;
        run_debug!("POST {} for {} @ {}", url, job.job_title, job.company_name);
        let response = self.send(self.client.post(url).json(job)).await?;
        let reply: GreetingReply = response
            .json()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))?;

        match (reply.greeting, reply.error) {
            (Some(greeting), _) if !greeting.trim().is_empty() => Ok(greeting),
            (_, Some(error)) => Err(ApiError::Status {
                status: 200,
                message: error,
            }),
            _ => Err(ApiError::Decode("reply carried no greeting".to_string())),
        }
    }
}

#[async_trait]
impl SubmissionTracker for ApiClient {
    async fn track(&self, submission: &Submission) -> Result<(), ApiError> {
        let url = self.endpoint("track-submission")?;
        self.send(self.client.post(url).json(submission)).await?;
        Ok(())
    }
}

#[async_trait]
impl QuotaSource for ApiClient {
    async fn quota(&self) -> Result<QuotaStatus, ApiError> {
        let url = self.endpoint("user/status")?;
        let response = self.send(self.client.get(url)).await?;
        response
            .json()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    ApiError::Network(err.to_string())
}
