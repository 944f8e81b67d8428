//! HTTP adapter: reqwest implementation of `ImagingApi`.

mod wire;

use std::time::Duration;

use reqwest::{multipart, StatusCode, Url};

use crate::domain::{AnalysisResult, PatientRecord, PatientSummary, ScanImageRef, UploadCandidate};
use crate::ports::{ApiError, HealthStatus, ImagingApi};
use crate::MedlensError;

use wire::{AnalyzeEnvelope, PatientEnvelope, SearchEnvelope, WireHealth};

/// Client for the imaging service rooted at a base URL.
#[derive(Debug, Clone)]
pub struct HttpImagingApi {
    base_url: Url,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpImagingApi {
    /// Create a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    /// Returns `MedlensError::Config` if the URL is invalid or the client
    /// cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> crate::Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|e| MedlensError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            client,
            timeout,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    fn map_send_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Transport(e.to_string())
        }
    }

    /// Send a request and return the body of a 2xx response.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        let detail = wire::error_detail(&body);
        tracing::debug!(status = status.as_u16(), has_detail = detail.is_some(), "Request failed");
        if status == StatusCode::NOT_FOUND {
            Err(ApiError::NotFound { detail })
        } else {
            Err(ApiError::Server {
                status: status.as_u16(),
                detail,
            })
        }
    }
}

fn parse_base_url(raw: &str) -> crate::Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| MedlensError::Config(format!("Invalid API base URL {raw:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(MedlensError::Config(format!(
            "API base URL must use http or https, got {}",
            url.scheme()
        )));
    }
    // Endpoints are joined relative to the base, which needs a trailing slash.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl ImagingApi for HttpImagingApi {
    async fn analyze_image(&self, candidate: &UploadCandidate) -> Result<AnalysisResult, ApiError> {
        let url = self.endpoint("analyze-image")?;
        let part = multipart::Part::bytes(candidate.content.to_vec())
            .file_name(candidate.file_name.clone())
            .mime_str(&candidate.mime_type)
            .map_err(|e| ApiError::Transport(format!("invalid MIME type: {e}")))?;
        let form = multipart::Form::new().part("file", part);

        let body = self.execute(self.client.post(url).multipart(form)).await?;
        let envelope: AnalyzeEnvelope = wire::decode(&body)?;
        tracing::debug!(
            filename = envelope.filename.as_deref().unwrap_or("-"),
            server_timestamp = envelope.timestamp.as_deref().unwrap_or("-"),
            "Analysis response decoded"
        );
        AnalysisResult::try_from(envelope.analysis)
    }

    async fn search_patients(&self, query: &str) -> Result<Vec<PatientSummary>, ApiError> {
        let url = self.endpoint("patients/search")?;
        let body = self
            .execute(self.client.get(url).query(&[("query", query)]))
            .await?;
        let envelope: SearchEnvelope = wire::decode(&body)?;
        Ok(envelope.patients.into_iter().map(Into::into).collect())
    }

    async fn fetch_patient(&self, patient_id: &str) -> Result<PatientRecord, ApiError> {
        let mut url = self.endpoint("patient/")?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Transport("base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .push(patient_id);

        let body = self.execute(self.client.get(url)).await?;
        let envelope: PatientEnvelope = wire::decode(&body)?;
        Ok(envelope.into_patient().into())
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = self.endpoint("health")?;
        let body = self.execute(self.client.get(url)).await?;
        let health: WireHealth = wire::decode(&body)?;
        Ok(health.into())
    }

    fn image_url(&self, image: &ScanImageRef) -> Result<String, ApiError> {
        // References are origin-relative paths such as `/images/glioma/1.jpg`.
        self.base_url
            .join(image.as_str())
            .map(String::from)
            .map_err(|e| ApiError::MalformedResponse(format!("bad image reference: {e}")))
    }
}
