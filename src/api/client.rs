//! `reqwest`-based client for the check service.
//!
//! Thin request/response wrappers over the service's REST surface plus
//! [`stream_check`](ApiClient::stream_check), which exposes the chunked
//! body of a streaming check as an [`AsyncRead`] for the
//! [`run_check`](crate::check::runner::run_check) loop.
//!
//! The configured timeout applies per request/response call.  It is
//! deliberately not installed on the underlying [`reqwest::Client`]:
//! a client-level timeout would also cap the total read time of a
//! streaming body, killing long-running checks mid-stream.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::TryStreamExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::check::poller::ProgressSource;
use crate::models::ai_model::AiModel;
use crate::models::erp::{ErpDatabase, ErpSqlList};
use crate::models::progress::BatchProgress;
use crate::models::provider::AiProvider;
use crate::models::record::CheckRecord;
use crate::models::request::{BatchCheckRequest, BatchSubmission, CheckAllRequest, CheckRequest};
use crate::{AppError, Result};

/// Outcome of an ERP connection test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ConnectionTest {
    /// `success` when the service could connect.
    pub status: String,
    /// Human-readable detail.
    pub message: String,
}

/// Report format for batch exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Excel workbook (`.xlsx`).
    Excel,
    /// PDF report.
    Pdf,
}

impl ExportFormat {
    /// URL path segment for the export endpoint.
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Excel => "excel",
            Self::Pdf => "pdf",
        }
    }

    /// Conventional file extension for the format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Excel => "xlsx",
            Self::Pdf => "pdf",
        }
    }
}

/// HTTP client bound to one check service instance.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    request_timeout: Duration,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the service at `base_url` (e.g.
    /// `http://127.0.0.1:8000/api`).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| AppError::Transport(format!("failed to build http client: {err}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            request_timeout,
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    // ── Streaming check ───────────────────────────────────────────────────────

    /// Submit a single check and return the raw event-line stream.
    ///
    /// The returned reader yields the chunked response body; feed it to
    /// [`run_check`](crate::check::runner::run_check).  Dropping the
    /// reader releases the connection.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` when the connection fails and
    /// `AppError::Api` on a non-success response — both before any
    /// stream is produced.
    pub async fn stream_check(
        &self,
        request: &CheckRequest,
    ) -> Result<Pin<Box<dyn AsyncRead + Send>>> {
        let url = self.url("/check/single/stream");
        debug!(model_id = request.model_id, "submitting streaming check");

        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Api(format!(
                "POST /check/single/stream: HTTP {status}: {detail}"
            )));
        }

        let body = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::pin(StreamReader::new(body)))
    }

    // ── Check submission and progress ─────────────────────────────────────────

    /// Submit a single check without streaming; blocks until the
    /// service has the full result.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn check_single(&self, request: &CheckRequest) -> Result<CheckRecord> {
        self.post_json("/check/single", request).await
    }

    /// Submit a batch of statements for asynchronous checking.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn submit_batch(&self, request: &BatchCheckRequest) -> Result<BatchSubmission> {
        self.post_json("/check/batch", request).await
    }

    /// Ask the service to check every statement of an ERP database.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn check_all(&self, request: &CheckAllRequest) -> Result<BatchSubmission> {
        self.post_json("/check/all", request).await
    }

    /// Query the progress of a batch job.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api` (including 404
    /// for an unknown batch).
    pub async fn batch_progress(&self, batch_id: &str) -> Result<BatchProgress> {
        self.get_json(&format!("/check/progress/{batch_id}")).await
    }

    // ── Configuration ─────────────────────────────────────────────────────────

    /// List configured AI providers.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn providers(&self) -> Result<Vec<AiProvider>> {
        self.get_json("/config/providers").await
    }

    /// Create a provider entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn create_provider(&self, provider: &AiProvider) -> Result<AiProvider> {
        self.post_json("/config/providers", provider).await
    }

    /// Update a provider entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn update_provider(&self, id: i64, provider: &AiProvider) -> Result<AiProvider> {
        self.put_json(&format!("/config/providers/{id}"), provider)
            .await
    }

    /// Delete a provider entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn delete_provider(&self, id: i64) -> Result<()> {
        self.delete(&format!("/config/providers/{id}")).await
    }

    /// List configured AI models.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn models(&self) -> Result<Vec<AiModel>> {
        self.get_json("/config/models").await
    }

    /// Create a model entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn create_model(&self, model: &AiModel) -> Result<AiModel> {
        self.post_json("/config/models", model).await
    }

    /// Update a model entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn update_model(&self, id: i64, model: &AiModel) -> Result<AiModel> {
        self.put_json(&format!("/config/models/{id}"), model).await
    }

    /// Delete a model entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn delete_model(&self, id: i64) -> Result<()> {
        self.delete(&format!("/config/models/{id}")).await
    }

    /// List configured ERP databases.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn databases(&self) -> Result<Vec<ErpDatabase>> {
        self.get_json("/config/erp-databases").await
    }

    /// Create an ERP database entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn create_database(&self, database: &ErpDatabase) -> Result<ErpDatabase> {
        self.post_json("/config/erp-databases", database).await
    }

    /// Update an ERP database entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn update_database(&self, id: i64, database: &ErpDatabase) -> Result<ErpDatabase> {
        self.put_json(&format!("/config/erp-databases/{id}"), database)
            .await
    }

    /// Delete an ERP database entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn delete_database(&self, id: i64) -> Result<()> {
        self.delete(&format!("/config/erp-databases/{id}")).await
    }

    /// Enumerate the checkable SQL statements of an ERP database.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn erp_sqls(&self, config_id: i64) -> Result<ErpSqlList> {
        self.get_json(&format!("/config/erp-databases/{config_id}/sqls"))
            .await
    }

    /// Test connectivity of an ERP database configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn test_connection(&self, config_id: i64) -> Result<ConnectionTest> {
        self.post_empty(&format!("/config/erp-databases/{config_id}/test"))
            .await
    }

    // ── History and export ────────────────────────────────────────────────────

    /// List check history records, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn records(&self, limit: Option<u32>) -> Result<Vec<CheckRecord>> {
        let path = match limit {
            Some(limit) => format!("/history/records?limit={limit}"),
            None => "/history/records".to_owned(),
        };
        self.get_json(&path).await
    }

    /// Fetch one history record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn record(&self, id: i64) -> Result<CheckRecord> {
        self.get_json(&format!("/history/records/{id}")).await
    }

    /// List every record of one batch.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn batch_records(&self, batch_id: &str) -> Result<Vec<CheckRecord>> {
        self.get_json(&format!("/history/batch/{batch_id}")).await
    }

    /// Download a batch report and return its raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` or `AppError::Api`.
    pub async fn export_report(&self, batch_id: &str, format: ExportFormat) -> Result<Vec<u8>> {
        let path = format!("/export/{}/{batch_id}", format.path_segment());
        let response = self
            .http
            .get(self.url(&path))
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Api(format!("GET {path}: HTTP {status}: {detail}")));
        }

        Ok(response.bytes().await?.to_vec())
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(self.url(path))
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::read_json("GET", path, response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .http
            .post(self.url(path))
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await?;
        Self::read_json("POST", path, response).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .post(self.url(path))
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::read_json("POST", path, response).await
    }

    async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .http
            .put(self.url(path))
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await?;
        Self::read_json("PUT", path, response).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.url(path))
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Api(format!(
                "DELETE {path}: HTTP {status}: {detail}"
            )));
        }
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(
        method: &str,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Api(format!(
                "{method} {path}: HTTP {status}: {detail}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Api(format!("{method} {path}: malformed response: {err}")))
    }
}

impl ProgressSource for ApiClient {
    fn fetch_progress(
        &self,
        batch_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<BatchProgress>> + Send + '_>> {
        let batch_id = batch_id.to_owned();
        Box::pin(async move { self.batch_progress(&batch_id).await })
    }
}
