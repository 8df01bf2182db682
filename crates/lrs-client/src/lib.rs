//! HTTP client backend targeting a peer Learning Record Store.
//!
//! Reads GET the statements resource and lazily follow the `more` URL of
//! paginated responses, re-applying the caller's query parameters on
//! every follow-up request.  Writes POST JSON arrays of statements in
//! chunks.  Every request carries Basic credentials and the configured
//! `X-Experience-API-Version` header.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use lrs_backend::{
    into_values, peek, DataBackend, DataBackendStatus, ListStream, OperationType, ReadItem,
    ReadStream, WriteStream,
};
use lrs_config::LrsSettings;
use lrs_error::{BackendError, BackendResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use tracing::{debug, error, info, warn};

// ---------------------------------------------------------------------------
// LrsQuery
// ---------------------------------------------------------------------------

/// Read query accepted by the LRS client: a flat mapping URL-encoded onto
/// the target path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LrsQuery {
    /// Query-string parameters.
    #[serde(default)]
    pub query_string: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// LrsHttpBackend
// ---------------------------------------------------------------------------

/// One page of a statements resource response.
#[derive(Debug, Deserialize)]
struct StatementsPage {
    #[serde(default)]
    statements: Vec<Value>,
    #[serde(default)]
    more: Option<String>,
}

/// LRS-over-HTTP data backend.
#[derive(Debug, Clone)]
pub struct LrsHttpBackend {
    settings: LrsSettings,
    client: reqwest::Client,
}

impl LrsHttpBackend {
    /// Instantiate the backend from its settings.
    pub fn new(settings: LrsSettings) -> BackendResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.request_timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        Ok(Self { settings, client })
    }

    /// Load settings from the environment and instantiate.
    pub fn from_env() -> BackendResult<Self> {
        let settings =
            LrsSettings::from_env().map_err(|err| BackendError::BadParameter(err.to_string()))?;
        Self::new(settings)
    }

    fn url(&self, path: &str) -> BackendResult<reqwest::Url> {
        let base = reqwest::Url::parse(&self.settings.url)
            .map_err(|err| BackendError::BadParameter(format!("invalid LRS URL: {err}")))?;
        base.join(path)
            .map_err(|err| BackendError::BadParameter(format!("invalid path '{path}': {err}")))
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: reqwest::Url,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .header("Content-Type", &self.settings.headers.content_type)
            .header(
                "X-Experience-API-Version",
                &self.settings.headers.x_experience_api_version,
            );
        if let Some(username) = &self.settings.basic_username {
            request = request.basic_auth(username, self.settings.basic_password.as_deref());
        }
        request
    }

    async fn fetch_page(
        &self,
        path: &str,
        params: &BTreeMap<String, String>,
    ) -> BackendResult<StatementsPage> {
        let url = self.url(path)?;
        let pairs: Vec<(&String, &String)> = params.iter().collect();
        let response = self
            .request(reqwest::Method::GET, url)
            .query(&pairs)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            let msg = "Failed to fetch statements.".to_owned();
            error!("{msg} ({})", response.status());
            return Err(BackendError::Transport(msg));
        }
        response
            .json()
            .await
            .map_err(|err| BackendError::BadFormat(format!("invalid statements page: {err}")))
    }

    /// Split a `more` URL into its path and query parameters.
    fn resolve_more(&self, more: &str) -> BackendResult<(String, BTreeMap<String, String>)> {
        let url = self.url(more)?;
        let params = url.query_pairs().into_owned().collect();
        Ok((url.path().to_owned(), params))
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::RequestTimeout(err.to_string())
    } else {
        BackendError::Transport(err.to_string())
    }
}

fn capitalized(operation_type: OperationType) -> &'static str {
    match operation_type {
        OperationType::Create => "Create",
        OperationType::Index => "Index",
        OperationType::Update => "Update",
        OperationType::Append => "Append",
        OperationType::Delete => "Delete",
    }
}

struct PageState {
    backend: LrsHttpBackend,
    caller_params: BTreeMap<String, String>,
    next: Option<(String, BTreeMap<String, String>)>,
    buffer: VecDeque<BackendResult<ReadItem>>,
    raw_output: bool,
}

impl PageState {
    async fn next_item(mut self) -> Option<(BackendResult<ReadItem>, Self)> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some((item, self));
            }
            let (path, params) = self.next.take()?;
            match self.backend.fetch_page(&path, &params).await {
                Err(err) => {
                    self.buffer.push_back(Err(err));
                }
                Ok(page) => {
                    for statement in page.statements {
                        let item = if self.raw_output {
                            ReadItem::Bytes(statement.to_string().into_bytes())
                        } else {
                            ReadItem::Value(statement)
                        };
                        self.buffer.push_back(Ok(item));
                    }
                    if let Some(more) = page.more {
                        match self.backend.resolve_more(&more) {
                            Ok((more_path, more_params)) => {
                                // Follow-up requests re-apply the caller's
                                // original parameters under the new cursor.
                                let mut merged = self.caller_params.clone();
                                merged.extend(more_params);
                                self.next = Some((more_path, merged));
                            }
                            Err(err) => self.buffer.push_back(Err(err)),
                        }
                    }
                }
            }
        }
    }
}

#[async_trait]
impl DataBackend for LrsHttpBackend {
    type Query = LrsQuery;

    fn name(&self) -> &'static str {
        "lrs"
    }

    async fn status(&self) -> DataBackendStatus {
        let Ok(url) = self.url(&self.settings.status_endpoint) else {
            return DataBackendStatus::Error;
        };
        match self.request(reqwest::Method::GET, url).send().await {
            Err(err) => {
                error!("Unable to request the server: {err}");
                DataBackendStatus::Away
            }
            Ok(response) => match response.status().as_u16() {
                200 => DataBackendStatus::Ok,
                503 => DataBackendStatus::Away,
                _ => DataBackendStatus::Error,
            },
        }
    }

    async fn list(
        &self,
        target: Option<&str>,
        _details: bool,
        _new: bool,
    ) -> BackendResult<ListStream> {
        let msg = format!(
            "LRS HTTP backend does not support `list` method, cannot list from {}",
            target.unwrap_or(&self.settings.statements_endpoint)
        );
        error!("{msg}");
        Err(BackendError::NotSupported(msg))
    }

    async fn read(
        &self,
        query: Option<&Self::Query>,
        target: Option<&str>,
        _chunk_size: Option<usize>,
        raw_output: bool,
        _ignore_errors: bool,
    ) -> BackendResult<ReadStream> {
        let caller_params = query.map(|q| q.query_string.clone()).unwrap_or_default();
        let path = target
            .unwrap_or(&self.settings.statements_endpoint)
            .to_owned();

        let state = PageState {
            backend: self.clone(),
            caller_params: caller_params.clone(),
            next: Some((path, caller_params)),
            buffer: VecDeque::new(),
            raw_output,
        };
        Ok(stream::unfold(state, PageState::next_item).boxed())
    }

    async fn write(
        &self,
        data: WriteStream,
        target: Option<&str>,
        chunk_size: Option<usize>,
        ignore_errors: bool,
        operation_type: Option<OperationType>,
    ) -> BackendResult<usize> {
        let operation_type = operation_type.unwrap_or(OperationType::Create);
        if matches!(
            operation_type,
            OperationType::Append | OperationType::Update | OperationType::Delete
        ) {
            let msg = format!(
                "{} operation_type is not supported.",
                capitalized(operation_type)
            );
            error!("{msg}");
            return Err(BackendError::NotSupported(msg));
        }
        let chunk_size = chunk_size.unwrap_or(self.settings.default_chunk_size);
        let path = target.unwrap_or(&self.settings.statements_endpoint);
        let url = self.url(path)?;

        let Some(data) = peek(data).await else {
            info!("Data Iterator is empty; skipping write to target.");
            return Ok(0);
        };
        debug!("Start writing to the {url} endpoint (chunk size: {chunk_size})");

        let mut batches = into_values(data, ignore_errors).chunks(chunk_size).boxed();
        let mut count = 0usize;
        while let Some(batch) = batches.next().await {
            let mut statements = Vec::with_capacity(batch.len());
            for item in batch {
                statements.push(item?);
            }

            let posted = self
                .request(reqwest::Method::POST, url.clone())
                .json(&statements)
                .send()
                .await
                .map_err(transport)
                .and_then(|response| {
                    if response.status().is_success() {
                        Ok(())
                    } else {
                        Err(BackendError::Transport(format!(
                            "Failed to post statements ({})",
                            response.status()
                        )))
                    }
                });
            match posted {
                Ok(()) => count += statements.len(),
                Err(err) if ignore_errors => {
                    warn!("Failed to post a statements chunk but you choose to ignore it: {err}");
                }
                Err(err) => {
                    return Err(BackendError::PartialBatch {
                        count,
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(count)
    }
}
