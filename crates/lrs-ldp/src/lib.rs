//! Read-only data backend for the OVH Log Data Platform.
//!
//! Archives live under a stream; reading one first asks the platform for
//! a temporary signed URL, then streams the archive content in byte
//! chunks.  Fully-read archives are recorded in the history journal under
//! a stream-disambiguated identifier, so the same archive name in two
//! streams is never spuriously reported as already read.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use lrs_backend::{
    DataBackend, DataBackendStatus, HistoryAction, HistoryEntry, HistoryJournal, ListItem,
    ListStream, OperationType, ReadItem, ReadStream, WriteStream,
};
use lrs_config::{HistorySettings, LdpSettings};
use lrs_error::{BackendError, BackendResult};
use serde_json::Value;
use sha1::{Digest, Sha1};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, warn};

/// OVH Log Data Platform data backend.
#[derive(Debug, Clone)]
pub struct LdpDataBackend {
    settings: LdpSettings,
    journal: HistoryJournal,
    client: reqwest::Client,
}

impl LdpDataBackend {
    /// Instantiate the backend from its settings.
    pub fn new(settings: LdpSettings, journal: HistoryJournal) -> BackendResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.request_timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        Ok(Self {
            settings,
            journal,
            client,
        })
    }

    /// Load settings from the environment and instantiate.
    pub fn from_env() -> BackendResult<Self> {
        let settings =
            LdpSettings::from_env().map_err(|err| BackendError::BadParameter(err.to_string()))?;
        let history =
            HistorySettings::from_env().map_err(|err| BackendError::BadParameter(err.to_string()))?;
        Self::new(settings, HistoryJournal::new(history.file))
    }

    /// The archive collection path for `stream_id`.
    fn archive_endpoint(&self, stream_id: Option<&str>) -> BackendResult<String> {
        let stream_id = stream_id.or(self.settings.default_stream_id.as_deref());
        let (Some(service_name), Some(stream_id)) =
            (self.settings.service_name.as_deref(), stream_id)
        else {
            let msg = "LDP backend requires both service_name and stream_id to be set".to_owned();
            error!("{msg}");
            return Err(BackendError::BadParameter(msg));
        };
        Ok(format!(
            "/dbaas/logs/{service_name}/output/graylog/stream/{stream_id}/archive"
        ))
    }

    /// Sign and send an API request, returning the parsed JSON body.
    async fn api_call(&self, method: reqwest::Method, path: &str) -> BackendResult<Value> {
        let url = format!("{}{path}", self.settings.endpoint.trim_end_matches('/'));
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| BackendError::Transport(err.to_string()))?
            .as_secs()
            .to_string();

        let application_key = self.settings.application_key.clone().unwrap_or_default();
        let application_secret = self.settings.application_secret.clone().unwrap_or_default();
        let consumer_key = self.settings.consumer_key.clone().unwrap_or_default();

        // First-generation request signature: SHA-1 over the credential
        // and request line, prefixed with "$1$".
        let signed = format!(
            "{application_secret}+{consumer_key}+{method}+{url}++{timestamp}",
            method = method.as_str(),
        );
        let digest = Sha1::digest(signed.as_bytes());
        let signature = format!(
            "$1${}",
            digest.iter().map(|byte| format!("{byte:02x}")).collect::<String>()
        );

        let response = self
            .client
            .request(method, &url)
            .header("X-Ovh-Application", application_key)
            .header("X-Ovh-Consumer", consumer_key)
            .header("X-Ovh-Timestamp", timestamp)
            .header("X-Ovh-Signature", signature)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        if !status.is_success() {
            return Err(BackendError::Transport(format!(
                "LDP API request failed ({status}): {}",
                text.trim()
            )));
        }
        serde_json::from_str(&text)
            .map_err(|err| BackendError::BadFormat(format!("invalid API response: {err}")))
    }

    /// Detail record of one archive.
    async fn details(&self, stream_id: Option<&str>, name: &str) -> BackendResult<Value> {
        let endpoint = self.archive_endpoint(stream_id)?;
        self.api_call(reqwest::Method::GET, &format!("{endpoint}/{name}"))
            .await
    }

    /// Resolve the temporary signed download URL of an archive.
    async fn archive_url(&self, stream_id: Option<&str>, name: &str) -> BackendResult<String> {
        let endpoint = self.archive_endpoint(stream_id)?;
        let response = self
            .api_call(reqwest::Method::POST, &format!("{endpoint}/{name}/url"))
            .await?;
        let url = response
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BackendError::BadFormat("archive URL response carries no `url`".to_owned())
            })?
            .to_owned();
        debug!("Temporary URL: {url}");
        Ok(url)
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::RequestTimeout(err.to_string())
    } else {
        BackendError::Transport(err.to_string())
    }
}

#[async_trait]
impl DataBackend for LdpDataBackend {
    type Query = String;

    fn name(&self) -> &'static str {
        "ldp"
    }

    async fn status(&self) -> DataBackendStatus {
        let endpoint = match self.archive_endpoint(None) {
            Ok(endpoint) => endpoint,
            Err(_) => return DataBackendStatus::Error,
        };
        match self.api_call(reqwest::Method::GET, &endpoint).await {
            Ok(_) => DataBackendStatus::Ok,
            Err(BackendError::Transport(msg)) if msg.contains("API request failed") => {
                error!("Failed to connect to the LDP: {msg}");
                DataBackendStatus::Error
            }
            Err(err) => {
                error!("Failed to connect to the LDP: {err}");
                DataBackendStatus::Away
            }
        }
    }

    async fn list(
        &self,
        target: Option<&str>,
        details: bool,
        new: bool,
    ) -> BackendResult<ListStream> {
        let endpoint = self.archive_endpoint(target)?;
        debug!("List archives endpoint: {endpoint}");
        let stream_id = target
            .or(self.settings.default_stream_id.as_deref())
            .unwrap_or_default()
            .to_owned();

        let archives = self
            .api_call(reqwest::Method::GET, &endpoint)
            .await
            .map_err(|err| {
                let msg = format!("Failed to get archives list: {err}");
                error!("{msg}");
                BackendError::Transport(msg)
            })?;
        let mut archives: Vec<String> = archives
            .as_array()
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        debug!("Found {} archives", archives.len());

        if new {
            let read = self.journal.ids(self.name(), HistoryAction::Read).await?;
            archives.retain(|archive| !read.contains(&format!("{stream_id}/{archive}")));
            debug!("New archives: {}", archives.len());
        }

        if !details {
            let items: Vec<BackendResult<ListItem>> =
                archives.into_iter().map(|id| Ok(ListItem::Id(id))).collect();
            return Ok(stream::iter(items).boxed());
        }

        let mut items: Vec<BackendResult<ListItem>> = Vec::with_capacity(archives.len());
        for archive in archives {
            items.push(
                self.details(target, &archive)
                    .await
                    .map(ListItem::Details),
            );
        }
        Ok(stream::iter(items).boxed())
    }

    async fn read(
        &self,
        query: Option<&Self::Query>,
        target: Option<&str>,
        chunk_size: Option<usize>,
        raw_output: bool,
        ignore_errors: bool,
    ) -> BackendResult<ReadStream> {
        let Some(archive) = query else {
            return Err(BackendError::BadParameter(
                "Invalid query. The query should be a valid archive name".to_owned(),
            ));
        };
        if !raw_output || !ignore_errors {
            warn!("The `raw_output` and `ignore_errors` arguments are ignored");
        }
        let chunk_size = chunk_size.unwrap_or(self.settings.default_chunk_size);
        let stream_id = target
            .or(self.settings.default_stream_id.as_deref())
            .unwrap_or_default()
            .to_owned();
        debug!("Getting archive: {archive} from stream: {stream_id}");

        // Stream the archive content from its signed URL.
        let url = self.archive_url(target, archive).await?;
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(|err| {
                let msg = format!("Failed to read archive {archive}: {err}");
                error!("{msg}");
                BackendError::Transport(msg)
            })?;
        let body = response.bytes().await.map_err(transport)?;
        let chunks: Vec<BackendResult<ReadItem>> = body
            .chunks(chunk_size.max(1))
            .map(|chunk| Ok(ReadItem::Bytes(chunk.to_vec())))
            .collect();

        // The archive is about to be fully read; record it so the `new`
        // filter skips it from now on.  The identifier is prepended with
        // the stream so equally-named archives in other streams still
        // count as unread.
        let details = self.details(target, archive).await.unwrap_or_default();
        self.journal
            .append(&HistoryEntry {
                backend: self.name().to_owned(),
                action: HistoryAction::Read,
                id: format!("{stream_id}/{archive}"),
                filename: details
                    .get("filename")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                size: details.get("size").and_then(Value::as_u64),
                timestamp: Utc::now(),
                operation_type: None,
            })
            .await?;

        Ok(stream::iter(chunks).boxed())
    }

    async fn write(
        &self,
        _data: WriteStream,
        target: Option<&str>,
        _chunk_size: Option<usize>,
        _ignore_errors: bool,
        _operation_type: Option<OperationType>,
    ) -> BackendResult<usize> {
        let msg = format!(
            "LDP data backend is read-only, cannot write to {}",
            target.unwrap_or_default()
        );
        error!("{msg}");
        Err(BackendError::NotSupported(msg))
    }
}
