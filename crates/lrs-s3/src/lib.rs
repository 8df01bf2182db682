//! Object-store data backend over S3-compatible storage.
//!
//! Targets are `bucket/key` pairs.  Reads stream an object's content and
//! record a history entry once the archive is fully fetched; writes
//! refuse to overwrite existing keys for `create`/`index` and record a
//! history entry on success.  The platform cannot append or delete.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use lrs_backend::{
    peek, DataBackend, DataBackendStatus, HistoryAction, HistoryEntry, HistoryJournal, ListItem,
    ListStream, OperationType, ReadItem, ReadStream, WriteRecord, WriteStream,
};
use lrs_config::{HistorySettings, S3Settings};
use lrs_error::{BackendError, BackendResult};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// S3 data backend.
#[derive(Clone)]
pub struct S3DataBackend {
    settings: S3Settings,
    journal: HistoryJournal,
    store_override: Option<Arc<dyn ObjectStore>>,
}

impl S3DataBackend {
    /// Instantiate the backend from its settings.
    pub fn new(settings: S3Settings, journal: HistoryJournal) -> Self {
        Self {
            settings,
            journal,
            store_override: None,
        }
    }

    /// Load settings from the environment and instantiate.
    pub fn from_env() -> BackendResult<Self> {
        let settings =
            S3Settings::from_env().map_err(|err| BackendError::BadParameter(err.to_string()))?;
        let history =
            HistorySettings::from_env().map_err(|err| BackendError::BadParameter(err.to_string()))?;
        Ok(Self::new(settings, HistoryJournal::new(history.file)))
    }

    /// Pin every bucket to an explicit store implementation.
    ///
    /// Lets tests and S3-compatible deployments substitute the transport.
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store_override = Some(store);
        self
    }

    fn default_bucket(&self) -> BackendResult<&str> {
        self.settings.default_bucket_name.as_deref().ok_or_else(|| {
            BackendError::BadParameter("no bucket target given and no default bucket set".to_owned())
        })
    }

    fn store_for(&self, bucket: &str) -> BackendResult<Arc<dyn ObjectStore>> {
        if let Some(store) = &self.store_override {
            return Ok(Arc::clone(store));
        }
        let mut builder = AmazonS3Builder::new().with_bucket_name(bucket);
        if let Some(region) = &self.settings.default_region {
            builder = builder.with_region(region);
        }
        if let Some(access_key_id) = &self.settings.access_key_id {
            builder = builder.with_access_key_id(access_key_id);
        }
        if let Some(secret) = &self.settings.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(token) = &self.settings.session_token {
            builder = builder.with_token(token);
        }
        if let Some(endpoint) = &self.settings.endpoint_url {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }
        let store = builder
            .build()
            .map_err(|err| BackendError::BadParameter(err.to_string()))?;
        Ok(Arc::new(store))
    }

    /// Split a `bucket/key` target, defaulting the bucket when absent.
    fn split_target<'a>(&'a self, target: &'a str) -> BackendResult<(&'a str, &'a str)> {
        match target.split_once('/') {
            Some((bucket, key)) => Ok((bucket, key)),
            None => {
                let bucket = self.default_bucket()?;
                info!("Bucket not specified; using default bucket: {bucket}/{target}");
                Ok((bucket, target))
            }
        }
    }

    async fn append_history(&self, entry: HistoryEntry) -> BackendResult<()> {
        self.journal.append(&entry).await
    }
}

fn store_error(err: object_store::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}

fn is_not_found(err: &object_store::Error) -> bool {
    matches!(err, object_store::Error::NotFound { .. })
}

/// Cut `bytes` into chunks of at most `chunk_size`.
fn rechunk(bytes: &[u8], chunk_size: usize) -> Vec<Vec<u8>> {
    bytes
        .chunks(chunk_size.max(1))
        .map(<[u8]>::to_vec)
        .collect()
}

/// Parse newline-delimited JSON records.
fn parse_lines(bytes: &[u8], ignore_errors: bool) -> Vec<BackendResult<ReadItem>> {
    bytes
        .split(|byte| *byte == b'\n')
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_slice::<Value>(line) {
            Ok(value) => Some(Ok(ReadItem::Value(value))),
            Err(err) => {
                let msg = format!("Raised error: {err}");
                error!("{msg}");
                if ignore_errors {
                    None
                } else {
                    Some(Err(BackendError::BadFormat(msg)))
                }
            }
        })
        .collect()
}

#[async_trait]
impl DataBackend for S3DataBackend {
    type Query = String;

    fn name(&self) -> &'static str {
        "s3"
    }

    async fn status(&self) -> DataBackendStatus {
        let Ok(bucket) = self.default_bucket() else {
            return DataBackendStatus::Error;
        };
        let Ok(store) = self.store_for(bucket) else {
            return DataBackendStatus::Error;
        };
        // Probing the bucket root is enough: an empty listing proves the
        // bucket exists and is accessible.
        match store.list(None).next().await {
            None | Some(Ok(_)) => DataBackendStatus::Ok,
            Some(Err(err)) => {
                error!("Failed to access the bucket {bucket}: {err}");
                DataBackendStatus::Error
            }
        }
    }

    async fn list(
        &self,
        target: Option<&str>,
        details: bool,
        new: bool,
    ) -> BackendResult<ListStream> {
        let bucket = match target {
            Some(target) => target.to_owned(),
            None => self.default_bucket()?.to_owned(),
        };
        let store = self.store_for(&bucket)?;

        let to_skip = if new {
            self.journal.ids(self.name(), HistoryAction::Read).await?
        } else {
            Default::default()
        };

        let mut objects = store.list(None);
        let mut items: Vec<BackendResult<ListItem>> = Vec::new();
        while let Some(meta) = objects.next().await {
            match meta {
                Ok(meta) => {
                    let key = meta.location.to_string();
                    if new && to_skip.contains(&format!("{bucket}/{key}")) {
                        continue;
                    }
                    if details {
                        items.push(Ok(ListItem::Details(json!({
                            "Key": key,
                            "Size": meta.size,
                            "LastModified": meta
                                .last_modified
                                .format("%Y-%m-%d %H:%M:%S")
                                .to_string(),
                        }))));
                    } else {
                        items.push(Ok(ListItem::Id(key)));
                    }
                }
                Err(err) => {
                    let msg = format!("Failed to list the bucket {bucket}: {err}");
                    error!("{msg}");
                    return Err(BackendError::Transport(msg));
                }
            }
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
        let Some(key) = query else {
            let msg = "`query` argument is required to read.".to_owned();
            error!("{msg}");
            return Err(BackendError::BadParameter(msg));
        };
        let bucket = match target {
            Some(target) => target.to_owned(),
            None => self.default_bucket()?.to_owned(),
        };
        let chunk_size = chunk_size.unwrap_or(self.settings.default_chunk_size);
        let store = self.store_for(&bucket)?;

        let body = match store.get(&ObjectPath::from(key.as_str())).await {
            Ok(result) => result.bytes().await.map_err(store_error)?,
            Err(err) => {
                let msg = format!("Failed to download {key}: {err}");
                error!("{msg}");
                if ignore_errors {
                    return Ok(stream::empty().boxed());
                }
                return Err(BackendError::Transport(msg));
            }
        };

        let items: Vec<BackendResult<ReadItem>> = if raw_output {
            rechunk(&body, chunk_size)
                .into_iter()
                .map(|chunk| Ok(ReadItem::Bytes(chunk)))
                .collect()
        } else {
            parse_lines(&body, ignore_errors)
        };

        // Archive fetched, add a new entry to the history.
        self.append_history(HistoryEntry {
            backend: self.name().to_owned(),
            action: HistoryAction::Read,
            id: format!("{bucket}/{key}"),
            filename: None,
            size: Some(body.len() as u64),
            timestamp: Utc::now(),
            operation_type: None,
        })
        .await?;

        Ok(stream::iter(items).boxed())
    }

    async fn write(
        &self,
        data: WriteStream,
        target: Option<&str>,
        _chunk_size: Option<usize>,
        ignore_errors: bool,
        operation_type: Option<OperationType>,
    ) -> BackendResult<usize> {
        let Some(mut data) = peek(data).await else {
            info!("Data Iterator is empty; skipping write to target.");
            return Ok(0);
        };
        let operation_type = operation_type.unwrap_or(OperationType::Create);
        if matches!(operation_type, OperationType::Append | OperationType::Delete) {
            let msg = format!("{operation_type} operation_type is not allowed.");
            error!("{msg}");
            return Err(BackendError::NotSupported(msg));
        }

        let target = match target {
            Some(target) => target.to_owned(),
            None => {
                let generated = format!(
                    "{}/{}-{}",
                    self.default_bucket()?,
                    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f"),
                    Uuid::new_v4()
                );
                info!(
                    "Target not specified; using default bucket with random file name: {generated}"
                );
                generated
            }
        };
        let (bucket, key) = self.split_target(&target)?;
        let store = self.store_for(bucket)?;
        let location = ObjectPath::from(key);

        if matches!(operation_type, OperationType::Create | OperationType::Index) {
            // Refusal is unconditional: `ignore_errors` never downgrades a
            // NotSupported failure.
            match store.head(&location).await {
                Ok(_) => {
                    let msg = format!(
                        "{key} already exists and overwrite is not allowed for operation {operation_type}"
                    );
                    error!("{msg}");
                    return Err(BackendError::NotSupported(msg));
                }
                Err(err) if is_not_found(&err) => {}
                Err(err) => return Err(store_error(err)),
            }
            debug!("Creating archive: {key}");
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(record) = data.next().await {
            match record {
                WriteRecord::Bytes(bytes) => body.extend_from_slice(&bytes),
                WriteRecord::Value(value) => {
                    body.extend_from_slice(value.to_string().as_bytes());
                    body.push(b'\n');
                }
            }
        }
        let size = body.len() as u64;

        if let Err(err) = store.put(&location, PutPayload::from(body)).await {
            let msg = format!("Failed to upload {bucket}/{key}: {err}");
            error!("{msg}");
            if !ignore_errors {
                return Err(BackendError::Transport(msg));
            }
            return Ok(0);
        }

        // Archive written, add a new entry to the history.
        self.append_history(HistoryEntry {
            backend: self.name().to_owned(),
            action: HistoryAction::Write,
            id: format!("{bucket}/{key}"),
            filename: None,
            size: Some(size),
            timestamp: Utc::now(),
            operation_type: Some(operation_type),
        })
        .await?;

        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrs_backend::write_stream;
    use object_store::memory::InMemory;
    use serde_json::json;

    fn backend(dir: &tempfile::TempDir) -> S3DataBackend {
        let settings = S3Settings {
            default_bucket_name: Some("statements".to_owned()),
            ..S3Settings::default()
        };
        let journal = HistoryJournal::new(dir.path().join("history.jsonl"));
        S3DataBackend::new(settings, journal).with_store(Arc::new(InMemory::new()))
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);

        let statement = json!({"id": "9e1310cd-e2d9-43dd-a19d-181b0a35a75c", "verb": {"id": "v"}});
        let count = backend
            .write(
                write_stream(vec![statement.clone()]),
                Some("statements/2023-02-17.gz"),
                None,
                false,
                None,
            )
            .await
            .unwrap();
        assert_eq!(count, 1);

        let records: Vec<_> = backend
            .read(
                Some(&"2023-02-17.gz".to_owned()),
                Some("statements"),
                None,
                false,
                false,
            )
            .await
            .unwrap()
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(records, vec![ReadItem::Value(statement)]);
    }

    #[tokio::test]
    async fn create_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let data = || write_stream(vec![json!({"id": "a"})]);

        backend
            .write(data(), Some("statements/new-archive.gz"), None, false, None)
            .await
            .unwrap();
        let err = backend
            .write(data(), Some("statements/new-archive.gz"), None, false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotSupported(_)));
        assert!(err.to_string().contains("new-archive.gz already exists"));
        assert!(err.to_string().contains("create"));

        // `ignore_errors` never downgrades the refusal; the stored object
        // stays untouched.
        let err = backend
            .write(
                write_stream(vec![json!({"id": "overwritten"})]),
                Some("statements/new-archive.gz"),
                None,
                true,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotSupported(_)));

        let records: Vec<_> = backend
            .read(
                Some(&"new-archive.gz".to_owned()),
                None,
                None,
                false,
                false,
            )
            .await
            .unwrap()
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(records, vec![ReadItem::Value(json!({"id": "a"}))]);

        // Only the original write made it into the journal.
        let writes: Vec<_> = backend
            .journal
            .entries()
            .await
            .unwrap()
            .into_iter()
            .filter(|entry| entry.action == HistoryAction::Write)
            .collect();
        assert_eq!(writes.len(), 1);
    }

    #[tokio::test]
    async fn update_overwrites_existing_objects() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);

        backend
            .write(
                write_stream(vec![json!({"id": "first"})]),
                Some("statements/archive.gz"),
                None,
                false,
                None,
            )
            .await
            .unwrap();
        backend
            .write(
                write_stream(vec![json!({"id": "second"})]),
                Some("statements/archive.gz"),
                None,
                false,
                Some(OperationType::Update),
            )
            .await
            .unwrap();

        let records: Vec<_> = backend
            .read(
                Some(&"archive.gz".to_owned()),
                None,
                None,
                false,
                false,
            )
            .await
            .unwrap()
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(records, vec![ReadItem::Value(json!({"id": "second"}))]);
    }

    #[tokio::test]
    async fn append_and_delete_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        for operation in [OperationType::Append, OperationType::Delete] {
            let err = backend
                .write(
                    write_stream(vec![json!({"id": "a"})]),
                    Some("statements/x"),
                    None,
                    false,
                    Some(operation),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, BackendError::NotSupported(_)));
        }
    }

    #[tokio::test]
    async fn new_listing_filters_already_read_archives() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);

        for key in ["statements/a.gz", "statements/b.gz"] {
            backend
                .write(write_stream(vec![json!({"id": key})]), Some(key), None, false, None)
                .await
                .unwrap();
        }

        // Reading `a.gz` records it in the journal.
        let _: Vec<_> = backend
            .read(Some(&"a.gz".to_owned()), None, None, false, false)
            .await
            .unwrap()
            .collect()
            .await;

        let fresh: Vec<_> = backend
            .list(None, false, true)
            .await
            .unwrap()
            .map(|item| item.unwrap().as_id().unwrap().to_owned())
            .collect()
            .await;
        assert_eq!(fresh, vec!["b.gz"]);
    }

    #[tokio::test]
    async fn raw_reads_rechunk_the_body() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        backend
            .write(
                write_stream(vec![WriteRecord::Bytes(vec![1u8; 10])]),
                Some("statements/blob"),
                None,
                false,
                None,
            )
            .await
            .unwrap();

        let chunks: Vec<_> = backend
            .read(Some(&"blob".to_owned()), None, Some(4), true, false)
            .await
            .unwrap()
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(chunks.len(), 3);
        assert!(matches!(&chunks[0], ReadItem::Bytes(bytes) if bytes.len() == 4));
        assert!(matches!(&chunks[2], ReadItem::Bytes(bytes) if bytes.len() == 2));
    }

    #[tokio::test]
    async fn missing_query_is_a_bad_parameter() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let err = backend.read(None, None, None, false, false).await.unwrap_err();
        assert!(matches!(err, BackendError::BadParameter(_)));
    }
}
