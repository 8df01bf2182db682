//! The MongoDB data backend and its LRS query engine.

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};
use futures::stream::{self, StreamExt};
use lrs_backend::{
    format_emission_time, into_values, parse_emission_time, peek, DataBackend, DataBackendStatus,
    ListItem, ListStream, LrsBackend, OperationType, ReadItem, ReadStream, WriteStream,
};
use lrs_config::MongoSettings;
use lrs_error::{BackendError, BackendResult};
use lrs_model::{StatementParameters, StatementQueryResult};
use mongodb::error::ErrorKind;
use mongodb::options::FindOptions;
use mongodb::{Client, Collection};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// MongoDB data backend.
#[derive(Debug, Clone)]
pub struct MongoDataBackend {
    settings: MongoSettings,
    client: Client,
}

impl MongoDataBackend {
    /// Instantiate the backend from its settings.
    ///
    /// The driver connects lazily; an unreachable cluster surfaces on the
    /// first operation, not here.
    pub async fn new(settings: MongoSettings) -> BackendResult<Self> {
        let client = Client::with_uri_str(&settings.connection_uri)
            .await
            .map_err(|err| BackendError::BadParameter(format!("invalid connection URI: {err}")))?;
        Ok(Self { settings, client })
    }

    /// Load settings from the environment and instantiate.
    pub async fn from_env() -> BackendResult<Self> {
        let settings =
            MongoSettings::from_env().map_err(|err| BackendError::BadParameter(err.to_string()))?;
        Self::new(settings).await
    }

    fn collection(&self, target: Option<&str>) -> Collection<Document> {
        self.client
            .database(&self.settings.database)
            .collection(target.unwrap_or(&self.settings.collection))
    }

    /// Project a statement into its collection document.
    fn to_document(statement: &Value) -> BackendResult<Document> {
        let id_ok = statement
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| Uuid::parse_str(id).is_ok());
        let timestamp_ok = statement
            .get("timestamp")
            .and_then(Value::as_str)
            .is_some_and(|ts| parse_emission_time(ts).is_ok());
        if !id_ok || !timestamp_ok {
            return Err(BackendError::BadFormat(format!(
                "Statement has an invalid or missing id or timestamp field: {statement}"
            )));
        }
        let source = bson::to_bson(statement)
            .map_err(|err| BackendError::BadFormat(err.to_string()))?;
        Ok(doc! { "_source": source })
    }

    async fn bulk_import(
        &self,
        batch: Vec<Document>,
        ignore_errors: bool,
        target: Option<&str>,
        written: usize,
    ) -> BackendResult<usize> {
        let total = batch.len();
        match self.collection(target).insert_many(batch, None).await {
            Ok(result) => {
                let inserted = result.inserted_ids.len();
                debug!("Inserted {inserted} documents chunk with success");
                Ok(inserted)
            }
            Err(err) => {
                // Ordered inserts stop at the first failing document.
                let inserted = match *err.kind {
                    ErrorKind::BulkWrite(ref failure) => failure
                        .write_errors
                        .as_ref()
                        .and_then(|errors| errors.first())
                        .map_or(total, |first| first.index),
                    _ => 0,
                };
                if ignore_errors {
                    warn!(
                        "Bulk importation failed for current documents chunk but you choose \
                         to ignore it: {err}"
                    );
                    return Ok(inserted);
                }
                Err(BackendError::PartialBatch {
                    count: written + inserted,
                    message: err.to_string(),
                })
            }
        }
    }

    async fn find(
        &self,
        filter: Document,
        sort: Option<Document>,
        limit: Option<i64>,
    ) -> BackendResult<Vec<Document>> {
        let options = FindOptions::builder().sort(sort).limit(limit).build();
        let mut cursor = self
            .collection(None)
            .find(filter, options)
            .await
            .map_err(|err| {
                let msg = format!("Failed to execute MongoDB query. {err}");
                error!("{msg}");
                BackendError::Transport(msg)
            })?;
        let mut documents = Vec::new();
        while let Some(document) = cursor.next().await {
            documents.push(document.map_err(|err| BackendError::Transport(err.to_string()))?);
        }
        Ok(documents)
    }
}

/// Make a fetched document JSON-serializable: stringify its object id.
fn document_to_value(document: Document) -> BackendResult<Value> {
    let object_id = document
        .get_object_id("_id")
        .map(|id| id.to_hex())
        .unwrap_or_default();
    let mut value =
        serde_json::to_value(&document).map_err(|err| BackendError::BadFormat(err.to_string()))?;
    value["_id"] = Value::String(object_id);
    Ok(value)
}

#[async_trait]
impl DataBackend for MongoDataBackend {
    type Query = crate::MongoQuery;

    fn name(&self) -> &'static str {
        "mongo"
    }

    async fn status(&self) -> DataBackendStatus {
        let admin = self.client.database("admin");
        if let Err(err) = admin.run_command(doc! { "ping": 1 }, None).await {
            error!("Failed to connect to MongoDB: {err}");
            return DataBackendStatus::Away;
        }
        match admin.run_command(doc! { "serverStatus": 1 }, None).await {
            Ok(server_status) => {
                let ok = server_status.get("ok").and_then(bson_to_f64).unwrap_or(0.0);
                if ok < 1.0 {
                    return DataBackendStatus::Error;
                }
                DataBackendStatus::Ok
            }
            Err(_) => DataBackendStatus::Error,
        }
    }

    async fn list(
        &self,
        target: Option<&str>,
        details: bool,
        _new: bool,
    ) -> BackendResult<ListStream> {
        let database = self
            .client
            .database(target.unwrap_or(&self.settings.database));
        let names = database
            .list_collection_names(None)
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        let items: Vec<BackendResult<ListItem>> = names
            .into_iter()
            .map(|name| {
                if details {
                    Ok(ListItem::Details(serde_json::json!({ "name": name })))
                } else {
                    Ok(ListItem::Id(name))
                }
            })
            .collect();
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
        let default_query = crate::MongoQuery::default();
        let query = query.unwrap_or(&default_query);
        let chunk_size = chunk_size.unwrap_or(self.settings.default_chunk_size);

        let options = FindOptions::builder()
            .batch_size(chunk_size as u32)
            .sort(query.sort.clone())
            .limit(query.limit)
            .build();
        let cursor = self
            .collection(target)
            .find(query.filter.clone().unwrap_or_default(), options)
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        let stream = cursor
            .filter_map(move |document| async move {
                let value = document
                    .map_err(|err| BackendError::Transport(err.to_string()))
                    .and_then(document_to_value);
                match value {
                    Ok(value) if raw_output => {
                        Some(Ok(ReadItem::Bytes(value.to_string().into_bytes())))
                    }
                    Ok(value) => Some(Ok(ReadItem::Value(value))),
                    Err(err) if ignore_errors => {
                        warn!("Skipping unreadable document: {err}");
                        None
                    }
                    Err(err) => Some(Err(err)),
                }
            })
            .boxed();
        Ok(stream)
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
        if operation_type != OperationType::Create {
            let msg = format!("{operation_type} operation_type is not allowed.");
            error!("{msg}");
            return Err(BackendError::NotSupported(msg));
        }
        let chunk_size = chunk_size.unwrap_or(self.settings.default_chunk_size);

        let Some(data) = peek(data).await else {
            info!("Data Iterator is empty; skipping write to target.");
            return Ok(0);
        };
        debug!(
            "Start writing to the {} collection of the {} database (chunk size: {chunk_size})",
            self.settings.collection, self.settings.database
        );

        let mut batches = into_values(data, ignore_errors)
            .filter_map(move |result| async move {
                match result {
                    Err(err) => Some(Err(err)),
                    Ok(value) => match Self::to_document(&value) {
                        Ok(document) => Some(Ok(document)),
                        Err(err) if ignore_errors => {
                            warn!("{err}");
                            None
                        }
                        Err(err) => Some(Err(err)),
                    },
                }
            })
            .chunks(chunk_size)
            .boxed();

        let mut success = 0usize;
        while let Some(batch) = batches.next().await {
            let mut documents = Vec::with_capacity(batch.len());
            for item in batch {
                documents.push(item?);
            }
            success += self
                .bulk_import(documents, ignore_errors, target, success)
                .await?;
        }
        debug!("Inserted a total of {success} documents with success");
        Ok(success)
    }
}

fn bson_to_f64(value: &bson::Bson) -> Option<f64> {
    match value {
        bson::Bson::Double(v) => Some(*v),
        bson::Bson::Int32(v) => Some(f64::from(*v)),
        bson::Bson::Int64(v) => Some(*v as f64),
        _ => None,
    }
}

/// Build the filter document for a statements query.
fn statement_filter(params: &StatementParameters) -> BackendResult<Document> {
    let mut filter = Document::new();
    if let Some(statement_id) = &params.statement_id {
        filter.insert("_source.id", statement_id);
    }
    if let Some(name) = params.agent_account_name() {
        filter.insert("_source.actor.account.name", name);
    }
    if let Some(verb) = &params.verb {
        filter.insert("_source.verb.id", verb);
    }
    if let Some(activity) = &params.activity {
        filter.insert("_source.object.objectType", "Activity");
        filter.insert("_source.object.id", activity);
    }
    let mut timestamp = Document::new();
    if let Some(since) = &params.since {
        timestamp.insert("$gt", since.to_rfc3339());
    }
    if let Some(until) = &params.until {
        timestamp.insert("$lte", until.to_rfc3339());
    }
    if !timestamp.is_empty() {
        filter.insert("_source.timestamp", timestamp);
    }
    if let Some(search_after) = &params.search_after {
        let pit_id = params.pit_id.as_ref().ok_or_else(|| {
            BackendError::BadParameter("search_after requires the matching pit_id".to_owned())
        })?;
        let object_id = ObjectId::parse_str(pit_id).map_err(|err| {
            BackendError::BadParameter(format!("invalid pit_id '{pit_id}': {err}"))
        })?;
        // Timestamp tie-break on the document object id keeps pages
        // stable across duplicate timestamps.
        let op = if params.ascending { "$gt" } else { "$lt" };
        filter.insert(
            "$or",
            vec![
                doc! { "_source.timestamp": { op: search_after.clone() } },
                doc! { "$and": [
                    { "_source.timestamp": search_after.clone() },
                    { "_id": { op: object_id } },
                ]},
            ],
        );
    }
    Ok(filter)
}

fn statement_sort(ascending: bool) -> Document {
    let order = if ascending { 1 } else { -1 };
    doc! { "_source.timestamp": order, "_id": order }
}

#[async_trait]
impl LrsBackend for MongoDataBackend {
    async fn query_statements(
        &self,
        params: &StatementParameters,
    ) -> BackendResult<StatementQueryResult> {
        params.validate()?;

        let filter = statement_filter(params)?;
        let sort = statement_sort(params.ascending);
        let documents = self
            .find(filter, Some(sort), params.limit.map(|limit| limit as i64))
            .await?;

        let cursor = match documents.last() {
            None => None,
            Some(last) => {
                let object_id = last
                    .get_object_id("_id")
                    .map_err(|err| BackendError::BadFormat(err.to_string()))?
                    .to_hex();
                let timestamp = last
                    .get_document("_source")
                    .ok()
                    .and_then(|source| source.get_str("timestamp").ok())
                    .and_then(|raw| parse_emission_time(raw).ok())
                    .ok_or_else(|| {
                        BackendError::BadFormat("document missing _source.timestamp".to_owned())
                    })?;
                Some((timestamp, object_id))
            }
        };

        let mut statements = Vec::with_capacity(documents.len());
        for document in documents {
            let source = document
                .get_document("_source")
                .map_err(|err| BackendError::BadFormat(err.to_string()))?;
            statements.push(
                serde_json::to_value(source)
                    .map_err(|err| BackendError::BadFormat(err.to_string()))?,
            );
        }

        let (continuation_token, point_in_time) = match cursor {
            None => (None, None),
            // The second cursor half maps to the document object id in
            // this dialect.
            Some((timestamp, object_id)) => {
                (Some(format_emission_time(timestamp)), Some(object_id))
            }
        };

        Ok(StatementQueryResult {
            statements,
            continuation_token,
            point_in_time,
        })
    }

    async fn query_statements_by_ids(&self, ids: &[String]) -> BackendResult<Vec<Value>> {
        let filter = doc! { "_source.id": { "$in": ids.to_vec() } };
        let documents = self.find(filter, None, None).await?;
        documents.into_iter().map(document_to_value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrs_backend::write_stream;
    use serde_json::json;

    async fn backend() -> MongoDataBackend {
        MongoDataBackend::new(MongoSettings::default()).await.unwrap()
    }

    fn statement(id: &str, timestamp: &str) -> Value {
        json!({ "id": id, "timestamp": timestamp })
    }

    #[test]
    fn to_document_wraps_the_statement_in_source() {
        let document = MongoDataBackend::to_document(&statement(
            "9e1310cd-e2d9-43dd-a19d-181b0a35a75c",
            "2023-02-17T16:55:17.721627",
        ))
        .unwrap();
        let source = document.get_document("_source").unwrap();
        assert_eq!(
            source.get_str("id").unwrap(),
            "9e1310cd-e2d9-43dd-a19d-181b0a35a75c"
        );
    }

    #[test]
    fn to_document_requires_id_and_timestamp() {
        let err = MongoDataBackend::to_document(&json!({"id": "not-a-uuid"})).unwrap_err();
        assert!(matches!(err, BackendError::BadFormat(_)));
        let err =
            MongoDataBackend::to_document(&json!({"timestamp": "2023-02-17T16:55:17Z"}))
                .unwrap_err();
        assert!(matches!(err, BackendError::BadFormat(_)));
    }

    #[test]
    fn filter_translates_the_parameter_grammar() {
        let params = StatementParameters {
            verb: Some("https://w3id.org/xapi/video/verbs/played".to_owned()),
            activity: Some("uuid://ba4252ce".to_owned()),
            ..Default::default()
        };
        let filter = statement_filter(&params).unwrap();
        assert_eq!(
            filter.get_str("_source.verb.id").unwrap(),
            "https://w3id.org/xapi/video/verbs/played"
        );
        assert_eq!(filter.get_str("_source.object.objectType").unwrap(), "Activity");
    }

    #[test]
    fn cursor_filter_uses_the_composite_comparison() {
        let params = StatementParameters {
            search_after: Some("2023-02-17T16:55:14.721633".to_owned()),
            pit_id: Some("62b9ce922c26b46b68ffc68f".to_owned()),
            ascending: true,
            ..Default::default()
        };
        let filter = statement_filter(&params).unwrap();
        let or = filter.get_array("$or").unwrap();
        assert_eq!(or.len(), 2);
        let first = or[0].as_document().unwrap();
        assert!(first
            .get_document("_source.timestamp")
            .unwrap()
            .contains_key("$gt"));
    }

    #[test]
    fn cursor_without_pit_id_is_rejected() {
        let params = StatementParameters {
            search_after: Some("2023-02-17T16:55:14.721633".to_owned()),
            ..Default::default()
        };
        assert!(matches!(
            statement_filter(&params),
            Err(BackendError::BadParameter(_))
        ));
    }

    #[test]
    fn sort_follows_the_requested_direction() {
        assert_eq!(
            statement_sort(true),
            doc! { "_source.timestamp": 1, "_id": 1 }
        );
        assert_eq!(
            statement_sort(false),
            doc! { "_source.timestamp": -1, "_id": -1 }
        );
    }

    #[tokio::test]
    async fn only_create_is_allowed() {
        let backend = backend().await;
        let err = backend
            .write(
                write_stream(vec![statement(
                    "9e1310cd-e2d9-43dd-a19d-181b0a35a75c",
                    "2023-02-17T16:55:17.721627",
                )]),
                None,
                None,
                false,
                Some(OperationType::Update),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotSupported(_)));
    }

    #[tokio::test]
    async fn empty_input_writes_nothing() {
        let backend = backend().await;
        let count = backend
            .write(write_stream(Vec::<Value>::new()), None, None, false, None)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
