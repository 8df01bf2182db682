//! The ClickHouse data backend and its LRS query engine.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use lrs_backend::{
    into_values, peek, DataBackend, DataBackendStatus, InsertTuple, ListItem, ListStream,
    LrsBackend, OperationType, ReadItem, ReadStream, StatementCursor, WriteStream,
};
use lrs_config::ClickHouseSettings;
use lrs_error::{BackendError, BackendResult};
use lrs_model::{StatementParameters, StatementQueryResult};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Timestamp form ClickHouse returns and `best_effort` parsing accepts.
const CLICKHOUSE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Ids per `query_statements_by_ids` query.
const ID_CHUNK_SIZE: usize = 10_000;

/// ClickHouse database backend.
#[derive(Debug, Clone)]
pub struct ClickHouseDataBackend {
    settings: ClickHouseSettings,
    client: reqwest::Client,
    base_url: String,
}

impl ClickHouseDataBackend {
    /// Instantiate the backend from its settings.
    ///
    /// The client is HTTP, so not actually stateful: an unreachable
    /// server surfaces per-request, never at construction.
    pub fn new(settings: ClickHouseSettings) -> BackendResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.request_timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        let base_url = format!("http://{}:{}/", settings.host, settings.port);
        Ok(Self {
            settings,
            client,
            base_url,
        })
    }

    /// Load settings from the environment and instantiate.
    pub fn from_env() -> BackendResult<Self> {
        let settings = ClickHouseSettings::from_env()
            .map_err(|err| BackendError::BadParameter(err.to_string()))?;
        Self::new(settings)
    }

    fn request_builder(
        &self,
        sql: &str,
        bind: &[(String, String)],
        database: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut query: Vec<(String, String)> = vec![
            (
                "database".to_owned(),
                database.unwrap_or(&self.settings.database).to_owned(),
            ),
            ("query".to_owned(), sql.to_owned()),
            (
                "date_time_input_format".to_owned(),
                self.settings.client_options.date_time_input_format.clone(),
            ),
            (
                "allow_experimental_object_type".to_owned(),
                self.settings
                    .client_options
                    .allow_experimental_object_type
                    .to_string(),
            ),
        ];
        for (key, value) in &self.settings.client_options.extra {
            query.push((key.clone(), value.clone()));
        }
        query.extend(bind.iter().cloned());

        let mut request = self.client.post(&self.base_url).query(&query);
        if let Some(username) = &self.settings.username {
            request = request.header("X-ClickHouse-User", username);
        }
        if let Some(password) = &self.settings.password {
            request = request.header("X-ClickHouse-Key", password);
        }
        request
    }

    async fn execute(
        &self,
        sql: &str,
        bind: &[(String, String)],
        body: Option<String>,
        database: Option<&str>,
    ) -> BackendResult<String> {
        let mut request = self.request_builder(sql, bind, database);
        if let Some(body) = body {
            request = request.body(body);
        }
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        if !status.is_success() {
            return Err(BackendError::Transport(format!(
                "ClickHouse request failed ({status}): {}",
                text.trim()
            )));
        }
        Ok(text)
    }

    /// Run a `SELECT`, returning one JSON value per row.
    async fn rows(
        &self,
        sql: &str,
        bind: &[(String, String)],
        database: Option<&str>,
    ) -> BackendResult<Vec<Value>> {
        let sql = format!("{sql} FORMAT JSONEachRow");
        let text = self.execute(&sql, bind, None, database).await?;
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|err| {
                    BackendError::BadFormat(format!("invalid row '{line}': {err}"))
                })
            })
            .collect()
    }

    /// Insert one batch of tuples, rejecting in-batch duplicate ids.
    async fn bulk_import(
        &self,
        batch: &[InsertTuple],
        ignore_errors: bool,
        table: &str,
    ) -> BackendResult<usize> {
        let result = self.try_bulk_import(batch, table).await;
        match result {
            Ok(count) => {
                debug!("Inserted {count} documents chunk with success");
                Ok(count)
            }
            Err(err) if ignore_errors => {
                warn!("Bulk import failed for current chunk but you choose to ignore it: {err}");
                Ok(0)
            }
            Err(err) => Err(err),
        }
    }

    async fn try_bulk_import(&self, batch: &[InsertTuple], table: &str) -> BackendResult<usize> {
        let ids: HashSet<Uuid> = batch.iter().map(|tuple| tuple.event_id).collect();
        if ids.len() != batch.len() {
            return Err(BackendError::BadFormat(
                "Duplicate IDs found in batch".to_owned(),
            ));
        }

        let body: String = batch
            .iter()
            .map(|tuple| {
                json!({
                    "event_id": tuple.event_id,
                    "emission_time": tuple
                        .emission_time
                        .format(CLICKHOUSE_TIME_FORMAT)
                        .to_string(),
                    "event": tuple.event,
                    "event_str": tuple.event_str,
                })
                .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n");

        let sql = format!(
            "INSERT INTO {table} (event_id, emission_time, event, event_str) FORMAT JSONEachRow"
        );
        // Let the server buffer the insert and wait for the buffer flush.
        let bind = vec![
            ("async_insert".to_owned(), "1".to_owned()),
            ("wait_for_async_insert".to_owned(), "1".to_owned()),
        ];
        self.execute(&sql, &bind, Some(body), None).await?;
        Ok(batch.len())
    }

    fn read_item(&self, row: Value, raw_output: bool) -> ReadItem {
        if raw_output {
            ReadItem::Bytes(row.to_string().into_bytes())
        } else {
            ReadItem::Value(row)
        }
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::RequestTimeout(err.to_string())
    } else {
        BackendError::Transport(err.to_string())
    }
}

fn quote_array(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|value| format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect();
    format!("[{}]", quoted.join(","))
}

#[async_trait]
impl DataBackend for ClickHouseDataBackend {
    type Query = crate::ClickHouseQuery;

    fn name(&self) -> &'static str {
        "clickhouse"
    }

    async fn status(&self) -> DataBackendStatus {
        let response = self.request_builder("SELECT 1", &[], None).send().await;
        match response {
            Err(err) => {
                error!("Failed to connect to ClickHouse: {err}");
                DataBackendStatus::Away
            }
            Ok(response) if response.status().is_success() => DataBackendStatus::Ok,
            Ok(response) => {
                error!("ClickHouse is unhealthy: {}", response.status());
                DataBackendStatus::Error
            }
        }
    }

    async fn list(
        &self,
        target: Option<&str>,
        details: bool,
        _new: bool,
    ) -> BackendResult<ListStream> {
        let rows = self.rows("SHOW TABLES", &[], target).await?;
        let items: Vec<BackendResult<ListItem>> = rows
            .into_iter()
            .map(|row| {
                if details {
                    Ok(ListItem::Details(row))
                } else {
                    let name = row
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned();
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
        _ignore_errors: bool,
    ) -> BackendResult<ReadStream> {
        let default_query = crate::ClickHouseQuery::default();
        let query = query.unwrap_or(&default_query);
        let fields = query
            .return_fields
            .as_ref()
            .map(|fields| fields.join(","))
            .unwrap_or_else(|| "event".to_owned());
        let target = target.unwrap_or(&self.settings.event_table_name);
        let chunk_size = chunk_size.unwrap_or(self.settings.default_chunk_size);

        let mut sql = format!("SELECT {fields} FROM {target}");
        if let Some(where_clause) = &query.where_clause {
            sql.push_str(&format!(" WHERE {where_clause}"));
        }
        sql.push_str(&format!(" LIMIT {chunk_size}"));

        let rows = self.rows(&sql, &[], None).await?;
        let backend = self.clone();
        let items: Vec<BackendResult<ReadItem>> = rows
            .into_iter()
            .map(|row| Ok(backend.read_item(row, raw_output)))
            .collect();
        Ok(stream::iter(items).boxed())
    }

    async fn write(
        &self,
        data: WriteStream,
        target: Option<&str>,
        chunk_size: Option<usize>,
        ignore_errors: bool,
        operation_type: Option<OperationType>,
    ) -> BackendResult<usize> {
        let target = target.unwrap_or(&self.settings.event_table_name).to_owned();
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
            "Start writing to the {target} table of the {} database (chunk size: {chunk_size})",
            self.settings.database
        );

        let mut batches = into_values(data, ignore_errors)
            .filter_map(move |result| async move {
                match result {
                    Err(err) => Some(Err(err)),
                    Ok(value) => match InsertTuple::from_statement(&value) {
                        Ok(tuple) => Some(Ok(tuple)),
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
            let mut tuples = Vec::with_capacity(batch.len());
            for item in batch {
                tuples.push(item?);
            }
            success += self
                .bulk_import(&tuples, ignore_errors, &target)
                .await
                .map_err(|err| match err {
                    BackendError::BadFormat(_) => err,
                    other => BackendError::PartialBatch {
                        count: success,
                        message: other.to_string(),
                    },
                })?;
        }

        debug!("Inserted a total of {success} documents with success");
        Ok(success)
    }
}

#[async_trait]
impl LrsBackend for ClickHouseDataBackend {
    async fn query_statements(
        &self,
        params: &StatementParameters,
    ) -> BackendResult<StatementQueryResult> {
        params.validate()?;

        let mut where_clauses: Vec<String> = Vec::new();
        let mut bind: Vec<(String, String)> = vec![(
            "param_event_table_name".to_owned(),
            self.settings.event_table_name.clone(),
        )];

        if let Some(statement_id) = &params.statement_id {
            where_clauses.push("event_id = {statementId:UUID}".to_owned());
            bind.push(("param_statementId".to_owned(), statement_id.clone()));
        }
        if let Some(name) = params.agent_account_name() {
            where_clauses.push("event.actor.account.name = {agent:String}".to_owned());
            bind.push(("param_agent".to_owned(), name.to_owned()));
        }
        if let Some(verb) = &params.verb {
            where_clauses.push("event.verb.id = {verb:String}".to_owned());
            bind.push(("param_verb".to_owned(), verb.clone()));
        }
        if let Some(activity) = &params.activity {
            where_clauses.push("event.object.objectType = 'Activity'".to_owned());
            where_clauses.push("event.object.id = {activity:String}".to_owned());
            bind.push(("param_activity".to_owned(), activity.clone()));
        }
        if let Some(since) = &params.since {
            where_clauses.push("emission_time > {since:DateTime64(6)}".to_owned());
            bind.push((
                "param_since".to_owned(),
                since.naive_utc().format(CLICKHOUSE_TIME_FORMAT).to_string(),
            ));
        }
        if let Some(until) = &params.until {
            where_clauses.push("emission_time <= {until:DateTime64(6)}".to_owned());
            bind.push((
                "param_until".to_owned(),
                until.naive_utc().format(CLICKHOUSE_TIME_FORMAT).to_string(),
            ));
        }
        if let Some(search_after) = &params.search_after {
            let pit_id = params.pit_id.as_ref().ok_or_else(|| {
                BackendError::BadParameter(
                    "search_after requires the matching pit_id".to_owned(),
                )
            })?;
            // The composite comparison keeps rows sharing an emission
            // time from being lost or repeated across pages.
            let op = if params.ascending { ">" } else { "<" };
            where_clauses.push(format!(
                "(emission_time {op} {{search_after:DateTime64(6)}} OR \
                 (emission_time = {{search_after:DateTime64(6)}} AND event_id {op} {{pit_id:UUID}}))"
            ));
            bind.push(("param_search_after".to_owned(), search_after.clone()));
            bind.push(("param_pit_id".to_owned(), pit_id.clone()));
        }

        let direction = if params.ascending { "ASC" } else { "DESC" };
        let mut sql =
            "SELECT event_id, emission_time, event FROM {event_table_name:Identifier}".to_owned();
        if !where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clauses.join(" AND "));
        }
        sql.push_str(&format!(
            " ORDER BY emission_time {direction}, event_id {direction}"
        ));
        if let Some(limit) = params.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let rows = self.rows(&sql, &bind, None).await.map_err(|err| {
            error!("Failed to execute ClickHouse query. {err}");
            err
        })?;

        let cursor = match rows.last() {
            None => None,
            Some(last) => {
                let emission_time = last
                    .get("emission_time")
                    .and_then(Value::as_str)
                    .and_then(|raw| parse_row_time(raw).ok())
                    .ok_or_else(|| {
                        BackendError::BadFormat("row missing emission_time".to_owned())
                    })?;
                let event_id = last
                    .get("event_id")
                    .and_then(Value::as_str)
                    .and_then(|raw| Uuid::parse_str(raw).ok())
                    .ok_or_else(|| BackendError::BadFormat("row missing event_id".to_owned()))?;
                Some(StatementCursor::from_last_row(emission_time, event_id))
            }
        };

        Ok(StatementQueryResult {
            statements: rows
                .into_iter()
                .map(|mut row| row["event"].take())
                .collect(),
            continuation_token: cursor.as_ref().map(|c| c.search_after.clone()),
            point_in_time: cursor.map(|c| c.pit_id),
        })
    }

    async fn query_statements_by_ids(&self, ids: &[String]) -> BackendResult<Vec<Value>> {
        let sql = "SELECT event_id FROM {event_table_name:Identifier} \
                   WHERE event_id IN {ids:Array(String)}";
        let mut found = Vec::new();
        for chunk in ids.chunks(ID_CHUNK_SIZE) {
            let bind = vec![
                (
                    "param_event_table_name".to_owned(),
                    self.settings.event_table_name.clone(),
                ),
                ("param_ids".to_owned(), quote_array(chunk)),
            ];
            let rows = self.rows(sql, &bind, None).await.map_err(|err| {
                error!("Failed to execute ClickHouse query. {err}");
                err
            })?;
            found.extend(rows);
        }
        Ok(found)
    }
}

fn parse_row_time(raw: &str) -> BackendResult<chrono::NaiveDateTime> {
    chrono::NaiveDateTime::parse_from_str(raw, CLICKHOUSE_TIME_FORMAT)
        .or_else(|_| lrs_backend::parse_emission_time(raw))
        .map_err(|_| BackendError::BadFormat(format!("invalid emission_time '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrs_backend::write_stream;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> ClickHouseDataBackend {
        let address = server.address();
        let settings = ClickHouseSettings {
            host: address.ip().to_string(),
            port: address.port(),
            ..ClickHouseSettings::default()
        };
        ClickHouseDataBackend::new(settings).unwrap()
    }

    fn statement(id: &str, timestamp: &str) -> Value {
        json!({
            "id": id,
            "timestamp": timestamp,
            "actor": {"mbox": "mailto:learner@example.com"},
            "verb": {"id": "http://adlnet.gov/expapi/verbs/answered"}
        })
    }

    async fn query_of(server: &MockServer, index: usize) -> String {
        let requests = server.received_requests().await.unwrap();
        requests[index]
            .url
            .query_pairs()
            .find(|(key, _)| key == "query")
            .map(|(_, value)| value.into_owned())
            .unwrap()
    }

    #[tokio::test]
    async fn status_taxonomy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("1\n"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        let backend = backend(&server);
        assert_eq!(backend.status().await, DataBackendStatus::Ok);

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        assert_eq!(backend.status().await, DataBackendStatus::Error);

        let address = server.address().to_owned();
        drop(server);
        let settings = ClickHouseSettings {
            host: address.ip().to_string(),
            port: address.port(),
            ..ClickHouseSettings::default()
        };
        let unreachable = ClickHouseDataBackend::new(settings).unwrap();
        assert_eq!(unreachable.status().await, DataBackendStatus::Away);
    }

    #[tokio::test]
    async fn list_yields_table_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{\"name\":\"xapi_events_all\"}\n{\"name\":\"test_table\"}\n"),
            )
            .mount(&server)
            .await;
        let backend = backend(&server);
        let names: Vec<_> = backend
            .list(None, false, false)
            .await
            .unwrap()
            .map(|item| item.unwrap().as_id().unwrap().to_owned())
            .collect()
            .await;
        assert_eq!(names, vec!["xapi_events_all", "test_table"]);
    }

    #[tokio::test]
    async fn read_bounds_the_query_with_the_chunk_size() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"event\":{\"id\":\"a\"}}\n"))
            .mount(&server)
            .await;
        let backend = backend(&server);
        let records: Vec<_> = backend
            .read(None, None, Some(10), false, false)
            .await
            .unwrap()
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(records.len(), 1);

        let sql = query_of(&server, 0).await;
        assert!(sql.starts_with("SELECT event FROM xapi_events_all"));
        assert!(sql.contains("LIMIT 10"));
    }

    #[tokio::test]
    async fn write_flushes_independent_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;
        let backend = backend(&server);

        let data = write_stream(vec![
            statement("9e1310cd-e2d9-43dd-a19d-181b0a35a75c", "2023-02-17T16:55:17.721627"),
            statement("f93b8d34-f74f-4d16-99a9-0ba5c6c192a8", "2023-02-17T16:55:14.721633"),
            statement("af5e9c42-4017-49ff-85a4-bc9d4eff7b0c", "2023-02-17T16:55:14.721633"),
        ]);
        let count = backend.write(data, None, Some(2), false, None).await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn empty_input_writes_nothing() {
        let server = MockServer::start().await;
        let backend = backend(&server);
        let count = backend
            .write(write_stream(Vec::<Value>::new()), None, None, false, None)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_ids_reject_the_whole_batch() {
        let server = MockServer::start().await;
        let backend = backend(&server);
        let duplicate = || statement("9e1310cd-e2d9-43dd-a19d-181b0a35a75c", "2023-02-17T16:55:17.721627");

        let err = backend
            .write(write_stream(vec![duplicate(), duplicate()]), None, None, false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::BadFormat(_)));
        assert!(err.to_string().contains("Duplicate IDs found in batch"));

        // Converted into a zero-success return when ignoring errors.
        let count = backend
            .write(write_stream(vec![duplicate(), duplicate()]), None, None, true, None)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_create_is_allowed() {
        let server = MockServer::start().await;
        let backend = backend(&server);
        for operation in [
            OperationType::Index,
            OperationType::Update,
            OperationType::Append,
            OperationType::Delete,
        ] {
            let err = backend
                .write(
                    write_stream(vec![statement(
                        "9e1310cd-e2d9-43dd-a19d-181b0a35a75c",
                        "2023-02-17T16:55:17.721627",
                    )]),
                    None,
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
    async fn failed_chunk_attaches_the_count_so_far() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("table is read only"))
            .mount(&server)
            .await;
        let backend = backend(&server);

        let data = write_stream(vec![
            statement("9e1310cd-e2d9-43dd-a19d-181b0a35a75c", "2023-02-17T16:55:17.721627"),
            statement("f93b8d34-f74f-4d16-99a9-0ba5c6c192a8", "2023-02-17T16:55:14.721633"),
        ]);
        let err = backend.write(data, None, Some(1), false, None).await.unwrap_err();
        match err {
            BackendError::PartialBatch { count, .. } => assert_eq!(count, 1),
            other => panic!("expected PartialBatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn query_statements_translates_the_parameter_grammar() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(concat!(
                "{\"event_id\":\"f93b8d34-f74f-4d16-99a9-0ba5c6c192a8\",",
                "\"emission_time\":\"2023-02-17 16:55:14.721633\",\"event\":{\"id\":\"b\"}}\n",
            )))
            .mount(&server)
            .await;
        let backend = backend(&server);

        let params = StatementParameters {
            verb: Some("http://adlnet.gov/expapi/verbs/answered".to_owned()),
            activity: Some("http://lms.example.com/activities/question-4".to_owned()),
            ascending: true,
            limit: Some(1),
            ..Default::default()
        };
        let result = backend.query_statements(&params).await.unwrap();

        assert_eq!(result.statements, vec![json!({"id": "b"})]);
        assert_eq!(
            result.continuation_token.as_deref(),
            Some("2023-02-17T16:55:14.721633")
        );
        assert_eq!(
            result.point_in_time.as_deref(),
            Some("f93b8d34-f74f-4d16-99a9-0ba5c6c192a8")
        );

        let sql = query_of(&server, 0).await;
        assert!(sql.contains("event.verb.id = {verb:String}"));
        assert!(sql.contains("event.object.objectType = 'Activity'"));
        assert!(sql.contains("ORDER BY emission_time ASC, event_id ASC"));
        assert!(sql.contains("LIMIT 1"));
        let bound: Vec<(String, String)> = server.received_requests().await.unwrap()[0]
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(bound.contains(&(
            "param_verb".to_owned(),
            "http://adlnet.gov/expapi/verbs/answered".to_owned()
        )));
    }

    #[tokio::test]
    async fn cursor_parameters_produce_the_composite_comparison() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server)
            .await;
        let backend = backend(&server);

        let params = StatementParameters {
            search_after: Some("2023-02-17T16:55:14.721633".to_owned()),
            pit_id: Some("af5e9c42-4017-49ff-85a4-bc9d4eff7b0c".to_owned()),
            ascending: true,
            ..Default::default()
        };
        let result = backend.query_statements(&params).await.unwrap();
        assert!(result.statements.is_empty());
        assert_eq!(result.continuation_token, None);
        assert_eq!(result.point_in_time, None);

        let sql = query_of(&server, 0).await;
        assert!(sql.contains(
            "(emission_time > {search_after:DateTime64(6)} OR \
             (emission_time = {search_after:DateTime64(6)} AND event_id > {pit_id:UUID}))"
        ));
    }

    #[tokio::test]
    async fn search_after_without_pit_id_is_a_bad_parameter() {
        let server = MockServer::start().await;
        let backend = backend(&server);
        let params = StatementParameters {
            search_after: Some("2023-02-17T16:55:14.721633".to_owned()),
            ..Default::default()
        };
        let err = backend.query_statements(&params).await.unwrap_err();
        assert!(matches!(err, BackendError::BadParameter(_)));
    }

    #[tokio::test]
    async fn conflicting_agent_identifiers_fail_before_any_request() {
        let server = MockServer::start().await;
        let backend = backend(&server);
        let params = StatementParameters {
            agent_mbox: Some("mailto:learner@example.com".to_owned()),
            agent_openid: Some("http://openid.example.com/learner".to_owned()),
            ..Default::default()
        };
        let err = backend.query_statements(&params).await.unwrap_err();
        assert!(err.to_string().contains("only one identifier can be used"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ids_are_quoted_into_an_array_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "{\"event_id\":\"9e1310cd-e2d9-43dd-a19d-181b0a35a75c\"}\n",
            ))
            .mount(&server)
            .await;
        let backend = backend(&server);
        let found = backend
            .query_statements_by_ids(&["9e1310cd-e2d9-43dd-a19d-181b0a35a75c".to_owned()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let bound: Vec<(String, String)> = server.received_requests().await.unwrap()[0]
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(bound.contains(&(
            "param_ids".to_owned(),
            "['9e1310cd-e2d9-43dd-a19d-181b0a35a75c']".to_owned()
        )));
    }
}
