//! The Elasticsearch data backend and its LRS query engine.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use lrs_backend::{
    into_values, parse_emission_time, peek, DataBackend, DataBackendStatus, ListItem, ListStream,
    LrsBackend, OperationType, ReadItem, ReadStream, StatementCursor, WriteStream,
};
use lrs_config::EsSettings;
use lrs_error::{BackendError, BackendResult};
use lrs_model::{StatementParameters, StatementQueryResult};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Keep-alive window for scroll contexts.
const SCROLL_KEEP_ALIVE: &str = "1m";

/// Elasticsearch data backend.
#[derive(Debug, Clone)]
pub struct EsDataBackend {
    settings: EsSettings,
    client: reqwest::Client,
    base_url: String,
}

impl EsDataBackend {
    /// Instantiate the backend from its settings.
    pub fn new(settings: EsSettings) -> BackendResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.request_timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if settings.client_options.verify_certs == Some(false) {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder
            .build()
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        let base_url = settings
            .hosts
            .first()
            .cloned()
            .ok_or_else(|| BackendError::BadParameter("no Elasticsearch host given".to_owned()))?
            .trim_end_matches('/')
            .to_owned();
        Ok(Self {
            settings,
            client,
            base_url,
        })
    }

    /// Load settings from the environment and instantiate.
    pub fn from_env() -> BackendResult<Self> {
        let settings =
            EsSettings::from_env().map_err(|err| BackendError::BadParameter(err.to_string()))?;
        Self::new(settings)
    }

    async fn get_json(&self, path: &str) -> BackendResult<Value> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .map_err(transport)?;
        check_response(response).await
    }

    async fn post_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &Value,
    ) -> BackendResult<Value> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .query(query)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        check_response(response).await
    }

    async fn scroll_start(
        &self,
        target: &str,
        body: &Value,
        query_string: Option<&str>,
    ) -> BackendResult<(Option<String>, Vec<Value>)> {
        let mut query: Vec<(&str, &str)> = vec![("scroll", SCROLL_KEEP_ALIVE)];
        if let Some(q) = query_string {
            query.push(("q", q));
        }
        let response = self
            .post_json(&format!("/{target}/_search"), &query, body)
            .await?;
        Ok(scroll_page(response))
    }

    async fn scroll_next(&self, scroll_id: &str) -> BackendResult<(Option<String>, Vec<Value>)> {
        let body = json!({ "scroll": SCROLL_KEEP_ALIVE, "scroll_id": scroll_id });
        let response = self.post_json("/_search/scroll", &[], &body).await?;
        Ok(scroll_page(response))
    }

    /// Shape one record into its `_bulk` action and optional source line.
    fn to_action(
        value: &Value,
        target: &str,
        operation_type: OperationType,
    ) -> (Value, Option<Value>) {
        let mut meta = json!({ "_index": target });
        if let Some(id) = value.get("id").and_then(Value::as_str) {
            meta["_id"] = json!(id);
        }
        match operation_type {
            OperationType::Update => (json!({ "update": meta }), Some(json!({ "doc": value }))),
            OperationType::Create => (json!({ "create": meta }), Some(value.clone())),
            OperationType::Index => (json!({ "index": meta }), Some(value.clone())),
            OperationType::Delete => (json!({ "delete": meta }), None),
            OperationType::Append => unreachable!("append is rejected before shaping"),
        }
    }

    async fn bulk(
        &self,
        batch: &[Value],
        target: &str,
        operation_type: OperationType,
        ignore_errors: bool,
        written: usize,
    ) -> BackendResult<usize> {
        let mut body = String::new();
        for value in batch {
            let (meta, source) = Self::to_action(value, target, operation_type);
            body.push_str(&meta.to_string());
            body.push('\n');
            if let Some(source) = source {
                body.push_str(&source.to_string());
                body.push('\n');
            }
        }

        let response = self
            .client
            .post(format!("{}/_bulk", self.base_url))
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(transport)?;
        let response = check_response(response).await?;

        let items = response
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut count = 0usize;
        let mut first_error = None;
        for item in &items {
            let action = item
                .as_object()
                .and_then(|object| object.values().next())
                .cloned()
                .unwrap_or_default();
            match action.get("error") {
                None => count += 1,
                Some(error) if first_error.is_none() => first_error = Some(error.clone()),
                Some(_) => {}
            }
        }
        debug!("Wrote {count} documents from a bulk of {}", items.len());

        if let Some(error) = first_error
            && !ignore_errors
        {
            return Err(BackendError::PartialBatch {
                count: written + count,
                message: error.to_string(),
            });
        }
        Ok(count)
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::RequestTimeout(err.to_string())
    } else {
        BackendError::Transport(err.to_string())
    }
}

async fn check_response(response: reqwest::Response) -> BackendResult<Value> {
    let status = response.status();
    let text = response.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(BackendError::Transport(format!(
            "Elasticsearch request failed ({status}): {}",
            text.trim()
        )));
    }
    serde_json::from_str(&text)
        .map_err(|err| BackendError::BadFormat(format!("invalid response body: {err}")))
}

fn scroll_page(response: Value) -> (Option<String>, Vec<Value>) {
    let scroll_id = response
        .get("_scroll_id")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let hits = response
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    (scroll_id, hits)
}

enum ScrollState {
    Initial {
        target: String,
        body: Value,
        query_string: Option<String>,
    },
    Continue(String),
    Done,
}

struct ScrollPager {
    backend: EsDataBackend,
    state: ScrollState,
    buffer: VecDeque<BackendResult<ReadItem>>,
    raw_output: bool,
}

impl ScrollPager {
    fn hit_item(&self, hit: Value) -> ReadItem {
        if self.raw_output {
            ReadItem::Bytes(hit.to_string().into_bytes())
        } else {
            ReadItem::Value(hit)
        }
    }

    async fn next_item(mut self) -> Option<(BackendResult<ReadItem>, Self)> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some((item, self));
            }
            let page = match std::mem::replace(&mut self.state, ScrollState::Done) {
                ScrollState::Done => return None,
                ScrollState::Initial {
                    target,
                    body,
                    query_string,
                } => {
                    self.backend
                        .scroll_start(&target, &body, query_string.as_deref())
                        .await
                }
                ScrollState::Continue(scroll_id) => self.backend.scroll_next(&scroll_id).await,
            };
            match page {
                Err(err) => {
                    self.buffer.push_back(Err(err));
                }
                Ok((_, hits)) if hits.is_empty() => {}
                Ok((scroll_id, hits)) => {
                    if let Some(scroll_id) = scroll_id {
                        self.state = ScrollState::Continue(scroll_id);
                    }
                    for hit in hits {
                        let item = self.hit_item(hit);
                        self.buffer.push_back(Ok(item));
                    }
                }
            }
        }
    }
}

#[async_trait]
impl DataBackend for EsDataBackend {
    type Query = crate::EsQuery;

    fn name(&self) -> &'static str {
        "es"
    }

    async fn status(&self) -> DataBackendStatus {
        if let Err(err) = self.get_json("/").await {
            error!("Failed to connect to Elasticsearch: {err}");
            return DataBackendStatus::Away;
        }

        let health = self
            .client
            .get(format!("{}/_cat/health", self.base_url))
            .send()
            .await;
        let body = match health {
            Ok(response) => response.text().await.unwrap_or_default(),
            Err(err) => {
                error!("Failed to read cluster health: {err}");
                return DataBackendStatus::Away;
            }
        };
        if !body.contains("green") {
            error!("Cluster status is not green: {}", body.trim());
            return DataBackendStatus::Error;
        }
        DataBackendStatus::Ok
    }

    async fn list(
        &self,
        target: Option<&str>,
        details: bool,
        _new: bool,
    ) -> BackendResult<ListStream> {
        let target = target.unwrap_or("*");
        let indices = self
            .get_json(&format!("/{target}"))
            .await
            .map_err(|err| {
                let msg = format!("Failed to read indices: {err}");
                error!("{msg}");
                BackendError::Transport(msg)
            })?;
        let Some(indices) = indices.as_object() else {
            return Err(BackendError::BadFormat(
                "expected an index mapping".to_owned(),
            ));
        };

        let items: Vec<BackendResult<ListItem>> = indices
            .iter()
            .map(|(index, index_details)| {
                if details {
                    Ok(ListItem::Details(json!({ index: index_details })))
                } else {
                    Ok(ListItem::Id(index.clone()))
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
        let default_query = crate::EsQuery::default();
        let query = query.unwrap_or(&default_query);
        let target = target.unwrap_or(&self.settings.default_index).to_owned();
        let chunk_size = chunk_size.unwrap_or(self.settings.default_chunk_size);

        let mut body = json!({ "size": chunk_size });
        if let Some(dsl) = &query.query {
            body["query"] = dsl.clone();
        }

        let pager = ScrollPager {
            backend: self.clone(),
            state: ScrollState::Initial {
                target,
                body,
                query_string: query.query_string.clone(),
            },
            buffer: VecDeque::new(),
            raw_output,
        };
        Ok(stream::unfold(pager, ScrollPager::next_item).boxed())
    }

    async fn write(
        &self,
        data: WriteStream,
        target: Option<&str>,
        chunk_size: Option<usize>,
        ignore_errors: bool,
        operation_type: Option<OperationType>,
    ) -> BackendResult<usize> {
        let target = target.unwrap_or(&self.settings.default_index).to_owned();
        let chunk_size = chunk_size.unwrap_or(self.settings.default_chunk_size);
        let operation_type = operation_type.unwrap_or(OperationType::Index);
        if operation_type == OperationType::Append {
            let msg = "Append operation_type is not supported.".to_owned();
            error!("{msg}");
            return Err(BackendError::NotSupported(msg));
        }

        let Some(data) = peek(data).await else {
            info!("Data Iterator is empty; skipping write to target.");
            return Ok(0);
        };
        debug!("Start writing to the {target} index (chunk size: {chunk_size})");

        let mut batches = into_values(data, ignore_errors).chunks(chunk_size).boxed();
        let mut count = 0usize;
        while let Some(batch) = batches.next().await {
            let mut values = Vec::with_capacity(batch.len());
            for item in batch {
                values.push(item?);
            }
            let written = self
                .bulk(&values, &target, operation_type, ignore_errors, count)
                .await;
            match written {
                Ok(written) => count += written,
                Err(err) if ignore_errors => {
                    warn!("Bulk failed for current chunk but you choose to ignore it: {err}");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl LrsBackend for EsDataBackend {
    async fn query_statements(
        &self,
        params: &StatementParameters,
    ) -> BackendResult<StatementQueryResult> {
        params.validate()?;

        let mut filters: Vec<Value> = Vec::new();
        if let Some(statement_id) = &params.statement_id {
            filters.push(json!({ "term": { "id.keyword": statement_id } }));
        }
        if let Some(name) = params.agent_account_name() {
            filters.push(json!({ "term": { "actor.account.name.keyword": name } }));
        }
        if let Some(verb) = &params.verb {
            filters.push(json!({ "term": { "verb.id.keyword": verb } }));
        }
        if let Some(activity) = &params.activity {
            filters.push(json!({ "term": { "object.objectType.keyword": "Activity" } }));
            filters.push(json!({ "term": { "object.id.keyword": activity } }));
        }
        if let Some(since) = &params.since {
            filters.push(json!({ "range": { "timestamp": { "gt": since.to_rfc3339() } } }));
        }
        if let Some(until) = &params.until {
            filters.push(json!({ "range": { "timestamp": { "lte": until.to_rfc3339() } } }));
        }

        let order = if params.ascending { "asc" } else { "desc" };
        let mut body = json!({
            "query": { "bool": { "filter": filters } },
            "sort": [
                { "timestamp": { "order": order } },
                { "id.keyword": { "order": order } }
            ]
        });
        if let Some(limit) = params.limit {
            body["size"] = json!(limit);
        }
        if let Some(search_after) = &params.search_after {
            let pit_id = params.pit_id.as_ref().ok_or_else(|| {
                BackendError::BadParameter("search_after requires the matching pit_id".to_owned())
            })?;
            body["search_after"] = json!([search_after, pit_id]);
        }

        let response = self
            .post_json(
                &format!("/{}/_search", self.settings.default_index),
                &[],
                &body,
            )
            .await
            .map_err(|err| {
                error!("Failed to execute Elasticsearch query. {err}");
                err
            })?;
        let hits = response
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let statements: Vec<Value> = hits
            .into_iter()
            .map(|mut hit| hit["_source"].take())
            .collect();

        let cursor = match statements.last() {
            None => None,
            Some(last) => {
                let emission_time = last
                    .get("timestamp")
                    .and_then(Value::as_str)
                    .and_then(|raw| parse_emission_time(raw).ok())
                    .ok_or_else(|| BackendError::BadFormat("hit missing timestamp".to_owned()))?;
                let event_id = last
                    .get("id")
                    .and_then(Value::as_str)
                    .and_then(|raw| Uuid::parse_str(raw).ok())
                    .ok_or_else(|| BackendError::BadFormat("hit missing id".to_owned()))?;
                Some(StatementCursor::from_last_row(emission_time, event_id))
            }
        };

        Ok(StatementQueryResult {
            statements,
            continuation_token: cursor.as_ref().map(|c| c.search_after.clone()),
            point_in_time: cursor.map(|c| c.pit_id),
        })
    }

    async fn query_statements_by_ids(&self, ids: &[String]) -> BackendResult<Vec<Value>> {
        let body = json!({
            "query": { "terms": { "id.keyword": ids } },
            "size": ids.len()
        });
        let response = self
            .post_json(
                &format!("/{}/_search", self.settings.default_index),
                &[],
                &body,
            )
            .await?;
        let hits = response
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(hits
            .into_iter()
            .map(|mut hit| hit["_source"].take())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrs_backend::write_stream;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> EsDataBackend {
        let settings = EsSettings {
            hosts: vec![server.uri()],
            ..EsSettings::default()
        };
        EsDataBackend::new(settings).unwrap()
    }

    #[tokio::test]
    async fn status_requires_a_green_cluster() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "node-1"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/_cat/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "1679582361 14:39:21 cluster green 1 1 1 1 0 0 0 0 - 100.0%\n",
            ))
            .expect(1)
            .mount(&server)
            .await;
        assert_eq!(backend(&server).status().await, DataBackendStatus::Ok);
    }

    #[tokio::test]
    async fn yellow_cluster_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "node-1"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/_cat/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "1679582361 14:39:21 cluster yellow 1 1 1 1 0 0 0 0 - 50.0%\n",
            ))
            .mount(&server)
            .await;
        assert_eq!(backend(&server).status().await, DataBackendStatus::Error);
    }

    #[tokio::test]
    async fn unreachable_cluster_is_away() {
        let server = MockServer::start().await;
        let unreachable = backend(&server);
        drop(server);
        assert_eq!(unreachable.status().await, DataBackendStatus::Away);
    }

    #[tokio::test]
    async fn list_yields_index_names_and_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "statements": {"aliases": {}},
                "statements-archive": {"aliases": {}}
            })))
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
        assert_eq!(names, vec!["statements", "statements-archive"]);

        let details: Vec<_> = backend
            .list(None, true, false)
            .await
            .unwrap()
            .collect()
            .await;
        assert!(matches!(details[0].as_ref().unwrap(), ListItem::Details(_)));
    }

    #[tokio::test]
    async fn read_follows_the_scroll() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/statements/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_scroll_id": "scroll-1",
                "hits": {"hits": [
                    {"_index": "statements", "_id": "a", "_source": {"id": "a"}},
                    {"_index": "statements", "_id": "b", "_source": {"id": "b"}}
                ]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/_search/scroll"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_scroll_id": "scroll-1",
                "hits": {"hits": []}
            })))
            .mount(&server)
            .await;
        let backend = backend(&server);

        let hits: Vec<_> = backend
            .read(None, None, Some(2), false, true)
            .await
            .unwrap()
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].as_value().unwrap()["_id"], json!("a"));
    }

    #[tokio::test]
    async fn write_shapes_bulk_actions_per_operation_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": false,
                "items": [{"update": {"status": 200}}]
            })))
            .mount(&server)
            .await;
        let backend = backend(&server);

        let count = backend
            .write(
                write_stream(vec![json!({"id": "a", "verb": {"id": "v"}})]),
                None,
                None,
                false,
                Some(OperationType::Update),
            )
            .await
            .unwrap();
        assert_eq!(count, 1);

        let body = String::from_utf8(server.received_requests().await.unwrap()[0].body.clone())
            .unwrap();
        let mut lines = body.lines();
        let meta: Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        let doc: Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(meta, json!({"update": {"_index": "statements", "_id": "a"}}));
        assert_eq!(doc, json!({"doc": {"id": "a", "verb": {"id": "v"}}}));
    }

    #[tokio::test]
    async fn append_is_rejected() {
        let server = MockServer::start().await;
        let backend = backend(&server);
        let err = backend
            .write(
                write_stream(vec![json!({"id": "a"})]),
                None,
                None,
                false,
                Some(OperationType::Append),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotSupported(_)));
        assert_eq!(err.to_string(), "operation not supported: Append operation_type is not supported.");
    }

    #[tokio::test]
    async fn bulk_item_errors_raise_a_partial_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": true,
                "items": [
                    {"index": {"status": 201}},
                    {"index": {"status": 409, "error": {"type": "version_conflict_engine_exception"}}}
                ]
            })))
            .mount(&server)
            .await;
        let backend = backend(&server);

        let data = || {
            write_stream(vec![
                json!({"id": "a"}),
                json!({"id": "b"}),
            ])
        };
        let err = backend
            .write(data(), None, None, false, None)
            .await
            .unwrap_err();
        match err {
            BackendError::PartialBatch { count, .. } => assert_eq!(count, 1),
            other => panic!("expected PartialBatch, got {other:?}"),
        }

        let count = backend.write(data(), None, None, true, None).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn query_statements_sorts_and_emits_the_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/statements/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": {"hits": [
                    {"_source": {
                        "id": "f93b8d34-f74f-4d16-99a9-0ba5c6c192a8",
                        "timestamp": "2023-02-17T16:55:14.721633+00:00",
                        "verb": {"id": "https://w3id.org/xapi/video/verbs/played"}
                    }}
                ]}
            })))
            .mount(&server)
            .await;
        let backend = backend(&server);

        let params = StatementParameters {
            verb: Some("https://w3id.org/xapi/video/verbs/played".to_owned()),
            ascending: true,
            limit: Some(1),
            ..Default::default()
        };
        let result = backend.query_statements(&params).await.unwrap();
        assert_eq!(result.statements.len(), 1);
        assert_eq!(
            result.continuation_token.as_deref(),
            Some("2023-02-17T16:55:14.721633")
        );
        assert_eq!(
            result.point_in_time.as_deref(),
            Some("f93b8d34-f74f-4d16-99a9-0ba5c6c192a8")
        );

        let body: Value = serde_json::from_slice(
            &server.received_requests().await.unwrap()[0].body,
        )
        .unwrap();
        assert_eq!(
            body["sort"],
            json!([
                {"timestamp": {"order": "asc"}},
                {"id.keyword": {"order": "asc"}}
            ])
        );
        assert_eq!(body["size"], json!(1));
        assert_eq!(
            body["query"]["bool"]["filter"][0],
            json!({"term": {"verb.id.keyword": "https://w3id.org/xapi/video/verbs/played"}})
        );
    }

    #[tokio::test]
    async fn cursor_round_trips_into_search_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/statements/_search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"hits": {"hits": []}})),
            )
            .mount(&server)
            .await;
        let backend = backend(&server);

        let params = StatementParameters {
            search_after: Some("2023-02-17T16:55:14.721633".to_owned()),
            pit_id: Some("af5e9c42-4017-49ff-85a4-bc9d4eff7b0c".to_owned()),
            ..Default::default()
        };
        backend.query_statements(&params).await.unwrap();

        let body: Value = serde_json::from_slice(
            &server.received_requests().await.unwrap()[0].body,
        )
        .unwrap();
        assert_eq!(
            body["search_after"],
            json!([
                "2023-02-17T16:55:14.721633",
                "af5e9c42-4017-49ff-85a4-bc9d4eff7b0c"
            ])
        );
    }
}

