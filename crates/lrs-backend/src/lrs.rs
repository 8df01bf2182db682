//! The LRS statement-query contract.

use async_trait::async_trait;
use lrs_error::BackendResult;
use lrs_model::{StatementParameters, StatementQueryResult};
use serde_json::Value;

/// A backend able to answer xAPI statement queries with stable pagination.
///
/// Implementations translate [`StatementParameters`] into their native
/// predicate, order by `(emission_time, event_id)` in the requested
/// direction, and emit the composite cursor from the last returned row.
/// Feeding each result's `(continuation_token, point_in_time)` back as the
/// next call's `(search_after, pit_id)` walks the full matching set with
/// no duplicates and no omissions.
#[async_trait]
pub trait LrsBackend: Send + Sync {
    /// Run one page of a statements query.
    async fn query_statements(
        &self,
        params: &StatementParameters,
    ) -> BackendResult<StatementQueryResult>;

    /// Return the stored statements whose ids appear in `ids`.
    async fn query_statements_by_ids(&self, ids: &[String]) -> BackendResult<Vec<Value>>;
}
