use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE},
    Client, Method, Response,
};
use serde_json::{json, Map, Value};
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::store::{Comparison, Filter, RecordStore, SortDirection, SortKey, StoreError};

const NEXT_ORDER_RPC: &str = "rpc/insert_with_next_order";

/// PostgREST-backed record store. Each collection maps to a table of the
/// same name under `/rest/v1`.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    fn get_headers(&self, prefer: Option<&'static str>) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|e| StoreError::Unavailable(format!("invalid service key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|e| StoreError::Unavailable(format!("invalid service key: {}", e)))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(prefer) = prefer {
            headers.insert("Prefer", HeaderValue::from_static(prefer));
        }

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        collection: &str,
        query: &str,
        body: Option<Value>,
        prefer: Option<&'static str>,
    ) -> Result<Response, StoreError> {
        let url = if query.is_empty() {
            format!("{}/rest/v1/{}", self.base_url, collection)
        } else {
            format!("{}/rest/v1/{}?{}", self.base_url, collection, query)
        };
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url).headers(self.get_headers(prefer)?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        if status.as_u16() == 409 {
            let index = constraint_name(&error_text).unwrap_or_else(|| "unknown".to_string());
            debug!("Unique constraint {} rejected write to {}", index, collection);
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                index,
            });
        }

        error!("API error ({}): {}", status, error_text);
        Err(StoreError::Unavailable(format!("API error ({}): {}", status, error_text)))
    }

    async fn rows(
        &self,
        method: Method,
        collection: &str,
        query: &str,
        body: Option<Value>,
        prefer: Option<&'static str>,
    ) -> Result<Vec<Value>, StoreError> {
        let response = self.send(method, collection, query, body, prefer).await?;
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to read response: {}", e)))?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Renders a filter and sort as a PostgREST query string.
pub fn postgrest_query(filter: &Filter, sort: &[SortKey], limit: Option<usize>) -> String {
    let mut parts: Vec<String> = filter
        .conditions()
        .iter()
        .map(|condition| {
            let op = match condition.op {
                Comparison::Eq => "eq",
                Comparison::Lt => "lt",
                Comparison::Gt => "gt",
            };
            match &condition.value {
                Value::Null => format!("{}=is.null", condition.field),
                value => format!("{}={}.{}", condition.field, op, encode_value(value)),
            }
        })
        .collect();

    if !sort.is_empty() {
        let order = sort
            .iter()
            .map(|key| match key.direction {
                SortDirection::Ascending => format!("{}.asc", key.field),
                SortDirection::Descending => format!("{}.desc", key.field),
            })
            .collect::<Vec<_>>()
            .join(",");
        parts.push(format!("order={}", order));
    }

    if let Some(limit) = limit {
        parts.push(format!("limit={}", limit));
    }

    parts.join("&")
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => urlencoding::encode(s).into_owned(),
        other => urlencoding::encode(&other.to_string()).into_owned(),
    }
}

/// Equality conditions as a JSON object for the ordered-insert function.
fn scope_object(scope: &Filter) -> Result<Value, StoreError> {
    let mut object = Map::new();
    for condition in scope.conditions() {
        if condition.op != Comparison::Eq {
            return Err(StoreError::Unavailable(format!(
                "ordered insert scope only supports equality, got {:?} on {}",
                condition.op, condition.field
            )));
        }
        object.insert(condition.field.clone(), condition.value.clone());
    }
    Ok(Value::Object(object))
}

fn constraint_name(error_text: &str) -> Option<String> {
    static CONSTRAINT: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = CONSTRAINT
        .get_or_init(|| Regex::new(r#"unique constraint \\?"([A-Za-z0-9_]+)\\?""#).ok())
        .as_ref()?;
    pattern
        .captures(error_text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parses the total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn total_from_content_range(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait]
impl RecordStore for SupabaseClient {
    async fn create(&self, collection: &str, document: Value) -> Result<Value, StoreError> {
        let rows = self
            .rows(Method::POST, collection, "", Some(document), Some("return=representation"))
            .await?;
        rows.into_iter().next().ok_or_else(|| {
            StoreError::Unavailable(format!("insert into {} returned no representation", collection))
        })
    }

    /// Delegates to the `insert_with_next_order` SQL function, which takes a
    /// per-scope advisory lock before reading the maximum.
    async fn create_with_next_order(
        &self,
        collection: &str,
        scope: &Filter,
        order_field: &str,
        document: Value,
    ) -> Result<Value, StoreError> {
        let params = json!({
            "p_table": collection,
            "p_scope": scope_object(scope)?,
            "p_order_field": order_field,
            "p_document": document,
        });

        let response = self
            .send(Method::POST, NEXT_ORDER_RPC, "", Some(params), None)
            .await
            .map_err(|e| match e {
                StoreError::DuplicateKey { index, .. } => StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    index,
                },
                other => other,
            })?;
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to read response: {}", e)))?;

        match serde_json::from_str(&text)? {
            Value::Array(rows) => rows.into_iter().next().ok_or_else(|| {
                StoreError::Unavailable(format!("ordered insert into {} returned no row", collection))
            }),
            row => Ok(row),
        }
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>, StoreError> {
        self.find_first(collection, filter, &[]).await
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        sort: &[SortKey],
    ) -> Result<Vec<Value>, StoreError> {
        let query = postgrest_query(filter, sort, None);
        self.rows(Method::GET, collection, &query, None, None).await
    }

    async fn find_first(
        &self,
        collection: &str,
        filter: &Filter,
        sort: &[SortKey],
    ) -> Result<Option<Value>, StoreError> {
        let query = postgrest_query(filter, sort, Some(1));
        Ok(self.rows(Method::GET, collection, &query, None, None).await?.into_iter().next())
    }

    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> Result<Option<Value>, StoreError> {
        let query = postgrest_query(&Filter::by_id(id), &[], None);
        let rows = self
            .rows(Method::PATCH, collection, &query, Some(patch), Some("return=representation"))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let Some(target) = self.find_first(collection, filter, &[]).await? else {
            return Ok(0);
        };
        let Some(id) = target.get("id").and_then(Value::as_str) else {
            return Ok(0);
        };
        let query = postgrest_query(&Filter::by_id(id), &[], None);
        let rows = self
            .rows(Method::DELETE, collection, &query, None, Some("return=representation"))
            .await?;
        Ok(rows.len() as u64)
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let query = postgrest_query(filter, &[], None);
        let rows = self
            .rows(Method::DELETE, collection, &query, None, Some("return=representation"))
            .await?;
        Ok(rows.len() as u64)
    }

    async fn count_documents(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut query = postgrest_query(filter, &[], Some(0));
        query = if query.is_empty() { "select=id".to_string() } else { format!("select=id&{}", query) };
        let response = self
            .send(Method::GET, collection, &query, None, Some("count=exact"))
            .await?;

        let header = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| StoreError::Unavailable("count response lacked Content-Range".to_string()))?;
        total_from_content_range(header)
            .ok_or_else(|| StoreError::Unavailable(format!("unparsable Content-Range '{}'", header)))
    }
}
