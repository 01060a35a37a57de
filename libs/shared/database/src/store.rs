use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use shared_models::ErrorKind;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate key in {collection} violates unique index {index}")]
    DuplicateKey { collection: String, index: String },

    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::DuplicateKey { .. } => ErrorKind::Conflict,
            StoreError::Unavailable(_) | StoreError::Malformed(_) => ErrorKind::Unavailable,
        }
    }

    /// Returns true when this is a violation of the named unique index.
    pub fn violates(&self, index_name: &str) -> bool {
        matches!(self, StoreError::DuplicateKey { index, .. } if index == index_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Lt,
    Gt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: Comparison,
    pub value: Value,
}

/// Conjunction of simple predicates on top-level document fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Serialize) -> Self {
        Self::new().eq("id", id)
    }

    pub fn eq(self, field: &str, value: impl Serialize) -> Self {
        self.with(field, Comparison::Eq, value)
    }

    pub fn lt(self, field: &str, value: impl Serialize) -> Self {
        self.with(field, Comparison::Lt, value)
    }

    pub fn gt(self, field: &str, value: impl Serialize) -> Self {
        self.with(field, Comparison::Gt, value)
    }

    fn with(mut self, field: &str, op: Comparison, value: impl Serialize) -> Self {
        self.conditions.push(Condition {
            field: field.to_string(),
            op,
            value: serde_json::to_value(value).unwrap_or(Value::Null),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.conditions.iter().all(|condition| {
            let actual = document.get(&condition.field).unwrap_or(&Value::Null);
            match condition.op {
                Comparison::Eq => values_equal(actual, &condition.value),
                Comparison::Lt => {
                    !actual.is_null()
                        && compare_values(actual, &condition.value) == Some(Ordering::Less)
                }
                Comparison::Gt => {
                    !actual.is_null()
                        && compare_values(actual, &condition.value) == Some(Ordering::Greater)
                }
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: &str) -> Self {
        Self { field: field.to_string(), direction: SortDirection::Ascending }
    }

    pub fn desc(field: &str) -> Self {
        Self { field: field.to_string(), direction: SortDirection::Descending }
    }
}

/// Orders two documents by a list of sort keys. Missing fields sort first
/// in ascending order.
pub fn compare_documents(a: &Value, b: &Value, sort: &[SortKey]) -> Ordering {
    for key in sort {
        let left = a.get(&key.field).unwrap_or(&Value::Null);
        let right = b.get(&key.field).unwrap_or(&Value::Null);
        let ordering = match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => compare_values(left, right).unwrap_or(Ordering::Equal),
        };
        let ordering = match key.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Numbers compare numerically, RFC 3339 timestamps chronologically and
/// other strings lexically. Mixed types are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Some(x.cmp(&y));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

/// A uniqueness constraint the store must enforce. With `partial` set,
/// only documents whose field equals the given value take part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueIndex {
    pub name: &'static str,
    pub collection: &'static str,
    pub fields: &'static [&'static str],
    pub partial: Option<(&'static str, &'static str)>,
}

impl UniqueIndex {
    pub const fn new(
        name: &'static str,
        collection: &'static str,
        fields: &'static [&'static str],
    ) -> Self {
        Self { name, collection, fields, partial: None }
    }

    pub const fn when_eq(self, field: &'static str, value: &'static str) -> Self {
        Self { partial: Some((field, value)), ..self }
    }

    pub fn applies_to(&self, document: &Value) -> bool {
        match self.partial {
            Some((field, value)) => document.get(field).and_then(Value::as_str) == Some(value),
            None => true,
        }
    }

    /// Key tuple for this index, or `None` when a field is absent (sparse).
    pub fn key_of(&self, document: &Value) -> Option<Vec<Value>> {
        self.fields
            .iter()
            .map(|field| match document.get(*field) {
                Some(Value::Null) | None => None,
                Some(value) => Some(value.clone()),
            })
            .collect()
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create(&self, collection: &str, document: Value) -> Result<Value, StoreError>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>, StoreError>;

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        sort: &[SortKey],
    ) -> Result<Vec<Value>, StoreError>;

    async fn find_first(
        &self,
        collection: &str,
        filter: &Filter,
        sort: &[SortKey],
    ) -> Result<Option<Value>, StoreError> {
        Ok(self.find(collection, filter, sort).await?.into_iter().next())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.find_one(collection, &Filter::by_id(id)).await
    }

    /// Inserts `document` with `order_field` set to one more than the
    /// largest value among documents matching `scope` (1 for an empty
    /// scope). Reading the maximum and inserting happen atomically with
    /// respect to other writers in the same scope.
    async fn create_with_next_order(
        &self,
        collection: &str,
        scope: &Filter,
        order_field: &str,
        document: Value,
    ) -> Result<Value, StoreError>;

    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> Result<Option<Value>, StoreError>;

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    async fn count_documents(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Value, StoreError> {
    Ok(serde_json::to_value(value)?)
}

pub fn from_document<T: DeserializeOwned>(document: Value) -> Result<T, StoreError> {
    Ok(serde_json::from_value(document)?)
}
