//! Key-value store abstraction backing the rate cache

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Hash holding the grouped snapshot.
pub const RATES_HASH_KEY: &str = "tasas";
pub const BCV_KEY: &str = "tasa:bcv";
pub const BINANCE_KEY: &str = "tasa:binance";
pub const EURO_KEY: &str = "tasa:euro";
pub const UPDATED_AT_KEY: &str = "tasa:updated_at";

pub const BCV_FIELD: &str = "bcv";
pub const BINANCE_FIELD: &str = "binance";
pub const EURO_FIELD: &str = "euro";
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Every key a refresh may have written.
pub const SNAPSHOT_KEYS: [&str; 5] = [
    BCV_KEY,
    BINANCE_KEY,
    EURO_KEY,
    UPDATED_AT_KEY,
    RATES_HASH_KEY,
];

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Delete(Vec<String>),
    Set { key: String, value: String },
    HashSet { key: String, fields: Vec<(String, String)> },
}

/// Writes applied together or not at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delete<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ops
            .push(WriteOp::Delete(keys.into_iter().map(Into::into).collect()));
        self
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn hset<I, F, V>(mut self, key: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<String>,
        V: Into<String>,
    {
        self.ops.push(WriteOp::HashSet {
            key: key.into(),
            fields: fields
                .into_iter()
                .map(|(f, v)| (f.into(), v.into()))
                .collect(),
        });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Errors are reserved for an unreachable or failing backend; a missing
/// key is `None` or an empty map.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Applies every op of `batch` atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;
}
