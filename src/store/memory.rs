use crate::core::store::{KeyValueStore, WriteBatch, WriteOp};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
}

/// In-process store with the same semantics as the Redis backend.
///
/// Cloning shares the underlying map, so a test can hold one handle while
/// the server holds another.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, Value>>>,
    available: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// When unavailable every call fails as if the backend were unreachable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if !self.available.load(Ordering::SeqCst) {
            bail!("Connection refused: memory store is unavailable");
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_available()?;
        let map = self.inner.lock().await;
        match map.get(key) {
            Some(Value::Str(s)) => {
                debug!("Store HIT for key: {}", key);
                Ok(Some(s.clone()))
            }
            Some(Value::Hash(_)) => {
                bail!("WRONGTYPE Operation against a key holding the wrong kind of value")
            }
            None => {
                debug!("Store MISS for key: {}", key);
                Ok(None)
            }
        }
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        self.ensure_available()?;
        let map = self.inner.lock().await;
        match map.get(key) {
            Some(Value::Hash(h)) => Ok(h.clone()),
            Some(Value::Str(_)) => {
                bail!("WRONGTYPE Operation against a key holding the wrong kind of value")
            }
            None => Ok(HashMap::new()),
        }
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.ensure_available()?;
        let mut map = self.inner.lock().await;

        // Apply to a copy so a type error leaves the map untouched.
        let mut staged = map.clone();
        for op in batch.ops() {
            match op {
                WriteOp::Delete(keys) => {
                    for key in keys {
                        staged.remove(key);
                    }
                }
                WriteOp::Set { key, value } => {
                    staged.insert(key.clone(), Value::Str(value.clone()));
                }
                WriteOp::HashSet { key, fields } => {
                    let entry = staged
                        .entry(key.clone())
                        .or_insert_with(|| Value::Hash(HashMap::new()));
                    match entry {
                        Value::Hash(h) => h.extend(fields.iter().cloned()),
                        Value::Str(_) => bail!(
                            "WRONGTYPE Operation against a key holding the wrong kind of value"
                        ),
                    }
                }
            }
        }
        *map = staged;
        debug!(ops = batch.ops().len(), "Store COMMIT");
        Ok(())
    }
}
