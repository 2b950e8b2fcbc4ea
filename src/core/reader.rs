use super::rate::RateSnapshot;
use super::store::{
    BCV_FIELD, BINANCE_FIELD, EURO_FIELD, KeyValueStore, RATES_HASH_KEY, UPDATED_AT_FIELD,
};
use anyhow::{Context, Result, anyhow};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    pub snapshot: RateSnapshot,
    /// `false` when no refresh has populated the cache yet.
    pub cached: bool,
}

/// Read-only view of the cached snapshot.
#[derive(Clone)]
pub struct RateReader {
    store: Arc<dyn KeyValueStore>,
}

impl RateReader {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// An empty cache is a successful, uncached read; an unreachable one is an error.
    #[instrument(name = "ReadRates", skip(self))]
    pub async fn read(&self) -> Result<ReadOutcome> {
        let result = self.try_read().await;
        if let Err(e) = &result {
            error!(error = %e, "Error reading rates");
        }
        result
    }

    async fn try_read(&self) -> Result<ReadOutcome> {
        let fields = self
            .store
            .hgetall(RATES_HASH_KEY)
            .await
            .context("Failed to read rates from cache")?;

        let present = |field: &str| fields.get(field).filter(|raw| !raw.trim().is_empty());
        let (Some(bcv), Some(binance)) = (present(BCV_FIELD), present(BINANCE_FIELD)) else {
            debug!("No cached rates yet");
            return Ok(ReadOutcome {
                snapshot: RateSnapshot::empty(),
                cached: false,
            });
        };

        let snapshot = RateSnapshot {
            bcv: parse_rate(BCV_FIELD, bcv)?,
            binance: parse_rate(BINANCE_FIELD, binance)?,
            euro: optional_rate(&fields, EURO_FIELD)?,
            updated_at: fields.get(UPDATED_AT_FIELD).cloned(),
        };
        Ok(ReadOutcome {
            snapshot,
            cached: true,
        })
    }
}

fn parse_rate(field: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| anyhow!("Invalid cached value for {}: {:?}", field, raw))
}

fn optional_rate(fields: &HashMap<String, String>, field: &str) -> Result<Option<f64>> {
    fields.get(field).map(|raw| parse_rate(field, raw)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::refresh::snapshot_batch;
    use crate::core::store::WriteBatch;
    use crate::store::memory::MemoryStore;

    fn reader(store: &MemoryStore) -> RateReader {
        RateReader::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn test_empty_cache_returns_sentinel() {
        let store = MemoryStore::new();

        let outcome = reader(&store).read().await.unwrap();

        assert!(!outcome.cached);
        assert_eq!(outcome.snapshot, RateSnapshot::empty());
        assert!(outcome.snapshot.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_partial_hash_is_not_cached() {
        let store = MemoryStore::new();
        store
            .commit(WriteBatch::new().hset(RATES_HASH_KEY, [(BCV_FIELD, "36.5")]))
            .await
            .unwrap();

        let outcome = reader(&store).read().await.unwrap();

        assert!(!outcome.cached);
        assert_eq!(outcome.snapshot.bcv, 0.0);
    }

    #[tokio::test]
    async fn test_empty_field_is_not_cached() {
        let store = MemoryStore::new();
        store
            .commit(
                WriteBatch::new().hset(RATES_HASH_KEY, [(BCV_FIELD, ""), (BINANCE_FIELD, "38.2")]),
            )
            .await
            .unwrap();

        let outcome = reader(&store).read().await.unwrap();

        assert!(!outcome.cached);
        assert_eq!(outcome.snapshot, RateSnapshot::empty());
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryStore::new();
        let snapshot = RateSnapshot {
            bcv: 36.5,
            binance: 36.5 * 1.03,
            euro: Some(1.08 * 36.5),
            updated_at: Some("2025-01-31T12:00:00.000Z".to_string()),
        };
        store.commit(snapshot_batch(&snapshot, true)).await.unwrap();

        let outcome = reader(&store).read().await.unwrap();

        assert!(outcome.cached);
        assert_eq!(outcome.snapshot, snapshot);
    }

    #[tokio::test]
    async fn test_unreachable_store_is_an_error() {
        let store = MemoryStore::new();
        store.set_available(false);

        let err = reader(&store).read().await.unwrap_err();

        assert!(err.to_string().contains("Failed to read rates from cache"));
    }

    #[tokio::test]
    async fn test_corrupted_value_is_an_error() {
        let store = MemoryStore::new();
        store
            .commit(
                WriteBatch::new()
                    .hset(RATES_HASH_KEY, [(BCV_FIELD, "36.5"), (BINANCE_FIELD, "abc")]),
            )
            .await
            .unwrap();

        assert!(reader(&store).read().await.is_err());
    }
}
