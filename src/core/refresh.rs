use super::fetcher::RateFetcher;
use super::rate::{RateSnapshot, RateSources, timestamp_now};
use super::store::{
    BCV_FIELD, BCV_KEY, BINANCE_FIELD, BINANCE_KEY, EURO_FIELD, EURO_KEY, KeyValueStore,
    RATES_HASH_KEY, SNAPSHOT_KEYS, UPDATED_AT_FIELD, UPDATED_AT_KEY, WriteBatch,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub snapshot: RateSnapshot,
    pub sources: RateSources,
}

/// Fetches a new snapshot and replaces the cached one.
pub struct RefreshJob {
    fetcher: RateFetcher,
    store: Arc<dyn KeyValueStore>,
    clear_previous: bool,
}

impl RefreshJob {
    pub fn new(fetcher: RateFetcher, store: Arc<dyn KeyValueStore>, clear_previous: bool) -> Self {
        Self {
            fetcher,
            store,
            clear_previous,
        }
    }

    #[instrument(name = "RefreshRates", skip(self))]
    pub async fn run(&self) -> Result<RefreshOutcome> {
        let result = self.try_run().await;
        if let Err(e) = &result {
            error!(error = %e, "Error updating rates");
        }
        result
    }

    async fn try_run(&self) -> Result<RefreshOutcome> {
        let fetched = self.fetcher.fetch().await?;
        let (snapshot, sources) = fetched.into_snapshot(timestamp_now());

        // One batch: either the whole snapshot lands or none of it does.
        self.store
            .commit(snapshot_batch(&snapshot, self.clear_previous))
            .await
            .context("Failed to write rates to cache")?;

        info!(
            bcv = snapshot.bcv,
            binance = snapshot.binance,
            euro = ?snapshot.euro,
            updated_at = ?snapshot.updated_at,
            "Rates updated"
        );
        Ok(RefreshOutcome { snapshot, sources })
    }
}

/// Scalar keys plus the grouped hash for `snapshot`.
pub fn snapshot_batch(snapshot: &RateSnapshot, clear_previous: bool) -> WriteBatch {
    let updated_at = snapshot.updated_at.clone().unwrap_or_default();
    let mut fields = vec![
        (BCV_FIELD, snapshot.bcv.to_string()),
        (BINANCE_FIELD, snapshot.binance.to_string()),
    ];
    if let Some(euro) = snapshot.euro {
        fields.push((EURO_FIELD, euro.to_string()));
    }
    fields.push((UPDATED_AT_FIELD, updated_at.clone()));

    let mut batch = WriteBatch::new();
    if clear_previous {
        batch = batch.delete(SNAPSHOT_KEYS);
    }
    batch = batch
        .set(BCV_KEY, snapshot.bcv.to_string())
        .set(BINANCE_KEY, snapshot.binance.to_string());
    if let Some(euro) = snapshot.euro {
        batch = batch.set(EURO_KEY, euro.to_string());
    }
    batch
        .set(UPDATED_AT_KEY, updated_at)
        .hset(RATES_HASH_KEY, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fetcher::tests::StaticProvider;
    use crate::core::rate::RateSource;
    use crate::core::store::WriteOp;
    use crate::store::memory::MemoryStore;

    fn job(store: &MemoryStore, bcv: f64, binance: f64, clear_previous: bool) -> RefreshJob {
        let fetcher = RateFetcher::new(
            StaticProvider::ok(bcv),
            StaticProvider::ok(binance),
            Some(StaticProvider::ok(1.05)),
        );
        RefreshJob::new(fetcher, Arc::new(store.clone()), clear_previous)
    }

    #[test]
    fn test_snapshot_batch_layout() {
        let snapshot = RateSnapshot {
            bcv: 36.5,
            binance: 38.2,
            euro: None,
            updated_at: Some("2025-01-31T12:00:00.000Z".to_string()),
        };

        let batch = snapshot_batch(&snapshot, true);
        let ops = batch.ops();

        assert_eq!(ops.len(), 5);
        assert!(matches!(&ops[0], WriteOp::Delete(keys) if keys.len() == SNAPSHOT_KEYS.len()));
        assert_eq!(
            ops[1],
            WriteOp::Set {
                key: BCV_KEY.to_string(),
                value: "36.5".to_string()
            }
        );
        match &ops[4] {
            WriteOp::HashSet { key, fields } => {
                assert_eq!(key, RATES_HASH_KEY);
                assert_eq!(fields.len(), 3);
                assert!(fields.iter().all(|(f, _)| f != EURO_FIELD));
            }
            other => panic!("Expected hash write, got {other:?}"),
        }

        let batch = snapshot_batch(&snapshot, false);
        assert!(!matches!(batch.ops()[0], WriteOp::Delete(_)));
    }

    #[tokio::test]
    async fn test_run_writes_scalars_and_hash() {
        let store = MemoryStore::new();

        let outcome = job(&store, 36.5, 38.2, true).run().await.unwrap();

        let updated_at = outcome.snapshot.updated_at.clone().unwrap();
        assert_eq!(outcome.snapshot.bcv, 36.5);
        assert_eq!(outcome.snapshot.euro, Some(1.05 * 36.5));
        assert_eq!(outcome.sources.binance, RateSource::Live);

        assert_eq!(store.get(BCV_KEY).await.unwrap().as_deref(), Some("36.5"));
        assert_eq!(store.get(BINANCE_KEY).await.unwrap().as_deref(), Some("38.2"));
        assert_eq!(
            store.get(UPDATED_AT_KEY).await.unwrap(),
            Some(updated_at.clone())
        );
        let hash = store.hgetall(RATES_HASH_KEY).await.unwrap();
        assert_eq!(hash.get(BCV_FIELD).map(String::as_str), Some("36.5"));
        assert_eq!(hash.get(BINANCE_FIELD).map(String::as_str), Some("38.2"));
        assert_eq!(hash.get(UPDATED_AT_FIELD), Some(&updated_at));
        assert!(hash.contains_key(EURO_FIELD));
    }

    #[tokio::test]
    async fn test_last_run_wins() {
        let store = MemoryStore::new();

        job(&store, 36.5, 38.2, true).run().await.unwrap();
        let second = job(&store, 37.0, 39.9, true).run().await.unwrap();

        let hash = store.hgetall(RATES_HASH_KEY).await.unwrap();
        assert_eq!(hash.get(BCV_FIELD).map(String::as_str), Some("37"));
        assert_eq!(hash.get(BINANCE_FIELD).map(String::as_str), Some("39.9"));
        assert_eq!(hash.get(UPDATED_AT_FIELD), second.snapshot.updated_at.as_ref());
        assert_eq!(store.get(BCV_KEY).await.unwrap().as_deref(), Some("37"));
        assert_eq!(store.get(BINANCE_KEY).await.unwrap().as_deref(), Some("39.9"));
    }

    #[tokio::test]
    async fn test_clear_previous_drops_stale_euro() {
        let store = MemoryStore::new();
        job(&store, 36.5, 38.2, true).run().await.unwrap();

        let without_fx = RefreshJob::new(
            RateFetcher::new(StaticProvider::ok(37.0), StaticProvider::ok(39.0), None),
            Arc::new(store.clone()),
            true,
        );
        without_fx.run().await.unwrap();

        assert!(store.get(EURO_KEY).await.unwrap().is_none());
        assert!(!store.hgetall(RATES_HASH_KEY).await.unwrap().contains_key(EURO_FIELD));
    }

    #[tokio::test]
    async fn test_stale_euro_survives_without_clearing() {
        let store = MemoryStore::new();
        job(&store, 36.5, 38.2, false).run().await.unwrap();

        let without_fx = RefreshJob::new(
            RateFetcher::new(StaticProvider::ok(37.0), StaticProvider::ok(39.0), None),
            Arc::new(store.clone()),
            false,
        );
        without_fx.run().await.unwrap();

        let stale = (1.05 * 36.5).to_string();
        assert_eq!(store.get(EURO_KEY).await.unwrap(), Some(stale.clone()));
        let hash = store.hgetall(RATES_HASH_KEY).await.unwrap();
        assert_eq!(hash.get(EURO_FIELD), Some(&stale));
        assert_eq!(hash.get(BCV_FIELD).map(String::as_str), Some("37"));
    }

    #[tokio::test]
    async fn test_store_outage_leaves_previous_values() {
        let store = MemoryStore::new();
        job(&store, 36.5, 38.2, true).run().await.unwrap();
        let before = store.hgetall(RATES_HASH_KEY).await.unwrap();

        store.set_available(false);
        let err = job(&store, 40.0, 41.0, true).run().await.unwrap_err();
        store.set_available(true);

        assert!(err.to_string().contains("Failed to write rates to cache"));
        assert_eq!(store.hgetall(RATES_HASH_KEY).await.unwrap(), before);
        assert_eq!(store.get(BCV_KEY).await.unwrap().as_deref(), Some("36.5"));
    }

    #[tokio::test]
    async fn test_official_failure_writes_nothing() {
        let store = MemoryStore::new();
        let failing = RefreshJob::new(
            RateFetcher::new(StaticProvider::failing(), StaticProvider::ok(38.2), None),
            Arc::new(store.clone()),
            true,
        );

        assert!(failing.run().await.is_err());
        assert!(store.hgetall(RATES_HASH_KEY).await.unwrap().is_empty());
        assert!(store.get(BCV_KEY).await.unwrap().is_none());
    }
}
