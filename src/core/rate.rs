//! Rate abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Whether a rate came from its upstream API or was estimated locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    Live,
    Fallback,
}

impl Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RateSource::Live => "live",
                RateSource::Fallback => "fallback",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateReading {
    pub value: f64,
    pub source: RateSource,
}

impl RateReading {
    pub fn live(value: f64) -> Self {
        Self {
            value,
            source: RateSource::Live,
        }
    }

    pub fn fallback(value: f64) -> Self {
        Self {
            value,
            source: RateSource::Fallback,
        }
    }
}

/// The current set of rates held in the cache.
///
/// `0` is the sentinel for a rate that was never fetched, and
/// `updated_at` is `None` only when nothing was ever written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub bcv: f64,
    pub binance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub euro: Option<f64>,
    pub updated_at: Option<String>,
}

impl RateSnapshot {
    pub fn empty() -> Self {
        Self {
            bcv: 0.0,
            binance: 0.0,
            euro: None,
            updated_at: None,
        }
    }
}

impl Default for RateSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Source tags for each rate of a freshly fetched snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSources {
    pub bcv: RateSource,
    pub binance: RateSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub euro: Option<RateSource>,
}

/// Rates gathered by one fetch pass, before they are stamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchedRates {
    pub bcv: RateReading,
    pub binance: RateReading,
    pub euro: Option<RateReading>,
}

impl FetchedRates {
    /// Stamps every rate with the same timestamp.
    pub fn into_snapshot(self, updated_at: String) -> (RateSnapshot, RateSources) {
        let snapshot = RateSnapshot {
            bcv: self.bcv.value,
            binance: self.binance.value,
            euro: self.euro.map(|r| r.value),
            updated_at: Some(updated_at),
        };
        let sources = RateSources {
            bcv: self.bcv.source,
            binance: self.binance.source,
            euro: self.euro.map(|r| r.source),
        };
        (snapshot, sources)
    }
}

/// Keeps only finite, strictly positive rates.
pub fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Current time in the `toISOString` shape, e.g. `2025-01-31T12:00:00.000Z`.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A single upstream rate. Implementations return the raw upstream
/// value; fallbacks are applied by the fetcher.
#[async_trait]
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Returns `Ok(None)` when the upstream answered without the field.
    async fn fetch_rate(&self) -> Result<Option<f64>>;
}
