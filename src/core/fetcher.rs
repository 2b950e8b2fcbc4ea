//! Combines the upstream providers into one set of rates

use super::rate::{FetchedRates, RateProvider, RateReading, positive};
use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

/// P2P estimate used when the marketplace is unavailable.
pub const P2P_FALLBACK_MARKUP: f64 = 1.03;

/// Approximate EUR/USD used when the FX source is unavailable.
pub const FALLBACK_EUR_USD: f64 = 1.08;

pub struct RateFetcher {
    official: Box<dyn RateProvider>,
    p2p: Box<dyn RateProvider>,
    fx: Option<Box<dyn RateProvider>>,
}

impl RateFetcher {
    pub fn new(
        official: Box<dyn RateProvider>,
        p2p: Box<dyn RateProvider>,
        fx: Option<Box<dyn RateProvider>>,
    ) -> Self {
        Self { official, p2p, fx }
    }

    /// Fetches official, P2P and EUR rates, in that order.
    ///
    /// Only a failed official request is an error. P2P and FX failures
    /// are recovered from the official rate and tagged as fallbacks.
    #[instrument(name = "RateFetch", skip(self))]
    pub async fn fetch(&self) -> Result<FetchedRates> {
        let bcv = self.fetch_official().await?;
        let binance = self.fetch_p2p(bcv.value).await;
        let euro = match &self.fx {
            Some(fx) => Some(Self::fetch_euro(fx.as_ref(), bcv.value).await),
            None => None,
        };

        info!(
            bcv = bcv.value,
            binance = binance.value,
            euro = ?euro.map(|r| r.value),
            "Fetched rates"
        );
        Ok(FetchedRates { bcv, binance, euro })
    }

    async fn fetch_official(&self) -> Result<RateReading> {
        let value = self
            .official
            .fetch_rate()
            .await
            .with_context(|| format!("Failed to fetch official rate from {}", self.official.name()))?;

        Ok(match positive(value) {
            Some(rate) => RateReading::live(rate),
            None => {
                warn!(
                    provider = self.official.name(),
                    "Official rate missing from response, storing 0"
                );
                RateReading::fallback(0.0)
            }
        })
    }

    async fn fetch_p2p(&self, official: f64) -> RateReading {
        match self.p2p.fetch_rate().await {
            Ok(value) => {
                if let Some(rate) = positive(value) {
                    return RateReading::live(rate);
                }
                warn!(
                    provider = self.p2p.name(),
                    "P2P rate missing from response, using official rate markup"
                );
            }
            Err(e) => {
                warn!(
                    provider = self.p2p.name(),
                    error = %e,
                    "Error fetching P2P rate, using official rate markup"
                );
            }
        }
        RateReading::fallback(official * P2P_FALLBACK_MARKUP)
    }

    async fn fetch_euro(fx: &dyn RateProvider, official: f64) -> RateReading {
        match fx.fetch_rate().await {
            Ok(value) => {
                if let Some(eur_usd) = positive(value) {
                    return RateReading::live(eur_usd * official);
                }
                warn!(
                    provider = fx.name(),
                    "EUR/USD missing from response, using {}", FALLBACK_EUR_USD
                );
            }
            Err(e) => {
                warn!(
                    provider = fx.name(),
                    error = %e,
                    "Error fetching EUR/USD, using {}", FALLBACK_EUR_USD
                );
            }
        }
        RateReading::fallback(FALLBACK_EUR_USD * official)
    }
}
