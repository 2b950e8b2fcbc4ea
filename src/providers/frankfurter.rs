use super::util::get_json;
use crate::core::rate::RateProvider;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// EUR/USD from the ECB reference rates published by Frankfurter.
pub struct FrankfurterProvider {
    base_url: String,
    client: reqwest::Client,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        FrankfurterProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    fn name(&self) -> &str {
        "frankfurter"
    }

    #[instrument(name = "FxRateFetch", skip(self))]
    async fn fetch_rate(&self) -> Result<Option<f64>> {
        let url = format!("{}/latest?from=EUR&to=USD", self.base_url);
        let data: LatestRatesResponse = get_json(&self.client, &url).await?;
        debug!(response = ?data, "Received EUR/USD response");
        Ok(data.rates.get("USD").copied())
    }
}
