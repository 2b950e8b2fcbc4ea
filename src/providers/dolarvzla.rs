use super::util::get_json;
use crate::core::rate::RateProvider;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    current: Option<CurrentRates>,
}

#[derive(Debug, Deserialize)]
struct CurrentRates {
    usd: Option<f64>,
}

/// Official BCV USD/VES rate.
pub struct DolarVzlaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl DolarVzlaProvider {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        DolarVzlaProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl RateProvider for DolarVzlaProvider {
    fn name(&self) -> &str {
        "dolarvzla"
    }

    #[instrument(name = "OfficialRateFetch", skip(self))]
    async fn fetch_rate(&self) -> Result<Option<f64>> {
        let url = format!("{}/public/exchange-rate", self.base_url);
        let data: ExchangeRateResponse = get_json(&self.client, &url).await?;
        debug!(response = ?data, "Received official rate response");
        Ok(data.current.and_then(|c| c.usd))
    }
}
