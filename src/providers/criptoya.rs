use super::util::get_json;
use crate::core::rate::RateProvider;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct P2pQuoteResponse {
    #[serde(alias = "totalAsk")]
    total_ask: Option<f64>,
}

/// Binance P2P USDT/VES ask price, as aggregated by CriptoYa.
pub struct CriptoYaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl CriptoYaProvider {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        CriptoYaProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl RateProvider for CriptoYaProvider {
    fn name(&self) -> &str {
        "criptoya-binancep2p"
    }

    #[instrument(name = "P2pRateFetch", skip(self))]
    async fn fetch_rate(&self) -> Result<Option<f64>> {
        let url = format!("{}/api/binancep2p/USDT/VES/1", self.base_url);
        let data: P2pQuoteResponse = get_json(&self.client, &url).await?;
        debug!(response = ?data, "Received P2P quote");
        Ok(data.total_ask)
    }
}
