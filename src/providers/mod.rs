pub mod criptoya;
pub mod dolarvzla;
pub mod frankfurter;
pub mod util;

use crate::core::RateFetcher;
use crate::core::config::ProvidersConfig;
use anyhow::Result;

/// Builds the fetcher for the configured upstream APIs.
pub fn build_fetcher(config: &ProvidersConfig) -> Result<RateFetcher> {
    let client = util::http_client()?;
    let official = dolarvzla::DolarVzlaProvider::new(&config.official.base_url, client.clone());
    let p2p = criptoya::CriptoYaProvider::new(&config.p2p.base_url, client.clone());
    let fx = config.fx.as_ref().map(|fx| {
        Box::new(frankfurter::FrankfurterProvider::new(&fx.base_url, client.clone()))
            as Box<dyn crate::core::RateProvider>
    });

    Ok(RateFetcher::new(Box::new(official), Box::new(p2p), fx))
}
