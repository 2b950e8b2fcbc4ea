use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

pub const USER_AGENT: &str = concat!("vesrates/", env!("CARGO_PKG_VERSION"));

/// Client shared by every provider.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// GETs `url` and decodes a JSON body, failing on non-2xx statuses.
pub async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T> {
    debug!("Requesting {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| anyhow!("Request error: {} URL: {}", e, url))?
        .error_for_status()
        .with_context(|| format!("Unexpected status from {url}"))?;

    let response_text = response
        .text()
        .await
        .context("Failed to get response text")?;

    match serde_json::from_str(&response_text) {
        Ok(data) => Ok(data),
        Err(e) => {
            error!(
                error = ?e,
                response = %response_text,
                "Failed to parse upstream response"
            );
            Err(e).with_context(|| format!("Failed to parse response from {url}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(serde::Deserialize)]
    struct Body {
        value: f64,
    }

    #[tokio::test]
    async fn test_get_json_sends_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rate"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value": 1.5}"#))
            .mount(&mock_server)
            .await;

        let client = http_client().unwrap();
        let body: Body = get_json(&client, &format!("{}/rate", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(body.value, 1.5);
    }

    #[tokio::test]
    async fn test_get_json_rejects_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = http_client().unwrap();
        let result: Result<Body> = get_json(&client, &mock_server.uri()).await;
        assert!(result.is_err());
    }
}
