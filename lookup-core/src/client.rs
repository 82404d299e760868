use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};
use serde_json::Value;
use std::fmt::Debug;

use crate::{Config, error::LookupError, model::collapse_integral_floats};

/// Anything that can resolve an ID to a stored weather payload.
#[async_trait]
pub trait WeatherLookup: Send + Sync + Debug {
    /// Fetch the record stored under `id`.
    ///
    /// On success returns the compact JSON serialization of the body.
    async fn fetch(&self, id: &str) -> Result<String, LookupError>;
}

#[derive(Debug, Clone)]
pub struct HttpWeatherClient {
    base_url: String,
    http: Client,
}

impl HttpWeatherClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http: Client::new() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.server_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The ID is substituted into the path as typed, without encoding.
    pub fn lookup_url(&self, id: &str) -> String {
        format!("{}/weather/{}", self.base_url, id)
    }
}

#[async_trait]
impl WeatherLookup for HttpWeatherClient {
    async fn fetch(&self, id: &str) -> Result<String, LookupError> {
        let url = self.lookup_url(id);
        tracing::debug!("GET {url}");

        let res = self
            .http
            .get(&url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .inspect_err(|e| tracing::warn!("Weather lookup for '{id}' failed to send: {e}"))?;

        let status = res.status();
        let mut body: Value = res
            .json()
            .await
            .inspect_err(|e| tracing::warn!("Weather lookup for '{id}' returned unreadable body: {e}"))?;

        if !status.is_success() {
            let detail = body
                .get("detail")
                .and_then(Value::as_str)
                .filter(|d| !d.is_empty())
                .map(str::to_string);
            tracing::warn!("Weather lookup for '{id}' rejected with status {status}: {detail:?}");

            return Err(LookupError::Rejected { status: status.as_u16(), detail });
        }

        collapse_integral_floats(&mut body);
        let payload = serde_json::to_string(&body)?;
        tracing::info!("{payload}");

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let client = HttpWeatherClient::new("http://localhost:8000/");
        assert_eq!(client.lookup_url("42"), "http://localhost:8000/weather/42");
    }

    #[test]
    fn from_config_uses_default_server() {
        let client = HttpWeatherClient::from_config(&Config::default());
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn success_issues_exactly_one_get_and_returns_compact_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather/abc123"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "location": { "name": "London" },
                "current": { "temperature": 10 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpWeatherClient::new(server.uri());
        let payload = client.fetch("abc123").await.expect("lookup should succeed");

        let round: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(round["location"]["name"], "London");
        assert!(!payload.contains('\n'));
    }

    #[tokio::test]
    async fn integral_floats_are_stored_as_integers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather/f"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"t":10.0,"v":1e1,"w":2.5}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let client = HttpWeatherClient::new(server.uri());
        let payload = client.fetch("f").await.unwrap();

        assert!(payload.contains(r#""t":10"#));
        assert!(payload.contains(r#""v":10"#));
        assert!(payload.contains(r#""w":2.5"#));
        assert!(!payload.contains("10.0"));
    }

    #[tokio::test]
    async fn non_success_status_carries_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "detail": "ID not found" })),
            )
            .mount(&server)
            .await;

        let client = HttpWeatherClient::new(server.uri());
        let err = client.fetch("missing").await.unwrap_err();

        assert_eq!(
            err,
            LookupError::Rejected { status: 404, detail: Some("ID not found".to_string()) }
        );
    }

    #[tokio::test]
    async fn non_success_without_detail_has_no_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
            .mount(&server)
            .await;

        let client = HttpWeatherClient::new(server.uri());
        let err = client.fetch("x").await.unwrap_err();

        assert_eq!(err, LookupError::Rejected { status: 500, detail: None });
    }

    #[tokio::test]
    async fn non_json_body_is_a_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let client = HttpWeatherClient::new(server.uri());
        let err = client.fetch("x").await.unwrap_err();

        assert!(matches!(err, LookupError::Network { .. }));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpWeatherClient::new(format!("http://{addr}"));
        let err = client.fetch("x").await.unwrap_err();

        assert!(matches!(err, LookupError::Network { .. }));
    }
}
