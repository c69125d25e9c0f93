// src/utils/http.rs

//! HTTP transport used by every remote call.
//!
//! The mirror only needs "fetch JSON" and "fetch bytes"; both go through the
//! [`Transport`] trait so the credential handling lives in one place.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Proxy, RequestBuilder};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, Credentials};

/// Status and decodability of a probe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub status: u16,
    pub json: bool,
}

/// Fetch capability shared by the lister, retriever and materializer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` with `query` and decode the answer as JSON.
    async fn fetch_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value>;

    /// GET `url` and return the raw body.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;

    /// GET `url` without failing on the status code.
    async fn probe(&self, url: &str) -> Result<Probe>;
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig, proxy: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs));
    if let Some(proxy) = proxy {
        builder = builder.proxy(Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}

/// [`Transport`] over a reqwest client with optional basic auth.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    credentials: Option<Credentials>,
}

impl HttpTransport {
    pub fn new(client: Client, credentials: Option<Credentials>) -> Self {
        Self {
            client,
            credentials,
        }
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.credentials {
            Some(creds) => request.basic_auth(&creds.username, creds.password.as_deref()),
            None => request,
        }
    }

    fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(AppError::Transport {
                url: response.url().to_string(),
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = self.get(url).query(query).send().await?;
        log::debug!("GET {}", response.url());
        let response = Self::check(response)?;
        Ok(response.json::<Value>().await?)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(url).send().await?;
        log::debug!("GET {}", response.url());
        let response = Self::check(response)?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn probe(&self, url: &str) -> Result<Probe> {
        let response = self.get(url).send().await?;
        log::debug!("GET {}", response.url());
        let status = response.status().as_u16();
        let json = response.json::<Value>().await.is_ok();
        Ok(Probe { status, json })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(credentials: Option<Credentials>) -> HttpTransport {
        let client = create_async_client(&CrawlerConfig::default(), None).unwrap();
        HttpTransport::new(client, credentials)
    }

    #[tokio::test]
    async fn test_fetch_json_with_query_and_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/content/7"))
            .and(query_param("expand", "history"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "x"})))
            .expect(1)
            .mount(&server)
            .await;

        let creds = Credentials {
            username: "jdoe".to_string(),
            password: Some("secret".to_string()),
        };
        let value = transport(Some(creds))
            .fetch_json(
                &format!("{}/rest/api/content/7", server.uri()),
                &[("expand", "history".to_string())],
            )
            .await
            .unwrap();
        assert_eq!(value["title"], "x");
    }

    #[tokio::test]
    async fn test_non_success_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = transport(None)
            .fetch_bytes(&format!("{}/missing.png", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Transport { status: 404, .. }));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_probe_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
            .mount(&server)
            .await;

        let probe = transport(None).probe(&server.uri()).await.unwrap();
        assert_eq!(probe, Probe { status: 401, json: false });
    }
}
