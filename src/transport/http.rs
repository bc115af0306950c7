//! HTTP Transport
//!
//! Session with the management server over reqwest: basic authentication,
//! JSON content headers and a per-call timeout. One `execute` is one HTTP
//! call; nothing is retried here.

use crate::config::ClientConfig;
use crate::domain::ports::{Transport, TransportRequest, TransportResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use tracing::{debug, info};

/// Transport backed by a pooled reqwest client
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl ReqwestTransport {
    /// Create a transport for the server described by a configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.base_url(), config)
    }

    /// Create a transport rooted at an explicit base URL
    pub fn new(base_url: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(!config.verify_tls);

        if let Some(path) = &config.ca_cert {
            let pem = std::fs::read(path)?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                Error::Configuration(format!("Invalid CA certificate {}: {}", path.display(), e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        info!("HTTP session established for {}", base_url);

        Ok(Self {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        let url = self.url_for(&request.path);

        let mut builder = self
            .client
            .request(request.method.into(), &url)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(request.timeout);
        if let Some(params) = &request.params {
            builder = builder.query(params);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(e, url.clone()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(e, url.clone()))?;

        debug!(method = %request.method, %url, status, "HTTP call complete");
        Ok(TransportResponse { status, body })
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{HttpMethod, QueryParams};
    use crate::error::TransportFault;
    use assert_matches::assert_matches;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> ClientConfig {
        ClientConfig {
            username: "smc".into(),
            password: "smc".into(),
            ..Default::default()
        }
    }

    fn request(method: HttpMethod, path: &str) -> TransportRequest {
        TransportRequest {
            method,
            path: path.to_string(),
            params: None,
            body: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_get_with_auth_and_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/univmax/restapi/90/system/symmetrix"))
            .and(query_param("ucode", ">5977"))
            .and(header("authorization", "Basic c21jOnNtYw=="))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"symmetrixId":["000197800123"]}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport =
            ReqwestTransport::new(format!("{}/univmax/restapi/", server.uri()), &config()).unwrap();
        let mut req = request(HttpMethod::Get, "/90/system/symmetrix");
        let mut params = QueryParams::new();
        params.insert("ucode".into(), ">5977".into());
        req.params = Some(params);

        let response = transport.execute(req).await.unwrap();
        assert_eq!(response.status, 200);
        assert!(response.body.contains("000197800123"));
    }

    #[tokio::test]
    async fn test_put_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/90/sloprovisioning/symmetrix/000197800123/storagegroup/SG1"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"executionOption": "ASYNCHRONOUS"})))
            .respond_with(ResponseTemplate::new(202).set_body_string(r#"{"jobId":"55555"}"#))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(server.uri(), &config()).unwrap();
        let mut req = request(
            HttpMethod::Put,
            "/90/sloprovisioning/symmetrix/000197800123/storagegroup/SG1",
        );
        req.body = Some(r#"{"executionOption":"ASYNCHRONOUS"}"#.into());

        let response = transport.execute(req).await.unwrap();
        assert_eq!(response.status, 202);
    }

    #[tokio::test]
    async fn test_error_status_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(server.uri(), &config()).unwrap();
        let response = transport
            .execute(request(HttpMethod::Delete, "/90/sloprovisioning/symmetrix/1/host/h"))
            .await
            .unwrap();
        assert_eq!(response.status, 500);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_a_transport_fault() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(server.uri(), &config()).unwrap();
        let mut req = request(HttpMethod::Get, "/90/system/version");
        req.timeout = Duration::from_millis(100);

        let err = transport.execute(req).await.unwrap_err();
        assert_matches!(err, Error::Transport { kind: TransportFault::Timeout, .. });
    }
}
