//! HTTP transport: one JSON-RPC message per `POST`.

use super::Transport;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use reqwest::Client;
use salesdesk_mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use std::collections::VecDeque;
use tracing::debug;
use url::Url;

/// Path of the JSON-RPC route when the endpoint URL names only a host
pub const DEFAULT_RPC_PATH: &str = "/mcp";

/// HTTP transport posting to the server's JSON-RPC route.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    url: Url,
    pending: VecDeque<JsonRpcResponse>,
}

impl HttpTransport {
    /// Create a transport for `url`. A bare base URL gets the `/mcp` route.
    pub fn new(url: Url, config: &ClientConfig) -> ClientResult<Self> {
        let url = if url.path() == "/" || url.path().is_empty() {
            url.join(DEFAULT_RPC_PATH)?
        } else {
            url
        };

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            url,
            pending: VecDeque::new(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&mut self, message: &JsonRpcRequest) -> ClientResult<()> {
        debug!(url = %self.url, method = %message.method, "POST request");

        let response = self.client.post(self.url.clone()).json(message).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        // Notifications are acknowledged without a body
        if !body.trim().is_empty() {
            self.pending.push_back(serde_json::from_str(&body)?);
        }
        Ok(())
    }

    async fn receive(&mut self) -> ClientResult<JsonRpcResponse> {
        self.pending
            .pop_front()
            .ok_or_else(|| ClientError::Protocol("no response pending".to_string()))
    }

    async fn close(&mut self) -> ClientResult<()> {
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(base_url: &str) -> HttpTransport {
        HttpTransport::new(Url::parse(base_url).unwrap(), &ClientConfig::default()).unwrap()
    }

    #[test]
    fn test_bare_base_url_gets_rpc_path() {
        assert_eq!(
            transport("http://localhost:8080").url().as_str(),
            "http://localhost:8080/mcp"
        );
        assert_eq!(
            transport("http://localhost:8080/rpc").url().as_str(),
            "http://localhost:8080/rpc"
        );
    }

    #[tokio::test]
    async fn test_post_queues_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/mcp"))
            .and(body_partial_json(json!({"method": "ping"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": {}})),
            )
            .mount(&server)
            .await;

        let mut transport = transport(&server.uri());
        transport
            .send(&JsonRpcRequest::new(1, "ping", None))
            .await
            .unwrap();

        let response = transport.receive().await.unwrap();
        assert_eq!(response.id, json!(1));
        assert!(matches!(
            transport.receive().await,
            Err(ClientError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_notification_without_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let mut transport = transport(&server.uri());
        transport
            .send(&JsonRpcRequest::notification("notifications/initialized", None))
            .await
            .unwrap();

        assert!(transport.receive().await.is_err());
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(ResponseTemplate::new(503).set_body_string("store offline"))
            .mount(&server)
            .await;

        let mut transport = transport(&server.uri());
        let result = transport.send(&JsonRpcRequest::new(1, "ping", None)).await;

        match result {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "store offline");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }
}
