use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

use crate::config::Config;
use crate::error::ClientError;
use crate::providers::ollama;

pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ClientError>> + 'a>>;

/// The narrow surface the session needs from a model server.
pub trait ModelGateway {
    fn list_models(&self) -> GatewayFuture<'_, Vec<String>>;

    fn generate<'a>(&'a self, model: &'a str, prompt: &'a str) -> GatewayFuture<'a, String>;
}

pub struct OllamaGateway<'a> {
    client: &'a Client,
    cfg: &'a Config,
}

impl<'a> OllamaGateway<'a> {
    pub fn new(client: &'a Client, cfg: &'a Config) -> Self {
        Self { client, cfg }
    }

    pub async fn version(&self) -> Result<String, ClientError> {
        ollama::version(self.client, self.cfg).await
    }
}

impl ModelGateway for OllamaGateway<'_> {
    fn list_models(&self) -> GatewayFuture<'_, Vec<String>> {
        Box::pin(async move { ollama::list_models(self.client, self.cfg).await })
    }

    fn generate<'a>(&'a self, model: &'a str, prompt: &'a str) -> GatewayFuture<'a, String> {
        Box::pin(async move { ollama::generate(self.client, self.cfg, model, prompt).await })
    }
}


#[cfg(test)]
mod tests {
    use super::ModelGateway;
    use super::stub::{StubGateway, names, refused};

    #[tokio::test]
    async fn stub_gateway_replays_catalogs_in_order() {
        let gateway = StubGateway::with_catalogs([Err(refused()), Ok(names(&["phi3"]))]);

        let first = gateway.list_models().await;
        let second = gateway.list_models().await;

        assert!(first.expect_err("first fetch should fail").is_connectivity());
        assert_eq!(second.expect("second fetch should succeed"), names(&["phi3"]));
        assert_eq!(*gateway.list_calls.borrow(), 2);
    }

    #[tokio::test]
    async fn stub_gateway_records_generate_calls() {
        let gateway = StubGateway::with_replies([Ok("pong".to_string())]);

        let reply = gateway
            .generate("phi3", "ping")
            .await
            .expect("generate should succeed");

        assert_eq!(reply, "pong");
        assert_eq!(
            gateway.prompts.borrow().as_slice(),
            &[("phi3".to_string(), "ping".to_string())]
        );
    }
}
