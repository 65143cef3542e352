//! reqwest-backed accrual client.

use async_trait::async_trait;
use tracing::debug;

use super::{AccrualApi, AccrualError, AccrualReply};

pub struct AccrualClient {
    http: reqwest::Client,
    base_url: String,
}

impl AccrualClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl AccrualApi for AccrualClient {
    async fn get_accrual(&self, order_number: i64) -> Result<AccrualReply, AccrualError> {
        let url = format!("{}/api/orders/{}", self.base_url, order_number);
        debug!(order = order_number, "sending accrual request");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| AccrualError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());
        let body = response
            .bytes()
            .await
            .map_err(|err| AccrualError::Transport(err.to_string()))?
            .to_vec();

        Ok(AccrualReply {
            status,
            body,
            retry_after,
        })
    }
}
