//! 提交服务 - 业务能力层
//!
//! 只负责把导出数据发送到导出接口并读取确认，不关心流程

use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use tracing::debug;

use crate::config::Config;
use crate::models::{ExportPayload, SubmitAck};

/// 导出数据的接收方
pub trait Submitter: Send + Sync {
    /// 发送导出数据；网络错误、非 2xx 响应和无法解析的响应都返回错误
    fn submit<'a>(&'a self, payload: &'a ExportPayload) -> BoxFuture<'a, Result<SubmitAck>>;
}

/// HTTP 导出接口
pub struct HttpSubmitter {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpSubmitter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.export_endpoint.clone(), config.submit_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, payload: &ExportPayload) -> Result<SubmitAck> {
        debug!("POST {}", self.endpoint);

        let resp = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("无法连接导出接口: {}", self.endpoint))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("导出接口返回 {}: {}", status, body);
        }

        let ack: SubmitAck = resp.json().await.context("无法解析导出接口响应")?;
        debug!("导出接口响应: success={}", ack.success);
        Ok(ack)
    }
}

impl Submitter for HttpSubmitter {
    fn submit<'a>(&'a self, payload: &'a ExportPayload) -> BoxFuture<'a, Result<SubmitAck>> {
        Box::pin(self.post(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = Config {
            export_endpoint: "http://example.test/export".to_string(),
            submit_timeout_secs: 5,
            ..Config::default()
        };
        let submitter = HttpSubmitter::from_config(&config);
        assert_eq!(submitter.endpoint(), "http://example.test/export");
        assert_eq!(submitter.timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_error() {
        let submitter = HttpSubmitter::new("http://127.0.0.1:9/export", Duration::from_millis(500));
        let evaluation = crate::models::CanonicalEvaluation {
            automated_checks: Default::default(),
            llm_evaluation: None,
            manual_evaluation: None,
            overall_score: 0.0,
        };
        let now = chrono::Utc::now();
        let payload = ExportPayload::assemble(
            &crate::models::RawCase::default(),
            evaluation,
            Default::default(),
            now,
            now,
        );
        assert!(submitter.submit(&payload).await.is_err());
    }
}
