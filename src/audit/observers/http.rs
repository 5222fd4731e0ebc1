use std::time::Duration;

use ureq::Agent;

use super::AuditObserver;
use crate::audit::AuditEvent;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// 每个事件一次 `POST application/json`
///
/// 使用阻塞的 ureq，调用方需在阻塞线程池中执行。
pub struct HttpObserver {
    url: String,
    agent: Agent,
}

impl HttpObserver {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            url: url.into(),
            agent,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl AuditObserver for HttpObserver {
    fn name(&self) -> &str {
        "http"
    }

    fn send(&self, event: &AuditEvent) -> anyhow::Result<()> {
        let resp = self.agent.post(&self.url).send_json(event)?;

        let status = resp.status().as_u16();
        if status >= 300 {
            anyhow::bail!("audit endpoint {} returned status {}", self.url, status);
        }
        Ok(())
    }
}
